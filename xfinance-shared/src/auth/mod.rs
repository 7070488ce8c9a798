/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing, verification and the strength policy
/// - [`jwt`]: access/refresh token issuing and validation
/// - [`middleware`]: bearer token extraction and the request `AuthContext`
/// - [`authorization`]: permission and action-code checks through user roles
///
/// # Example
///
/// ```no_run
/// use xfinance_shared::auth::password::{hash_password, verify_password};
/// use xfinance_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("ledger2024")?;
/// assert!(verify_password("ledger2024", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "bookkeeper".to_string(), TokenType::Access);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!")?;
/// validate_access_token(&token, "secret-key-at-least-32-bytes-long!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
