/// Role-based authorization
///
/// Two kinds of grants hang off a user's roles:
///
/// - **Permissions**: named admin capabilities (`users:manage`, `logs:read`, ...)
///   reached through `user_roles -> role_permissions -> permissions`
/// - **Action codes**: numeric feature gates checked by bookkeeping screens
///   (`100` edit accounts, `400` record journal entries, ...) reached through
///   `user_roles -> role_actions`
///
/// Holding the role named `admin` passes every check.
///
/// # Example
///
/// ```no_run
/// use sqlx::PgPool;
/// use xfinance_shared::auth::authorization::{actions, permissions, require_action, require_permission};
/// use xfinance_shared::auth::middleware::AuthContext;
///
/// # async fn example(pool: PgPool, auth: AuthContext) -> Result<(), Box<dyn std::error::Error>> {
/// require_permission(&pool, &auth, permissions::USERS_MANAGE).await?;
/// require_action(&pool, &auth, actions::ACCOUNTS_EDIT).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;

use super::middleware::AuthContext;
use crate::models::{action::Action, permission::Permission, role::Role};

/// Name of the role that bypasses every check
pub const ADMIN_ROLE: &str = "admin";

/// Named permissions seeded by the migrations
pub mod permissions {
    pub const USERS_MANAGE: &str = "users:manage";
    pub const ROLES_MANAGE: &str = "roles:manage";
    pub const COMPANIES_MANAGE: &str = "companies:manage";
    pub const SETTINGS_MANAGE: &str = "settings:manage";
    pub const LOGS_READ: &str = "logs:read";
}

/// Action codes seeded by the migrations
pub mod actions {
    pub const ACCOUNTS_EDIT: i32 = 100;
    pub const CUSTOMERS_EDIT: i32 = 200;
    pub const CF_ITEMS_EDIT: i32 = 300;
    pub const JOURNAL_RECORD: i32 = 400;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Missing permission: {0}")]
    MissingPermission(String),

    #[error("Action {0} is not allowed for your role")]
    MissingAction(i32),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Requires a named permission
///
/// # Errors
///
/// `AuthzError::MissingPermission` when none of the caller's roles grants it
pub async fn require_permission(
    pool: &PgPool,
    auth: &AuthContext,
    permission: &str,
) -> Result<(), AuthzError> {
    if Role::user_is_admin(pool, auth.user_id).await? {
        return Ok(());
    }

    if !Permission::user_has(pool, auth.user_id, permission).await? {
        tracing::debug!(user_id = %auth.user_id, permission, "Permission denied");
        return Err(AuthzError::MissingPermission(permission.to_string()));
    }

    Ok(())
}

/// Requires an action code
///
/// # Errors
///
/// `AuthzError::MissingAction` when none of the caller's roles grants it
pub async fn require_action(pool: &PgPool, auth: &AuthContext, code: i32) -> Result<(), AuthzError> {
    if Role::user_is_admin(pool, auth.user_id).await? {
        return Ok(());
    }

    if !Action::user_has(pool, auth.user_id, code).await? {
        tracing::debug!(user_id = %auth.user_id, code, "Action denied");
        return Err(AuthzError::MissingAction(code));
    }

    Ok(())
}
