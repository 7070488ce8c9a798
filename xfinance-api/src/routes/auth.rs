/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/login` - Login with username and password
/// - `POST /api/auth/refresh` - Exchange a refresh token for an access token
/// - `GET /api/auth/me` - Current user with roles, permissions and actions
/// - `PUT /api/auth/password` - Change own password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;
use xfinance_shared::{
    auth::{
        jwt::{self, Claims, TokenType},
        middleware::AuthContext,
        password::{self, PasswordError},
    },
    models::{
        action::Action,
        log::{AuditLog, NewLog},
        permission::Permission,
        role::Role,
        user::User,
    },
};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 64, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
///
/// Carries everything the add-in needs to decide which ribbon buttons
/// to enable.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    pub user: User,
    pub actions: Vec<i32>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub roles: Vec<Role>,
    pub permissions: Vec<String>,
    pub actions: Vec<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    pub new_password: String,
}

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Login
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "username": "saraa",
///   "password": "secret123"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown user, wrong password or deactivated user.
///   The message is the same in every case.
/// - `422 Unprocessable Entity`: Empty username or password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let username = req.username.trim();

    let user = match User::find_by_username(&state.db, username).await? {
        Some(user) if user.is_active => user,
        found => {
            let reason = if found.is_some() { "inactive" } else { "unknown_user" };
            reject_login(&state, username, reason).await;
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    let verified = match password::verify_password(&req.password, &user.password_hash) {
        Ok(ok) => ok,
        // Rows imported without a PHC hash can never log in
        Err(PasswordError::InvalidHash(_)) => false,
        Err(e) => return Err(e.into()),
    };

    if !verified {
        reject_login(&state, username, "wrong_password").await;
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let access_claims = Claims::new(user.id, user.username.clone(), TokenType::Access);
    let expires_in = access_claims.expires_in_seconds().unwrap_or(0);
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    let refresh_claims = Claims::new(user.id, user.username.clone(), TokenType::Refresh);
    let refresh_token = jwt::create_token(&refresh_claims, state.jwt_secret())?;

    let actions = Action::codes_for_user(&state.db, user.id).await?;
    let permissions = Permission::names_for_user(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User logged in");
    AuditLog::record_quietly(
        &state.db,
        NewLog::info("auth.login", format!("{} logged in", user.username)).by(user.id),
    )
    .await;

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in,
        user,
        actions,
        permissions,
    }))
}

async fn reject_login(state: &AppState, username: &str, reason: &str) {
    tracing::warn!(username, reason, "Login rejected");
    AuditLog::record_quietly(
        &state.db,
        NewLog::warn("auth.login_failed", format!("Failed login for {}", username))
            .with_metadata(json!({ "username": username, "reason": reason })),
    )
    .await;
}

/// Refresh an access token
///
/// ```text
/// POST /api/auth/refresh
///
/// { "refresh_token": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid refresh token, or the user was deactivated
///   or deleted after logging in
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;
    let user = active_user(&state, claims.sub).await?;

    let access_claims = Claims::new(user.id, user.username, TokenType::Access);
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Loads the caller, 401 unless the account still exists and is active
async fn active_user(state: &AppState, user_id: Uuid) -> ApiResult<User> {
    match User::find_by_id(&state.db, user_id).await? {
        Some(user) if user.is_active => Ok(user),
        Some(_) => Err(ApiError::Unauthorized("Account is deactivated".to_string())),
        None => Err(ApiError::Unauthorized("Account no longer exists".to_string())),
    }
}

/// Current user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = active_user(&state, auth.user_id).await?;

    let roles = Role::list_for_user(&state.db, user.id).await?;
    let permissions = Permission::names_for_user(&state.db, user.id).await?;
    let actions = Action::codes_for_user(&state.db, user.id).await?;

    Ok(Json(MeResponse {
        user,
        roles,
        permissions,
        actions,
    }))
}

/// Change own password
///
/// # Errors
///
/// - `401 Unauthorized`: Current password is wrong
/// - `422 Unprocessable Entity`: New password is too weak
pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    req.validate()?;

    password::validate_password_strength(&req.new_password).map_err(|e| {
        ApiError::ValidationError(vec![ValidationErrorDetail::new("new_password", e.to_string())])
    })?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let hash = password::hash_password(&req.new_password)?;
    User::set_password(&state.db, user.id, &hash).await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("auth.password_changed", "Password changed").by(user.id),
    )
    .await;

    Ok(Json(json!({ "updated": true })))
}
