/// User administration
///
/// Every endpoint needs the `users:manage` permission.
///
/// # Endpoints
///
/// - `GET /api/users?limit=50&offset=0`
/// - `POST /api/users`
/// - `GET/PUT/DELETE /api/users/:id`
/// - `PUT /api/users/:id/roles`
/// - `PUT /api/users/:id/password`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::Deleted,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;
use xfinance_shared::{
    auth::{
        authorization::{permissions, require_permission},
        middleware::AuthContext,
        password,
    },
    models::{
        log::{AuditLog, NewLog},
        role::Role,
        user::{CreateUser, UpdateUser, User},
    },
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(max = 200, message = "Full name must be at most 200 characters"))]
    pub full_name: Option<String>,

    /// Roles to assign right away
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 200, message = "Full name must be at most 200 characters"))]
    pub full_name: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SetRolesRequest {
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

async fn guard(state: &AppState, auth: &AuthContext) -> ApiResult<()> {
    require_permission(&state.db, auth, permissions::USERS_MANAGE).await?;
    Ok(())
}

fn check_password(password: &str) -> ApiResult<()> {
    password::validate_password_strength(password)
        .map_err(|e| ApiError::ValidationError(vec![ValidationErrorDetail::new("password", e.to_string())]))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<UserPage>> {
    guard(&state, &auth).await?;

    let users = User::list(&state.db, page.limit(), page.offset()).await?;
    let total = User::count(&state.db).await?;

    Ok(Json(UserPage {
        users,
        total,
        limit: page.limit(),
        offset: page.offset(),
    }))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserDetail>> {
    guard(&state, &auth).await?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let roles = Role::list_for_user(&state.db, id).await?;

    Ok(Json(UserDetail { user, roles }))
}

/// Creates a user
///
/// # Errors
///
/// - `409 Conflict`: Username or email already exists
/// - `422 Unprocessable Entity`: Validation failed or weak password
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserDetail>)> {
    guard(&state, &auth).await?;
    req.validate()?;
    check_password(&req.password)?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create_with_roles(
        &state.db,
        CreateUser {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            password_hash,
            full_name: req.full_name,
        },
        &req.role_ids,
    )
    .await?;

    let roles = Role::list_for_user(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User created");
    AuditLog::record_quietly(
        &state.db,
        NewLog::info("users.create", format!("Created user {}", user.username))
            .by(auth.user_id)
            .with_metadata(json!({ "user_id": user.id })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(UserDetail { user, roles })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    guard(&state, &auth).await?;
    req.validate()?;

    if id == auth.user_id && req.is_active == Some(false) {
        return Err(ApiError::BadRequest("You cannot deactivate yourself".to_string()));
    }

    let data = UpdateUser {
        username: req.username.map(|u| u.trim().to_string()),
        email: req.email.map(|e| e.trim().to_lowercase()),
        full_name: req.full_name.map(Some),
        is_active: req.is_active,
    };

    let user = User::update(&state.db, id, data)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("users.update", format!("Updated user {}", user.username))
            .by(auth.user_id)
            .with_metadata(json!({ "user_id": user.id })),
    )
    .await;

    Ok(Json(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    guard(&state, &auth).await?;

    if id == auth.user_id {
        return Err(ApiError::BadRequest("You cannot delete yourself".to_string()));
    }

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::not_found("User"));
    }

    AuditLog::record_quietly(
        &state.db,
        NewLog::warn("users.delete", "Deleted user")
            .by(auth.user_id)
            .with_metadata(json!({ "user_id": id })),
    )
    .await;

    Ok(Json(Deleted::yes()))
}

/// Replaces the user's roles
pub async fn set_roles(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetRolesRequest>,
) -> ApiResult<Json<UserDetail>> {
    guard(&state, &auth).await?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    User::set_roles(&state.db, id, &req.role_ids).await?;
    let roles = Role::list_for_user(&state.db, id).await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("users.set_roles", format!("Updated roles of {}", user.username))
            .by(auth.user_id)
            .with_metadata(json!({ "user_id": id, "role_ids": req.role_ids })),
    )
    .await;

    Ok(Json(UserDetail { user, roles }))
}

/// Sets a new password without knowing the old one
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    guard(&state, &auth).await?;
    check_password(&req.password)?;

    let hash = password::hash_password(&req.password)?;
    if !User::set_password(&state.db, id, &hash).await? {
        return Err(ApiError::not_found("User"));
    }

    AuditLog::record_quietly(
        &state.db,
        NewLog::warn("users.reset_password", "Reset user password")
            .by(auth.user_id)
            .with_metadata(json!({ "user_id": id })),
    )
    .await;

    Ok(Json(json!({ "updated": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_and_bounds() {
        let page = Pagination::default();
        assert_eq!(page.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);

        let page = Pagination {
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(page.limit(), MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_weak_password_reports_password_field() {
        match check_password("short1") {
            Err(ApiError::ValidationError(details)) => assert_eq!(details[0].field, "password"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(check_password("longenough1").is_ok());
    }
}
