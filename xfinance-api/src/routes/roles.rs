/// Role, permission and action administration
///
/// Every endpoint here needs the `roles:manage` permission. Roles bundle
/// named permissions (admin screens) and numeric action codes (add-in
/// buttons).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Deleted,
};
use axum::{
    extract::{Path, State},
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
    },
    models::{
        action::Action,
        log::{AuditLog, NewLog},
        permission::{CreatePermission, Permission},
        role::{CreateRole, Role, UpdateRole},
    },
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

/// Role with everything it grants
#[derive(Debug, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
pub struct SetPermissionsRequest {
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SetActionsRequest {
    pub codes: Vec<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateActionRequest {
    #[validate(range(min = 1, message = "Action code must be positive"))]
    pub code: i32,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub description: Option<String>,
}

async fn guard(state: &AppState, auth: &AuthContext) -> ApiResult<()> {
    require_permission(&state.db, auth, permissions::ROLES_MANAGE).await?;
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Role>>> {
    guard(&state, &auth).await?;
    Ok(Json(Role::list(&state.db).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RoleDetail>> {
    guard(&state, &auth).await?;

    let role = Role::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role"))?;

    let permissions = Permission::list_for_role(&state.db, id).await?;
    let actions = Action::list_for_role(&state.db, id).await?;

    Ok(Json(RoleDetail {
        role,
        permissions,
        actions,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<Role>)> {
    guard(&state, &auth).await?;
    req.validate()?;

    let role = Role::create(
        &state.db,
        CreateRole {
            name: req.name.trim().to_string(),
            description: req.description,
        },
    )
    .await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("roles.create", format!("Created role {}", role.name)).by(auth.user_id),
    )
    .await;

    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Role>> {
    guard(&state, &auth).await?;
    req.validate()?;

    let role = Role::update(
        &state.db,
        id,
        UpdateRole {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Role"))?;

    Ok(Json(role))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    guard(&state, &auth).await?;

    if !Role::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Role"));
    }

    AuditLog::record_quietly(
        &state.db,
        NewLog::warn("roles.delete", "Deleted role")
            .by(auth.user_id)
            .with_metadata(json!({ "role_id": id })),
    )
    .await;

    Ok(Json(Deleted::yes()))
}

/// Replaces the role's permissions
pub async fn set_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetPermissionsRequest>,
) -> ApiResult<Json<RoleDetail>> {
    guard(&state, &auth).await?;

    let role = Role::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role"))?;

    Role::set_permissions(&state.db, id, &req.permission_ids).await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("roles.set_permissions", format!("Updated permissions of {}", role.name))
            .by(auth.user_id)
            .with_metadata(json!({ "role_id": id, "permission_ids": req.permission_ids })),
    )
    .await;

    let permissions = Permission::list_for_role(&state.db, id).await?;
    let actions = Action::list_for_role(&state.db, id).await?;

    Ok(Json(RoleDetail {
        role,
        permissions,
        actions,
    }))
}

/// Replaces the role's action codes
pub async fn set_actions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetActionsRequest>,
) -> ApiResult<Json<RoleDetail>> {
    guard(&state, &auth).await?;

    let role = Role::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role"))?;

    Role::set_actions(&state.db, id, &req.codes).await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("roles.set_actions", format!("Updated actions of {}", role.name))
            .by(auth.user_id)
            .with_metadata(json!({ "role_id": id, "codes": req.codes })),
    )
    .await;

    let permissions = Permission::list_for_role(&state.db, id).await?;
    let actions = Action::list_for_role(&state.db, id).await?;

    Ok(Json(RoleDetail {
        role,
        permissions,
        actions,
    }))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Permission>>> {
    guard(&state, &auth).await?;
    Ok(Json(Permission::list(&state.db).await?))
}

pub async fn create_permission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<Permission>)> {
    guard(&state, &auth).await?;
    req.validate()?;

    let permission = Permission::create(
        &state.db,
        CreatePermission {
            name: req.name.trim().to_string(),
            description: req.description,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(permission)))
}

pub async fn delete_permission(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    guard(&state, &auth).await?;

    if !Permission::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Permission"));
    }

    Ok(Json(Deleted::yes()))
}

pub async fn list_actions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Action>>> {
    guard(&state, &auth).await?;
    Ok(Json(Action::list(&state.db).await?))
}

pub async fn create_action(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateActionRequest>,
) -> ApiResult<(StatusCode, Json<Action>)> {
    guard(&state, &auth).await?;
    req.validate()?;

    let action = Action::create(
        &state.db,
        Action {
            code: req.code,
            name: req.name.trim().to_string(),
            description: req.description,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(action)))
}

pub async fn delete_action(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(code): Path<i32>,
) -> ApiResult<Json<Deleted>> {
    guard(&state, &auth).await?;

    if !Action::delete(&state.db, code).await? {
        return Err(ApiError::not_found("Action"));
    }

    Ok(Json(Deleted::yes()))
}
