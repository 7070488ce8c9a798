/// Settings endpoints
///
/// Global settings are readable by everyone and writable with
/// `settings:manage`. Per-user settings under `/api/me/settings` belong to
/// the caller alone.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Deleted,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use xfinance_shared::{
    auth::{
        authorization::{permissions, require_permission},
        middleware::AuthContext,
    },
    models::{
        log::{AuditLog, NewLog},
        setting::Setting,
        user_setting::UserSetting,
    },
};

const MAX_KEY_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SettingValue {
    pub value: Value,
}

fn check_key(key: &str) -> ApiResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(ApiError::BadRequest(format!(
            "Setting key must be 1-{} characters",
            MAX_KEY_LEN
        )));
    }
    Ok(())
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Setting>>> {
    Ok(Json(Setting::list(&state.db).await?))
}

pub async fn get(State(state): State<AppState>, Path(key): Path<String>) -> ApiResult<Json<Setting>> {
    let setting = Setting::get(&state.db, &key)
        .await?
        .ok_or_else(|| ApiError::not_found("Setting"))?;

    Ok(Json(setting))
}

/// ```text
/// PUT /api/settings/company.default
///
/// { "value": "3f0c..." }
/// ```
pub async fn put(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
    Json(req): Json<SettingValue>,
) -> ApiResult<Json<Setting>> {
    require_permission(&state.db, &auth, permissions::SETTINGS_MANAGE).await?;
    check_key(&key)?;

    let setting = Setting::upsert(&state.db, &key, &req.value).await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("settings.update", format!("Set {}", key))
            .by(auth.user_id)
            .with_metadata(json!({ "key": key, "value": req.value })),
    )
    .await;

    Ok(Json(setting))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
) -> ApiResult<Json<Deleted>> {
    require_permission(&state.db, &auth, permissions::SETTINGS_MANAGE).await?;

    if !Setting::delete(&state.db, &key).await? {
        return Err(ApiError::not_found("Setting"));
    }

    Ok(Json(Deleted::yes()))
}

pub async fn list_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<UserSetting>>> {
    Ok(Json(UserSetting::list(&state.db, auth.user_id).await?))
}

pub async fn put_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
    Json(req): Json<SettingValue>,
) -> ApiResult<Json<UserSetting>> {
    check_key(&key)?;

    let setting = UserSetting::upsert(&state.db, auth.user_id, &key, &req.value).await?;
    Ok(Json(setting))
}

pub async fn delete_mine(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(key): Path<String>,
) -> ApiResult<Json<Deleted>> {
    if !UserSetting::delete(&state.db, auth.user_id, &key).await? {
        return Err(ApiError::not_found("Setting"));
    }

    Ok(Json(Deleted::yes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_length() {
        assert!(check_key("ribbon.theme").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key(&"k".repeat(MAX_KEY_LEN + 1)).is_err());
    }
}
