/// Cash-flow item endpoints
///
/// Writes need the `CF_ITEMS_EDIT` action.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{ensure_company, not_blank, Deleted},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;
use xfinance_shared::{
    auth::{
        authorization::{actions, require_action},
        middleware::AuthContext,
    },
    models::{
        cf_item::{CfDirection, CfItem, CreateCfItem, UpdateCfItem},
        log::{AuditLog, NewLog},
    },
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCfItemRequest {
    #[validate(
        length(min = 1, max = 20, message = "Code must be 1-20 characters"),
        custom(function = "not_blank")
    )]
    pub code: String,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub direction: CfDirection,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCfItemRequest {
    #[validate(
        length(min = 1, max = 20, message = "Code must be 1-20 characters"),
        custom(function = "not_blank")
    )]
    pub code: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub direction: Option<CfDirection>,
}

pub async fn list(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<CfItem>>> {
    ensure_company(&state, company_id).await?;
    Ok(Json(CfItem::list_by_company(&state.db, company_id).await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<CfItem>> {
    let item = CfItem::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("CF item"))?;

    Ok(Json(item))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    Json(req): Json<CreateCfItemRequest>,
) -> ApiResult<(StatusCode, Json<CfItem>)> {
    require_action(&state.db, &auth, actions::CF_ITEMS_EDIT).await?;
    req.validate()?;
    ensure_company(&state, company_id).await?;

    let item = CfItem::create(
        &state.db,
        CreateCfItem {
            company_id,
            code: req.code.trim().to_string(),
            name: req.name.trim().to_string(),
            direction: req.direction,
        },
    )
    .await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("cf_items.create", format!("Created CF item {}", item.code))
            .by(auth.user_id)
            .with_metadata(json!({ "company_id": company_id, "cf_item_id": item.id })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCfItemRequest>,
) -> ApiResult<Json<CfItem>> {
    require_action(&state.db, &auth, actions::CF_ITEMS_EDIT).await?;
    req.validate()?;

    let data = UpdateCfItem {
        code: req.code.map(|c| c.trim().to_string()),
        name: req.name.map(|n| n.trim().to_string()),
        direction: req.direction,
    };

    let item = CfItem::update(&state.db, id, data)
        .await?
        .ok_or_else(|| ApiError::not_found("CF item"))?;

    Ok(Json(item))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    require_action(&state.db, &auth, actions::CF_ITEMS_EDIT).await?;

    if !CfItem::delete(&state.db, id).await? {
        return Err(ApiError::not_found("CF item"));
    }

    AuditLog::record_quietly(
        &state.db,
        NewLog::warn("cf_items.delete", "Deleted CF item")
            .by(auth.user_id)
            .with_metadata(json!({ "cf_item_id": id })),
    )
    .await;

    Ok(Json(Deleted::yes()))
}
