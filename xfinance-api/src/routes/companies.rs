/// Company endpoints
///
/// Any signed-in user can read companies; writes need the
/// `companies:manage` permission.

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
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;
use xfinance_shared::{
    auth::{
        authorization::{permissions, require_permission},
        middleware::AuthContext,
    },
    models::{
        company::{Company, CreateCompany, UpdateCompany},
        log::{AuditLog, NewLog},
    },
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 50, message = "Register number must be at most 50 characters"))]
    pub register_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 50, message = "Register number must be at most 50 characters"))]
    pub register_number: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Company>>> {
    Ok(Json(Company::list(&state.db).await?))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Company>> {
    let company = Company::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Company"))?;

    Ok(Json(company))
}

/// ```text
/// POST /api/companies
///
/// { "name": "Tenger LLC", "register_number": "5123456" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCompanyRequest>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    require_permission(&state.db, &auth, permissions::COMPANIES_MANAGE).await?;
    req.validate()?;

    let company = Company::create(
        &state.db,
        CreateCompany {
            name: req.name.trim().to_string(),
            register_number: req.register_number,
        },
    )
    .await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("companies.create", format!("Created company {}", company.name))
            .by(auth.user_id)
            .with_metadata(json!({ "company_id": company.id })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(company)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCompanyRequest>,
) -> ApiResult<Json<Company>> {
    require_permission(&state.db, &auth, permissions::COMPANIES_MANAGE).await?;
    req.validate()?;

    let data = UpdateCompany {
        name: req.name.map(|n| n.trim().to_string()),
        register_number: req.register_number.map(Some),
    };

    let company = Company::update(&state.db, id, data)
        .await?
        .ok_or_else(|| ApiError::not_found("Company"))?;

    Ok(Json(company))
}

/// Deletes a company with its accounts, customers and CF items
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    require_permission(&state.db, &auth, permissions::COMPANIES_MANAGE).await?;

    if !Company::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Company"));
    }

    AuditLog::record_quietly(
        &state.db,
        NewLog::warn("companies.delete", "Deleted company")
            .by(auth.user_id)
            .with_metadata(json!({ "company_id": id })),
    )
    .await;

    Ok(Json(Deleted::yes()))
}
