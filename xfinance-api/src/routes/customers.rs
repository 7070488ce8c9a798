/// Customer endpoints
///
/// Writes need the `CUSTOMERS_EDIT` action.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{ensure_company, not_blank, Deleted},
};
use axum::{
    extract::{Path, Query, State},
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
        customer::{CreateCustomer, Customer, UpdateCustomer},
        log::{AuditLog, NewLog},
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    /// Matches code or name, case-insensitive
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(
        length(min = 1, max = 50, message = "Code must be 1-50 characters"),
        custom(function = "not_blank")
    )]
    pub code: String,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    pub register_number: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(
        length(min = 1, max = 50, message = "Code must be 1-50 characters"),
        custom(function = "not_blank")
    )]
    pub code: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    pub register_number: Option<String>,
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<ListCustomersQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    ensure_company(&state, company_id).await?;

    let customers = Customer::list_by_company(&state.db, company_id, query.search.as_deref()).await?;
    Ok(Json(customers))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Customer>> {
    let customer = Customer::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer"))?;

    Ok(Json(customer))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    Json(req): Json<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    require_action(&state.db, &auth, actions::CUSTOMERS_EDIT).await?;
    req.validate()?;
    ensure_company(&state, company_id).await?;

    let customer = Customer::create(
        &state.db,
        CreateCustomer {
            company_id,
            code: req.code.trim().to_string(),
            name: req.name.trim().to_string(),
            register_number: req.register_number,
            phone: req.phone,
            email: req.email,
        },
    )
    .await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info("customers.create", format!("Created customer {}", customer.code))
            .by(auth.user_id)
            .with_metadata(json!({ "company_id": company_id, "customer_id": customer.id })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCustomerRequest>,
) -> ApiResult<Json<Customer>> {
    require_action(&state.db, &auth, actions::CUSTOMERS_EDIT).await?;
    req.validate()?;

    let data = UpdateCustomer {
        code: req.code.map(|c| c.trim().to_string()),
        name: req.name.map(|n| n.trim().to_string()),
        register_number: req.register_number,
        phone: req.phone,
        email: req.email,
    };

    let customer = Customer::update(&state.db, id, data)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer"))?;

    Ok(Json(customer))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    require_action(&state.db, &auth, actions::CUSTOMERS_EDIT).await?;

    if !Customer::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Customer"));
    }

    AuditLog::record_quietly(
        &state.db,
        NewLog::warn("customers.delete", "Deleted customer")
            .by(auth.user_id)
            .with_metadata(json!({ "customer_id": id })),
    )
    .await;

    Ok(Json(Deleted::yes()))
}
