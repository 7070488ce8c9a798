/// Chart of accounts endpoints
///
/// Reads are open to any signed-in user. Writes need the
/// `ACCOUNTS_EDIT` action.
///
/// # Endpoints
///
/// - `GET /api/companies/:company_id/accounts?include_inactive=true`
/// - `POST /api/companies/:company_id/accounts` - 409 on a duplicate number
/// - `PUT /api/companies/:company_id/accounts/import` - bulk upsert
/// - `GET/PUT/DELETE /api/accounts/:id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::{ensure_company, not_blank, Deleted},
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
        authorization::{actions, require_action},
        middleware::AuthContext,
    },
    models::{
        account::{Account, AccountType, CreateAccount, UpdateAccount},
        log::{AuditLog, NewLog},
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct ListAccountsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AccountRequest {
    #[validate(
        length(min = 1, max = 20, message = "Account number must be 1-20 characters"),
        custom(function = "not_blank")
    )]
    pub account_number: String,

    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    pub account_type: AccountType,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
}

impl AccountRequest {
    fn into_create(self, company_id: Uuid) -> CreateAccount {
        CreateAccount {
            company_id,
            account_number: self.account_number.trim().to_string(),
            name: self.name.trim().to_string(),
            account_type: self.account_type,
            currency: self.currency,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(
        length(min = 1, max = 20, message = "Account number must be 1-20 characters"),
        custom(function = "not_blank")
    )]
    pub account_number: Option<String>,

    #[validate(
        length(min = 1, max = 200, message = "Name must be 1-200 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    pub account_type: Option<AccountType>,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ImportAccountsRequest {
    pub accounts: Vec<AccountRequest>,
}

#[derive(Debug, Serialize)]
pub struct ImportAccountsResponse {
    pub imported: usize,
    pub accounts: Vec<Account>,
}

pub async fn list(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Json<Vec<Account>>> {
    ensure_company(&state, company_id).await?;

    let accounts = Account::list_by_company(&state.db, company_id, query.include_inactive).await?;
    Ok(Json(accounts))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Account>> {
    let account = Account::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))?;

    Ok(Json(account))
}

/// Creates an account
///
/// # Errors
///
/// - `404 Not Found`: Company does not exist
/// - `409 Conflict`: Account number already exists for this company
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    Json(req): Json<AccountRequest>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    require_action(&state.db, &auth, actions::ACCOUNTS_EDIT).await?;
    req.validate()?;
    ensure_company(&state, company_id).await?;

    let account = Account::create(&state.db, req.into_create(company_id)).await?;

    AuditLog::record_quietly(
        &state.db,
        NewLog::info(
            "accounts.create",
            format!("Created account {} {}", account.account_number, account.name),
        )
        .by(auth.user_id)
        .with_metadata(json!({ "company_id": company_id, "account_id": account.id })),
    )
    .await;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Upserts a whole chart of accounts
///
/// Existing numbers are overwritten and reactivated. Either every row is
/// stored or none is.
pub async fn import(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(company_id): Path<Uuid>,
    Json(req): Json<ImportAccountsRequest>,
) -> ApiResult<Json<ImportAccountsResponse>> {
    require_action(&state.db, &auth, actions::ACCOUNTS_EDIT).await?;
    validate_rows(&req.accounts)?;
    ensure_company(&state, company_id).await?;

    let rows = req
        .accounts
        .into_iter()
        .map(|row| row.into_create(company_id))
        .collect();

    let accounts = Account::import(&state.db, rows).await?;

    tracing::info!(%company_id, count = accounts.len(), "Imported chart of accounts");
    AuditLog::record_quietly(
        &state.db,
        NewLog::info("accounts.import", format!("Imported {} accounts", accounts.len()))
            .by(auth.user_id)
            .with_metadata(json!({ "company_id": company_id, "count": accounts.len() })),
    )
    .await;

    Ok(Json(ImportAccountsResponse {
        imported: accounts.len(),
        accounts,
    }))
}

/// Validates every row, reporting fields as `accounts[i].field`
fn validate_rows(rows: &[AccountRequest]) -> ApiResult<()> {
    if rows.is_empty() {
        return Err(ApiError::BadRequest("No accounts to import".to_string()));
    }

    let mut details = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if let Err(errors) = row.validate() {
            if let ApiError::ValidationError(row_details) = ApiError::from(errors) {
                details.extend(row_details.into_iter().map(|d| {
                    ValidationErrorDetail::new(format!("accounts[{}].{}", i, d.field), d.message)
                }));
            }
        }
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(details))
    }
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Json<Account>> {
    require_action(&state.db, &auth, actions::ACCOUNTS_EDIT).await?;
    req.validate()?;

    let data = UpdateAccount {
        account_number: req.account_number.map(|n| n.trim().to_string()),
        name: req.name.map(|n| n.trim().to_string()),
        account_type: req.account_type,
        currency: req.currency,
        is_active: req.is_active,
    };

    let account = Account::update(&state.db, id, data)
        .await?
        .ok_or_else(|| ApiError::not_found("Account"))?;

    Ok(Json(account))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    require_action(&state.db, &auth, actions::ACCOUNTS_EDIT).await?;

    if !Account::delete(&state.db, id).await? {
        return Err(ApiError::not_found("Account"));
    }

    AuditLog::record_quietly(
        &state.db,
        NewLog::warn("accounts.delete", "Deleted account")
            .by(auth.user_id)
            .with_metadata(json!({ "account_id": id })),
    )
    .await;

    Ok(Json(Deleted::yes()))
}
