/// API route handlers
///
/// One module per resource:
///
/// - `health`: Health check
/// - `auth`: Login, refresh, current user, password change
/// - `companies`, `accounts`, `customers`, `cf_items`: bookkeeping masters
/// - `roles`, `users`: access administration
/// - `settings`, `daily_tasks`, `notes`: workspace data
/// - `logs`: audit log viewer
/// - `ledger`: ledger, trial balance and journal entry preparation

pub mod accounts;
pub mod auth;
pub mod cf_items;
pub mod companies;
pub mod customers;
pub mod daily_tasks;
pub mod health;
pub mod ledger;
pub mod logs;
pub mod notes;
pub mod roles;
pub mod settings;
pub mod users;

use serde::Serialize;
use uuid::Uuid;
use validator::ValidationError;
use xfinance_shared::models::company::Company;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Body of a successful DELETE
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

impl Deleted {
    pub fn yes() -> Self {
        Self { deleted: true }
    }
}

/// 404 unless the company exists
pub(crate) async fn ensure_company(state: &AppState, company_id: Uuid) -> ApiResult<()> {
    if !Company::exists(&state.db, company_id).await? {
        return Err(ApiError::not_found("Company"));
    }
    Ok(())
}

/// Rejects values that are empty once surrounding whitespace is trimmed
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("1101").is_ok());
        assert!(not_blank("  x ").is_ok());
        assert!(not_blank("").is_err());
        assert_eq!(not_blank(" \t ").unwrap_err().code, "blank");
    }
}
