/// Audit log viewer
///
/// ```text
/// GET /api/logs?level=warn&action=auth.login_failed&since=2024-03-01T00:00:00Z&limit=200
/// ```
///
/// Needs the `logs:read` permission. Newest events come first.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use xfinance_shared::{
    auth::{
        authorization::{permissions, require_permission},
        middleware::AuthContext,
    },
    models::log::{AuditLog, LogFilter},
};

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<LogFilter>,
) -> ApiResult<Json<Vec<AuditLog>>> {
    require_permission(&state.db, &auth, permissions::LOGS_READ).await?;

    Ok(Json(AuditLog::list(&state.db, &filter).await?))
}
