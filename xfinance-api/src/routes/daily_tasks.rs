/// Daily task endpoints
///
/// Tasks are private: every query is scoped to the caller, so another
/// user's task id simply comes back as 404.
///
/// # Endpoints
///
/// - `GET /api/daily-tasks?date=2024-03-01` (defaults to today)
/// - `GET /api/daily-tasks?from=2024-03-01&to=2024-03-07`
/// - `POST /api/daily-tasks`
/// - `PUT/DELETE /api/daily-tasks/:id`
/// - `POST /api/daily-tasks/:id/toggle`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::Deleted,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;
use xfinance_shared::{
    auth::middleware::AuthContext,
    models::daily_task::{CreateDailyTask, DailyTask, UpdateDailyTask},
};

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TaskQuery {
    /// Inclusive day range the query asks for
    fn range(&self, today: NaiveDate) -> ApiResult<(NaiveDate, NaiveDate)> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(ApiError::BadRequest(format!(
                "Invalid date range: {} is after {}",
                from, to
            ))),
            (Some(from), Some(to)) => Ok((from, to)),
            (Some(from), None) => Ok((from, from)),
            (None, Some(to)) => Ok((to, to)),
            (None, None) => {
                let day = self.date.unwrap_or(today);
                Ok((day, day))
            }
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Defaults to today
    pub task_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: String,

    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    pub task_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 500, message = "Title must be 1-500 characters"))]
    pub title: Option<String>,

    pub note: Option<String>,
    pub is_done: Option<bool>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<Vec<DailyTask>>> {
    let (from, to) = query.range(Utc::now().date_naive())?;

    let tasks = DailyTask::list_range(&state.db, auth.user_id, from, to).await?;
    Ok(Json(tasks))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<DailyTask>)> {
    req.validate()?;

    let task = DailyTask::create(
        &state.db,
        CreateDailyTask {
            user_id: auth.user_id,
            task_date: req.task_date.unwrap_or_else(|| Utc::now().date_naive()),
            title: req.title.trim().to_string(),
            note: req.note,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<DailyTask>> {
    req.validate()?;

    let data = UpdateDailyTask {
        task_date: req.task_date,
        title: req.title.map(|t| t.trim().to_string()),
        note: req.note,
        is_done: req.is_done,
    };

    let task = DailyTask::update(&state.db, auth.user_id, id, data)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    Ok(Json(task))
}

/// Flips the done flag
pub async fn toggle(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DailyTask>> {
    let task = DailyTask::toggle(&state.db, auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    Ok(Json(task))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    if !DailyTask::delete(&state.db, auth.user_id, id).await? {
        return Err(ApiError::not_found("Task"));
    }

    Ok(Json(Deleted::yes()))
}
