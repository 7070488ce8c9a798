/// Personal notes

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
use uuid::Uuid;
use validator::Validate;
use xfinance_shared::{auth::middleware::AuthContext, models::user_note::UserNote};

#[derive(Debug, Deserialize, Validate)]
pub struct NoteRequest {
    #[validate(length(min = 1, max = 10000, message = "Note must be 1-10000 characters"))]
    pub content: String,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<UserNote>>> {
    Ok(Json(UserNote::list(&state.db, auth.user_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<NoteRequest>,
) -> ApiResult<(StatusCode, Json<UserNote>)> {
    req.validate()?;

    let note = UserNote::create(&state.db, auth.user_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<NoteRequest>,
) -> ApiResult<Json<UserNote>> {
    req.validate()?;

    let note = UserNote::update(&state.db, auth.user_id, id, &req.content)
        .await?
        .ok_or_else(|| ApiError::not_found("Note"))?;

    Ok(Json(note))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Deleted>> {
    if !UserNote::delete(&state.db, auth.user_id, id).await? {
        return Err(ApiError::not_found("Note"));
    }

    Ok(Json(Deleted::yes()))
}
