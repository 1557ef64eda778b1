use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::error::ApiResult;
use crate::routes::dto::{EmailResponse, ThreadResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListMessagesQuery {
    /// Maximum number of messages, oldest first
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/threads/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread id")),
    responses(
        (status = 200, description = "Thread summary", body = ThreadResponse),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = state.service.get_thread(&thread_id).await?;
    Ok(Json(thread.into()))
}

#[utoipa::path(
    get,
    path = "/threads/{thread_id}/messages",
    params(("thread_id" = String, Path, description = "Thread id"), ListMessagesQuery),
    responses(
        (status = 200, description = "Messages in creation order", body = Vec<EmailResponse>)
    ),
    tag = "threads"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<Vec<EmailResponse>>> {
    let messages = state
        .service
        .list_thread_messages(&thread_id, query.limit.filter(|l| *l > 0))
        .await?;
    Ok(Json(messages.iter().map(EmailResponse::from).collect()))
}
