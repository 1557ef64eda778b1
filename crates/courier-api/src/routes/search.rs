use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::error::ApiResult;
use crate::routes::dto::SearchResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Full-text query
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Best matches first", body = SearchResponse),
        (status = 400, description = "Empty query")
    ),
    tag = "search"
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let hits = state.service.search(&query.q, query.limit).await?;
    Ok(Json(SearchResponse {
        query: query.q,
        hits: hits.into_iter().map(Into::into).collect(),
    }))
}
