//! Route handlers. Each one decodes its input, calls [`MemoryService`] once and
//! maps the outcome through [`ApiError`].

use axum::extract::{FromRequest, FromRequestParts, Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::memory::service::HealthStatus;
use crate::memory::types::{LogItem, SearchResult, WaitlistSignup};
use crate::memory::{ChatResponse, Confirmation, MemoryService};

pub type AppState = Arc<MemoryService>;

/// `Json` extractor whose decode failures become [`ApiError`]s.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// `Query` extractor whose decode failures become [`ApiError`]s.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub limit: Option<usize>,
}

pub async fn log_event(
    State(service): State<AppState>,
    AppJson(item): AppJson<LogItem>,
) -> Result<Json<Confirmation>, ApiError> {
    Ok(Json(service.ingest(item).await?))
}

pub async fn chat(
    State(service): State<AppState>,
    AppJson(request): AppJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    Ok(Json(service.chat(&request.query).await?))
}

pub async fn search(
    State(service): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    Ok(Json(service.search(&params.query, params.limit).await?))
}

pub async fn join_waitlist(
    State(service): State<AppState>,
    AppJson(signup): AppJson<WaitlistSignup>,
) -> Result<Json<Confirmation>, ApiError> {
    service
        .join_waitlist(signup)
        .await
        .map(Json)
        .map_err(ApiError::opaque)
}

pub async fn health(State(service): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    Ok(Json(service.health().await?))
}
