use axum::{
    extract::State,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use super::error::ApiError;
use super::extract::{SearchBody, SearchQuery};
use super::AppState;
use crate::search::{Envelope, ParamSource};

pub const USAGE: &str =
    "YouTube Music Search API — use /search?q=... or POST /search with body { search: \"...\" }";

/// `GET /`
pub async fn root() -> &'static str {
    USAGE
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "ok": true,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// `GET /search?q=...`
pub async fn search_get(
    State(state): State<AppState>,
    SearchQuery(params): SearchQuery,
) -> Result<Json<Envelope>, ApiError> {
    let envelope = state.handler.handle(&params, ParamSource::Query).await?;
    Ok(Json(envelope))
}

/// `POST /search` con cuerpo JSON o de formulario
pub async fn search_post(
    State(state): State<AppState>,
    SearchBody(params): SearchBody,
) -> Result<Json<Envelope>, ApiError> {
    let envelope = state.handler.handle(&params, ParamSource::Body).await?;
    Ok(Json(envelope))
}
