use axum::{
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{core::METRICS_TEXT_CONTENT_TYPE, metrics::render_metrics};

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub(crate) async fn metrics() -> Response {
    (
        [(CONTENT_TYPE, METRICS_TEXT_CONTENT_TYPE)],
        render_metrics(),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct GuildPath {
    pub(crate) guild_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GuildResponse {
    pub(crate) guild_id: String,
    pub(crate) name: String,
    pub(crate) owner_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GuildDataResponse {
    pub(crate) guild_id: String,
    pub(crate) settings: serde_json::Map<String, serde_json::Value>,
}
