use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use crate::application::ports::{DocumentExtractor, ProviderClient};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
        }),
    )
}

/// Connectivity status of the configured model provider and the extractor
/// sidecar. Probes never fail; unreachability is reported as a status.
#[tracing::instrument(skip(state))]
pub async fn ai_status_handler<P, X>(State(state): State<AppState<P, X>>) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    let provider = state.provider.health_check().await;
    let extractor = state.extractor.health_check().await;

    (
        StatusCode::OK,
        Json(json!({
            "provider": state.settings.provider.chat_provider.as_str(),
            "status": provider.status.as_str(),
            "host": provider.host,
            "chat_model": provider.chat_model,
            "available_models": provider.available_models,
            "error": provider.error,
            "extractor": {
                "status": extractor.status.as_str(),
                "host": extractor.host,
                "error": extractor.error,
            },
        })),
    )
}
