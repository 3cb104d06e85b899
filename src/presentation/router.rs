use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::ports::{DocumentExtractor, ProviderClient};
use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    ai_status_handler, create_session_handler, delete_session_handler, document_status_handler,
    get_session_handler, health_handler, list_messages_handler, list_sessions_handler,
    send_message_handler, upload_document_handler,
};
use crate::presentation::state::AppState;

pub fn create_router<P, X>(state: AppState<P, X>) -> Router
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/ai/status", get(ai_status_handler::<P, X>))
        .route(
            "/api/v1/documents/upload",
            post(upload_document_handler::<P, X>),
        )
        .route(
            "/api/v1/documents/{document_id}",
            get(document_status_handler::<P, X>),
        )
        .route(
            "/api/v1/chat/sessions",
            post(create_session_handler::<P, X>).get(list_sessions_handler::<P, X>),
        )
        .route(
            "/api/v1/chat/sessions/{session_id}",
            get(get_session_handler::<P, X>).delete(delete_session_handler::<P, X>),
        )
        .route(
            "/api/v1/chat/sessions/{session_id}/messages",
            get(list_messages_handler::<P, X>).post(send_message_handler::<P, X>),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
