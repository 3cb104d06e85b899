use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::ports::{DocumentExtractor, ProviderClient};
use crate::application::services::ChatServiceError;
use crate::domain::{ChatMessage, ChatSession, SessionId, UserId};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Uuid,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsParams {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub user_id: String,
    pub title: Option<String>,
    pub created_at: String,
    pub last_activity_at: String,
}

impl SessionResponse {
    fn from_session(session: &ChatSession) -> Self {
        Self {
            id: session.id.as_uuid().to_string(),
            user_id: session.user_id.as_uuid().to_string(),
            title: session.title.clone(),
            created_at: session.created_at.to_rfc3339(),
            last_activity_at: session.last_activity_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct SessionDetailResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub messages: Vec<MessageResponse>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub role: String,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

impl MessageResponse {
    fn from_message(message: &ChatMessage) -> Self {
        Self {
            id: message.id.as_uuid().to_string(),
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            metadata: message.metadata.clone(),
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn service_error(e: ChatServiceError) -> axum::response::Response {
    match e {
        ChatServiceError::SessionNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Chat session not found: {}", id),
            }),
        )
            .into_response(),
        ChatServiceError::Repository(e) => {
            tracing::error!(error = %e, "Chat repository failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Chat request failed: {}", e),
                }),
            )
                .into_response()
        }
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, axum::response::Response> {
    Uuid::parse_str(raw).map(SessionId::from_uuid).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid session ID: {}", raw),
            }),
        )
            .into_response()
    })
}

#[tracing::instrument(skip(state, request))]
pub async fn create_session_handler<P, X>(
    State(state): State<AppState<P, X>>,
    Json(request): Json<CreateSessionRequest>,
) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    match state
        .chat_service
        .create_session(UserId::from_uuid(request.user_id), request.title)
        .await
    {
        Ok(session) => (
            StatusCode::CREATED,
            Json(SessionResponse::from_session(&session)),
        )
            .into_response(),
        Err(e) => service_error(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_sessions_handler<P, X>(
    State(state): State<AppState<P, X>>,
    Query(params): Query<ListSessionsParams>,
) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    match state
        .chat_service
        .list_sessions(UserId::from_uuid(params.user_id))
        .await
    {
        Ok(sessions) => {
            let sessions: Vec<SessionResponse> =
                sessions.iter().map(SessionResponse::from_session).collect();
            (StatusCode::OK, Json(sessions)).into_response()
        }
        Err(e) => service_error(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn get_session_handler<P, X>(
    State(state): State<AppState<P, X>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let session = match state.chat_service.get_session(session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Chat session not found: {}", session_id.as_uuid()),
                }),
            )
                .into_response();
        }
        Err(e) => return service_error(e),
    };

    match state.chat_service.list_messages(session_id).await {
        Ok(messages) => (
            StatusCode::OK,
            Json(SessionDetailResponse {
                session: SessionResponse::from_session(&session),
                messages: messages.iter().map(MessageResponse::from_message).collect(),
            }),
        )
            .into_response(),
        Err(e) => service_error(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn delete_session_handler<P, X>(
    State(state): State<AppState<P, X>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.chat_service.delete_session(session_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Chat session not found: {}", session_id.as_uuid()),
            }),
        )
            .into_response(),
        Err(e) => service_error(e),
    }
}

#[tracing::instrument(skip(state))]
pub async fn list_messages_handler<P, X>(
    State(state): State<AppState<P, X>>,
    Path(session_id): Path<String>,
) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.chat_service.get_session(session_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Chat session not found: {}", session_id.as_uuid()),
                }),
            )
                .into_response();
        }
        Err(e) => return service_error(e),
    }

    match state.chat_service.list_messages(session_id).await {
        Ok(messages) => {
            let messages: Vec<MessageResponse> =
                messages.iter().map(MessageResponse::from_message).collect();
            (StatusCode::OK, Json(messages)).into_response()
        }
        Err(e) => service_error(e),
    }
}

/// Send a message and stream the assistant's reply as SSE. Each normalized
/// chat event becomes one `data: <json>` frame.
#[tracing::instrument(skip(state, request))]
pub async fn send_message_handler<P, X>(
    State(state): State<AppState<P, X>>,
    Path(session_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    tracing::debug!(prompt = %sanitize_prompt(&request.content), "Processing chat message");

    let events = match state
        .chat_service
        .send_message_stream(session_id, request.content)
        .await
    {
        Ok(events) => events,
        Err(e) => return service_error(e),
    };

    let keep_alive_seconds = state.settings.chat.sse_keep_alive_seconds;
    let sse_stream = events.map(|event| {
        let frame = serde_json::to_string(&event).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(frame))
    });

    Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(keep_alive_seconds))
                .text("keep-alive"),
        )
        .into_response()
}
