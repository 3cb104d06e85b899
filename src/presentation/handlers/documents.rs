use std::path::Path as FsPath;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::application::ports::{DocumentExtractor, ProviderClient};
use crate::application::services::PipelineMessage;
use crate::domain::{Document, DocumentId, DocumentType, UserId};
use crate::presentation::state::AppState;

const ALLOWED_MIME_TYPES: &[(&str, &str)] = &[
    ("application/pdf", ".pdf"),
    ("image/jpeg", ".jpg"),
    ("image/jpg", ".jpg"),
    ("image/png", ".png"),
    ("image/tiff", ".tiff"),
    ("image/webp", ".webp"),
];

#[derive(Serialize)]
pub struct UploadAcceptedResponse {
    pub document_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub document_type: String,
    pub file_type: String,
    pub status: String,
    pub document_date: Option<String>,
    pub parsed_data: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Accept a medical document for asynchronous processing. Responds 202
/// immediately; progress is polled via the document status endpoint.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_document_handler<P, X>(
    State(state): State<AppState<P, X>>,
    mut multipart: Multipart,
) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut file_type = String::new();
    let mut user_id: Option<Uuid> = None;
    let mut title: Option<String> = None;
    let mut document_type: Option<String> = None;
    let mut document_date: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return bad_request(format!("Failed to read multipart: {}", e));
            }
        };

        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                file_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => file_bytes = Some(bytes.to_vec()),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read file bytes");
                        return bad_request(format!("Failed to read file: {}", e));
                    }
                }
            }
            "user_id" => match field.text().await.ok().and_then(|v| v.parse().ok()) {
                Some(id) => user_id = Some(id),
                None => return bad_request("user_id must be a UUID"),
            },
            "title" => title = field.text().await.ok(),
            "document_type" => document_type = field.text().await.ok(),
            "document_date" => document_date = field.text().await.ok(),
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let Some(data) = file_bytes else {
        tracing::warn!("Upload request with no file");
        return bad_request("No file uploaded");
    };
    let Some(user_id) = user_id else {
        return bad_request("user_id is required");
    };
    let Some(title) = title.filter(|t| !t.trim().is_empty()) else {
        return bad_request("title is required");
    };

    let max_bytes = state.settings.storage.max_upload_size_mb * 1024 * 1024;
    if data.len() > max_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(ErrorResponse {
                error: format!(
                    "File exceeds maximum size of {} MB",
                    state.settings.storage.max_upload_size_mb
                ),
            }),
        )
            .into_response();
    }

    let Some((_, extension)) = ALLOWED_MIME_TYPES.iter().find(|(mime, _)| *mime == file_type)
    else {
        tracing::warn!(content_type = %file_type, "Unsupported content type");
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ErrorResponse {
                error: format!(
                    "Unsupported file type: {}. Allowed: PDF, JPEG, PNG, TIFF, WebP",
                    file_type
                ),
            }),
        )
            .into_response();
    };

    let document_type = match document_type.as_deref().and_then(DocumentType::parse) {
        Some(dt) => dt,
        None => {
            return bad_request(
                "document_type must be one of: lab_report, prescription, imaging, other",
            );
        }
    };

    let document_date = match document_date.filter(|d| !d.trim().is_empty()) {
        Some(raw) => match raw.trim().parse::<NaiveDate>() {
            Ok(date) => Some(date),
            Err(_) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ErrorResponse {
                        error: "document_date must be in YYYY-MM-DD format".to_string(),
                    }),
                )
                    .into_response();
            }
        },
        None => None,
    };

    // UUID-based name prevents path traversal via the original filename.
    let stored_name = format!("{}{}", Uuid::new_v4(), extension);
    let upload_dir = FsPath::new(&state.settings.storage.upload_dir);
    if let Err(e) = tokio::fs::create_dir_all(upload_dir).await {
        tracing::error!(error = %e, "Failed to create upload directory");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to store file".to_string(),
            }),
        )
            .into_response();
    }
    let file_path = upload_dir.join(&stored_name);
    if let Err(e) = tokio::fs::write(&file_path, &data).await {
        tracing::error!(error = %e, "Failed to write uploaded file");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to store file".to_string(),
            }),
        )
            .into_response();
    }

    let document = Document::new(
        UserId::from_uuid(user_id),
        title,
        document_type,
        file_path.to_string_lossy().to_string(),
        file_type,
        document_date,
    );
    let document_id = document.id;

    if let Err(e) = state.document_repository.create(&document).await {
        tracing::error!(error = %e, "Failed to create document record");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to create document: {}", e),
            }),
        )
            .into_response();
    }

    if let Err(e) = state
        .pipeline_sender
        .send(PipelineMessage { document_id })
        .await
    {
        tracing::error!(error = %e, "Failed to enqueue document processing");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Processing queue full or worker unavailable".to_string(),
            }),
        )
            .into_response();
    }

    tracing::info!(
        document_id = %document_id.as_uuid(),
        "Document accepted for processing"
    );

    (
        StatusCode::ACCEPTED,
        Json(UploadAcceptedResponse {
            document_id: document_id.as_uuid().to_string(),
            status: "pending".to_string(),
            message: "Document accepted for processing".to_string(),
        }),
    )
        .into_response()
}

/// Poll a document's processing status by id.
#[tracing::instrument(skip(state))]
pub async fn document_status_handler<P, X>(
    State(state): State<AppState<P, X>>,
    Path(document_id): Path<String>,
) -> impl IntoResponse
where
    P: ProviderClient + ?Sized + 'static,
    X: DocumentExtractor + ?Sized + 'static,
{
    let Ok(uuid) = Uuid::parse_str(&document_id) else {
        return bad_request(format!("Invalid document ID: {}", document_id));
    };

    match state
        .document_repository
        .get_by_id(DocumentId::from_uuid(uuid))
        .await
    {
        Ok(Some(document)) => (
            StatusCode::OK,
            Json(DocumentResponse {
                id: document.id.as_uuid().to_string(),
                user_id: document.user_id.as_uuid().to_string(),
                title: document.title,
                document_type: document.document_type.as_str().to_string(),
                file_type: document.file_type,
                status: document.status.as_str().to_string(),
                document_date: document.document_date.map(|d| d.to_string()),
                parsed_data: document.parsed_data,
                created_at: document.created_at.to_rfc3339(),
            }),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Document not found: {}", document_id),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch document");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to fetch document: {}", e),
                }),
            )
                .into_response()
        }
    }
}
