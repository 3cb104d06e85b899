use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::application::ports::{
    DocumentExtractor, DocumentRepository, LabResultRepository, ProviderClient, ProviderMessage,
    RepositoryError,
};
use crate::domain::{DocumentId, DocumentStatus, LabResult, LabResultId, LabStatus};

pub const DEFAULT_EXTRACTION_TEXT_LIMIT: usize = 8000;

const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a medical data extractor. Return ONLY valid JSON.";

const EXTRACTION_USER_TEMPLATE: &str = r#"Extract all lab results from the following medical document text.

Return a JSON object with this exact structure:
{
  "lab_results": [
    {
      "test_name": "Hemoglobin",
      "value": 14.2,
      "unit": "g/dL",
      "reference_min": 13.5,
      "reference_max": 17.5,
      "recorded_at": "2024-01-15",
      "status": "normal"
    }
  ]
}

Rules:
- "value" must be a number (not a string)
- "reference_min" and "reference_max" may be null if not stated
- "recorded_at" must be YYYY-MM-DD format; use today's date if not found
- "status" must be one of: "normal", "high", "low", or null
- Only include results with a numeric value

Document text:
{text}"#;

/// Fixed-delay bounded retry for transport failures against the external
/// services. Content errors never retry.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Parse,
    Extract,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Parse => "parse",
            PipelineStage::Extract => "extract",
        }
    }
}

/// Terminal report of one pipeline run, consumed by the worker/scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed {
        document_id: DocumentId,
        report: ExtractionReport,
    },
    Failed {
        document_id: DocumentId,
        stage: PipelineStage,
        reason: String,
    },
    /// The stage's status guard did not hold; another run owns the document.
    Skipped {
        document_id: DocumentId,
        status: DocumentStatus,
    },
    NotFound {
        document_id: DocumentId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractionReport {
    pub saved: usize,
    pub skipped: usize,
}

impl ExtractionReport {
    pub fn total(&self) -> usize {
        self.saved + self.skipped
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}

enum StageResult {
    Advanced,
    Terminal(PipelineOutcome),
}

/// Two-stage document state machine: parse (OCR) then extract (structured
/// measurements), auto-chained. Stages are guarded on the current status;
/// `failed` and `completed` are terminal.
pub struct DocumentPipeline<X: ?Sized, P: ?Sized> {
    extractor: Arc<X>,
    provider: Arc<P>,
    documents: Arc<dyn DocumentRepository>,
    labs: Arc<dyn LabResultRepository>,
    retry: RetryPolicy,
    extraction_text_limit: usize,
}

impl<X, P> DocumentPipeline<X, P>
where
    X: DocumentExtractor + ?Sized,
    P: ProviderClient + ?Sized,
{
    pub fn new(
        extractor: Arc<X>,
        provider: Arc<P>,
        documents: Arc<dyn DocumentRepository>,
        labs: Arc<dyn LabResultRepository>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            extractor,
            provider,
            documents,
            labs,
            retry,
            extraction_text_limit: DEFAULT_EXTRACTION_TEXT_LIMIT,
        }
    }

    /// Run a document through both stages. Parse-stage completion strictly
    /// precedes extraction-stage start.
    pub async fn process(&self, document_id: DocumentId) -> Result<PipelineOutcome, PipelineError> {
        match self.parse_stage(document_id).await? {
            StageResult::Advanced => self.extract_stage(document_id).await,
            StageResult::Terminal(outcome) => Ok(outcome),
        }
    }

    async fn parse_stage(&self, document_id: DocumentId) -> Result<StageResult, PipelineError> {
        let Some(document) = self.documents.get_by_id(document_id).await? else {
            tracing::error!("Parse stage: document not found");
            return Ok(StageResult::Terminal(PipelineOutcome::NotFound {
                document_id,
            }));
        };

        if document.status != DocumentStatus::Pending {
            tracing::debug!(status = %document.status, "Parse stage skipped: status guard");
            return Ok(StageResult::Terminal(PipelineOutcome::Skipped {
                document_id,
                status: document.status,
            }));
        }

        self.documents
            .update_status(document_id, DocumentStatus::Parsing)
            .await?;

        let mut attempt = 0u32;
        let raw_text = loop {
            match self.extractor.extract(&document.file_path).await {
                Ok(text) => break text,
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "Extractor call failed, retrying");
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Document parse failed");
                    self.documents
                        .update_status(document_id, DocumentStatus::Failed)
                        .await?;
                    return Ok(StageResult::Terminal(PipelineOutcome::Failed {
                        document_id,
                        stage: PipelineStage::Parse,
                        reason: e.to_string(),
                    }));
                }
            }
        };

        self.documents.mark_parsed(document_id, &raw_text).await?;
        tracing::info!(chars = raw_text.len(), "Document parsed");

        Ok(StageResult::Advanced)
    }

    async fn extract_stage(
        &self,
        document_id: DocumentId,
    ) -> Result<PipelineOutcome, PipelineError> {
        let Some(document) = self.documents.get_by_id(document_id).await? else {
            tracing::error!("Extract stage: document not found");
            return Ok(PipelineOutcome::NotFound { document_id });
        };

        if document.status != DocumentStatus::Parsed {
            tracing::debug!(status = %document.status, "Extract stage skipped: status guard");
            return Ok(PipelineOutcome::Skipped {
                document_id,
                status: document.status,
            });
        }

        // Missing text is not transient; fail without touching the provider.
        let raw_text = document.raw_text.unwrap_or_default();
        if raw_text.trim().is_empty() {
            tracing::error!("Extract stage: document has no raw text");
            self.documents
                .update_status(document_id, DocumentStatus::Failed)
                .await?;
            return Ok(PipelineOutcome::Failed {
                document_id,
                stage: PipelineStage::Extract,
                reason: "no_raw_text".to_string(),
            });
        }

        self.documents
            .update_status(document_id, DocumentStatus::Extracting)
            .await?;

        let excerpt: String = raw_text.chars().take(self.extraction_text_limit).collect();
        let messages = vec![
            ProviderMessage::system(EXTRACTION_SYSTEM_PROMPT),
            ProviderMessage::user(EXTRACTION_USER_TEMPLATE.replace("{text}", &excerpt)),
        ];

        let mut attempt = 0u32;
        let turn = loop {
            match self.provider.chat_once(&messages, None).await {
                Ok(turn) => break turn,
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "Extraction model call failed, retrying");
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Structured extraction failed");
                    self.documents
                        .update_status(document_id, DocumentStatus::Failed)
                        .await?;
                    return Ok(PipelineOutcome::Failed {
                        document_id,
                        stage: PipelineStage::Extract,
                        reason: e.to_string(),
                    });
                }
            }
        };

        let payload: ExtractionPayload =
            match serde_json::from_str(strip_code_fences(&turn.content)) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(error = %e, "Extraction returned invalid JSON");
                    self.documents
                        .update_status(document_id, DocumentStatus::Failed)
                        .await?;
                    return Ok(PipelineOutcome::Failed {
                        document_id,
                        stage: PipelineStage::Extract,
                        reason: format!("invalid extraction payload: {}", e),
                    });
                }
            };

        let today = Utc::now().date_naive();
        let mut report = ExtractionReport::default();

        for item in &payload.lab_results {
            // Non-numeric values are counted, never fatal.
            let Some(value) = item.value.as_ref().and_then(lenient_decimal) else {
                tracing::debug!(?item, "Skipping non-numeric extraction item");
                report.skipped += 1;
                continue;
            };

            let reference_min = item.reference_min.as_ref().and_then(lenient_decimal);
            let reference_max = item.reference_max.as_ref().and_then(lenient_decimal);

            let recorded_at = item
                .recorded_at
                .as_deref()
                .and_then(|s| NaiveDate::from_str(s.trim()).ok())
                .unwrap_or(today);

            let status = item
                .status
                .as_deref()
                .and_then(LabStatus::parse)
                .or_else(|| LabStatus::classify(value, reference_min, reference_max));

            let result = LabResult {
                id: LabResultId::new(),
                document_id: Some(document_id),
                user_id: document.user_id,
                test_name: item
                    .test_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("Unknown")
                    .to_string(),
                test_code: None,
                value,
                unit: item
                    .unit
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("?")
                    .to_string(),
                reference_min,
                reference_max,
                status,
                recorded_at,
            };

            match self.labs.insert(&result).await {
                Ok(()) => report.saved += 1,
                Err(RepositoryError::ConstraintViolation(_)) => {
                    tracing::debug!(
                        test_name = %result.test_name,
                        recorded_at = %result.recorded_at,
                        "Duplicate lab result skipped"
                    );
                    report.skipped += 1;
                }
                Err(e) => return Err(PipelineError::Repository(e)),
            }
        }

        self.documents
            .mark_completed(
                document_id,
                json!({
                    "saved": report.saved,
                    "skipped": report.skipped,
                    "total": payload.lab_results.len(),
                }),
            )
            .await?;

        tracing::info!(
            saved = report.saved,
            skipped = report.skipped,
            "Extraction completed"
        );

        Ok(PipelineOutcome::Completed {
            document_id,
            report,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    lab_results: Vec<RawLabItem>,
}

#[derive(Debug, Deserialize)]
struct RawLabItem {
    test_name: Option<String>,
    value: Option<Value>,
    unit: Option<String>,
    reference_min: Option<Value>,
    reference_max: Option<Value>,
    recorded_at: Option<String>,
    status: Option<String>,
}

/// Lenient numeric coercion: JSON numbers or numeric strings become a
/// fixed-precision decimal, anything else is None.
fn lenient_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Models without a JSON output mode tend to wrap payloads in markdown
/// fences.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed.strip_prefix("```json").unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix("```").unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}
