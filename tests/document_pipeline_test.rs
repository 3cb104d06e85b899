use std::sync::Arc;
use std::time::Duration;

use meridian::application::ports::{
    AssistantTurn, DocumentRepository, ExtractorError, LabResultRepository, ProviderError,
};
use meridian::application::services::{
    DocumentPipeline, ExtractionReport, PipelineOutcome, PipelineStage, RetryPolicy,
};
use meridian::domain::{Document, DocumentId, DocumentStatus, DocumentType, UserId};
use meridian::infrastructure::extractor::MockExtractor;
use meridian::infrastructure::llm::ScriptedProvider;
use meridian::infrastructure::persistence::{InMemoryDocumentStore, InMemoryLabStore};

struct Harness {
    extractor: Arc<MockExtractor>,
    provider: Arc<ScriptedProvider>,
    documents: Arc<InMemoryDocumentStore>,
    labs: Arc<InMemoryLabStore>,
    pipeline: DocumentPipeline<MockExtractor, ScriptedProvider>,
}

fn harness() -> Harness {
    let extractor = Arc::new(MockExtractor::new());
    let provider = Arc::new(ScriptedProvider::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    let labs = Arc::new(InMemoryLabStore::new());
    let pipeline = DocumentPipeline::new(
        Arc::clone(&extractor),
        Arc::clone(&provider),
        Arc::clone(&documents) as Arc<dyn DocumentRepository>,
        Arc::clone(&labs) as Arc<dyn LabResultRepository>,
        RetryPolicy {
            max_retries: 2,
            backoff: Duration::from_millis(1),
        },
    );
    Harness {
        extractor,
        provider,
        documents,
        labs,
        pipeline,
    }
}

async fn seed_document(harness: &Harness, user_id: UserId) -> DocumentId {
    let document = Document::new(
        user_id,
        "Blood panel".to_string(),
        DocumentType::LabReport,
        "/tmp/blood-panel.pdf".to_string(),
        "application/pdf".to_string(),
        None,
    );
    let id = document.id;
    harness.documents.create(&document).await.unwrap();
    id
}

fn extraction_json(turn_content: &str) -> AssistantTurn {
    AssistantTurn {
        content: turn_content.to_string(),
        tool_calls: Vec::new(),
    }
}

const TWO_RESULTS: &str = r#"{
  "lab_results": [
    {"test_name": "Hemoglobin", "value": 14.2, "unit": "g/dL",
     "reference_min": 13.5, "reference_max": 17.5,
     "recorded_at": "2026-07-01", "status": "normal"},
    {"test_name": "Ferritin", "value": 18.0, "unit": "ng/mL",
     "reference_min": 30.0, "reference_max": 400.0,
     "recorded_at": "2026-07-01", "status": null}
  ]
}"#;

#[tokio::test]
async fn given_parseable_document_when_processing_then_completes_with_saved_results() {
    let h = harness();
    let user = UserId::new();
    let id = seed_document(&h, user).await;

    h.extractor.push_text("Hemoglobin 14.2 g/dL\nFerritin 18 ng/mL");
    h.provider.push_turn(extraction_json(TWO_RESULTS));

    let outcome = h.pipeline.process(id).await.unwrap();

    assert_eq!(
        outcome,
        PipelineOutcome::Completed {
            document_id: id,
            report: ExtractionReport {
                saved: 2,
                skipped: 0
            },
        }
    );

    let document = h.documents.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Completed);
    assert!(document.raw_text.is_some());
    assert_eq!(document.parsed_data.unwrap()["saved"], 2);
    assert_eq!(h.labs.count().await, 2);
}

#[tokio::test]
async fn given_non_numeric_values_when_extracting_then_items_are_skipped_not_fatal() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor.push_text("report text");
    h.provider.push_turn(extraction_json(
        r#"{"lab_results": [
            {"test_name": "Hemoglobin", "value": 14.2, "unit": "g/dL"},
            {"test_name": "Comment", "value": "see note", "unit": ""},
            {"test_name": "Glucose", "value": "5.4", "unit": "mmol/L"}
        ]}"#,
    ));

    let outcome = h.pipeline.process(id).await.unwrap();

    // "see note" is not numeric; "5.4" coerces leniently.
    match outcome {
        PipelineOutcome::Completed { report, .. } => {
            assert_eq!(report.saved, 2);
            assert_eq!(report.skipped, 1);
            assert_eq!(report.total(), 3);
        }
        other => panic!("expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn given_duplicate_second_document_when_extracting_then_skips_increment_and_still_completes()
{
    let h = harness();
    let user = UserId::new();

    let first = seed_document(&h, user).await;
    h.extractor.push_text("first");
    h.provider.push_turn(extraction_json(TWO_RESULTS));
    h.pipeline.process(first).await.unwrap();
    assert_eq!(h.labs.count().await, 2);

    let second = seed_document(&h, user).await;
    h.extractor.push_text("second");
    h.provider.push_turn(extraction_json(TWO_RESULTS));
    let outcome = h.pipeline.process(second).await.unwrap();

    assert_eq!(
        outcome,
        PipelineOutcome::Completed {
            document_id: second,
            report: ExtractionReport {
                saved: 0,
                skipped: 2
            },
        }
    );
    assert_eq!(h.labs.count().await, 2);

    let document = h.documents.get_by_id(second).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Completed);
}

#[tokio::test]
async fn given_empty_extracted_text_when_extracting_then_fails_fast_without_model_call() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor.push_text("   ");

    let outcome = h.pipeline.process(id).await.unwrap();

    assert_eq!(
        outcome,
        PipelineOutcome::Failed {
            document_id: id,
            stage: PipelineStage::Extract,
            reason: "no_raw_text".to_string(),
        }
    );
    // One extractor call, zero retries, zero provider attempts consumed.
    assert_eq!(h.extractor.calls(), 1);
    assert_eq!(h.provider.chat_once_calls(), 0);

    let document = h.documents.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Failed);
}

#[tokio::test]
async fn given_transient_extractor_failures_when_parsing_then_retries_before_terminal_failure() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    for _ in 0..3 {
        h.extractor
            .push_error(ExtractorError::RequestFailed("connect refused".to_string()));
    }

    let outcome = h.pipeline.process(id).await.unwrap();

    match outcome {
        PipelineOutcome::Failed { stage, reason, .. } => {
            assert_eq!(stage, PipelineStage::Parse);
            assert!(reason.contains("connect refused"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    // Initial attempt plus two retries.
    assert_eq!(h.extractor.calls(), 3);

    let document = h.documents.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Failed);
}

#[tokio::test]
async fn given_transient_failure_then_success_when_parsing_then_recovers_within_the_bound() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor
        .push_error(ExtractorError::RequestFailed("blip".to_string()));
    h.extractor.push_text("recovered text");
    h.provider
        .push_turn(extraction_json(r#"{"lab_results": []}"#));

    let outcome = h.pipeline.process(id).await.unwrap();

    assert!(matches!(outcome, PipelineOutcome::Completed { .. }));
    assert_eq!(h.extractor.calls(), 2);
}

#[tokio::test]
async fn given_no_extractable_text_error_when_parsing_then_fails_without_retry() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor
        .push_error(ExtractorError::NoExtractableText("scan.pdf".to_string()));

    let outcome = h.pipeline.process(id).await.unwrap();

    assert!(matches!(
        outcome,
        PipelineOutcome::Failed {
            stage: PipelineStage::Parse,
            ..
        }
    ));
    assert_eq!(h.extractor.calls(), 1);
}

#[tokio::test]
async fn given_transient_model_failures_when_extracting_then_retries_then_fails_terminally() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor.push_text("report text");
    for _ in 0..3 {
        h.provider
            .push_error(ProviderError::RequestFailed("timeout".to_string()));
    }

    let outcome = h.pipeline.process(id).await.unwrap();

    assert!(matches!(
        outcome,
        PipelineOutcome::Failed {
            stage: PipelineStage::Extract,
            ..
        }
    ));
    assert_eq!(h.provider.chat_once_calls(), 3);

    let document = h.documents.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Failed);
}

#[tokio::test]
async fn given_malformed_extraction_payload_when_extracting_then_fails_without_retry() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor.push_text("report text");
    h.provider
        .push_turn(extraction_json("The results look great overall!"));

    let outcome = h.pipeline.process(id).await.unwrap();

    match outcome {
        PipelineOutcome::Failed { stage, reason, .. } => {
            assert_eq!(stage, PipelineStage::Extract);
            assert!(reason.contains("invalid extraction payload"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    // Malformed content is not transient; exactly one model call.
    assert_eq!(h.provider.chat_once_calls(), 1);
}

#[tokio::test]
async fn given_fenced_json_when_extracting_then_payload_still_parses() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor.push_text("report text");
    h.provider.push_turn(extraction_json(
        "```json\n{\"lab_results\": [{\"test_name\": \"TSH\", \"value\": 2.1, \"unit\": \"mIU/L\"}]}\n```",
    ));

    let outcome = h.pipeline.process(id).await.unwrap();

    assert!(matches!(
        outcome,
        PipelineOutcome::Completed {
            report: ExtractionReport { saved: 1, skipped: 0 },
            ..
        }
    ));
}

#[tokio::test]
async fn given_malformed_date_and_status_when_extracting_then_item_is_recovered_locally() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor.push_text("report text");
    h.provider.push_turn(extraction_json(
        r#"{"lab_results": [
            {"test_name": "Iron", "value": 95, "unit": "ug/dL",
             "reference_min": "not a number",
             "recorded_at": "sometime last week", "status": "elevated"}
        ]}"#,
    ));

    let outcome = h.pipeline.process(id).await.unwrap();

    assert!(matches!(
        outcome,
        PipelineOutcome::Completed {
            report: ExtractionReport { saved: 1, skipped: 0 },
            ..
        }
    ));
}

#[tokio::test]
async fn given_already_processed_document_when_processing_again_then_run_is_skipped() {
    let h = harness();
    let id = seed_document(&h, UserId::new()).await;

    h.extractor.push_text("report text");
    h.provider
        .push_turn(extraction_json(r#"{"lab_results": []}"#));
    h.pipeline.process(id).await.unwrap();

    let second = h.pipeline.process(id).await.unwrap();

    assert_eq!(
        second,
        PipelineOutcome::Skipped {
            document_id: id,
            status: DocumentStatus::Completed,
        }
    );
    assert_eq!(h.extractor.calls(), 1);
}

#[tokio::test]
async fn given_unknown_document_id_when_processing_then_reports_not_found() {
    let h = harness();
    let id = DocumentId::new();

    let outcome = h.pipeline.process(id).await.unwrap();

    assert_eq!(outcome, PipelineOutcome::NotFound { document_id: id });
}
