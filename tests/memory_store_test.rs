use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use meridian::application::ports::{
    ChatRepository, DocumentRepository, LabResultRepository, RepositoryError,
};
use meridian::domain::{
    ChatMessage, ChatSession, Document, DocumentStatus, DocumentType, LabResult, LabResultId,
    MessageRole, UserId,
};
use meridian::infrastructure::persistence::{
    InMemoryChatStore, InMemoryDocumentStore, InMemoryLabStore,
};

fn lab(user_id: UserId, test_name: &str, days_ago: i64) -> LabResult {
    LabResult {
        id: LabResultId::new(),
        document_id: None,
        user_id,
        test_name: test_name.to_string(),
        test_code: None,
        value: Decimal::new(54, 1),
        unit: "mmol/L".to_string(),
        reference_min: None,
        reference_max: None,
        status: None,
        recorded_at: Utc::now().date_naive() - Duration::days(days_ago),
    }
}

#[tokio::test]
async fn given_duplicate_owner_test_and_date_when_inserting_then_constraint_violation() {
    let store = InMemoryLabStore::new();
    let user = UserId::new();

    store.insert(&lab(user, "Glucose", 3)).await.unwrap();
    let second = store.insert(&lab(user, "Glucose", 3)).await;

    assert!(matches!(
        second,
        Err(RepositoryError::ConstraintViolation(_))
    ));
    assert_eq!(store.count().await, 1);
}

#[tokio::test]
async fn given_same_test_on_other_date_when_inserting_then_both_rows_persist() {
    let store = InMemoryLabStore::new();
    let user = UserId::new();

    store.insert(&lab(user, "Glucose", 3)).await.unwrap();
    store.insert(&lab(user, "Glucose", 4)).await.unwrap();

    assert_eq!(store.count().await, 2);
}

#[tokio::test]
async fn given_same_triple_for_other_user_when_inserting_then_no_conflict() {
    let store = InMemoryLabStore::new();

    store.insert(&lab(UserId::new(), "Glucose", 3)).await.unwrap();
    store.insert(&lab(UserId::new(), "Glucose", 3)).await.unwrap();

    assert_eq!(store.count().await, 2);
}

#[tokio::test]
async fn given_recent_query_when_listing_then_newest_results_come_first() {
    let store = InMemoryLabStore::new();
    let user = UserId::new();
    store.insert(&lab(user, "Glucose", 30)).await.unwrap();
    store.insert(&lab(user, "Glucose", 1)).await.unwrap();
    store.insert(&lab(user, "Glucose", 10)).await.unwrap();

    let results = store
        .list_recent(user, Utc::now().date_naive() - Duration::days(90), None, 50)
        .await
        .unwrap();

    let dates: Vec<_> = results.iter().map(|r| r.recorded_at).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
}

#[tokio::test]
async fn given_backdated_touch_when_bumping_session_then_activity_does_not_regress() {
    let store = InMemoryChatStore::new();
    let session = ChatSession::new(UserId::new(), None);
    store.create_session(&session).await.unwrap();

    let later = Utc::now() + Duration::seconds(10);
    store.touch_session(session.id, later).await.unwrap();
    store
        .touch_session(session.id, later - Duration::seconds(30))
        .await
        .unwrap();

    let stored = store.get_session(session.id).await.unwrap().unwrap();
    assert_eq!(stored.last_activity_at, later);
}

#[tokio::test]
async fn given_more_messages_than_limit_when_listing_then_keeps_most_recent_window_in_order() {
    let store = InMemoryChatStore::new();
    let session = ChatSession::new(UserId::new(), None);
    store.create_session(&session).await.unwrap();

    for i in 0..6 {
        store
            .append_message(&ChatMessage::new(
                session.id,
                MessageRole::User,
                format!("message {}", i),
            ))
            .await
            .unwrap();
    }

    let window = store.list_messages(session.id, 4).await.unwrap();

    assert_eq!(window.len(), 4);
    assert_eq!(window[0].content, "message 2");
    assert_eq!(window[3].content, "message 5");
}

#[tokio::test]
async fn given_legal_path_when_transitioning_document_then_all_steps_succeed() {
    let store = InMemoryDocumentStore::new();
    let document = Document::new(
        UserId::new(),
        "Panel".to_string(),
        DocumentType::LabReport,
        "/tmp/panel.pdf".to_string(),
        "application/pdf".to_string(),
        None,
    );
    let id = document.id;
    store.create(&document).await.unwrap();

    store
        .update_status(id, DocumentStatus::Parsing)
        .await
        .unwrap();
    store.mark_parsed(id, "text").await.unwrap();
    store
        .update_status(id, DocumentStatus::Extracting)
        .await
        .unwrap();
    store.mark_completed(id, json!({ "saved": 0 })).await.unwrap();

    let stored = store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.status, DocumentStatus::Completed);
    assert_eq!(stored.raw_text.as_deref(), Some("text"));
}

#[tokio::test]
async fn given_terminal_document_when_transitioning_then_store_rejects_the_update() {
    let store = InMemoryDocumentStore::new();
    let document = Document::new(
        UserId::new(),
        "Panel".to_string(),
        DocumentType::LabReport,
        "/tmp/panel.pdf".to_string(),
        "application/pdf".to_string(),
        None,
    );
    let id = document.id;
    store.create(&document).await.unwrap();
    store
        .update_status(id, DocumentStatus::Failed)
        .await
        .unwrap();

    let result = store.update_status(id, DocumentStatus::Parsing).await;

    assert!(matches!(result, Err(RepositoryError::QueryFailed(_))));
}

#[tokio::test]
async fn given_deleted_session_when_listing_messages_then_log_is_gone() {
    let store = InMemoryChatStore::new();
    let session = ChatSession::new(UserId::new(), None);
    store.create_session(&session).await.unwrap();
    store
        .append_message(&ChatMessage::new(
            session.id,
            MessageRole::User,
            "hello".to_string(),
        ))
        .await
        .unwrap();

    assert!(store.delete_session(session.id).await.unwrap());
    assert!(!store.delete_session(session.id).await.unwrap());
    assert!(store.list_messages(session.id, 50).await.unwrap().is_empty());
}
