use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use meridian::application::ports::LabResultRepository;
use meridian::application::tools::{ToolDispatcher, ToolExecutor};
use meridian::domain::{LabResult, LabResultId, UserId};
use meridian::infrastructure::persistence::{InMemoryHealthDataStore, InMemoryLabStore};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn lab(user_id: UserId, test_name: &str, value: &str, days_ago: i64) -> LabResult {
    LabResult {
        id: LabResultId::new(),
        document_id: None,
        user_id,
        test_name: test_name.to_string(),
        test_code: None,
        value: dec(value),
        unit: "mg/dL".to_string(),
        reference_min: None,
        reference_max: None,
        status: None,
        recorded_at: Utc::now().date_naive() - Duration::days(days_ago),
    }
}

async fn dispatcher_for(user_id: UserId, labs: Arc<InMemoryLabStore>) -> ToolDispatcher {
    let health_data = Arc::new(InMemoryHealthDataStore::new());
    ToolDispatcher::new(labs, health_data.clone(), health_data, user_id)
}

async fn execute(dispatcher: &ToolDispatcher, name: &str, arguments: Value) -> Value {
    serde_json::from_str(&dispatcher.execute(name, &arguments).await).unwrap()
}

#[tokio::test]
async fn given_unknown_tool_name_when_dispatching_then_returns_structured_error() {
    let dispatcher = dispatcher_for(UserId::new(), Arc::new(InMemoryLabStore::new())).await;

    let result = execute(&dispatcher, "drop_all_tables", json!({})).await;

    assert_eq!(result["error"], "Unknown tool: drop_all_tables");
}

#[tokio::test]
async fn given_missing_required_parameter_when_dispatching_then_returns_validation_error() {
    let dispatcher = dispatcher_for(UserId::new(), Arc::new(InMemoryLabStore::new())).await;

    let result = execute(&dispatcher, "get_lab_trend", json!({})).await;

    let error = result["error"].as_str().unwrap();
    assert!(error.contains("test_name"));
    assert!(error.contains("get_lab_trend"));
}

#[tokio::test]
async fn given_integer_as_string_when_dispatching_then_argument_is_coerced() {
    let labs = Arc::new(InMemoryLabStore::new());
    let user = UserId::new();
    labs.insert(&lab(user, "Glucose", "5.4", 10)).await.unwrap();
    let dispatcher = dispatcher_for(user, labs).await;

    let result = execute(&dispatcher, "get_recent_labs", json!({ "days": "30" })).await;

    assert_eq!(result["period_days"], 30);
    assert_eq!(result["count"], 1);
}

#[tokio::test]
async fn given_non_numeric_integer_argument_when_dispatching_then_returns_validation_error() {
    let dispatcher = dispatcher_for(UserId::new(), Arc::new(InMemoryLabStore::new())).await;

    let result = execute(&dispatcher, "get_recent_labs", json!({ "days": "soon" })).await;

    assert!(result["error"].as_str().unwrap().contains("days"));
}

#[tokio::test]
async fn given_undeclared_arguments_when_dispatching_then_they_are_dropped() {
    let labs = Arc::new(InMemoryLabStore::new());
    let user = UserId::new();
    labs.insert(&lab(user, "Glucose", "5.4", 10)).await.unwrap();
    let dispatcher = dispatcher_for(user, labs).await;

    let result = execute(
        &dispatcher,
        "get_recent_labs",
        json!({ "days": 30, "user_id": "someone-else", "limit": 99999 }),
    )
    .await;

    assert_eq!(result["count"], 1);
}

#[tokio::test]
async fn given_foreign_user_data_when_dispatching_then_results_stay_owner_scoped() {
    let labs = Arc::new(InMemoryLabStore::new());
    let owner = UserId::new();
    let other = UserId::new();
    labs.insert(&lab(owner, "Glucose", "5.4", 5)).await.unwrap();
    labs.insert(&lab(other, "Glucose", "9.9", 5)).await.unwrap();
    let dispatcher = dispatcher_for(owner, labs).await;

    let result = execute(&dispatcher, "get_recent_labs", json!({})).await;

    assert_eq!(result["count"], 1);
    assert_eq!(result["user_id"], owner.as_uuid().to_string());
    assert_eq!(result["results"][0]["value"], 5.4);
}

#[tokio::test]
async fn given_null_arguments_when_dispatching_then_defaults_apply() {
    let labs = Arc::new(InMemoryLabStore::new());
    let user = UserId::new();
    labs.insert(&lab(user, "Glucose", "5.4", 10)).await.unwrap();
    let dispatcher = dispatcher_for(user, labs).await;

    let result = execute(
        &dispatcher,
        "get_recent_labs",
        json!({ "days": null, "test_name": null }),
    )
    .await;

    assert_eq!(result["period_days"], 90);
    assert_eq!(result["count"], 1);
}

#[tokio::test]
async fn given_invalid_date_when_requesting_daily_summary_then_returns_error_payload() {
    let dispatcher = dispatcher_for(UserId::new(), Arc::new(InMemoryLabStore::new())).await;

    let result = execute(
        &dispatcher,
        "get_daily_summary",
        json!({ "date": "last tuesday" }),
    )
    .await;

    assert!(result["error"]
        .as_str()
        .unwrap()
        .contains("Invalid date format"));
}
