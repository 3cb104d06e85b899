use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use meridian::application::tools::{ToolDispatcher, ToolExecutor};
use meridian::domain::{SymptomEntry, UserId};
use meridian::infrastructure::persistence::{InMemoryHealthDataStore, InMemoryLabStore};

async fn correlate(
    health_data: Arc<InMemoryHealthDataStore>,
    user: UserId,
    metric_a: &str,
    metric_b: &str,
) -> Value {
    let dispatcher = ToolDispatcher::new(
        Arc::new(InMemoryLabStore::new()),
        health_data.clone(),
        health_data,
        user,
    );
    let result = dispatcher
        .execute(
            "correlate_metrics",
            &json!({ "metric_a": metric_a, "metric_b": metric_b }),
        )
        .await;
    serde_json::from_str(&result).unwrap()
}

async fn seeded_store(user: UserId, pairs: &[(i64, f64, f64)]) -> Arc<InMemoryHealthDataStore> {
    let store = Arc::new(InMemoryHealthDataStore::new());
    store.add_series_definition("heart_rate", "bpm").await;
    store.add_series_definition("steps", "count").await;
    for (days_ago, heart_rate, steps) in pairs {
        let at = Utc::now() - Duration::days(*days_ago);
        store.add_sample(user, "heart_rate", *heart_rate, at).await;
        store.add_sample(user, "steps", *steps, at).await;
    }
    store
}

#[tokio::test]
async fn given_two_overlapping_days_when_correlating_then_reports_not_enough_data() {
    let user = UserId::new();
    let store = seeded_store(user, &[(1, 60.0, 8000.0), (2, 70.0, 9000.0)]).await;

    let result = correlate(store, user, "heart_rate", "steps").await;

    assert_eq!(result["overlapping_days"], 2);
    assert!(result["message"]
        .as_str()
        .unwrap()
        .contains("Not enough overlapping data points"));
    assert!(result.get("correlation").is_none());
}

#[tokio::test]
async fn given_perfectly_aligned_series_when_correlating_then_coefficient_is_one() {
    let user = UserId::new();
    let store = seeded_store(
        user,
        &[(1, 60.0, 6000.0), (2, 70.0, 7000.0), (3, 80.0, 8000.0)],
    )
    .await;

    let result = correlate(store, user, "heart_rate", "steps").await;

    assert_eq!(result["overlapping_days"], 3);
    assert_eq!(result["correlation"], 1.0);
    assert_eq!(result["interpretation"], "strong positive");
    assert_eq!(result["paired_data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn given_inverse_series_when_correlating_then_coefficient_is_negative() {
    let user = UserId::new();
    let store = seeded_store(
        user,
        &[(1, 80.0, 6000.0), (2, 70.0, 7000.0), (3, 60.0, 8000.0)],
    )
    .await;

    let result = correlate(store, user, "heart_rate", "steps").await;

    assert_eq!(result["correlation"], -1.0);
    assert_eq!(result["interpretation"], "strong negative");
}

#[tokio::test]
async fn given_constant_series_when_correlating_then_reports_insufficient_variance() {
    let user = UserId::new();
    let store = seeded_store(
        user,
        &[(1, 65.0, 6000.0), (2, 65.0, 7000.0), (3, 65.0, 8000.0)],
    )
    .await;

    let result = correlate(store, user, "heart_rate", "steps").await;

    assert_eq!(result["correlation"], Value::Null);
    assert_eq!(result["interpretation"], "insufficient variance");
}

#[tokio::test]
async fn given_symptom_prefix_when_correlating_then_pairs_against_daily_severity() {
    let user = UserId::new();
    let store = Arc::new(InMemoryHealthDataStore::new());
    store.add_series_definition("heart_rate", "bpm").await;
    for (days_ago, heart_rate, severity) in [(1i64, 60.0, 2), (2, 70.0, 5), (3, 80.0, 8)] {
        let at = Utc::now() - Duration::days(days_ago);
        store.add_sample(user, "heart_rate", heart_rate, at).await;
        store
            .add_symptom(SymptomEntry::new(user, "migraine".to_string(), severity, at))
            .await;
    }

    let result = correlate(store, user, "heart_rate", "symptom:migraine").await;

    assert_eq!(result["overlapping_days"], 3);
    assert_eq!(result["correlation"], 1.0);
}

#[tokio::test]
async fn given_missing_metric_when_correlating_then_reports_insufficient_data() {
    let user = UserId::new();
    let store = seeded_store(user, &[(1, 60.0, 6000.0), (2, 61.0, 6100.0), (3, 62.0, 6200.0)])
        .await;

    let result = correlate(store, user, "heart_rate", "blood_pressure").await;

    assert_eq!(
        result["error"],
        "Insufficient data for one or both metrics."
    );
    assert_eq!(result["data_b_count"], 0);
}

#[tokio::test]
async fn given_sum_metric_when_correlating_then_daily_value_is_the_total() {
    let user = UserId::new();
    let store = Arc::new(InMemoryHealthDataStore::new());
    store.add_series_definition("steps", "count").await;
    store.add_series_definition("heart_rate", "bpm").await;
    for days_ago in 1i64..=3 {
        let at = Utc::now() - Duration::days(days_ago);
        // Two step batches per day; daily series value must be their sum.
        store.add_sample(user, "steps", 1000.0 * days_ago as f64, at).await;
        store.add_sample(user, "steps", 500.0, at).await;
        store
            .add_sample(user, "heart_rate", 60.0 + days_ago as f64, at)
            .await;
    }

    let result = correlate(store, user, "steps", "heart_rate").await;

    let paired = result["paired_data"].as_array().unwrap();
    let steps_values: Vec<f64> = paired
        .iter()
        .map(|p| p["steps"].as_f64().unwrap())
        .collect();
    assert!(steps_values.contains(&1500.0));
    assert!(steps_values.contains(&2500.0));
    assert!(steps_values.contains(&3500.0));
}
