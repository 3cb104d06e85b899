use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use meridian::application::ports::LabResultRepository;
use meridian::application::tools::{ToolDispatcher, ToolExecutor};
use meridian::domain::{
    EventCategory, HealthEvent, LabResult, LabResultId, LabStatus, SymptomEntry, UserId,
};
use meridian::infrastructure::persistence::{InMemoryHealthDataStore, InMemoryLabStore};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

struct Fixture {
    labs: Arc<InMemoryLabStore>,
    health_data: Arc<InMemoryHealthDataStore>,
    user: UserId,
}

impl Fixture {
    fn new() -> Self {
        Self {
            labs: Arc::new(InMemoryLabStore::new()),
            health_data: Arc::new(InMemoryHealthDataStore::new()),
            user: UserId::new(),
        }
    }

    fn dispatcher(&self) -> ToolDispatcher {
        ToolDispatcher::new(
            Arc::clone(&self.labs) as Arc<dyn LabResultRepository>,
            self.health_data.clone(),
            self.health_data.clone(),
            self.user,
        )
    }

    async fn execute(&self, name: &str, arguments: Value) -> Value {
        serde_json::from_str(&self.dispatcher().execute(name, &arguments).await).unwrap()
    }

    async fn insert_lab(
        &self,
        test_name: &str,
        value: &str,
        range: Option<(&str, &str)>,
        status: Option<LabStatus>,
        days_ago: i64,
    ) {
        self.labs
            .insert(&LabResult {
                id: LabResultId::new(),
                document_id: None,
                user_id: self.user,
                test_name: test_name.to_string(),
                test_code: None,
                value: dec(value),
                unit: "g/dL".to_string(),
                reference_min: range.map(|(min, _)| dec(min)),
                reference_max: range.map(|(_, max)| dec(max)),
                status,
                recorded_at: Utc::now().date_naive() - Duration::days(days_ago),
            })
            .await
            .unwrap();
    }
}

fn sleep_event(user: UserId, nights_ago: i64, minutes: i64) -> HealthEvent {
    let end = Utc::now() - Duration::days(nights_ago);
    HealthEvent {
        user_id: user,
        category: EventCategory::Sleep,
        event_type: None,
        source_name: "oura".to_string(),
        duration_seconds: Some(minutes * 60),
        start_at: end - Duration::minutes(minutes),
        end_at: end,
    }
}

#[tokio::test]
async fn given_boundary_value_with_drifted_status_when_listing_labs_then_reports_normal() {
    let fixture = Fixture::new();
    fixture
        .insert_lab(
            "Hemoglobin",
            "17.5",
            Some(("13.5", "17.5")),
            Some(LabStatus::High),
            3,
        )
        .await;

    let result = fixture.execute("get_recent_labs", json!({})).await;

    assert_eq!(result["count"], 1);
    assert_eq!(result["results"][0]["status"], "normal");
    assert_eq!(result["results"][0]["reference_max"], 17.5);
}

#[tokio::test]
async fn given_partial_name_filter_when_listing_labs_then_matches_case_insensitively() {
    let fixture = Fixture::new();
    fixture.insert_lab("Vitamin D", "32", None, None, 3).await;
    fixture.insert_lab("Ferritin", "80", None, None, 3).await;

    let result = fixture
        .execute("get_recent_labs", json!({ "test_name": "vitamin" }))
        .await;

    assert_eq!(result["count"], 1);
    assert_eq!(result["results"][0]["test_name"], "Vitamin D");
}

#[tokio::test]
async fn given_no_matching_results_when_requesting_trend_then_returns_explicit_message() {
    let fixture = Fixture::new();

    let result = fixture
        .execute("get_lab_trend", json!({ "test_name": "HbA1c" }))
        .await;

    assert_eq!(result["count"], 0);
    assert!(result["message"].as_str().unwrap().contains("HbA1c"));
}

#[tokio::test]
async fn given_rising_values_when_requesting_trend_then_statistics_say_increasing() {
    let fixture = Fixture::new();
    fixture
        .insert_lab("HbA1c", "5.1", Some(("4.0", "5.6")), None, 200)
        .await;
    fixture
        .insert_lab("HbA1c", "5.4", Some(("4.0", "5.6")), None, 100)
        .await;
    fixture
        .insert_lab("HbA1c", "5.9", Some(("4.0", "5.6")), None, 10)
        .await;

    let result = fixture
        .execute("get_lab_trend", json!({ "test_name": "HbA1c" }))
        .await;

    assert_eq!(result["count"], 3);
    assert_eq!(result["statistics"]["trend"], "increasing");
    assert_eq!(result["statistics"]["latest"], 5.9);
    assert_eq!(result["statistics"]["min"], 5.1);
    assert_eq!(result["data_points"][2]["status"], "high");
    assert_eq!(result["reference_range"]["min"], 4.0);
}

#[tokio::test]
async fn given_symptom_entries_when_requesting_timeline_then_frequency_is_aggregated() {
    let fixture = Fixture::new();
    for (days_ago, severity) in [(1i64, 6), (3, 8), (5, 4)] {
        fixture
            .health_data
            .add_symptom(SymptomEntry::new(
                fixture.user,
                "migraine".to_string(),
                severity,
                Utc::now() - Duration::days(days_ago),
            ))
            .await;
    }
    fixture
        .health_data
        .add_symptom(SymptomEntry::new(
            fixture.user,
            "fatigue".to_string(),
            3,
            Utc::now() - Duration::days(2),
        ))
        .await;

    let result = fixture.execute("get_symptom_timeline", json!({})).await;

    assert_eq!(result["count"], 4);
    assert_eq!(result["frequency"]["migraine"]["count"], 3);
    assert_eq!(result["frequency"]["migraine"]["avg_severity"], 6.0);
    assert_eq!(result["frequency"]["migraine"]["max_severity"], 8);
    assert_eq!(result["frequency"]["fatigue"]["count"], 1);
}

#[tokio::test]
async fn given_type_filter_when_requesting_timeline_then_other_types_are_excluded() {
    let fixture = Fixture::new();
    fixture
        .health_data
        .add_symptom(SymptomEntry::new(
            fixture.user,
            "migraine".to_string(),
            6,
            Utc::now() - Duration::days(1),
        ))
        .await;
    fixture
        .health_data
        .add_symptom(SymptomEntry::new(
            fixture.user,
            "fatigue".to_string(),
            3,
            Utc::now() - Duration::days(1),
        ))
        .await;

    let result = fixture
        .execute("get_symptom_timeline", json!({ "symptom_type": "migraine" }))
        .await;

    assert_eq!(result["count"], 1);
    assert_eq!(result["entries"][0]["symptom_type"], "migraine");
}

#[tokio::test]
async fn given_unknown_metric_when_requesting_wearable_summary_then_lists_available_codes() {
    let fixture = Fixture::new();
    fixture
        .health_data
        .add_series_definition("heart_rate", "bpm")
        .await;
    fixture
        .health_data
        .add_series_definition("steps", "count")
        .await;

    let result = fixture
        .execute("get_wearable_summary", json!({ "metric": "mood" }))
        .await;

    assert_eq!(result["error"], "Unknown metric 'mood'.");
    assert_eq!(result["available_metrics"], json!(["heart_rate", "steps"]));
}

#[tokio::test]
async fn given_metric_alias_when_requesting_wearable_summary_then_resolves_to_series_code() {
    let fixture = Fixture::new();
    fixture
        .health_data
        .add_series_definition("heart_rate", "bpm")
        .await;
    for hour in [1i64, 2, 3] {
        fixture
            .health_data
            .add_sample(
                fixture.user,
                "heart_rate",
                60.0 + hour as f64,
                Utc::now() - Duration::hours(hour),
            )
            .await;
    }

    let result = fixture
        .execute("get_wearable_summary", json!({ "metric": "hr" }))
        .await;

    assert_eq!(result["metric"], "heart_rate");
    assert_eq!(result["unit"], "bpm");
    assert_eq!(result["statistics"]["days_with_data"], 1);
}

#[tokio::test]
async fn given_sleep_pseudo_metric_when_requesting_summary_then_reports_nightly_durations() {
    let fixture = Fixture::new();
    fixture
        .health_data
        .add_event(sleep_event(fixture.user, 1, 420))
        .await;
    fixture
        .health_data
        .add_event(sleep_event(fixture.user, 2, 480))
        .await;

    let result = fixture
        .execute("get_wearable_summary", json!({ "metric": "sleep" }))
        .await;

    assert_eq!(result["metric"], "sleep");
    assert_eq!(result["count"], 2);
    assert_eq!(result["statistics"]["nights_tracked"], 2);
    assert_eq!(result["statistics"]["avg_duration_minutes"], 450);
    assert_eq!(result["statistics"]["min_duration_minutes"], 420);
    assert_eq!(result["statistics"]["max_duration_minutes"], 480);
}

#[tokio::test]
async fn given_workouts_when_requesting_summary_then_totals_and_types_are_reported() {
    let fixture = Fixture::new();
    for (days_ago, workout_type, minutes) in [(1i64, "running", 30), (2, "cycling", 45), (4, "running", 60)]
    {
        let start = Utc::now() - Duration::days(days_ago);
        fixture
            .health_data
            .add_event(HealthEvent {
                user_id: fixture.user,
                category: EventCategory::Workout,
                event_type: Some(workout_type.to_string()),
                source_name: "strava".to_string(),
                duration_seconds: Some(minutes * 60),
                start_at: start,
                end_at: start + Duration::minutes(minutes),
            })
            .await;
    }

    let result = fixture
        .execute("get_wearable_summary", json!({ "metric": "workouts" }))
        .await;

    assert_eq!(result["statistics"]["total_workouts"], 3);
    assert_eq!(result["statistics"]["total_duration_minutes"], 135);
    assert_eq!(result["statistics"]["by_type"]["running"], 2);
    assert_eq!(result["statistics"]["by_type"]["cycling"], 1);
}

#[tokio::test]
async fn given_data_across_domains_when_requesting_daily_summary_then_sections_are_combined() {
    let fixture = Fixture::new();
    let day = Utc.with_ymd_and_hms(2026, 7, 20, 0, 0, 0).unwrap();
    let date = day.date_naive();

    fixture
        .labs
        .insert(&LabResult {
            id: LabResultId::new(),
            document_id: None,
            user_id: fixture.user,
            test_name: "Glucose".to_string(),
            test_code: None,
            value: dec("5.4"),
            unit: "mmol/L".to_string(),
            reference_min: Some(dec("3.9")),
            reference_max: Some(dec("5.6")),
            status: None,
            recorded_at: date,
        })
        .await
        .unwrap();

    fixture
        .health_data
        .add_symptom(SymptomEntry::new(
            fixture.user,
            "headache".to_string(),
            4,
            day + Duration::hours(14),
        ))
        .await;

    fixture
        .health_data
        .add_series_definition("heart_rate", "bpm")
        .await;
    fixture
        .health_data
        .add_series_definition("steps", "count")
        .await;
    for hour in [8i64, 12, 18] {
        fixture
            .health_data
            .add_sample(fixture.user, "heart_rate", 60.0, day + Duration::hours(hour))
            .await;
        fixture
            .health_data
            .add_sample(fixture.user, "steps", 3000.0, day + Duration::hours(hour))
            .await;
    }

    fixture
        .health_data
        .add_event(HealthEvent {
            user_id: fixture.user,
            category: EventCategory::Sleep,
            event_type: None,
            source_name: "oura".to_string(),
            duration_seconds: Some(7 * 3600),
            start_at: day - Duration::hours(1),
            end_at: day + Duration::hours(6),
        })
        .await;

    let result = fixture
        .execute("get_daily_summary", json!({ "date": "2026-07-20" }))
        .await;

    assert_eq!(result["date"], "2026-07-20");
    assert_eq!(result["lab_results"][0]["test_name"], "Glucose");
    assert_eq!(result["lab_results"][0]["status"], "normal");
    assert_eq!(result["symptoms"][0]["type"], "headache");
    assert_eq!(result["sleep"][0]["duration_minutes"], 420);
    // Steps report a daily total, heart rate an average.
    assert_eq!(result["wearable_metrics"]["steps"]["total"], 9000.0);
    assert_eq!(result["wearable_metrics"]["heart_rate"]["avg"], 60.0);
    assert!(result.get("workouts").is_none());
}
