use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};

use crate::application::ports::{
    LabResultRepository, RepositoryError, SymptomRepository, WearableRepository,
};
use crate::domain::{EventCategory, UserId};

/// Series aggregated into the daily overview. Steps and energy report a
/// total, the rest avg/min/max.
const KEY_METRICS: &[&str] = &["heart_rate", "steps", "active_energy_burned"];
const TOTALED_METRICS: &[&str] = &["steps", "active_energy_burned"];

pub async fn daily_summary(
    labs: &dyn LabResultRepository,
    symptoms: &dyn SymptomRepository,
    wearables: &dyn WearableRepository,
    user_id: UserId,
    target_date: &str,
) -> Result<Value, RepositoryError> {
    let Ok(date) = target_date.parse::<NaiveDate>() else {
        return Ok(json!({
            "error": format!("Invalid date format: {}. Use YYYY-MM-DD.", target_date),
        }));
    };

    let day_start = Utc
        .from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
    let day_end = day_start + Duration::days(1);

    let mut summary = serde_json::Map::new();
    summary.insert("user_id".to_string(), json!(user_id.as_uuid().to_string()));
    summary.insert("date".to_string(), json!(target_date));

    let lab_results = labs.list_on(user_id, date).await?;
    if !lab_results.is_empty() {
        let entries: Vec<Value> = lab_results
            .iter()
            .map(|r| {
                json!({
                    "test_name": r.test_name,
                    "value": r.value.to_f64(),
                    "unit": r.unit,
                    "status": r.effective_status().map(|s| s.as_str()),
                })
            })
            .collect();
        summary.insert("lab_results".to_string(), json!(entries));
    }

    let symptom_entries = symptoms.list_between(user_id, day_start, day_end).await?;
    if !symptom_entries.is_empty() {
        let entries: Vec<Value> = symptom_entries
            .iter()
            .map(|s| {
                json!({
                    "type": s.symptom_type,
                    "severity": s.severity,
                    "notes": s.notes,
                })
            })
            .collect();
        summary.insert("symptoms".to_string(), json!(entries));
    }

    // Sleep is attributed to the day it ended, workouts to the day they
    // started.
    let sleep = wearables
        .events_between(user_id, EventCategory::Sleep, day_start, day_end)
        .await?;
    let sleep: Vec<Value> = sleep
        .iter()
        .filter(|e| e.end_at >= day_start && e.end_at < day_end)
        .map(|e| {
            json!({
                "duration_minutes": e.duration_minutes(),
                "start": e.start_at.to_rfc3339(),
                "end": e.end_at.to_rfc3339(),
            })
        })
        .collect();
    if !sleep.is_empty() {
        summary.insert("sleep".to_string(), json!(sleep));
    }

    let workouts = wearables
        .events_between(user_id, EventCategory::Workout, day_start, day_end)
        .await?;
    let workouts: Vec<Value> = workouts
        .iter()
        .filter(|e| e.start_at >= day_start && e.start_at < day_end)
        .map(|e| {
            json!({
                "type": e.event_type.clone().unwrap_or_else(|| "unknown".to_string()),
                "duration_minutes": e.duration_minutes(),
                "start": e.start_at.to_rfc3339(),
            })
        })
        .collect();
    if !workouts.is_empty() {
        summary.insert("workouts".to_string(), json!(workouts));
    }

    let definitions = wearables.series_definitions().await?;
    let mut metrics = serde_json::Map::new();
    for code in KEY_METRICS {
        let Some(series) = definitions.iter().find(|d| d.code == *code) else {
            continue;
        };
        let samples = wearables
            .samples_between(user_id, code, day_start, day_end)
            .await?;
        if samples.is_empty() {
            continue;
        }
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let mut metric = serde_json::Map::new();
        metric.insert("unit".to_string(), json!(series.unit));
        metric.insert("data_points".to_string(), json!(values.len()));
        if TOTALED_METRICS.contains(code) {
            metric.insert("total".to_string(), json!(values.iter().sum::<f64>()));
        } else {
            let avg = values.iter().sum::<f64>() / values.len() as f64;
            metric.insert("avg".to_string(), json!((avg * 10.0).round() / 10.0));
            metric.insert(
                "min".to_string(),
                json!(values.iter().cloned().fold(f64::INFINITY, f64::min)),
            );
            metric.insert(
                "max".to_string(),
                json!(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
            );
        }
        metrics.insert(code.to_string(), Value::Object(metric));
    }
    if !metrics.is_empty() {
        summary.insert("wearable_metrics".to_string(), Value::Object(metrics));
    }

    Ok(Value::Object(summary))
}
