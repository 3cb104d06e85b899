use chrono::{Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::application::ports::{LabResultRepository, RepositoryError};
use crate::domain::UserId;

const RECENT_LABS_LIMIT: usize = 50;

fn dec_to_f64(value: Option<Decimal>) -> Value {
    match value.and_then(|d| d.to_f64()) {
        Some(f) => json!(f),
        None => Value::Null,
    }
}

pub async fn recent_labs(
    repo: &dyn LabResultRepository,
    user_id: UserId,
    days: i64,
    test_name: Option<&str>,
) -> Result<Value, RepositoryError> {
    let cutoff = Utc::now().date_naive() - Duration::days(days);
    let results = repo
        .list_recent(user_id, cutoff, test_name, RECENT_LABS_LIMIT)
        .await?;

    let records: Vec<Value> = results
        .iter()
        .map(|r| {
            let mut record = json!({
                "test_name": r.test_name,
                "value": dec_to_f64(Some(r.value)),
                "unit": r.unit,
                "recorded_at": r.recorded_at.to_string(),
                "status": r.effective_status().map(|s| s.as_str()),
                "reference_min": dec_to_f64(r.reference_min),
                "reference_max": dec_to_f64(r.reference_max),
            });
            if let Some(code) = &r.test_code {
                record["test_code"] = json!(code);
            }
            record
        })
        .collect();

    Ok(json!({
        "user_id": user_id.as_uuid().to_string(),
        "period_days": days,
        "count": records.len(),
        "results": records,
    }))
}

pub async fn lab_trend(
    repo: &dyn LabResultRepository,
    user_id: UserId,
    test_name: &str,
    months: i64,
) -> Result<Value, RepositoryError> {
    let cutoff = Utc::now().date_naive() - Duration::days(months * 30);
    let results = repo.list_for_test(user_id, test_name, cutoff).await?;

    if results.is_empty() {
        return Ok(json!({
            "user_id": user_id.as_uuid().to_string(),
            "test_name": test_name,
            "period_months": months,
            "count": 0,
            "data_points": [],
            "message": format!(
                "No results found for '{}' in the last {} months.",
                test_name, months
            ),
        }));
    }

    // First result's reference range is the baseline for the whole trend.
    let first = &results[0];
    let reference_range = json!({
        "min": dec_to_f64(first.reference_min),
        "max": dec_to_f64(first.reference_max),
    });
    let unit = first.unit.clone();
    let actual_test_name = first.test_name.clone();

    let data_points: Vec<Value> = results
        .iter()
        .map(|r| {
            json!({
                "date": r.recorded_at.to_string(),
                "value": dec_to_f64(Some(r.value)),
                "status": r.effective_status().map(|s| s.as_str()),
            })
        })
        .collect();

    let values: Vec<f64> = results.iter().filter_map(|r| r.value.to_f64()).collect();
    let statistics = if values.is_empty() {
        json!({})
    } else {
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let latest = values[values.len() - 1];
        let trend = if values.len() >= 2 && latest > values[0] {
            "increasing"
        } else if values.len() >= 2 && latest < values[0] {
            "decreasing"
        } else {
            "stable"
        };
        json!({
            "min": min,
            "max": max,
            "avg": (avg * 100.0).round() / 100.0,
            "latest": latest,
            "trend": trend,
        })
    };

    Ok(json!({
        "user_id": user_id.as_uuid().to_string(),
        "test_name": actual_test_name,
        "unit": unit,
        "period_months": months,
        "count": data_points.len(),
        "reference_range": reference_range,
        "data_points": data_points,
        "statistics": statistics,
    }))
}
