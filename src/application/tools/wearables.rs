use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::application::ports::{RepositoryError, WearableRepository};
use crate::domain::{EventCategory, UserId};

/// Common shorthand the model tends to use for series codes.
const METRIC_ALIASES: &[(&str, &str)] = &[
    ("hr", "heart_rate"),
    ("hrv", "heart_rate_variability_sdnn"),
    ("resting_hr", "resting_heart_rate"),
    ("spo2", "blood_oxygen_saturation"),
    ("energy", "active_energy_burned"),
    ("distance", "distance_walking_running"),
];

const MAX_LISTED_METRICS: usize = 30;

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub async fn wearable_summary(
    repo: &dyn WearableRepository,
    user_id: UserId,
    metric: &str,
    days: i64,
) -> Result<Value, RepositoryError> {
    let now = Utc::now();
    let cutoff = now - Duration::days(days);

    // Sleep and workouts are event-derived pseudo-metrics, not series.
    if metric == "sleep" {
        return sleep_summary(repo, user_id, cutoff, days).await;
    }
    if metric == "workouts" || metric == "workout" {
        return workout_summary(repo, user_id, cutoff, days).await;
    }

    let definitions = repo.series_definitions().await?;
    let resolved = definitions
        .iter()
        .find(|d| d.code == metric)
        .or_else(|| {
            METRIC_ALIASES
                .iter()
                .find(|(alias, _)| *alias == metric)
                .and_then(|(_, code)| definitions.iter().find(|d| d.code == *code))
        })
        .cloned();

    let Some(series) = resolved else {
        let available: Vec<&str> = definitions
            .iter()
            .take(MAX_LISTED_METRICS)
            .map(|d| d.code.as_str())
            .collect();
        return Ok(json!({
            "user_id": user_id.as_uuid().to_string(),
            "metric": metric,
            "error": format!("Unknown metric '{}'.", metric),
            "available_metrics": available,
        }));
    };

    let samples = repo.samples_since(user_id, &series.code, cutoff).await?;

    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for sample in &samples {
        by_day
            .entry(sample.recorded_at.date_naive())
            .or_default()
            .push(sample.value);
    }

    let mut daily_values = Vec::new();
    let mut day_averages = Vec::new();
    for (day, values) in by_day.iter().rev() {
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        daily_values.push(json!({
            "date": day.to_string(),
            "avg": round1(avg),
            "min": min,
            "max": max,
            "data_points": values.len(),
        }));
        day_averages.push(avg);
    }

    let statistics = if day_averages.is_empty() {
        json!({})
    } else {
        let overall_avg = day_averages.iter().sum::<f64>() / day_averages.len() as f64;
        let overall_min = day_averages.iter().cloned().fold(f64::INFINITY, f64::min);
        let overall_max = day_averages
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        json!({
            "overall_avg": round1(overall_avg),
            "overall_min": round1(overall_min),
            "overall_max": round1(overall_max),
            "days_with_data": day_averages.len(),
        })
    };

    Ok(json!({
        "user_id": user_id.as_uuid().to_string(),
        "metric": series.code,
        "unit": series.unit,
        "period_days": days,
        "count": daily_values.len(),
        "daily_values": daily_values,
        "statistics": statistics,
    }))
}

async fn sleep_summary(
    repo: &dyn WearableRepository,
    user_id: UserId,
    cutoff: chrono::DateTime<Utc>,
    days: i64,
) -> Result<Value, RepositoryError> {
    let events = repo
        .events_between(user_id, EventCategory::Sleep, cutoff, Utc::now())
        .await?;

    let mut records = Vec::new();
    let mut durations = Vec::new();
    for e in &events {
        let duration = e.duration_minutes();
        records.push(json!({
            "date": e.start_at.date_naive().to_string(),
            "start": e.start_at.to_rfc3339(),
            "end": e.end_at.to_rfc3339(),
            "duration_minutes": duration,
            "source": e.source_name,
        }));
        if let Some(d) = duration {
            durations.push(d);
        }
    }

    let statistics = if durations.is_empty() {
        json!({})
    } else {
        let avg = durations.iter().sum::<i64>() as f64 / durations.len() as f64;
        json!({
            "avg_duration_minutes": avg.round() as i64,
            "min_duration_minutes": durations.iter().min(),
            "max_duration_minutes": durations.iter().max(),
            "nights_tracked": durations.len(),
        })
    };

    Ok(json!({
        "user_id": user_id.as_uuid().to_string(),
        "metric": "sleep",
        "period_days": days,
        "count": records.len(),
        "records": records,
        "statistics": statistics,
    }))
}

async fn workout_summary(
    repo: &dyn WearableRepository,
    user_id: UserId,
    cutoff: chrono::DateTime<Utc>,
    days: i64,
) -> Result<Value, RepositoryError> {
    let events = repo
        .events_between(user_id, EventCategory::Workout, cutoff, Utc::now())
        .await?;

    let mut records = Vec::new();
    let mut total_duration = 0i64;
    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    for e in &events {
        let duration = e.duration_minutes();
        let workout_type = e.event_type.clone().unwrap_or_else(|| "unknown".to_string());
        *by_type.entry(workout_type.clone()).or_default() += 1;
        records.push(json!({
            "date": e.start_at.date_naive().to_string(),
            "type": workout_type,
            "duration_minutes": duration,
            "start": e.start_at.to_rfc3339(),
            "end": e.end_at.to_rfc3339(),
            "source": e.source_name,
        }));
        if let Some(d) = duration {
            total_duration += d;
        }
    }

    Ok(json!({
        "user_id": user_id.as_uuid().to_string(),
        "metric": "workouts",
        "period_days": days,
        "count": records.len(),
        "records": records,
        "statistics": {
            "total_workouts": records.len(),
            "total_duration_minutes": total_duration,
            "by_type": by_type,
        },
    }))
}
