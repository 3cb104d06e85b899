use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::application::ports::{RepositoryError, SymptomRepository};
use crate::domain::UserId;

const TIMELINE_LIMIT: usize = 100;

pub async fn symptom_timeline(
    repo: &dyn SymptomRepository,
    user_id: UserId,
    symptom_type: Option<&str>,
    days: i64,
) -> Result<Value, RepositoryError> {
    let cutoff = Utc::now() - Duration::days(days);
    let results = repo
        .list_since(user_id, cutoff, symptom_type, TIMELINE_LIMIT)
        .await?;

    let entries: Vec<Value> = results
        .iter()
        .map(|s| {
            let mut entry = json!({
                "symptom_type": s.symptom_type,
                "severity": s.severity,
                "recorded_at": s.recorded_at.to_rfc3339(),
            });
            if let Some(notes) = &s.notes {
                entry["notes"] = json!(notes);
            }
            if let Some(triggers) = &s.triggers {
                entry["triggers"] = json!(triggers);
            }
            if let Some(duration) = s.duration_minutes {
                entry["duration_minutes"] = json!(duration);
            }
            entry
        })
        .collect();

    // Frequency statistics per symptom type.
    let mut type_severities: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
    for s in &results {
        type_severities
            .entry(s.symptom_type.as_str())
            .or_default()
            .push(s.severity);
    }

    let mut frequency = serde_json::Map::new();
    for (symptom_type, severities) in type_severities {
        let count = severities.len();
        let avg = severities.iter().sum::<i32>() as f64 / count as f64;
        let max = severities.iter().max().copied().unwrap_or(0);
        frequency.insert(
            symptom_type.to_string(),
            json!({
                "count": count,
                "avg_severity": (avg * 10.0).round() / 10.0,
                "max_severity": max,
            }),
        );
    }

    Ok(json!({
        "user_id": user_id.as_uuid().to_string(),
        "period_days": days,
        "count": entries.len(),
        "entries": entries,
        "frequency": Value::Object(frequency),
    }))
}
