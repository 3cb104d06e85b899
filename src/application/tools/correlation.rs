use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};

use crate::application::ports::{
    LabResultRepository, RepositoryError, SymptomRepository, WearableRepository,
};
use crate::domain::UserId;

const MIN_OVERLAPPING_DAYS: usize = 3;

/// Metrics whose daily value is a total rather than a mean.
const SUM_METRICS: &[&str] = &[
    "steps",
    "active_energy_burned",
    "basal_energy_burned",
    "distance_walking_running",
];

pub async fn correlate_metrics(
    labs: &dyn LabResultRepository,
    symptoms: &dyn SymptomRepository,
    wearables: &dyn WearableRepository,
    user_id: UserId,
    metric_a: &str,
    metric_b: &str,
    days: i64,
) -> Result<Value, RepositoryError> {
    let values_a = metric_daily_values(labs, symptoms, wearables, user_id, metric_a, days).await?;
    let values_b = metric_daily_values(labs, symptoms, wearables, user_id, metric_b, days).await?;

    if values_a.is_empty() || values_b.is_empty() {
        return Ok(json!({
            "user_id": user_id.as_uuid().to_string(),
            "metric_a": metric_a,
            "metric_b": metric_b,
            "period_days": days,
            "error": "Insufficient data for one or both metrics.",
            "data_a_count": values_a.len(),
            "data_b_count": values_b.len(),
        }));
    }

    let common_dates: Vec<NaiveDate> = values_a
        .keys()
        .filter(|d| values_b.contains_key(*d))
        .copied()
        .collect();

    if common_dates.len() < MIN_OVERLAPPING_DAYS {
        return Ok(json!({
            "user_id": user_id.as_uuid().to_string(),
            "metric_a": metric_a,
            "metric_b": metric_b,
            "period_days": days,
            "overlapping_days": common_dates.len(),
            "message": "Not enough overlapping data points for meaningful correlation \
                        (need at least 3).",
        }));
    }

    let mut paired_data = Vec::new();
    let mut a_values = Vec::new();
    let mut b_values = Vec::new();
    for date in &common_dates {
        let a = values_a[date];
        let b = values_b[date];
        let mut pair = serde_json::Map::new();
        pair.insert("date".to_string(), json!(date.to_string()));
        pair.insert(metric_a.to_string(), json!(a));
        pair.insert(metric_b.to_string(), json!(b));
        paired_data.push(Value::Object(pair));
        a_values.push(a);
        b_values.push(b);
    }

    let (correlation, interpretation) = match pearson(&a_values, &b_values) {
        Some(r) => {
            let rounded = (r * 1000.0).round() / 1000.0;
            let label = if r.abs() >= 0.7 {
                if r > 0.0 { "strong positive" } else { "strong negative" }
            } else if r.abs() >= 0.4 {
                if r > 0.0 { "moderate positive" } else { "moderate negative" }
            } else if r.abs() >= 0.2 {
                if r > 0.0 { "weak positive" } else { "weak negative" }
            } else {
                "no significant correlation"
            };
            (json!(rounded), label)
        }
        None => (Value::Null, "insufficient variance"),
    };

    Ok(json!({
        "user_id": user_id.as_uuid().to_string(),
        "metric_a": metric_a,
        "metric_b": metric_b,
        "period_days": days,
        "overlapping_days": common_dates.len(),
        "correlation": correlation,
        "interpretation": interpretation,
        "paired_data": paired_data,
    }))
}

/// Population Pearson coefficient. None when either side has zero variance.
fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let cov = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / n;
    let std_a = (a.iter().map(|x| (x - mean_a).powi(2)).sum::<f64>() / n).sqrt();
    let std_b = (b.iter().map(|y| (y - mean_b).powi(2)).sum::<f64>() / n).sqrt();

    if std_a > 0.0 && std_b > 0.0 {
        Some(cov / (std_a * std_b))
    } else {
        None
    }
}

/// Daily values for one metric identifier. `symptom:` prefixes route to the
/// symptom log (mean severity per day), `lab:` to lab results (value per
/// recorded date), bare codes to the series catalog (sum or mean per day).
async fn metric_daily_values(
    labs: &dyn LabResultRepository,
    symptoms: &dyn SymptomRepository,
    wearables: &dyn WearableRepository,
    user_id: UserId,
    metric: &str,
    days: i64,
) -> Result<BTreeMap<NaiveDate, f64>, RepositoryError> {
    let cutoff_dt = Utc::now() - Duration::days(days);
    let cutoff_date = Utc::now().date_naive() - Duration::days(days);

    if let Some(symptom_type) = metric.strip_prefix("symptom:") {
        let entries = symptoms
            .list_since(user_id, cutoff_dt, Some(symptom_type), usize::MAX)
            .await?;
        let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        for e in entries {
            by_day
                .entry(e.recorded_at.date_naive())
                .or_default()
                .push(e.severity as f64);
        }
        return Ok(by_day
            .into_iter()
            .map(|(day, vals)| (day, vals.iter().sum::<f64>() / vals.len() as f64))
            .collect());
    }

    if let Some(test_name) = metric.strip_prefix("lab:") {
        let results = labs.list_for_test(user_id, test_name, cutoff_date).await?;
        return Ok(results
            .into_iter()
            .filter_map(|r| r.value.to_f64().map(|v| (r.recorded_at, v)))
            .collect());
    }

    let definitions = wearables.series_definitions().await?;
    if !definitions.iter().any(|d| d.code == metric) {
        return Ok(BTreeMap::new());
    }

    let samples = wearables.samples_since(user_id, metric, cutoff_dt).await?;
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for s in samples {
        by_day
            .entry(s.recorded_at.date_naive())
            .or_default()
            .push(s.value);
    }

    let sum_metric = SUM_METRICS.contains(&metric);
    Ok(by_day
        .into_iter()
        .map(|(day, vals)| {
            let value = if sum_metric {
                vals.iter().sum::<f64>()
            } else {
                vals.iter().sum::<f64>() / vals.len() as f64
            };
            (day, value)
        })
        .collect())
}
