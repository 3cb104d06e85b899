use chrono::{DateTime, Utc};

use super::UserId;

/// Catalog entry for a continuously sampled device metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDefinition {
    pub code: String,
    pub unit: String,
}

/// One sample of a series metric (heart rate, steps, ...).
#[derive(Debug, Clone)]
pub struct SeriesSample {
    pub user_id: UserId,
    pub code: String,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

/// A discrete device-recorded occurrence: a night of sleep or a workout.
#[derive(Debug, Clone)]
pub struct HealthEvent {
    pub user_id: UserId,
    pub category: EventCategory,
    pub event_type: Option<String>,
    pub source_name: String,
    pub duration_seconds: Option<i64>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl HealthEvent {
    pub fn duration_minutes(&self) -> Option<i64> {
        self.duration_seconds.map(|s| s / 60)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Sleep,
    Workout,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Sleep => "sleep",
            EventCategory::Workout => "workout",
        }
    }
}
