use serde_json::{json, Value};

/// A named, schema-described read-only data query callable by the model.
/// Immutable; the catalog is built once at process start.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

#[derive(Debug, Clone)]
pub struct ToolParameter {
    pub name: String,
    pub description: String,
    pub kind: ParameterKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Integer,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Integer => "integer",
        }
    }
}

impl ToolParameter {
    fn new(name: &str, kind: ParameterKind, required: bool, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            required,
        }
    }
}

impl ToolDefinition {
    /// Function-calling wire shape shared by both provider protocols.
    pub fn to_wire(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                json!({
                    "type": param.kind.as_str(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": Value::Object(properties),
                    "required": Value::Array(required),
                },
            },
        })
    }

}

/// The six health-data query tools.
pub fn health_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_recent_labs".to_string(),
            description: "Get recent lab test results for the user. Returns blood work, hormone \
                          levels, and other medical test results with values, units, and \
                          reference ranges. Use this when the user asks about their lab results, \
                          blood tests, or specific medical markers."
                .to_string(),
            parameters: vec![
                ToolParameter::new(
                    "days",
                    ParameterKind::Integer,
                    false,
                    "Number of days to look back. Default 90.",
                ),
                ToolParameter::new(
                    "test_name",
                    ParameterKind::String,
                    false,
                    "Optional: filter by test name (partial match, case-insensitive). Examples: \
                     'HbA1c', 'cholesterol', 'vitamin D', 'iron', 'TSH'.",
                ),
            ],
        },
        ToolDefinition {
            name: "get_lab_trend".to_string(),
            description: "Get the historical trend for a specific lab test over time. Shows how \
                          a test value has changed across multiple measurements. Useful for \
                          tracking progress or identifying trends in markers like HbA1c, \
                          cholesterol, vitamin D, etc."
                .to_string(),
            parameters: vec![
                ToolParameter::new(
                    "test_name",
                    ParameterKind::String,
                    true,
                    "The lab test name to track (partial match). Examples: 'HbA1c', 'LDL', \
                     'Vitamin D', 'Ferritin'.",
                ),
                ToolParameter::new(
                    "months",
                    ParameterKind::Integer,
                    false,
                    "Number of months to look back. Default 12.",
                ),
            ],
        },
        ToolDefinition {
            name: "get_symptom_timeline".to_string(),
            description: "Get symptom entries logged by the user over a time period. Shows when \
                          symptoms occurred, their severity (0-10), duration, triggers, and \
                          notes. Use when the user asks about their symptoms, headaches, \
                          migraines, pain, mood, energy, etc."
                .to_string(),
            parameters: vec![
                ToolParameter::new(
                    "symptom_type",
                    ParameterKind::String,
                    false,
                    "Optional: filter by symptom type (exact match). Common types: 'migraine', \
                     'headache', 'back_pain', 'fatigue', 'insomnia', 'nausea', 'joint_pain', \
                     'anxiety', 'brain_fog'. Omit to get all symptom types.",
                ),
                ToolParameter::new(
                    "days",
                    ParameterKind::Integer,
                    false,
                    "Number of days to look back. Default 30.",
                ),
            ],
        },
        ToolDefinition {
            name: "get_wearable_summary".to_string(),
            description: "Get wearable device data for a specific health metric. Returns daily \
                          aggregated values with statistics. Use for questions about heart \
                          rate, steps, sleep, workouts, HRV, weight, etc."
                .to_string(),
            parameters: vec![
                ToolParameter::new(
                    "metric",
                    ParameterKind::String,
                    true,
                    "The metric to retrieve. Options: 'heart_rate' (avg/min/max bpm), 'steps' \
                     (daily step count), 'sleep' (sleep duration and timing), 'workouts' \
                     (exercise sessions), 'resting_heart_rate' (daily resting HR), \
                     'heart_rate_variability_sdnn' (HRV), 'weight' (body weight), \
                     'active_energy_burned' (calories), 'blood_oxygen_saturation' (SpO2), \
                     'distance_walking_running' (distance in meters).",
                ),
                ToolParameter::new(
                    "days",
                    ParameterKind::Integer,
                    false,
                    "Number of days to look back. Default 30.",
                ),
            ],
        },
        ToolDefinition {
            name: "get_daily_summary".to_string(),
            description: "Get a combined summary of ALL health data for a specific date. \
                          Includes wearable metrics, lab results, symptoms, sleep, and workouts \
                          for that day. Use when the user asks about a specific day or wants an \
                          overview."
                .to_string(),
            parameters: vec![ToolParameter::new(
                "date",
                ParameterKind::String,
                true,
                "Date in YYYY-MM-DD format. Example: '2026-02-20'.",
            )],
        },
        ToolDefinition {
            name: "correlate_metrics".to_string(),
            description: "Find correlations between two health metrics over time. Calculates \
                          Pearson correlation coefficient and provides interpretation. Useful \
                          for finding patterns like 'does poor sleep correlate with more \
                          headaches?' or 'does exercise affect my HRV?'. Prefix symptom types \
                          with 'symptom:' (e.g., 'symptom:migraine') and lab tests with 'lab:' \
                          (e.g., 'lab:HbA1c'). Wearable metrics use their code directly (e.g., \
                          'heart_rate')."
                .to_string(),
            parameters: vec![
                ToolParameter::new(
                    "metric_a",
                    ParameterKind::String,
                    true,
                    "First metric. Examples: 'heart_rate', 'steps', 'symptom:migraine', \
                     'symptom:energy', 'lab:HbA1c'.",
                ),
                ToolParameter::new(
                    "metric_b",
                    ParameterKind::String,
                    true,
                    "Second metric. Same format as metric_a.",
                ),
                ToolParameter::new(
                    "days",
                    ParameterKind::Integer,
                    false,
                    "Number of days to look back. Default 90.",
                ),
            ],
        },
    ]
}
