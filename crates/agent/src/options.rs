use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// Options as the host hands them over: every value is a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentOptions {
    pub min_value: String,
    pub propagate_training_events: String,
    pub expected_update_period_in_days: String,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            min_value: "0.5".into(),
            propagate_training_events: "true".into(),
            expected_update_period_in_days: "7".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedOptions {
    pub min_value: f64,
    pub propagate_training_events: bool,
    pub expected_update_period: Option<Duration>,
}

impl ResolvedOptions {
    /// `min_value == 1` selects only the single best category.
    pub fn wants_max_class(&self) -> bool {
        self.min_value == 1.0
    }
}

impl AgentOptions {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.expected_update_period_in_days.trim().is_empty() {
            errors.push("expected_update_period_in_days must be present".to_string());
        }
        match parse_min_value(&self.min_value) {
            Some(value) if value > 0.0 && value <= 1.0 => {}
            _ => errors.push(
                "minimum value must be greater than 0 and less than or equal to 1, e.g. 0.5"
                    .to_string(),
            ),
        }
        errors
    }

    pub fn resolve(&self) -> Result<ResolvedOptions, AgentError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(AgentError::InvalidOptions(errors));
        }
        Ok(ResolvedOptions {
            min_value: parse_min_value(&self.min_value).unwrap_or(0.5),
            propagate_training_events: self
                .propagate_training_events
                .trim()
                .eq_ignore_ascii_case("true"),
            expected_update_period: self
                .expected_update_period_in_days
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(Duration::try_days),
        })
    }
}

fn parse_min_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}
