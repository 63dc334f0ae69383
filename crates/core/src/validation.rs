//! Validation of lesson generation parameters.
//!
//! Front-ends call [`validate_config`] before sending a request and show the
//! issues inline; the service rejects invalid requests with the same list.

use ck_protocol::{ContentType, GenerationConfig};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Checks a lesson request. An empty list means the request is valid.
pub fn validate_config(config: &GenerationConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if config.topic.trim().is_empty() {
        issues.push(ValidationIssue::new("topic", "Topic is required"));
    }
    if config.audience.trim().is_empty() {
        issues.push(ValidationIssue::new("audience", "Audience is required"));
    }
    if config.content_types.is_empty() {
        issues.push(ValidationIssue::new(
            "content_types",
            "Select at least one content type",
        ));
    }
    if config.content_types.contains(&ContentType::Quiz) && config.quiz_types.is_empty() {
        issues.push(ValidationIssue::new(
            "quiz_types",
            "Choose at least one question type for the quiz",
        ));
    }
    if config
        .content_types
        .iter()
        .any(|c| matches!(c, ContentType::Custom(name) if name.trim().is_empty()))
    {
        issues.push(ValidationIssue::new(
            "content_types",
            "Custom content types need a name",
        ));
    }
    if let Some(position) = config
        .learning_objectives
        .iter()
        .position(|o| o.trim().is_empty())
    {
        issues.push(ValidationIssue::new(
            "learning_objectives",
            format!("Objective {} is empty", position + 1),
        ));
    }
    if !config.duration.trim().is_empty() && parse_duration_minutes(&config.duration).is_none() {
        issues.push(ValidationIssue::new(
            "duration",
            format!("Cannot read '{}' as a duration in minutes", config.duration),
        ));
    }

    issues
}

/// Checks a quick-action request. The action decides the content types, so
/// only the lesson fields are checked.
pub fn validate_quick_action(config: &GenerationConfig) -> Vec<ValidationIssue> {
    validate_config(config)
        .into_iter()
        .filter(|issue| !matches!(issue.field, "content_types" | "quiz_types"))
        .collect()
}

/// Joins issues into one line for status messages.
pub fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parses lesson durations such as `"50"`, `"45 minutes"`, `"90m"`,
/// `"1 hour"` or `"1.5h"` into whole minutes.
pub fn parse_duration_minutes(input: &str) -> Option<u32> {
    let text = input.trim().to_ascii_lowercase();
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number.parse().ok()?;

    let minutes = match unit.trim() {
        "" | "m" | "min" | "mins" | "minute" | "minutes" => value,
        "h" | "hr" | "hrs" | "hour" | "hours" => value * 60.0,
        _ => return None,
    };
    if !minutes.is_finite() || minutes <= 0.0 || minutes > f64::from(u32::MAX) {
        return None;
    }
    Some(minutes.round() as u32)
}
