//! Client-side validation
//!
//! Field-level validation gates that run before anything is sent to the
//! service. Failures are collected into a field → message map so a form can
//! show every problem at once.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::domain::llm_model::{LlmModel, parse_date};
use crate::domain::task::JsonMap;

/// Lowercase alphanumeric segments joined by single `.` or `-`
pub const MODEL_ID_PATTERN: &str = r"^[a-z0-9]+([.-][a-z0-9]+)*$";

static MODEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MODEL_ID_PATTERN).expect("model id pattern is valid"));

/// Field-level validation failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`; the first message per field wins
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(value)` when no error was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.errors {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_valid_model_id(model_id: &str) -> bool {
    MODEL_ID_RE.is_match(model_id)
}

/// Validate an LLM model record before create or update
pub fn validate_llm_model(model: &LlmModel) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let required = [
        ("family", &model.family),
        ("name", &model.name),
        ("model_id", &model.model_id),
        ("version", &model.version),
        ("description", &model.description),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.add(field, format!("{} is required", field));
        }
    }
    if model.knowledge_cutoff_date.is_none() {
        errors.add("knowledge_cutoff_date", "knowledge_cutoff_date is required");
    }

    if !model.model_id.trim().is_empty() && !is_valid_model_id(&model.model_id) {
        errors.add(
            "model_id",
            "model_id must be lowercase letters and digits separated by '.' or '-'",
        );
    }

    for (vendor, window) in &model.lifecycle {
        let field = format!("lifecycle.{}", vendor);
        match (window.available_date, window.sunset_date) {
            (Some(available), Some(sunset)) if sunset <= available => {
                errors.add(field, "sunset_date must be after available_date");
            }
            (Some(_), None) | (None, Some(_)) => {
                errors.add(field, "available_date and sunset_date are required together");
            }
            _ => {}
        }
    }

    for (i, pt) in model.provisioned_throughput.iter().enumerate() {
        if pt.region.trim().is_empty() {
            errors.add(
                format!("provisioned_throughput[{}].region", i),
                "region is required",
            );
        }
        if pt.gsu == 0 {
            errors.add(
                format!("provisioned_throughput[{}].gsu", i),
                "gsu must be greater than 0",
            );
        }
    }

    for (class, rate) in &model.burndown_rates {
        if !rate.is_finite() || *rate <= 0.0 {
            errors.add(
                format!("burndown_rates.{}", class),
                "burndown rate must be a positive number",
            );
        }
    }

    errors.into_result(())
}

/// Decode and validate an LLM model record from raw JSON, as read from a
/// form or a file
///
/// Blank dates count as missing. A date that is not `YYYY-MM-DD` is reported
/// against its field rather than failing the whole decode, alongside every
/// other validation error.
pub fn parse_llm_model(mut value: Value) -> Result<LlmModel, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Some(record) = value.as_object_mut() {
        clear_bad_date(record, "knowledge_cutoff_date", "knowledge_cutoff_date", &mut errors);

        if let Some(Value::Object(lifecycle)) = record.get_mut("lifecycle") {
            for (vendor, window) in lifecycle.iter_mut() {
                if let Some(window) = window.as_object_mut() {
                    let field = format!("lifecycle.{}", vendor);
                    clear_bad_date(window, "available_date", &field, &mut errors);
                    clear_bad_date(window, "sunset_date", &field, &mut errors);
                }
            }
        }
    }

    let model: LlmModel = match serde_json::from_value(value) {
        Ok(model) => model,
        Err(e) => {
            errors.add("record", format!("not a valid model record: {}", e));
            return Err(errors);
        }
    };

    if let Err(more) = validate_llm_model(&model) {
        for (field, message) in more.iter() {
            errors.add(field, message);
        }
    }

    errors.into_result(model)
}

/// Null out `key` when it holds something other than a `YYYY-MM-DD` date
fn clear_bad_date(record: &mut JsonMap, key: &str, field: &str, errors: &mut ValidationErrors) {
    let malformed = match record.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty() && parse_date(text).is_err(),
        Some(_) => true,
    };

    if malformed {
        errors.add(field, format!("{} must be a date (YYYY-MM-DD)", key));
        record.insert(key.to_string(), Value::Null);
    }
}
