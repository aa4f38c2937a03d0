//! LLM model reference records
//!
//! Registration data for the models prompt tasks may target: identity,
//! support profile, burndown-rate factors, per-vendor lifecycle windows and
//! provisioned throughput per region.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::BTreeMap;

use super::task::JsonMap;

/// Calendar-date format used by every date field of a model record
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date, ignoring surrounding whitespace
pub fn parse_date(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
}

/// Absent, null and blank dates all decode to `None`
fn optional_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(text) if !text.trim().is_empty() => parse_date(&text)
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid date `{}`: {}", text, e))),
        _ => Ok(None),
    }
}

/// A registered LLM model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub name: String,
    /// Lowercase dotted/dashed identifier, e.g. `gemini-2.5-flash-lite`
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub knowledge_cutoff_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_profile: Option<SupportProfile>,
    /// Quota burndown multiplier per token class (`input`, `output`, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub burndown_rates: BTreeMap<String, f64>,
    /// Lifecycle window per vendor
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lifecycle: BTreeMap<String, LifecycleWindow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provisioned_throughput: Vec<ProvisionedThroughput>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// What a model supports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportProfile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_modalities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_streaming: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_function_calling: Option<bool>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Availability window offered by one vendor
///
/// Both dates are set together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifecycleWindow {
    #[serde(default, deserialize_with = "optional_date")]
    pub available_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub sunset_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl LifecycleWindow {
    pub fn new(available_date: Option<NaiveDate>, sunset_date: Option<NaiveDate>) -> Self {
        Self {
            available_date,
            sunset_date,
            extra: JsonMap::new(),
        }
    }

    /// Whether the model is available from this vendor on `date`
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        match (self.available_date, self.sunset_date) {
            (Some(from), Some(until)) => from <= date && date < until,
            _ => false,
        }
    }
}

/// Provisioned throughput purchased in one region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvisionedThroughput {
    pub region: String,
    /// Capacity in GSUs
    pub gsu: u32,
    #[serde(flatten)]
    pub extra: JsonMap,
}
