//! Model response repair and intent extraction
//!
//! Models asked for bare JSON still wrap it in code fences, leave trailing
//! commas, or annotate fields with comments. Repair handles those three
//! failure modes; anything beyond them (truncated output, prose instead of
//! JSON) is a hard [`InterpreterError::InvalidResponse`].
//!
//! Field extraction never fails: every intent field has a documented
//! default, and substitutions are logged rather than silently absorbed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use aether_core::{parse_metric_value, CampaignIntent, MetricTarget, TargetBehavior};

use crate::InterpreterError;

static TRAILING_COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[}\]])").unwrap());
static LINE_COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)//.*?$").unwrap());
static BLOCK_COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Strip code fences and repair the common JSON defects the model produces
/// despite instructions: trailing commas, line comments, block comments.
pub fn clean_model_payload(raw: &str) -> String {
    let mut content = raw.trim();

    if let Some(rest) = content.strip_prefix("```json") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    let content = content.trim();

    let content = TRAILING_COMMAS.replace_all(content, "$1");
    let content = LINE_COMMENTS.replace_all(&content, "");
    let content = BLOCK_COMMENTS.replace_all(&content, "");

    content.trim().to_string()
}

/// Parse a raw model response into a [`CampaignIntent`].
///
/// The payload is repaired first, then must parse as a JSON object. Missing
/// or mistyped fields degrade to defaults; a payload that is not JSON at
/// all is an error, not a default intent.
pub fn parse_intent(raw: &str) -> Result<CampaignIntent, InterpreterError> {
    let cleaned = clean_model_payload(raw);

    let value: Value = serde_json::from_str(&cleaned).map_err(|e| {
        InterpreterError::InvalidResponse(format!("model output is not valid JSON: {e}"))
    })?;
    let Some(fields) = value.as_object() else {
        return Err(InterpreterError::InvalidResponse(
            "model output is not a JSON object".to_string(),
        ));
    };

    Ok(intent_from_fields(fields))
}

/// Extract an intent from parsed response fields, defaulting per field.
///
/// Defaults mirror the documented contract: goal "conversion", behavior
/// "general" (unrecognized), metric "conversion_rate_increase" at 0.1,
/// intervention "discount", assumptions empty.
pub fn intent_from_fields(fields: &Map<String, Value>) -> CampaignIntent {
    let campaign_goal = string_field(fields, "campaign_goal", "conversion");
    let target_behavior = TargetBehavior::parse(&string_field(fields, "target_behavior", "general"));
    let target_subgroup = optional_string_field(fields, "target_subgroup");
    let time_constraint = optional_string_field(fields, "time_constraint");
    let proposed_intervention = string_field(fields, "proposed_intervention", "discount");

    let metric_fields = fields.get("metric_target").and_then(Value::as_object);
    let metric_kind = metric_fields
        .and_then(|m| m.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("conversion_rate_increase")
        .to_string();
    let metric_value = parse_metric_value(metric_fields.and_then(|m| m.get("value")));
    if let Some(reason) = metric_value.default_reason() {
        tracing::warn!(reason, "metric target value defaulted");
    }

    let underlying_assumptions = fields
        .get("underlying_assumptions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    CampaignIntent {
        campaign_goal,
        target_behavior,
        target_subgroup,
        metric_target: MetricTarget::new(metric_kind, metric_value.into_value()),
        time_constraint,
        proposed_intervention,
        underlying_assumptions,
    }
}

fn string_field(fields: &Map<String, Value>, key: &str, default: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn optional_string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}
