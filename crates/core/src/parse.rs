//! Fallible parsing with tagged defaults
//!
//! Interpreter output is never trusted field-by-field: each parse either
//! yields the value or an explicit default plus the reason, so the caller
//! decides whether to log or reject instead of the default being buried.

use chrono::Duration;
use serde_json::Value;

/// Default metric value when a target cannot be parsed
pub const DEFAULT_METRIC_VALUE: f64 = 0.1;

/// Default time window when a constraint cannot be parsed
pub const DEFAULT_TIME_WINDOW_DAYS: i64 = 7;

/// Outcome of a parse that degrades instead of failing
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// The input parsed cleanly
    Value(T),
    /// The input was unusable; a documented default was substituted
    Defaulted { value: T, reason: String },
}

impl<T> Parsed<T> {
    pub fn defaulted(value: T, reason: impl Into<String>) -> Self {
        Self::Defaulted {
            value,
            reason: reason.into(),
        }
    }

    /// The parsed or substituted value
    pub fn value(&self) -> &T {
        match self {
            Self::Value(v) => v,
            Self::Defaulted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Value(v) => v,
            Self::Defaulted { value, .. } => value,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }

    /// Why the default was substituted, when it was
    pub fn default_reason(&self) -> Option<&str> {
        match self {
            Self::Value(_) => None,
            Self::Defaulted { reason, .. } => Some(reason),
        }
    }
}

/// Parse a metric target value from raw interpreter JSON
///
/// Numbers pass through; strings handle percentage forms ("20%",
/// "20 percent") and plain decimals; anything else degrades to
/// [`DEFAULT_METRIC_VALUE`]. The result is always finite and non-negative.
pub fn parse_metric_value(raw: Option<&Value>) -> Parsed<f64> {
    let Some(value) = raw else {
        return Parsed::defaulted(DEFAULT_METRIC_VALUE, "metric value missing");
    };

    match value {
        Value::Null => Parsed::defaulted(DEFAULT_METRIC_VALUE, "metric value was null"),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 => Parsed::Value(v),
            _ => Parsed::defaulted(
                DEFAULT_METRIC_VALUE,
                format!("metric value {n} outside [0, inf)"),
            ),
        },
        Value::String(s) => parse_metric_string(s),
        other => Parsed::defaulted(
            DEFAULT_METRIC_VALUE,
            format!("unsupported metric value type: {other}"),
        ),
    }
}

fn parse_metric_string(raw: &str) -> Parsed<f64> {
    let cleaned = raw.trim().to_lowercase();
    let is_percentage = cleaned.contains('%') || cleaned.contains("percent");
    let body = if is_percentage {
        cleaned.replace('%', "").replace("percent", "")
    } else {
        cleaned
    };

    match body.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => {
            Parsed::Value(if is_percentage { v / 100.0 } else { v })
        }
        _ => Parsed::defaulted(
            DEFAULT_METRIC_VALUE,
            format!("could not parse metric value '{raw}'"),
        ),
    }
}

/// Parse a duration-encoding constraint like "48_hours" or "2_weeks"
///
/// Trailing qualifiers are ignored ("48_hours_post_abandonment" reads as
/// 48 hours). Unparseable input degrades to 7 days.
pub fn parse_time_constraint(constraint: &str) -> Parsed<Duration> {
    let default = Duration::days(DEFAULT_TIME_WINDOW_DAYS);
    let lowered = constraint.trim().to_lowercase();
    let mut parts = lowered.split('_');

    let (Some(amount), Some(unit)) = (parts.next(), parts.next()) else {
        return Parsed::defaulted(
            default,
            format!("time constraint '{constraint}' has no unit"),
        );
    };

    let Ok(value) = amount.parse::<i64>() else {
        return Parsed::defaulted(
            default,
            format!("time constraint '{constraint}' has no numeric amount"),
        );
    };

    if unit.contains("hour") {
        Parsed::Value(Duration::hours(value))
    } else if unit.contains("day") {
        Parsed::Value(Duration::days(value))
    } else if unit.contains("week") {
        Parsed::Value(Duration::weeks(value))
    } else if unit.contains("month") {
        Parsed::Value(Duration::days(value * 30))
    } else {
        Parsed::defaulted(
            default,
            format!("unknown time unit '{unit}' in '{constraint}'"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metric_value_numbers_pass_through() {
        let v = json!(0.2);
        assert_eq!(parse_metric_value(Some(&v)), Parsed::Value(0.2));
    }

    #[test]
    fn test_metric_value_percentage_strings() {
        let v = json!("20%");
        assert_eq!(parse_metric_value(Some(&v)), Parsed::Value(0.2));

        let v = json!("20 percent");
        assert_eq!(parse_metric_value(Some(&v)), Parsed::Value(0.2));

        let v = json!("0.2");
        assert_eq!(parse_metric_value(Some(&v)), Parsed::Value(0.2));
    }

    #[test]
    fn test_metric_value_defaults_with_reason() {
        let v = json!("abc");
        let parsed = parse_metric_value(Some(&v));
        assert!(parsed.is_defaulted());
        assert_eq!(*parsed.value(), DEFAULT_METRIC_VALUE);
        assert!(parsed.default_reason().unwrap().contains("abc"));

        let parsed = parse_metric_value(None);
        assert_eq!(*parsed.value(), DEFAULT_METRIC_VALUE);

        let v = json!(null);
        assert!(parse_metric_value(Some(&v)).is_defaulted());

        let v = json!(-0.5);
        assert!(parse_metric_value(Some(&v)).is_defaulted());
    }

    #[test]
    fn test_time_constraint_units() {
        assert_eq!(
            parse_time_constraint("48_hours").into_value(),
            Duration::hours(48)
        );
        assert_eq!(
            parse_time_constraint("7_days").into_value(),
            Duration::days(7)
        );
        assert_eq!(
            parse_time_constraint("2_weeks").into_value(),
            Duration::weeks(2)
        );
        assert_eq!(
            parse_time_constraint("48_hours_post_abandonment").into_value(),
            Duration::hours(48)
        );
    }

    #[test]
    fn test_time_constraint_defaults_to_a_week() {
        let parsed = parse_time_constraint("soon");
        assert!(parsed.is_defaulted());
        assert_eq!(parsed.into_value(), Duration::days(7));

        let parsed = parse_time_constraint("two_weeks");
        assert!(parsed.is_defaulted());
        assert_eq!(parsed.into_value(), Duration::days(7));
    }
}
