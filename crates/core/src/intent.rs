//! Structured campaign intent types

use serde::{Deserialize, Serialize};

/// Customer behavior targeted by a campaign
///
/// Produced by the intent interpreter from a fixed vocabulary. Unknown
/// strings are preserved as `Unrecognized` rather than rejected: the query
/// builder simply contributes no behavior-specific predicate for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetBehavior {
    /// Cart recovery campaigns
    AbandonedCart,
    /// Win-back campaigns for high-churn-risk customers
    LapsedCustomer,
    /// Campaigns for highly engaged active users
    HighEngagement,
    /// Product recommendations to recent buyers
    CrossSell,
    /// Onboarding campaigns for recent signups
    NewCustomer,
    /// Customers at risk of not returning (30-90 days since purchase)
    Retention,
    /// Dormant customers with high churn probability
    Reactivation,
    /// Anything outside the fixed vocabulary
    Unrecognized(String),
}

impl TargetBehavior {
    /// Parse a behavior string, folding known aliases onto canonical variants
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "abandoned_cart" => Self::AbandonedCart,
            "lapsed_customer" => Self::LapsedCustomer,
            "high_engagement" | "active_customer" => Self::HighEngagement,
            "cross_sell" => Self::CrossSell,
            "new_customer" | "acquisition" => Self::NewCustomer,
            "retention" | "repeat_purchase" => Self::Retention,
            "reactivation" | "dormant" => Self::Reactivation,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Canonical snake_case name
    pub fn as_str(&self) -> &str {
        match self {
            Self::AbandonedCart => "abandoned_cart",
            Self::LapsedCustomer => "lapsed_customer",
            Self::HighEngagement => "high_engagement",
            Self::CrossSell => "cross_sell",
            Self::NewCustomer => "new_customer",
            Self::Retention => "retention",
            Self::Reactivation => "reactivation",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }

    /// Whether this behavior carries the abandoned-cart join and cart fields
    pub fn is_abandoned_cart(&self) -> bool {
        matches!(self, Self::AbandonedCart)
    }
}

impl From<String> for TargetBehavior {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TargetBehavior> for String {
    fn from(behavior: TargetBehavior) -> Self {
        behavior.as_str().to_string()
    }
}

impl std::fmt::Display for TargetBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Success metric for a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTarget {
    /// Metric kind, e.g. "conversion_rate_increase"
    #[serde(rename = "type")]
    pub kind: String,
    /// Target value as a decimal (0.20 for a 20% increase)
    pub value: f64,
}

impl MetricTarget {
    pub fn new(kind: impl Into<String>, value: f64) -> Self {
        Self {
            kind: kind.into(),
            value,
        }
    }
}

impl Default for MetricTarget {
    fn default() -> Self {
        Self::new("conversion_rate_increase", 0.1)
    }
}

/// Structured campaign intent
///
/// Immutable value object produced by the intent interpreter from a
/// natural-language objective. Every field has a documented default so a
/// partially parseable interpreter response still yields a usable intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignIntent {
    /// Primary goal (conversion, retention, acquisition, win_back, ...)
    pub campaign_goal: String,

    /// Targeted customer behavior
    pub target_behavior: TargetBehavior,

    /// Optional subgroup, inspected for cues like "high_value"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_subgroup: Option<String>,

    /// Success metric
    pub metric_target: MetricTarget,

    /// Optional duration-encoding string like "48_hours" or "7_days"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_constraint: Option<String>,

    /// Proposed trigger/offer type (discount, free_shipping, ...)
    pub proposed_intervention: String,

    /// Marketing psychology assumptions extracted from the objective
    #[serde(default)]
    pub underlying_assumptions: Vec<String>,
}

impl CampaignIntent {
    /// Create an intent with the required fields; the rest via builders
    pub fn new(
        campaign_goal: impl Into<String>,
        target_behavior: TargetBehavior,
        proposed_intervention: impl Into<String>,
    ) -> Self {
        Self {
            campaign_goal: campaign_goal.into(),
            target_behavior,
            target_subgroup: None,
            metric_target: MetricTarget::default(),
            time_constraint: None,
            proposed_intervention: proposed_intervention.into(),
            underlying_assumptions: Vec::new(),
        }
    }

    /// Set the target subgroup
    pub fn subgroup(mut self, subgroup: impl Into<String>) -> Self {
        self.target_subgroup = Some(subgroup.into());
        self
    }

    /// Set the metric target
    pub fn metric(mut self, kind: impl Into<String>, value: f64) -> Self {
        self.metric_target = MetricTarget::new(kind, value);
        self
    }

    /// Set the time constraint
    pub fn time_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.time_constraint = Some(constraint.into());
        self
    }

    /// Set the underlying assumptions
    pub fn assumptions(mut self, assumptions: Vec<String>) -> Self {
        self.underlying_assumptions = assumptions;
        self
    }

    /// Whether the subgroup carries a high-value cue (case-insensitive)
    pub fn targets_high_value(&self) -> bool {
        self.target_subgroup
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains("high_value"))
    }

    /// Whether this is a win-back campaign against lapsed customers
    pub fn is_win_back_lapsed(&self) -> bool {
        self.campaign_goal == "win_back" && self.target_behavior == TargetBehavior::LapsedCustomer
    }
}
