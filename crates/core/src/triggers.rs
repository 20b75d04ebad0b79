//! Marketing trigger types and ranking output

use serde::{Deserialize, Serialize};

/// Category a trigger belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    /// Monetary incentives (discounts, free shipping, cashback)
    ValueDriven,
    /// Persuasion mechanics (scarcity, exclusivity, social proof)
    Psychological,
    /// Content and education driven
    Informational,
}

impl TriggerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueDriven => "value_driven",
            Self::Psychological => "psychological",
            Self::Informational => "informational",
        }
    }
}

impl std::fmt::Display for TriggerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ranked trigger recommendation
///
/// Computed fresh per analysis, ranked by `predicted_uplift`, never mutated
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRecommendation {
    pub trigger_type: TriggerCategory,
    /// Display name, e.g. "Personalized Discount Offer"
    pub trigger_name: String,
    /// Fraction of the cohort scoring above the high-performer threshold
    pub confidence_score: f64,
    /// Mean uplift score across the cohort
    pub predicted_uplift: f64,
    pub description: String,
    pub rationale: String,
}
