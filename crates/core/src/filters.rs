//! Filter descriptors and the filter-preview funnel result

use serde::{Deserialize, Serialize};

use crate::segment::DemographicBreakdown;

/// What aspect of the cohort a filter constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Behavior,
    Timing,
    Value,
    CartValue,
    Preference,
    Location,
}

/// A predicate the system derived automatically from the campaign intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiFilter {
    pub filter_type: FilterKind,
    /// Human-readable description shown to the user
    pub description: String,
    /// Underlying predicate expression
    pub sql_condition: String,
    /// Whether a user may loosen or tighten this filter
    pub can_modify: bool,
}

impl AiFilter {
    pub fn new(
        filter_type: FilterKind,
        description: impl Into<String>,
        sql_condition: impl Into<String>,
    ) -> Self {
        Self {
            filter_type,
            description: description.into(),
            sql_condition: sql_condition.into(),
            can_modify: true,
        }
    }

    /// Mark the filter as not user-modifiable
    pub fn locked(mut self) -> Self {
        self.can_modify = false;
        self
    }
}

/// Manual refinement filters applied in-memory after the warehouse query
///
/// Filters compose by intersection in declaration order. Country and city
/// match case-insensitively; the cart-value minimum only applies when the
/// cohort carries a cart-value column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clv_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_value_min: Option<f64>,
}

impl ManualFilters {
    pub fn is_empty(&self) -> bool {
        self.location_country.is_none()
            && self.location_city.is_none()
            && self.clv_min.is_none()
            && self.cart_value_min.is_none()
    }
}

/// One applied filter stage and the cohort size after it ran
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedFilter {
    #[serde(rename = "type")]
    pub filter_type: FilterKind,
    pub description: String,
    /// Rows remaining after this stage
    pub impact: usize,
}

/// Funnel metrics for a filter preview; ephemeral, never cached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterPreview {
    pub starting_size: usize,
    pub final_size: usize,
    /// final/starting as a percentage; 0 when the starting cohort is empty
    pub percentage_retained: f64,
    pub filters_applied: Vec<AppliedFilter>,
    /// 0.0 on an empty final cohort
    pub final_avg_clv: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_avg_cart_value: Option<f64>,
    pub demographic_breakdown: DemographicBreakdown,
}
