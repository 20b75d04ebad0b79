//! Segment responses, metadata, and explainability payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::filters::AiFilter;
use crate::intent::CampaignIntent;
use crate::triggers::TriggerRecommendation;

/// Country distribution over a cohort
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicBreakdown {
    #[serde(default)]
    pub top_countries: BTreeMap<String, u64>,
}

impl DemographicBreakdown {
    pub fn from_counts(top_countries: BTreeMap<String, u64>) -> Self {
        Self { top_countries }
    }

    pub fn is_empty(&self) -> bool {
        self.top_countries.is_empty()
    }
}

/// One customer in a delivered segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: String,
    pub email: String,
    /// Falls back to "Valued Customer" when the warehouse has no name
    pub first_name: String,
    pub clv_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandoned_cart_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_items: Option<Vec<String>>,
}

/// Aggregate metadata describing a segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub segment_id: String,
    pub estimated_size: usize,
    pub predicted_uplift: f64,
    /// ROI tier: "4-6x" when the top uplift exceeds 0.6, else "2-4x"
    pub predicted_roi: String,
    pub avg_clv_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_cart_value: Option<f64>,
    #[serde(default)]
    pub common_product_categories: Vec<String>,
    #[serde(default)]
    pub demographic_breakdown: DemographicBreakdown,
    #[serde(default)]
    pub ai_filters: Vec<AiFilter>,
}

/// One ranked signal behind a segment choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyFactor {
    /// Display name, e.g. "Clv Score"
    pub feature: String,
    pub importance: f64,
    pub description: String,
}

/// Why-this-segment explanation attached to an analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explainability {
    pub why_this_segment: String,
    pub key_factors: Vec<KeyFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_trigger: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_rationale: Option<String>,
    pub sample_size: usize,
    /// "high" above 500 matched customers, otherwise "moderate"
    pub confidence_level: String,
}

/// One step in the segment-creation journey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyStep {
    pub step: String,
    pub description: String,
}

/// Final shape of a created segment, for the journey summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentCharacteristics {
    pub total_customers: usize,
    pub avg_clv_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_location: Option<String>,
}

/// Ordered record of how a segment was refined, objective through manual filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneySummary {
    pub summary_text: String,
    pub filtering_steps: Vec<JourneyStep>,
    pub final_characteristics: SegmentCharacteristics,
    pub confidence_level: String,
}

/// Full response for segment creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentResponse {
    pub segment_id: String,
    /// The original natural-language objective
    pub campaign_objective_ref: String,
    pub query_timestamp: DateTime<Utc>,
    /// Size of the full segment after all filtering
    pub estimated_size: usize,
    /// The rendered warehouse query that produced the segment
    pub criteria_used: String,
    /// Preview of the segment, capped; the cache retains the full list
    pub customer_profiles: Vec<CustomerProfile>,
    pub metadata: SegmentMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_trigger: Option<TriggerRecommendation>,
    pub comprehensive_summary: JourneySummary,
}

/// Response for campaign analysis; never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignAnalysis {
    pub campaign_objective_object: CampaignIntent,
    pub segment_preview: SegmentMetadata,
    pub trigger_suggestions: Vec<TriggerRecommendation>,
    pub explainability: Explainability,
}
