//! Segment aggregates and profile conversion

use std::collections::BTreeMap;

use aether_config::QueryTuning;
use aether_core::{
    generate_segment_id, CampaignIntent, Cohort, CustomerProfile, DemographicBreakdown,
    SegmentMetadata, TriggerRecommendation,
};

use crate::narrative;

/// Categories reported per segment
const COMMON_CATEGORY_LIMIT: usize = 3;

/// Uplift assumed when no trigger has been ranked yet
const BASELINE_UPLIFT: f64 = 0.15;

/// Uplift above which the ROI estimate moves to the higher tier
const HIGH_ROI_UPLIFT: f64 = 0.6;

/// Aggregate metadata for a cohort under an intent
///
/// The embedded id is keyed to the proposed intervention; the response-level
/// segment id is keyed to the objective text. An empty cohort reports the
/// 0.7 prior for average CLV rather than NaN.
pub fn segment_metadata(
    cohort: &Cohort,
    intent: &CampaignIntent,
    top_trigger: Option<&TriggerRecommendation>,
    tuning: &QueryTuning,
) -> SegmentMetadata {
    let predicted_uplift = top_trigger.map_or(BASELINE_UPLIFT, |t| t.predicted_uplift);
    let predicted_roi = if predicted_uplift > HIGH_ROI_UPLIFT {
        "4-6x"
    } else {
        "2-4x"
    };

    SegmentMetadata {
        segment_id: generate_segment_id(&intent.proposed_intervention),
        estimated_size: cohort.len(),
        predicted_uplift,
        predicted_roi: predicted_roi.to_string(),
        avg_clv_score: cohort.mean_clv().unwrap_or(0.7),
        avg_cart_value: cohort.mean_cart_value(),
        common_product_categories: common_product_categories(cohort),
        demographic_breakdown: DemographicBreakdown::from_counts(cohort.country_counts()),
        ai_filters: narrative::derive_ai_filters(intent, tuning),
    }
}

/// Top product categories across the cohort's cart contents
///
/// Ranked by item count descending, name ascending on ties, capped at three.
/// Cohorts without cart data report no categories.
pub fn common_product_categories(cohort: &Cohort) -> Vec<String> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for row in &cohort.rows {
        for item in row.parsed_cart_items() {
            *counts.entry(item.category).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(COMMON_CATEGORY_LIMIT)
        .map(|(category, _)| category)
        .collect()
}

/// Convert cohort rows into response-facing customer profiles
///
/// Cart fields attach only when the row carries an abandoned cart; cart items
/// surface as the parsed product names.
pub fn customer_profiles(cohort: &Cohort) -> Vec<CustomerProfile> {
    cohort
        .rows
        .iter()
        .map(|row| {
            let mut profile = CustomerProfile {
                customer_id: row.customer_id.clone(),
                email: row.email_address.clone(),
                first_name: row
                    .first_name
                    .clone()
                    .unwrap_or_else(|| "Valued Customer".to_string()),
                clv_score: row.clv_score.unwrap_or(0.5),
                location_city: row.location_city.clone(),
                abandoned_cart_id: None,
                cart_value: None,
                cart_items: None,
            };

            if let Some(cart_id) = &row.abandoned_cart_id {
                profile.abandoned_cart_id = Some(cart_id.clone());
                profile.cart_value = Some(row.cart_value.unwrap_or(0.0));
                profile.cart_items = Some(
                    row.parsed_cart_items()
                        .into_iter()
                        .map(|item| item.product)
                        .collect(),
                );
            }

            profile
        })
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
