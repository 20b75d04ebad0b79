//! Human-readable segment narratives
//!
//! Builds the AI-filter descriptions, the why-this-segment explanation, the
//! ranked key factors, and the step-by-step journey summary embedded in
//! creation responses. Wording here is surfaced verbatim in the campaign
//! console, so thresholds are rendered from the same tuning values the
//! query builder uses.

use tracing::debug;

use aether_config::QueryTuning;
use aether_core::{
    parse_time_constraint, sanitize_identifier, title_case, AiFilter, CampaignIntent, Cohort,
    Explainability, FilterKind, JourneyStep, JourneySummary, KeyFactor, ManualFilters,
    SegmentCharacteristics, TargetBehavior, TriggerRecommendation,
};

use crate::metadata::round_to;

/// Cohort size above which explanations claim high confidence
const HIGH_CONFIDENCE_SIZE: usize = 500;

/// Confidence label for a cohort of the given size
pub fn confidence_level(sample_size: usize) -> &'static str {
    if sample_size > HIGH_CONFIDENCE_SIZE {
        "high"
    } else {
        "moderate"
    }
}

/// Filters the intent itself implies, described for the refinement UI
///
/// The abandoned-cart behavior filter is locked since removing it would
/// change the campaign rather than refine it; everything else stays
/// user-modifiable.
pub fn derive_ai_filters(intent: &CampaignIntent, tuning: &QueryTuning) -> Vec<AiFilter> {
    let mut filters = Vec::new();

    match &intent.target_behavior {
        TargetBehavior::AbandonedCart => {
            filters.push(
                AiFilter::new(
                    FilterKind::Behavior,
                    "Target Behavior: Abandoned Cart",
                    "ac.status = 'abandoned'",
                )
                .locked(),
            );
        }
        TargetBehavior::LapsedCustomer => {
            filters.push(AiFilter::new(
                FilterKind::Behavior,
                "Target Behavior: Lapsed Customer (high churn risk)",
                format!("cs.churn_probability_score > {}", tuning.churn_threshold),
            ));
        }
        TargetBehavior::HighEngagement => {
            filters.push(AiFilter::new(
                FilterKind::Behavior,
                "Target Behavior: High Engagement",
                format!(
                    "cs.content_engagement_score > {}",
                    tuning.engagement_threshold
                ),
            ));
        }
        _ => {}
    }

    if let Some(constraint) = &intent.time_constraint {
        let window = parse_time_constraint(constraint);
        if let Some(reason) = window.default_reason() {
            debug!(reason, "time constraint fell back to the default window");
        }
        let hours = window.into_value().num_hours().max(1);
        filters.push(AiFilter::new(
            FilterKind::Timing,
            format!("Time Window: {}", title_case(constraint)),
            format!("ac.timestamp > TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {hours} HOUR)"),
        ));
    }

    if intent.targets_high_value() {
        filters.push(AiFilter::new(
            FilterKind::Value,
            format!(
                "Customer Value: High CLV (≥ {}, top 25%)",
                tuning.high_value_clv
            ),
            format!("c.clv_score >= {}", tuning.high_value_clv),
        ));
    }

    match &intent.target_behavior {
        TargetBehavior::AbandonedCart => {
            filters.push(AiFilter::new(
                FilterKind::CartValue,
                "Cart Value: Above average",
                "ac.cart_value > (SELECT AVG(cart_value) FROM abandoned_carts)",
            ));
        }
        TargetBehavior::CrossSell => {
            filters.push(AiFilter::new(
                FilterKind::Behavior,
                "Target Behavior: Cross-Sell (recent product purchasers)",
                format!(
                    "EXISTS (SELECT 1 FROM transactions WHERE customer_id = c.customer_id \
                     AND timestamp > TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {} DAY))",
                    tuning.recent_transaction_days
                ),
            ));
        }
        TargetBehavior::NewCustomer => {
            filters.push(AiFilter::new(
                FilterKind::Behavior,
                format!(
                    "Target Behavior: New Customer (acquired in last {} days)",
                    tuning.new_customer_days
                ),
                format!(
                    "c.creation_date > TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {} DAY)",
                    tuning.new_customer_days
                ),
            ));
        }
        TargetBehavior::Retention => {
            filters.push(AiFilter::new(
                FilterKind::Behavior,
                format!(
                    "Target Behavior: At-Risk Retention ({}-{} days since last purchase)",
                    tuning.retention_min_days, tuning.retention_max_days
                ),
                format!(
                    "EXISTS (SELECT 1 FROM transactions WHERE customer_id = c.customer_id \
                     AND timestamp BETWEEN TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {} DAY) \
                     AND TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {} DAY))",
                    tuning.retention_max_days, tuning.retention_min_days
                ),
            ));
        }
        TargetBehavior::Reactivation => {
            filters.push(AiFilter::new(
                FilterKind::Behavior,
                "Target Behavior: Reactivation (high churn risk)",
                format!("cs.churn_probability_score > {}", tuning.churn_threshold),
            ));
        }
        _ => {}
    }

    if intent.is_win_back_lapsed() {
        filters.push(AiFilter::new(
            FilterKind::Preference,
            "Customer Preference: Exclusivity Seekers",
            "cs.exclusivity_seeker_flag = true",
        ));
    }

    filters
}

/// Templated "why this segment" paragraph for analysis responses
pub fn segment_explanation(intent: &CampaignIntent, cohort: &Cohort) -> String {
    let mut text = format!(
        "This segment was selected based on your campaign goal to {} for customers \
         exhibiting {} behavior. ",
        intent.campaign_goal, intent.target_behavior
    );

    if let Some(subgroup) = &intent.target_subgroup {
        let avg_clv = cohort.mean_clv().unwrap_or(0.7);
        text.push_str(&format!(
            "We focused on {subgroup} (average CLV score: {avg_clv:.2}). "
        ));
    }

    if let Some(constraint) = &intent.time_constraint {
        text.push_str(&format!(
            "The segment includes only customers within the {constraint} timeframe. "
        ));
    }

    text.push_str(&format!(
        "Based on historical campaign data, the {} intervention is predicted to have \
         the highest impact on this audience.",
        intent.proposed_intervention
    ));

    text
}

/// Assemble the explainability block for an analysis response
pub fn build_explainability(
    intent: &CampaignIntent,
    cohort: &Cohort,
    suggestions: &[TriggerRecommendation],
    importance: &[(String, f64)],
) -> Explainability {
    let top = suggestions.first();
    Explainability {
        why_this_segment: segment_explanation(intent, cohort),
        key_factors: key_factors(importance),
        recommended_trigger: top.map(|t| t.trigger_name.clone()),
        trigger_rationale: top.map(|t| t.rationale.clone()),
        sample_size: cohort.len(),
        confidence_level: confidence_level(cohort.len()).to_string(),
    }
}

/// Feature importances formatted for display
pub fn key_factors(importance: &[(String, f64)]) -> Vec<KeyFactor> {
    importance
        .iter()
        .map(|(feature, weight)| KeyFactor {
            feature: title_case(feature),
            importance: *weight,
            description: feature_description(feature),
        })
        .collect()
}

fn feature_description(feature: &str) -> String {
    match feature {
        "clv_score" => "Customer lifetime value prediction".to_string(),
        "discount_sensitivity_score" => "Likelihood to respond to discounts".to_string(),
        "cart_value" => "Value of items in abandoned cart".to_string(),
        "purchase_frequency" => "How often the customer purchases".to_string(),
        "free_shipping_sensitivity_score" => "Responsiveness to free shipping offers".to_string(),
        "time_since_last_purchase" => "Recency of last transaction".to_string(),
        "avg_order_value" => "Average amount spent per order".to_string(),
        "churn_probability_score" => "Risk of customer leaving".to_string(),
        other => capitalize(&other.replace('_', " ")),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Ordered record of how a created segment was refined
pub fn journey_summary(
    intent: &CampaignIntent,
    cohort: &Cohort,
    suggestions: &[TriggerRecommendation],
    selected_trigger: Option<&str>,
    manual_filters: Option<&ManualFilters>,
    tuning: &QueryTuning,
) -> JourneySummary {
    let avg_clv = cohort.mean_clv().unwrap_or(0.7);
    let mut steps = vec![JourneyStep {
        step: "Campaign Objective".to_string(),
        description: format!(
            "Goal: {} campaign targeting {} behavior",
            title_case(&intent.campaign_goal),
            intent.target_behavior.as_str().replace('_', " ")
        ),
    }];

    let mut ai_items = vec![behavior_label(&intent.target_behavior, tuning)];
    if intent.targets_high_value() {
        ai_items.push(format!(
            "High CLV customers (top 25%, score ≥ {:.0}%)",
            tuning.high_value_clv * 100.0
        ));
    }
    if intent.target_behavior.is_abandoned_cart() {
        ai_items.push("Above-average cart value".to_string());
    }
    steps.push(JourneyStep {
        step: "AI Behavioral Filters".to_string(),
        description: bulleted(&ai_items),
    });

    if let Some(selected) = selected_trigger {
        let selected_key = sanitize_identifier(selected);
        let chosen = suggestions
            .iter()
            .find(|t| sanitize_identifier(&t.trigger_name) == selected_key);
        let mut description = format!(
            "Selected: {}\nSensitivity threshold: {:.0}%",
            title_case(selected),
            tuning.default_uplift_threshold * 100.0
        );
        if let Some(trigger) = chosen {
            description.push_str(&format!(
                "\nPredicted uplift: {}%",
                (trigger.predicted_uplift * 100.0) as i64
            ));
        }
        steps.push(JourneyStep {
            step: "Trigger Selection".to_string(),
            description,
        });
    }

    if let Some(filters) = manual_filters {
        let refinements = refinement_items(filters);
        if !refinements.is_empty() {
            steps.push(JourneyStep {
                step: "Manual Refinements".to_string(),
                description: bulleted(&refinements),
            });
        }
    }

    let mut summary_text = format!(
        "This segment of {} customers was created through a {}-step refinement process:\n\n",
        thousands(cohort.len()),
        steps.len()
    );
    for (i, step) in steps.iter().enumerate() {
        summary_text.push_str(&format!(
            "{}. **{}**: {}\n",
            i + 1,
            step.step,
            step.description
        ));
    }
    summary_text.push_str(&format!(
        "\n**Final Result**: {} highly-targeted customers with an average CLV score of {}%, \
         optimized for maximum campaign impact.",
        thousands(cohort.len()),
        (avg_clv * 100.0) as i64
    ));

    JourneySummary {
        summary_text,
        filtering_steps: steps,
        final_characteristics: SegmentCharacteristics {
            total_customers: cohort.len(),
            avg_clv_score: round_to(avg_clv, 3),
            primary_location: cohort.primary_country(),
        },
        confidence_level: confidence_level(cohort.len()).to_string(),
    }
}

/// One-line journey label for a behavior
fn behavior_label(behavior: &TargetBehavior, tuning: &QueryTuning) -> String {
    match behavior {
        TargetBehavior::AbandonedCart => {
            format!("Abandoned cart in last {} days", tuning.cart_recency_days)
        }
        TargetBehavior::LapsedCustomer => format!(
            "High churn risk customers (churn score > {:.0}%)",
            tuning.churn_threshold * 100.0
        ),
        TargetBehavior::HighEngagement => format!(
            "High engagement customers (engagement score > {:.0}%)",
            tuning.engagement_threshold * 100.0
        ),
        TargetBehavior::CrossSell => format!(
            "Recent product purchasers (last {} days)",
            tuning.recent_transaction_days
        ),
        TargetBehavior::NewCustomer => format!(
            "New customers (acquired in last {} days)",
            tuning.new_customer_days
        ),
        TargetBehavior::Retention => format!(
            "At-risk retention ({}-{} days since last purchase)",
            tuning.retention_min_days, tuning.retention_max_days
        ),
        TargetBehavior::Reactivation => "Dormant customers (high churn probability)".to_string(),
        TargetBehavior::Unrecognized(raw) => format!("{raw} behavior"),
    }
}

fn refinement_items(filters: &ManualFilters) -> Vec<String> {
    let mut items = Vec::new();
    if let Some(country) = filters
        .location_country
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    {
        items.push(format!("Country: {country}"));
    }
    if let Some(city) = filters
        .location_city
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    {
        items.push(format!("City: {city}"));
    }
    if let Some(clv_min) = filters.clv_min {
        items.push(format!("Minimum CLV: {}%", (clv_min * 100.0) as i64));
    }
    if let Some(cart_value_min) = filters.cart_value_min {
        items.push(format!("Minimum cart value: ${cart_value_min:.2}"));
    }
    items
}

/// Journey bullet list: " • a\n • b"
fn bulleted(items: &[String]) -> String {
    format!(" • {}", items.join("\n • "))
}

/// Format a count with thousands separators (1234 -> "1,234")
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
