//! Trigger registry: effectiveness profiles, categories and copy

use aether_core::{CampaignIntent, ScoreField, TriggerCategory};

/// Triggers evaluated when the caller does not supply candidates
pub const DEFAULT_TRIGGER_CANDIDATES: [&str; 5] = [
    "personalized_discount_offer",
    "free_shipping",
    "scarcity",
    "exclusivity",
    "social_proof",
];

/// How a trigger is scored: which sensitivity column drives it, its base
/// effectiveness from historical campaigns, and its outcome variance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerProfile {
    pub score_field: ScoreField,
    pub base_effectiveness: f64,
    pub variance: f64,
}

impl TriggerProfile {
    const fn new(score_field: ScoreField, base_effectiveness: f64, variance: f64) -> Self {
        Self {
            score_field,
            base_effectiveness,
            variance,
        }
    }
}

/// Profile for a trigger; unknown triggers get a conservative default
pub fn trigger_profile(trigger: &str) -> TriggerProfile {
    match trigger {
        "discount" => TriggerProfile::new(ScoreField::DiscountSensitivity, 0.72, 0.15),
        "personalized_discount_offer" => {
            TriggerProfile::new(ScoreField::DiscountSensitivity, 0.75, 0.12)
        }
        "free_shipping" => TriggerProfile::new(ScoreField::FreeShippingSensitivity, 0.68, 0.14),
        "free_expedited_shipping" => {
            TriggerProfile::new(ScoreField::FreeShippingSensitivity, 0.65, 0.16)
        }
        "scarcity" => TriggerProfile::new(ScoreField::DiscountSensitivity, 0.60, 0.18),
        "exclusivity" => TriggerProfile::new(ScoreField::ExclusivitySeeker, 0.58, 0.20),
        "social_proof" => TriggerProfile::new(ScoreField::SocialProofAffinity, 0.55, 0.17),
        "bundling" => TriggerProfile::new(ScoreField::DiscountSensitivity, 0.63, 0.15),
        "cashback" => TriggerProfile::new(ScoreField::DiscountSensitivity, 0.66, 0.14),
        _ => TriggerProfile::new(ScoreField::DiscountSensitivity, 0.55, 0.18),
    }
}

/// Category of a trigger; unknown triggers count as value-driven
pub fn trigger_category(trigger: &str) -> TriggerCategory {
    match trigger {
        "discount" | "personalized_discount_offer" | "free_shipping" | "cashback"
        | "bundling" => TriggerCategory::ValueDriven,
        "scarcity" | "urgency" | "exclusivity" | "social_proof" => TriggerCategory::Psychological,
        "content" | "storytelling" => TriggerCategory::Informational,
        _ => TriggerCategory::ValueDriven,
    }
}

/// Short description of what applying the trigger means
pub fn trigger_description(trigger: &str) -> String {
    match trigger {
        "personalized_discount_offer" => {
            "Offer a targeted discount based on customer value and cart contents".to_string()
        }
        "free_shipping" => "Eliminate shipping costs to reduce cart abandonment".to_string(),
        "scarcity" => "Create urgency with limited-time or limited-stock messaging".to_string(),
        "exclusivity" => "Offer VIP or early access to make customers feel valued".to_string(),
        "social_proof" => "Leverage reviews, testimonials, and popularity signals".to_string(),
        other => format!("Apply {} strategy", other.replace('_', " ")),
    }
}

/// Templated rationale for a recommendation at a given uplift level
pub fn trigger_rationale(predicted_uplift: f64, intent: &CampaignIntent) -> String {
    let effectiveness = if predicted_uplift > 0.7 {
        "highly effective"
    } else if predicted_uplift > 0.5 {
        "moderately effective"
    } else {
        "somewhat effective"
    };

    format!(
        "Based on historical campaign data and customer behavior patterns, \
         this trigger is predicted to be {} for {} campaigns targeting {}. \
         Estimated uplift: {:.1}%",
        effectiveness,
        intent.target_behavior,
        intent.target_subgroup.as_deref().unwrap_or("this segment"),
        predicted_uplift * 100.0
    )
}
