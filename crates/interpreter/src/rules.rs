//! Rule-based campaign intent interpretation
//!
//! Keyword matcher used when no Gemini API key is configured and in tests.
//! It covers the same behavior vocabulary as the model prompt but only
//! recognizes surface cues; ambiguous objectives fall back to the same
//! defaults the response parser uses.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use aether_core::{CampaignIntent, MetricTarget, TargetBehavior};

use crate::gemini::IntentInterpreter;
use crate::InterpreterError;

static PERCENT_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(?:%|percent)").unwrap());
static TIME_WINDOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)[\s_-]*(hour|day|week|month)").unwrap());

/// Offline interpreter driven by keyword rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedInterpreter;

impl RuleBasedInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Interpret an objective without touching the network.
    pub fn interpret_objective(&self, objective: &str) -> CampaignIntent {
        let text = objective.to_lowercase();

        let target_behavior = detect_behavior(&text);
        let campaign_goal = detect_goal(&text, &target_behavior);
        let proposed_intervention = detect_intervention(&text);

        CampaignIntent {
            campaign_goal,
            target_behavior,
            target_subgroup: detect_subgroup(&text),
            metric_target: detect_metric(&text),
            time_constraint: detect_time_constraint(&text),
            underlying_assumptions: assumptions_for(&proposed_intervention),
            proposed_intervention,
        }
    }
}

#[async_trait]
impl IntentInterpreter for RuleBasedInterpreter {
    async fn interpret(&self, objective: &str) -> Result<CampaignIntent, InterpreterError> {
        let intent = self.interpret_objective(objective);
        tracing::debug!(
            campaign_goal = %intent.campaign_goal,
            target_behavior = %intent.target_behavior,
            proposed_intervention = %intent.proposed_intervention,
            "campaign objective interpreted by rules"
        );
        Ok(intent)
    }
}

fn detect_behavior(text: &str) -> TargetBehavior {
    if text.contains("abandon") || text.contains("cart") {
        TargetBehavior::AbandonedCart
    } else if text.contains("win back") || text.contains("win-back") || text.contains("lapsed")
        || text.contains("churn")
    {
        TargetBehavior::LapsedCustomer
    } else if text.contains("reactivat") || text.contains("dormant") || text.contains("inactive") {
        TargetBehavior::Reactivation
    } else if text.contains("cross-sell") || text.contains("cross sell")
        || text.contains("recommend")
    {
        TargetBehavior::CrossSell
    } else if text.contains("new customer") || text.contains("signup") || text.contains("sign-up")
        || text.contains("onboard")
    {
        TargetBehavior::NewCustomer
    } else if text.contains("retention") || text.contains("retain")
        || text.contains("repeat purchase")
    {
        TargetBehavior::Retention
    } else if text.contains("engage") || text.contains("active user") {
        TargetBehavior::HighEngagement
    } else {
        TargetBehavior::Unrecognized("general".to_string())
    }
}

fn detect_goal(text: &str, behavior: &TargetBehavior) -> String {
    let goal = if text.contains("win back") || text.contains("win-back") {
        "win_back"
    } else {
        match behavior {
            TargetBehavior::Reactivation => "reactivation",
            TargetBehavior::Retention => "retention",
            TargetBehavior::CrossSell => "cross_sell",
            TargetBehavior::NewCustomer => "acquisition",
            _ if text.contains("upsell") => "upsell",
            _ => "conversion",
        }
    };
    goal.to_string()
}

fn detect_subgroup(text: &str) -> Option<String> {
    if text.contains("high-value") || text.contains("high value") || text.contains("high_value")
        || text.contains("vip")
    {
        Some("high_value_shopper".to_string())
    } else if text.contains("loyal") {
        Some("loyal_customer".to_string())
    } else {
        None
    }
}

fn detect_intervention(text: &str) -> String {
    let intervention = if text.contains("expedited") {
        "free_expedited_shipping"
    } else if text.contains("free shipping") || text.contains("free delivery") {
        "free_shipping"
    } else if text.contains("cashback") || text.contains("cash back") {
        "cashback"
    } else if text.contains("bundle") {
        "bundling"
    } else if text.contains("exclusiv") {
        "exclusivity"
    } else if text.contains("scarcity") || text.contains("limited") || text.contains("last chance")
    {
        "scarcity"
    } else if text.contains("social proof") || text.contains("review")
        || text.contains("testimonial")
    {
        "social_proof"
    } else if text.contains("personalized discount") || text.contains("personalised discount") {
        "personalized_discount_offer"
    } else {
        "discount"
    };
    intervention.to_string()
}

fn detect_metric(text: &str) -> MetricTarget {
    let value = PERCENT_TARGET
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|v| v / 100.0);
    match value {
        Some(v) => MetricTarget::new("conversion_rate_increase", v),
        None => MetricTarget::default(),
    }
}

fn detect_time_constraint(text: &str) -> Option<String> {
    TIME_WINDOW
        .captures(text)
        .map(|caps| format!("{}_{}s", &caps[1], &caps[2]))
}

fn assumptions_for(intervention: &str) -> Vec<String> {
    let assumptions: &[&str] = match intervention {
        "discount" | "personalized_discount_offer" | "cashback" | "bundling" => {
            &["price_sensitive"]
        }
        "free_shipping" | "free_expedited_shipping" => &["shipping_cost_sensitive"],
        "scarcity" => &["urgency_responsive"],
        "exclusivity" => &["status_seeking"],
        "social_proof" => &["socially_influenced"],
        _ => &[],
    };
    assumptions.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_abandoned_cart_objective() {
        let interpreter = RuleBasedInterpreter::new();
        let intent = interpreter
            .interpret(
                "Recover high-value customers who abandoned carts in the last 48 hours \
                 with a 20% discount to lift conversion",
            )
            .await
            .unwrap();

        assert_eq!(intent.target_behavior, TargetBehavior::AbandonedCart);
        assert_eq!(intent.campaign_goal, "conversion");
        assert!(intent.targets_high_value());
        assert!((intent.metric_target.value - 0.2).abs() < f64::EPSILON);
        assert_eq!(intent.time_constraint.as_deref(), Some("48_hours"));
        assert_eq!(intent.proposed_intervention, "discount");
        assert_eq!(intent.underlying_assumptions, vec!["price_sensitive"]);
    }

    #[tokio::test]
    async fn test_win_back_lapsed_objective() {
        let interpreter = RuleBasedInterpreter::new();
        let intent = interpreter
            .interpret("Win back lapsed customers with an exclusive members-only offer")
            .await
            .unwrap();

        assert_eq!(intent.target_behavior, TargetBehavior::LapsedCustomer);
        assert_eq!(intent.campaign_goal, "win_back");
        assert!(intent.is_win_back_lapsed());
        assert_eq!(intent.proposed_intervention, "exclusivity");
    }

    #[tokio::test]
    async fn test_vague_objective_uses_defaults() {
        let interpreter = RuleBasedInterpreter::new();
        let intent = interpreter.interpret("Increase sales").await.unwrap();

        assert_eq!(
            intent.target_behavior,
            TargetBehavior::Unrecognized("general".to_string())
        );
        assert_eq!(intent.campaign_goal, "conversion");
        assert_eq!(intent.target_subgroup, None);
        assert!((intent.metric_target.value - 0.1).abs() < f64::EPSILON);
        assert_eq!(intent.time_constraint, None);
        assert_eq!(intent.proposed_intervention, "discount");
    }

    #[test]
    fn test_time_window_detection() {
        assert_eq!(
            detect_time_constraint("within 7 days of signup").as_deref(),
            Some("7_days")
        );
        assert_eq!(
            detect_time_constraint("a 48-hour recovery window").as_deref(),
            Some("48_hours")
        );
        assert_eq!(detect_time_constraint("as soon as possible"), None);
    }

    #[test]
    fn test_intervention_priorities() {
        assert_eq!(
            detect_intervention("offer free expedited shipping and a discount"),
            "free_expedited_shipping"
        );
        assert_eq!(
            detect_intervention("a personalized discount for each shopper"),
            "personalized_discount_offer"
        );
        assert_eq!(detect_intervention("limited time offer"), "scarcity");
    }
}
