//! Prompt construction for the campaign intent model
//!
//! The prompt pins the model to a fixed output contract: a bare JSON object
//! with a known field set, snake_case behavior vocabulary, and numeric
//! metric values. Everything downstream (response repair, field defaulting)
//! assumes this contract was at least attempted.

/// Analyst instructions and the extraction field list.
const PROMPT_PREAMBLE: &str = r#"You are an AI marketing campaign analyst specialized in interpreting marketing objectives.
Your task is to analyze natural language campaign descriptions and extract structured information.

You must identify:
1. campaign_goal: The primary goal (e.g., conversion, retention, acquisition, upsell, cross_sell, win_back, reactivation)
2. target_behavior: The specific customer behavior targeted. Use EXACTLY one of these:
   - abandoned_cart (for cart recovery)
   - lapsed_customer (for win-back, high churn risk)
   - high_engagement (for active users)
   - cross_sell (for product recommendations to recent buyers)
   - new_customer (for onboarding, recent signups)
   - retention (for customers at risk of not returning)
   - reactivation (for dormant/inactive customers)
3. target_subgroup: The customer segment (e.g., high_value_shopper, new_customer, loyal_customer)
4. metric_target: The success metric with NUMERIC value as a decimal (e.g., 0.20 for 20% increase)
5. time_constraint: Timeframe for the campaign (e.g., 48_hours_post_abandonment, 7_days, 30_days)
6. proposed_intervention: The trigger/offer type (discount, free_shipping, scarcity, exclusivity, social_proof, content, gift_with_purchase, cashback, bundling)
7. underlying_assumptions: Marketing psychology assumptions (e.g., price_sensitive, urgency_responsive, status_seeking)"#;

/// Output contract. Kept separate from the preamble so the JSON skeleton
/// stays a literal instead of a format string full of escaped braces.
const PROMPT_OUTPUT_RULES: &str = r#"OUTPUT FORMAT - CRITICAL INSTRUCTIONS:
- Return ONLY the JSON object below
- NO markdown formatting (no ```json or ``` blocks)
- NO comments in the JSON
- NO trailing commas
- Use double quotes for all strings
- Ensure all brackets and braces are properly closed

{
  "campaign_goal": "<goal>",
  "target_behavior": "<behavior>",
  "target_subgroup": "<subgroup>",
  "metric_target": {
    "type": "<metric_type>",
    "value": 0.20
  },
  "time_constraint": "<time_constraint>",
  "proposed_intervention": "<intervention_type>",
  "underlying_assumptions": ["<assumption1>", "<assumption2>"]
}

IMPORTANT:
- metric_target.value MUST be a numeric decimal (0.20 for 20%, 0.15 for 15%, etc.)
- target_behavior should use underscore_case from the list above (abandoned_cart, lapsed_customer, high_engagement, cross_sell, new_customer, retention, reactivation)
- All field names must match exactly as shown
- Return ONLY the JSON - nothing before or after it

Ensure all values are specific and actionable. Use standardized terminology."#;

/// Build the full interpretation prompt for a campaign objective.
pub fn build_interpreter_prompt(objective: &str) -> String {
    format!(
        "{PROMPT_PREAMBLE}\n\nCampaign Objective to analyze: \"{objective}\"\n\n{PROMPT_OUTPUT_RULES}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_objective() {
        let prompt = build_interpreter_prompt("Recover abandoned carts with a 20% discount");
        assert!(prompt
            .contains("Campaign Objective to analyze: \"Recover abandoned carts with a 20% discount\""));
    }

    #[test]
    fn test_prompt_pins_output_contract() {
        let prompt = build_interpreter_prompt("anything");
        assert!(prompt.contains("Return ONLY the JSON object below"));
        assert!(prompt.contains("\"metric_target\""));
        assert!(prompt.contains("abandoned_cart (for cart recovery)"));
    }
}
