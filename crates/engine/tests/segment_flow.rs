//! Full-pipeline scenarios over the in-memory stack
//!
//! Uses the rule-based interpreter and a hand-built warehouse so every
//! assertion is deterministic: 100 high-CLV, discount-sensitive customers
//! with recent above-average carts, plus 50 low-CLV customers that every
//! cart-recovery criterion excludes.

use std::sync::Arc;

use chrono::{Duration, Utc};

use aether_config::Settings;
use aether_core::{CampaignIntent, FilterKind, ManualFilters, TargetBehavior, TriggerCategory};
use aether_engine::{EngineError, SegmentCache, SegmentOrchestrator};
use aether_interpreter::RuleBasedInterpreter;
use aether_uplift::HeuristicScorer;
use aether_warehouse::{CartRecord, CustomerRecord, InMemoryWarehouse, ScoreRecord};

const OBJECTIVE: &str = "Re-engage high-value shoppers who abandoned carts in the last \
                         48 hours with a personalized discount, targeting 20% conversion uplift";

const CART_ITEMS: [&str; 3] = [
    r#"[{"product":"Sofa","category":"Living Room","price":899.0}]"#,
    r#"[{"product":"Bed Frame","category":"Bedroom","price":650.0},{"product":"Nightstand","category":"Bedroom","price":120.0}]"#,
    r#"[{"product":"Desk","category":"Office","price":450.0}]"#,
];

fn customer(
    id: &str,
    city: &str,
    country: &str,
    clv_score: f64,
) -> CustomerRecord {
    CustomerRecord {
        customer_id: id.to_string(),
        email_address: format!("{id}@example.com"),
        first_name: "Emma".to_string(),
        location_city: city.to_string(),
        location_country: country.to_string(),
        acquisition_source: "organic_search".to_string(),
        creation_date: Utc::now() - Duration::days(400),
        clv_score,
    }
}

fn fixture() -> (SegmentOrchestrator, Arc<SegmentCache>) {
    let settings = Settings::default();

    let mut customers = Vec::new();
    let mut scores = Vec::new();
    let mut carts = Vec::new();

    // In-target: high CLV, strong discount affinity, fresh 900-unit carts
    for i in 0..100 {
        let id = format!("cust_{:06}", i + 1);
        customers.push(customer(
            &id,
            "Seattle",
            "United States",
            0.76 + (i % 20) as f64 * 0.01,
        ));
        scores.push(ScoreRecord {
            customer_id: id.clone(),
            discount_sensitivity_score: 0.9,
            free_shipping_sensitivity_score: 0.8,
            exclusivity_seeker_flag: i % 2 == 0,
            churn_probability_score: 0.3,
            social_proof_affinity: 0.5,
            content_engagement_score: 0.6,
        });
        carts.push(CartRecord {
            cart_id: format!("cart_{:06}", i + 1),
            customer_id: id,
            cart_value: 900.0,
            items: CART_ITEMS[i % 3].to_string(),
            timestamp: Utc::now() - Duration::hours(24),
            status: "abandoned".to_string(),
        });
    }

    // Out-of-target: low CLV and carts far below the table average
    for i in 0..50 {
        let id = format!("cust_{:06}", i + 101);
        customers.push(customer(&id, "London", "United Kingdom", 0.3));
        scores.push(ScoreRecord {
            customer_id: id.clone(),
            discount_sensitivity_score: 0.2,
            free_shipping_sensitivity_score: 0.2,
            exclusivity_seeker_flag: false,
            churn_probability_score: 0.8,
            social_proof_affinity: 0.2,
            content_engagement_score: 0.1,
        });
        carts.push(CartRecord {
            cart_id: format!("cart_{:06}", i + 101),
            customer_id: id,
            cart_value: 10.0,
            items: CART_ITEMS[0].to_string(),
            timestamp: Utc::now() - Duration::hours(24),
            status: "abandoned".to_string(),
        });
    }

    let warehouse = InMemoryWarehouse::new(
        settings.warehouse.dataset.clone(),
        customers,
        scores,
        carts,
        Vec::new(),
    );

    let cache = Arc::new(SegmentCache::new(&settings.cache));
    let orchestrator = SegmentOrchestrator::new(
        Arc::new(RuleBasedInterpreter::new()),
        Arc::new(warehouse),
        Arc::new(HeuristicScorer::with_seed(settings.scoring.clone(), 42)),
        Arc::clone(&cache),
        &settings,
    );
    (orchestrator, cache)
}

#[tokio::test]
async fn test_analyze_campaign_end_to_end() {
    let (orchestrator, _) = fixture();
    let analysis = orchestrator.analyze_campaign(OBJECTIVE).await.unwrap();

    let intent = &analysis.campaign_objective_object;
    assert_eq!(intent.target_behavior, TargetBehavior::AbandonedCart);
    assert_eq!(intent.proposed_intervention, "personalized_discount_offer");
    assert_eq!(intent.time_constraint.as_deref(), Some("48_hours"));
    assert!(intent.targets_high_value());

    // Only the 100 high-CLV customers with above-average carts match
    let preview = &analysis.segment_preview;
    assert_eq!(preview.estimated_size, 100);
    assert!((preview.avg_clv_score - 0.855).abs() < 1e-6);
    assert_eq!(preview.avg_cart_value, Some(900.0));
    assert_eq!(
        preview.common_product_categories,
        ["Bedroom", "Living Room", "Office"]
    );
    assert_eq!(preview.demographic_breakdown.top_countries.len(), 1);
    assert_eq!(preview.demographic_breakdown.top_countries["United States"], 100);

    let kinds: Vec<FilterKind> = preview.ai_filters.iter().map(|f| f.filter_type).collect();
    assert_eq!(
        kinds,
        vec![
            FilterKind::Behavior,
            FilterKind::Timing,
            FilterKind::Value,
            FilterKind::CartValue
        ]
    );
    assert!(!preview.ai_filters[0].can_modify);

    // Discount affinity dominates the fixture, so a value-driven trigger wins
    assert_eq!(analysis.trigger_suggestions.len(), 5);
    let top = &analysis.trigger_suggestions[0];
    assert_eq!(top.trigger_name, "Personalized Discount Offer");
    assert_eq!(top.trigger_type, TriggerCategory::ValueDriven);
    assert!(preview.predicted_uplift > 0.6);
    assert_eq!(preview.predicted_roi, "4-6x");

    assert_eq!(analysis.explainability.sample_size, 100);
    assert_eq!(analysis.explainability.confidence_level, "moderate");
    assert!(analysis
        .explainability
        .why_this_segment
        .contains("high_value_shopper"));
    assert_eq!(
        analysis.explainability.recommended_trigger.as_deref(),
        Some("Personalized Discount Offer")
    );
    assert!(!analysis.explainability.key_factors.is_empty());
}

#[tokio::test]
async fn test_create_segment_caches_for_follow_up_reads() {
    let (orchestrator, cache) = fixture();
    let segment = orchestrator
        .create_segment(OBJECTIVE, None, None)
        .await
        .unwrap();

    assert!(segment.segment_id.starts_with("SEG_"));
    assert_eq!(segment.campaign_objective_ref, OBJECTIVE);
    assert_eq!(segment.estimated_size, 100);
    assert_eq!(segment.customer_profiles.len(), 100);
    assert!(segment.criteria_used.contains("INNER JOIN"));
    assert!(segment
        .criteria_used
        .contains("cs.discount_sensitivity_score > 0.65"));
    assert!(segment.recommended_trigger.is_some());

    // Profiles carry the parsed cart contents
    let profile = &segment.customer_profiles[0];
    assert!(profile.abandoned_cart_id.is_some());
    assert_eq!(profile.cart_value, Some(900.0));
    assert!(!profile.cart_items.as_ref().unwrap().is_empty());

    let steps: Vec<&str> = segment
        .comprehensive_summary
        .filtering_steps
        .iter()
        .map(|s| s.step.as_str())
        .collect();
    assert_eq!(
        steps,
        vec!["Campaign Objective", "AI Behavioral Filters", "Trigger Selection"]
    );
    assert!(segment
        .comprehensive_summary
        .summary_text
        .contains("Selected: Personalized Discount Offer"));

    assert_eq!(cache.len(), 1);
    let customers = orchestrator
        .segment_customers(&segment.segment_id, Some(10))
        .unwrap();
    assert_eq!(customers.len(), 10);
    let all = orchestrator
        .segment_customers(&segment.segment_id, None)
        .unwrap();
    assert_eq!(all.len(), 100);
    let metadata = orchestrator.segment_metadata(&segment.segment_id).unwrap();
    assert_eq!(metadata.estimated_size, 100);
}

#[tokio::test]
async fn test_recreating_same_objective_overwrites_cache_entry() {
    let (orchestrator, cache) = fixture();
    let first = orchestrator
        .create_segment(OBJECTIVE, None, None)
        .await
        .unwrap();
    let second = orchestrator
        .create_segment(OBJECTIVE, None, None)
        .await
        .unwrap();

    assert_eq!(first.segment_id, second.segment_id);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_trigger_override_shapes_journey_not_the_gate_column() {
    let (orchestrator, _) = fixture();
    let segment = orchestrator
        .create_segment(OBJECTIVE, Some("free_shipping"), None)
        .await
        .unwrap();

    // The sensitivity gate follows the proposed intervention; the override
    // changes the journey narrative and the threshold lookup key only
    assert!(segment
        .criteria_used
        .contains("cs.discount_sensitivity_score > 0.65"));
    assert_eq!(segment.estimated_size, 100);
    let trigger_step = segment
        .comprehensive_summary
        .filtering_steps
        .iter()
        .find(|s| s.step == "Trigger Selection")
        .unwrap();
    assert!(trigger_step.description.contains("Selected: Free Shipping"));
    // The ranked recommendation is reported even when overridden
    assert_eq!(
        segment.recommended_trigger.unwrap().trigger_name,
        "Personalized Discount Offer"
    );
}

#[tokio::test]
async fn test_filters_that_empty_the_segment_still_create_it() {
    let (orchestrator, _) = fixture();
    let filters = ManualFilters {
        location_country: Some("Atlantis".to_string()),
        ..ManualFilters::default()
    };
    let segment = orchestrator
        .create_segment(OBJECTIVE, None, Some(&filters))
        .await
        .unwrap();

    assert_eq!(segment.estimated_size, 0);
    assert!(segment.customer_profiles.is_empty());
    assert_eq!(segment.metadata.avg_clv_score, 0.7);
    assert!(segment.metadata.avg_cart_value.is_none());
    assert_eq!(
        segment.comprehensive_summary.final_characteristics.total_customers,
        0
    );
    assert!(segment
        .comprehensive_summary
        .summary_text
        .contains("Country: Atlantis"));

    // Retrieval works, it just returns nobody
    let customers = orchestrator
        .segment_customers(&segment.segment_id, None)
        .unwrap();
    assert!(customers.is_empty());
}

#[tokio::test]
async fn test_preview_reports_per_stage_funnel() {
    let (orchestrator, _) = fixture();
    let analysis = orchestrator.analyze_campaign(OBJECTIVE).await.unwrap();
    let intent = analysis.campaign_objective_object;

    let filters = ManualFilters {
        clv_min: Some(0.9),
        ..ManualFilters::default()
    };
    let preview = orchestrator
        .preview_filter_impact(&intent, &filters, None)
        .await
        .unwrap();

    assert_eq!(preview.starting_size, 100);
    assert_eq!(preview.final_size, 30);
    assert_eq!(preview.percentage_retained, 30.0);
    assert_eq!(preview.filters_applied.len(), 1);
    assert_eq!(preview.filters_applied[0].filter_type, FilterKind::Value);
    assert_eq!(preview.filters_applied[0].impact, 30);
    assert_eq!(preview.final_avg_clv, 0.925);
    assert_eq!(preview.final_avg_cart_value, Some(900.0));
    assert_eq!(preview.demographic_breakdown.top_countries["United States"], 30);
}

#[tokio::test]
async fn test_preview_applies_sensitivity_gate_only_when_trigger_selected() {
    let (orchestrator, _) = fixture();
    // Broad intent matching everyone: no cart criteria, no CLV floor
    let intent = CampaignIntent::new(
        "conversion",
        TargetBehavior::Unrecognized("general".to_string()),
        "personalized_discount_offer",
    );

    let ungated = orchestrator
        .preview_filter_impact(&intent, &ManualFilters::default(), None)
        .await
        .unwrap();
    assert_eq!(ungated.starting_size, 150);

    // With a trigger chosen, discount sensitivity > 0.65 drops the 50 cold rows
    let gated = orchestrator
        .preview_filter_impact(
            &intent,
            &ManualFilters::default(),
            Some("personalized_discount_offer"),
        )
        .await
        .unwrap();
    assert_eq!(gated.starting_size, 100);
    assert_eq!(gated.percentage_retained, 100.0);
}

#[tokio::test]
async fn test_preview_of_empty_cohort_reports_zero_retention() {
    let (orchestrator, _) = fixture();
    // Everyone in the fixture was acquired 400 days ago
    let intent = CampaignIntent::new("acquisition", TargetBehavior::NewCustomer, "discount");
    let filters = ManualFilters {
        clv_min: Some(0.5),
        ..ManualFilters::default()
    };

    let preview = orchestrator
        .preview_filter_impact(&intent, &filters, None)
        .await
        .unwrap();

    assert_eq!(preview.starting_size, 0);
    assert_eq!(preview.final_size, 0);
    assert_eq!(preview.percentage_retained, 0.0);
    assert_eq!(preview.final_avg_clv, 0.0);
    assert!(preview.final_avg_cart_value.is_none());
    assert!(preview.demographic_breakdown.is_empty());
    assert_eq!(preview.filters_applied.len(), 1);
    assert_eq!(preview.filters_applied[0].impact, 0);
}

#[tokio::test]
async fn test_unknown_segment_id_is_not_found() {
    let (orchestrator, _) = fixture();

    let err = orchestrator
        .segment_customers("SEG_20250101_DEADBEEF", None)
        .unwrap_err();
    assert!(matches!(err, EngineError::SegmentNotFound(_)));

    let err = orchestrator
        .segment_metadata("SEG_20250101_DEADBEEF")
        .unwrap_err();
    assert!(matches!(err, EngineError::SegmentNotFound(_)));
}

#[tokio::test]
async fn test_suggest_triggers_ranks_all_candidates() {
    let (orchestrator, _) = fixture();
    let suggestions = orchestrator.suggest_triggers(OBJECTIVE).await.unwrap();

    assert_eq!(suggestions.len(), 5);
    for pair in suggestions.windows(2) {
        assert!(pair[0].predicted_uplift >= pair[1].predicted_uplift);
    }
    for suggestion in &suggestions {
        assert!(!suggestion.rationale.is_empty());
        assert!((0.0..=1.0).contains(&suggestion.predicted_uplift));
    }
}
