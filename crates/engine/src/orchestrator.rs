//! Pipeline orchestration from objective text to segment response

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use aether_config::{QueryTuning, SegmentationLimits, Settings};
use aether_core::{
    generate_segment_id, sanitize_identifier, CampaignAnalysis, CampaignIntent, Cohort,
    CustomerProfile, DemographicBreakdown, FilterPreview, ManualFilters, SegmentMetadata,
    SegmentResponse, TriggerRecommendation,
};
use aether_interpreter::IntentInterpreter;
use aether_query::SegmentQueryBuilder;
use aether_uplift::UpliftModel;
use aether_warehouse::Warehouse;

use crate::cache::{CachedSegment, SegmentCache};
use crate::funnel::apply_manual_filters;
use crate::metadata::{self, round_to};
use crate::narrative;
use crate::EngineError;

/// Trigger gating the segment query when ranking produced nothing to pick
const FALLBACK_TRIGGER: &str = "discount";

/// Coordinates interpretation, querying, scoring, and response assembly
///
/// Holds its collaborators behind trait objects so the server can wire a
/// Gemini or rule-based interpreter and any warehouse or model without the
/// pipeline changing. Created segments land in the shared [`SegmentCache`].
pub struct SegmentOrchestrator {
    interpreter: Arc<dyn IntentInterpreter>,
    warehouse: Arc<dyn Warehouse>,
    model: Arc<dyn UpliftModel>,
    cache: Arc<SegmentCache>,
    builder: SegmentQueryBuilder,
    tuning: QueryTuning,
    limits: SegmentationLimits,
}

impl SegmentOrchestrator {
    pub fn new(
        interpreter: Arc<dyn IntentInterpreter>,
        warehouse: Arc<dyn Warehouse>,
        model: Arc<dyn UpliftModel>,
        cache: Arc<SegmentCache>,
        settings: &Settings,
    ) -> Self {
        Self {
            interpreter,
            warehouse,
            model,
            cache,
            builder: SegmentQueryBuilder::new(
                settings.warehouse.dataset.as_str(),
                settings.query.clone(),
            ),
            tuning: settings.query.clone(),
            limits: settings.segmentation.clone(),
        }
    }

    /// Analyze an objective end to end without persisting anything
    pub async fn analyze_campaign(&self, objective: &str) -> Result<CampaignAnalysis, EngineError> {
        info!(objective, "analyzing campaign objective");
        let intent = self.interpreter.interpret(objective).await?;

        let query = self.builder.build(&intent, None, None);
        let cohort = self.warehouse.execute(&query).await?;
        info!(customers = cohort.len(), "cohort matched for analysis");

        let suggestions = self.rank_triggers(&cohort, &intent).await;
        let segment_preview =
            metadata::segment_metadata(&cohort, &intent, suggestions.first(), &self.tuning);
        let importance = self
            .model
            .feature_importance(&intent.proposed_intervention, &cohort);
        let explainability =
            narrative::build_explainability(&intent, &cohort, &suggestions, &importance);

        Ok(CampaignAnalysis {
            campaign_objective_object: intent,
            segment_preview,
            trigger_suggestions: suggestions,
            explainability,
        })
    }

    /// Create a segment, cache it, and return the response
    ///
    /// The trigger override takes precedence over the top-ranked suggestion;
    /// with neither available the query falls back to gating on discount
    /// sensitivity. Manual filters shrink the cohort before any aggregates
    /// are computed, so a zero-size segment is a valid outcome.
    pub async fn create_segment(
        &self,
        objective: &str,
        override_trigger: Option<&str>,
        additional_filters: Option<&ManualFilters>,
    ) -> Result<SegmentResponse, EngineError> {
        info!(objective, "creating segment");
        let intent = self.interpreter.interpret(objective).await?;

        let sample_query = self
            .builder
            .build(&intent, None, Some(self.limits.sample_size));
        let sample = self.warehouse.execute(&sample_query).await?;
        let suggestions = self.rank_triggers(&sample, &intent).await;
        let top = suggestions.first().cloned();

        let selected_trigger = override_trigger
            .map(str::to_string)
            .or_else(|| top.as_ref().map(|t| t.trigger_name.clone()))
            .unwrap_or_else(|| FALLBACK_TRIGGER.to_string());
        info!(trigger = %selected_trigger, "trigger selected for segment");

        let mut thresholds = BTreeMap::new();
        thresholds.insert(
            sanitize_identifier(&selected_trigger),
            self.tuning.default_uplift_threshold,
        );
        let query = self.builder.build(
            &intent,
            Some(&thresholds),
            Some(self.limits.max_segment_size),
        );
        let mut cohort = self.warehouse.execute(&query).await?;
        info!(customers = cohort.len(), "segment cohort fetched");

        if let Some(filters) = additional_filters {
            let before = cohort.len();
            let (filtered, _) = apply_manual_filters(cohort, filters);
            cohort = filtered;
            info!(before, after = cohort.len(), "manual filters applied");
            if cohort.is_empty() && before > 0 {
                warn!("manual filters removed every customer from the segment");
            }
        }

        let profiles = metadata::customer_profiles(&cohort);
        let segment_metadata =
            metadata::segment_metadata(&cohort, &intent, top.as_ref(), &self.tuning);
        let comprehensive_summary = narrative::journey_summary(
            &intent,
            &cohort,
            &suggestions,
            Some(&selected_trigger),
            additional_filters,
            &self.tuning,
        );

        let query_text = query.render();
        let response = SegmentResponse {
            segment_id: generate_segment_id(objective),
            campaign_objective_ref: objective.to_string(),
            query_timestamp: Utc::now(),
            estimated_size: profiles.len(),
            criteria_used: query_text.clone(),
            customer_profiles: profiles
                .iter()
                .take(self.limits.profile_preview_limit)
                .cloned()
                .collect(),
            metadata: segment_metadata,
            recommended_trigger: top,
            comprehensive_summary,
        };

        self.cache.insert(CachedSegment {
            response: response.clone(),
            customers: profiles,
            query: query_text,
            created_at: Utc::now(),
        });
        info!(
            segment_id = %response.segment_id,
            size = response.estimated_size,
            "segment created and cached"
        );

        Ok(response)
    }

    /// Preview the funnel effect of manual filters without creating anything
    pub async fn preview_filter_impact(
        &self,
        intent: &CampaignIntent,
        new_filters: &ManualFilters,
        selected_trigger: Option<&str>,
    ) -> Result<FilterPreview, EngineError> {
        // The trigger-sensitivity gate applies only once a trigger is chosen
        let thresholds = selected_trigger.map(|trigger| {
            let mut map = BTreeMap::new();
            map.insert(
                sanitize_identifier(trigger),
                self.tuning.default_uplift_threshold,
            );
            map
        });

        let query = self.builder.build(intent, thresholds.as_ref(), None);
        let cohort = self.warehouse.execute(&query).await?;
        let starting_size = cohort.len();

        let (filtered, filters_applied) = apply_manual_filters(cohort, new_filters);
        let final_size = filtered.len();

        let percentage_retained = if starting_size == 0 {
            0.0
        } else {
            round_to(final_size as f64 / starting_size as f64 * 100.0, 1)
        };
        info!(
            starting_size,
            final_size, percentage_retained, "filter preview computed"
        );

        Ok(FilterPreview {
            starting_size,
            final_size,
            percentage_retained,
            filters_applied,
            final_avg_clv: round_to(filtered.mean_clv().unwrap_or(0.0), 3),
            final_avg_cart_value: filtered.mean_cart_value().map(|v| round_to(v, 2)),
            demographic_breakdown: DemographicBreakdown::from_counts(filtered.country_counts()),
        })
    }

    /// Interpret an objective and rank triggers against a sample cohort
    pub async fn suggest_triggers(
        &self,
        objective: &str,
    ) -> Result<Vec<TriggerRecommendation>, EngineError> {
        let intent = self.interpreter.interpret(objective).await?;
        let query = self
            .builder
            .build(&intent, None, Some(self.limits.sample_size));
        let cohort = self.warehouse.execute(&query).await?;
        let suggestions = self.model.recommend_triggers(&cohort, &intent, None).await?;
        info!(
            customers = cohort.len(),
            suggestions = suggestions.len(),
            "trigger suggestions ranked"
        );
        Ok(suggestions)
    }

    /// Customers of a cached segment, optionally capped
    pub fn segment_customers(
        &self,
        segment_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<CustomerProfile>, EngineError> {
        let cached = self
            .cache
            .get(segment_id)
            .ok_or_else(|| EngineError::SegmentNotFound(segment_id.to_string()))?;
        let customers = match limit {
            Some(limit) => cached.customers.iter().take(limit).cloned().collect(),
            None => cached.customers.clone(),
        };
        Ok(customers)
    }

    /// Metadata of a cached segment
    pub fn segment_metadata(&self, segment_id: &str) -> Result<SegmentMetadata, EngineError> {
        let cached = self
            .cache
            .get(segment_id)
            .ok_or_else(|| EngineError::SegmentNotFound(segment_id.to_string()))?;
        Ok(cached.response.metadata.clone())
    }

    /// Rank triggers, degrading to no suggestions when scoring fails
    ///
    /// Analysis and creation still produce a useful response without
    /// suggestions; only the dedicated suggestions endpoint propagates
    /// scoring errors.
    async fn rank_triggers(
        &self,
        cohort: &Cohort,
        intent: &CampaignIntent,
    ) -> Vec<TriggerRecommendation> {
        match self.model.recommend_triggers(cohort, intent, None).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(error = %e, "trigger ranking failed, continuing without suggestions");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aether_core::{CohortRow, Column, TargetBehavior};
    use aether_interpreter::InterpreterError;
    use aether_query::SegmentQuery;
    use aether_uplift::UpliftError;
    use aether_warehouse::WarehouseError;

    struct StaticIntent(CampaignIntent);

    #[async_trait]
    impl IntentInterpreter for StaticIntent {
        async fn interpret(&self, _objective: &str) -> Result<CampaignIntent, InterpreterError> {
            Ok(self.0.clone())
        }
    }

    struct FixedCohort {
        columns: Vec<Column>,
        rows: Vec<CohortRow>,
    }

    #[async_trait]
    impl Warehouse for FixedCohort {
        async fn execute(&self, query: &SegmentQuery) -> Result<Cohort, WarehouseError> {
            let mut cohort = Cohort::new(self.columns.clone(), self.rows.clone());
            if let Some(limit) = query.limit {
                cohort.rows.truncate(limit);
            }
            Ok(cohort)
        }
    }

    struct NoSuggestions;

    #[async_trait]
    impl UpliftModel for NoSuggestions {
        async fn score_series(
            &self,
            _cohort: &Cohort,
            _trigger: &str,
            _intent: &CampaignIntent,
        ) -> Result<Vec<f64>, UpliftError> {
            Ok(Vec::new())
        }

        async fn recommend_triggers(
            &self,
            _cohort: &Cohort,
            _intent: &CampaignIntent,
            _candidates: Option<&[&str]>,
        ) -> Result<Vec<TriggerRecommendation>, UpliftError> {
            Ok(Vec::new())
        }

        fn feature_importance(&self, _trigger: &str, _cohort: &Cohort) -> Vec<(String, f64)> {
            Vec::new()
        }
    }

    struct FailingModel;

    #[async_trait]
    impl UpliftModel for FailingModel {
        async fn score_series(
            &self,
            _cohort: &Cohort,
            _trigger: &str,
            _intent: &CampaignIntent,
        ) -> Result<Vec<f64>, UpliftError> {
            Err(UpliftError::Distribution("sampler exhausted".to_string()))
        }

        async fn recommend_triggers(
            &self,
            _cohort: &Cohort,
            _intent: &CampaignIntent,
            _candidates: Option<&[&str]>,
        ) -> Result<Vec<TriggerRecommendation>, UpliftError> {
            Err(UpliftError::Distribution("sampler exhausted".to_string()))
        }

        fn feature_importance(&self, _trigger: &str, _cohort: &Cohort) -> Vec<(String, f64)> {
            vec![("clv_score".to_string(), 1.0)]
        }
    }

    fn orchestrator_with(model: Arc<dyn UpliftModel>) -> SegmentOrchestrator {
        let intent = CampaignIntent::new(
            "conversion",
            TargetBehavior::Unrecognized("general".to_string()),
            "discount",
        );
        let rows = (0..10)
            .map(|i| CohortRow {
                customer_id: format!("cust_{i:06}"),
                email_address: format!("c{i}@example.com"),
                clv_score: Some(0.8),
                location_country: Some("Canada".to_string()),
                ..CohortRow::default()
            })
            .collect();
        let settings = Settings::default();
        SegmentOrchestrator::new(
            Arc::new(StaticIntent(intent)),
            Arc::new(FixedCohort {
                columns: Column::base_set(),
                rows,
            }),
            model,
            Arc::new(SegmentCache::new(&settings.cache)),
            &settings,
        )
    }

    #[tokio::test]
    async fn test_empty_ranking_falls_back_to_discount_trigger() {
        let orchestrator = orchestrator_with(Arc::new(NoSuggestions));
        let segment = orchestrator
            .create_segment("general push", None, None)
            .await
            .unwrap();

        assert!(segment.recommended_trigger.is_none());
        let trigger_step = segment
            .comprehensive_summary
            .filtering_steps
            .iter()
            .find(|s| s.step == "Trigger Selection")
            .unwrap();
        assert!(trigger_step.description.contains("Selected: Discount"));
        // The fallback still gates the query on discount sensitivity
        assert!(segment
            .criteria_used
            .contains("cs.discount_sensitivity_score > 0.65"));
    }

    #[tokio::test]
    async fn test_scoring_failure_degrades_analysis() {
        let orchestrator = orchestrator_with(Arc::new(FailingModel));
        let analysis = orchestrator.analyze_campaign("general push").await.unwrap();

        assert!(analysis.trigger_suggestions.is_empty());
        assert!(analysis.explainability.recommended_trigger.is_none());
        assert_eq!(analysis.segment_preview.predicted_uplift, 0.15);
        assert_eq!(analysis.segment_preview.predicted_roi, "2-4x");
        // Importance still surfaces as key factors
        assert_eq!(analysis.explainability.key_factors.len(), 1);
    }

    #[tokio::test]
    async fn test_scoring_failure_propagates_for_suggestions() {
        let orchestrator = orchestrator_with(Arc::new(FailingModel));
        let err = orchestrator
            .suggest_triggers("general push")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Scoring(_)));
    }
}
