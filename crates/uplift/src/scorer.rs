//! Heuristic uplift scoring
//!
//! Blends per-customer sensitivity with trigger base effectiveness, adjusts
//! for customer value and campaign alignment, adds calibrated noise and clips
//! to the configured range. Stands in for a trained uplift model wherever one
//! is not available.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Beta, Distribution, Normal};
use tracing::debug;

use aether_config::ScoringWeights;
use aether_core::{title_case, CampaignIntent, Cohort, Column, TriggerRecommendation};

use crate::importance;
use crate::registry::{
    trigger_category, trigger_description, trigger_profile, trigger_rationale,
    DEFAULT_TRIGGER_CANDIDATES,
};
use crate::UpliftError;

/// Scores cohorts against triggers and ranks trigger candidates
///
/// The seam for swapping in a trained model; the orchestrator only depends
/// on this trait.
#[async_trait]
pub trait UpliftModel: Send + Sync {
    /// Per-row uplift scores for one trigger; empty cohort gives empty output
    async fn score_series(
        &self,
        cohort: &Cohort,
        trigger: &str,
        intent: &CampaignIntent,
    ) -> Result<Vec<f64>, UpliftError>;

    /// Rank trigger candidates by predicted uplift, best first
    async fn recommend_triggers(
        &self,
        cohort: &Cohort,
        intent: &CampaignIntent,
        candidates: Option<&[&str]>,
    ) -> Result<Vec<TriggerRecommendation>, UpliftError>;

    /// Relative importance of cohort features for a trigger, best first
    fn feature_importance(&self, trigger: &str, cohort: &Cohort) -> Vec<(String, f64)>;
}

/// Sensitivity-based uplift model
pub struct HeuristicScorer {
    weights: ScoringWeights,
    rng: Mutex<StdRng>,
}

impl HeuristicScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Scorer with a fixed seed for reproducible runs
    pub fn with_seed(weights: ScoringWeights, seed: u64) -> Self {
        Self {
            weights,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn score_cohort(
        &self,
        cohort: &Cohort,
        trigger: &str,
        intent: &CampaignIntent,
    ) -> Result<Vec<f64>, UpliftError> {
        if cohort.is_empty() {
            return Ok(Vec::new());
        }

        let profile = trigger_profile(trigger);
        let noise = Normal::new(0.0, profile.variance / 3.0)
            .map_err(|e| UpliftError::Distribution(e.to_string()))?;
        let synthetic = Beta::new(3.0, 3.0).map_err(|e| UpliftError::Distribution(e.to_string()))?;

        let sensitivity_available = cohort.has_column(profile.score_field.column());
        if !sensitivity_available {
            debug!(
                trigger,
                column = profile.score_field.column_name(),
                "sensitivity column missing, sampling synthetic scores"
            );
        }
        let clv_available = cohort.has_column(Column::ClvScore);
        let aligned = !intent.proposed_intervention.is_empty()
            && intent
                .proposed_intervention
                .to_lowercase()
                .contains(&trigger.to_lowercase());

        let weights = &self.weights;
        let mut rng = self.rng.lock();

        let scores = cohort
            .rows
            .iter()
            .map(|row| {
                let base = if sensitivity_available {
                    row.sensitivity(profile.score_field).unwrap_or(0.5)
                } else {
                    synthetic.sample(&mut *rng)
                };

                let weighted = base * weights.sensitivity_weight
                    + profile.base_effectiveness * weights.effectiveness_weight;

                let clv_boost = if clv_available {
                    (row.clv_score.unwrap_or(0.5) - 0.5) * weights.clv_coefficient
                } else {
                    0.0
                };

                let alignment_bonus = if aligned { weights.alignment_bonus } else { 0.0 };

                let raw = weighted + clv_boost + alignment_bonus + noise.sample(&mut *rng);
                let clipped = raw.clamp(weights.uplift_floor, weights.uplift_ceiling);
                if clipped.is_nan() {
                    0.5
                } else {
                    clipped
                }
            })
            .collect();

        Ok(scores)
    }
}

#[async_trait]
impl UpliftModel for HeuristicScorer {
    async fn score_series(
        &self,
        cohort: &Cohort,
        trigger: &str,
        intent: &CampaignIntent,
    ) -> Result<Vec<f64>, UpliftError> {
        self.score_cohort(cohort, trigger, intent)
    }

    async fn recommend_triggers(
        &self,
        cohort: &Cohort,
        intent: &CampaignIntent,
        candidates: Option<&[&str]>,
    ) -> Result<Vec<TriggerRecommendation>, UpliftError> {
        let candidates = candidates.unwrap_or(&DEFAULT_TRIGGER_CANDIDATES);
        let mut recommendations = Vec::with_capacity(candidates.len());

        for trigger in candidates {
            let scores = self.score_cohort(cohort, trigger, intent)?;

            let (predicted_uplift, confidence) = if scores.is_empty() {
                (0.5, 0.5)
            } else {
                let mean = scores.iter().sum::<f64>() / scores.len() as f64;
                let mean = if mean.is_nan() { 0.5 } else { mean };
                let high_performers = scores
                    .iter()
                    .filter(|score| **score > self.weights.confidence_threshold)
                    .count();
                (mean, high_performers as f64 / scores.len() as f64)
            };

            debug!(
                trigger,
                customers = scores.len(),
                predicted_uplift,
                confidence,
                "evaluated trigger candidate"
            );

            recommendations.push(TriggerRecommendation {
                trigger_type: trigger_category(trigger),
                trigger_name: title_case(trigger),
                confidence_score: confidence,
                predicted_uplift,
                description: trigger_description(trigger),
                rationale: trigger_rationale(predicted_uplift, intent),
            });
        }

        // Stable sort keeps candidate order among ties
        recommendations.sort_by(|a, b| {
            b.predicted_uplift
                .partial_cmp(&a.predicted_uplift)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(recommendations)
    }

    fn feature_importance(&self, trigger: &str, cohort: &Cohort) -> Vec<(String, f64)> {
        importance::feature_importance(trigger, cohort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_core::{CohortRow, TargetBehavior};

    fn intent() -> CampaignIntent {
        CampaignIntent::new(
            "conversion",
            TargetBehavior::AbandonedCart,
            "personalized_discount_offer",
        )
    }

    fn cohort_with_scores(n: usize, discount: f64, clv: f64) -> Cohort {
        let rows = (0..n)
            .map(|i| CohortRow {
                customer_id: format!("cust_{i:06}"),
                email_address: format!("c{i}@example.com"),
                clv_score: Some(clv),
                discount_sensitivity_score: Some(discount),
                ..CohortRow::default()
            })
            .collect();
        Cohort::new(Column::base_set(), rows)
    }

    #[tokio::test]
    async fn test_empty_cohort_scores_empty() {
        let scorer = HeuristicScorer::with_seed(ScoringWeights::default(), 42);
        let scores = scorer
            .score_series(&Cohort::empty(), "discount", &intent())
            .await
            .unwrap();
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_scores_stay_within_clip_bounds() {
        let scorer = HeuristicScorer::with_seed(ScoringWeights::default(), 42);

        // Extreme sensitivities still clip into range
        for discount in [0.0, 1.0] {
            let cohort = cohort_with_scores(200, discount, 1.0);
            let scores = scorer
                .score_series(&cohort, "discount", &intent())
                .await
                .unwrap();
            assert_eq!(scores.len(), 200);
            assert!(scores.iter().all(|s| (0.15..=0.95).contains(s)));
        }
    }

    #[tokio::test]
    async fn test_missing_sensitivity_column_falls_back_to_synthetic() {
        let scorer = HeuristicScorer::with_seed(ScoringWeights::default(), 7);
        let rows = (0..100)
            .map(|i| CohortRow {
                customer_id: format!("cust_{i:06}"),
                email_address: format!("c{i}@example.com"),
                ..CohortRow::default()
            })
            .collect();
        // No score columns materialized at all
        let cohort = Cohort::new(vec![Column::CustomerId, Column::EmailAddress], rows);

        let scores = scorer
            .score_series(&cohort, "social_proof", &intent())
            .await
            .unwrap();
        assert_eq!(scores.len(), 100);
        assert!(scores.iter().all(|s| (0.15..=0.95).contains(s)));
    }

    #[tokio::test]
    async fn test_alignment_bonus_shifts_scores() {
        let weights = ScoringWeights::default();
        let cohort = cohort_with_scores(50, 0.5, 0.5);

        let aligned = HeuristicScorer::with_seed(weights.clone(), 11)
            .score_series(&cohort, "discount", &intent())
            .await
            .unwrap();
        let neutral_intent =
            CampaignIntent::new("conversion", TargetBehavior::AbandonedCart, "free_shipping");
        let unaligned = HeuristicScorer::with_seed(weights.clone(), 11)
            .score_series(&cohort, "discount", &neutral_intent)
            .await
            .unwrap();

        // Same seed, same noise: every pair differs by exactly the bonus
        for (a, u) in aligned.iter().zip(&unaligned) {
            assert!((a - u - weights.alignment_bonus).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_ranking_is_total_and_sorted() {
        let scorer = HeuristicScorer::with_seed(ScoringWeights::default(), 3);
        let cohort = cohort_with_scores(120, 0.85, 0.8);

        let recommendations = scorer
            .recommend_triggers(&cohort, &intent(), None)
            .await
            .unwrap();

        assert_eq!(recommendations.len(), DEFAULT_TRIGGER_CANDIDATES.len());
        for pair in recommendations.windows(2) {
            assert!(pair[0].predicted_uplift >= pair[1].predicted_uplift);
        }
        assert!(recommendations
            .iter()
            .all(|r| (0.0..=1.0).contains(&r.confidence_score)));
    }

    #[tokio::test]
    async fn test_empty_cohort_ranking_uses_neutral_defaults() {
        let scorer = HeuristicScorer::with_seed(ScoringWeights::default(), 5);
        let recommendations = scorer
            .recommend_triggers(&Cohort::empty(), &intent(), None)
            .await
            .unwrap();

        assert_eq!(recommendations.len(), DEFAULT_TRIGGER_CANDIDATES.len());
        assert!(recommendations
            .iter()
            .all(|r| (r.predicted_uplift - 0.5).abs() < f64::EPSILON));
    }
}
