//! Segment query construction from campaign intents

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use tracing::debug;

use aether_config::QueryTuning;
use aether_core::{sanitize_identifier, CampaignIntent, Column, ScoreField, TargetBehavior};

use crate::plan::{Join, Predicate, SegmentQuery};

/// Builds segment query plans from campaign intents
///
/// Each intent facet contributes an independent clause; unrecognized
/// behaviors contribute nothing rather than failing.
#[derive(Debug, Clone)]
pub struct SegmentQueryBuilder {
    dataset: String,
    tuning: QueryTuning,
}

impl SegmentQueryBuilder {
    pub fn new(dataset: impl Into<String>, tuning: QueryTuning) -> Self {
        Self {
            dataset: dataset.into(),
            tuning,
        }
    }

    /// Build a query plan for the given intent
    ///
    /// `trigger_thresholds` maps sanitized trigger names to minimum
    /// sensitivity scores; when present, a threshold clause is added for the
    /// intent's proposed intervention (unmapped triggers fall back to the
    /// discount-sensitivity column and the default threshold).
    pub fn build(
        &self,
        intent: &CampaignIntent,
        trigger_thresholds: Option<&BTreeMap<String, f64>>,
        limit: Option<usize>,
    ) -> SegmentQuery {
        let mut columns = Column::base_set();
        let mut joins = vec![Join::CustomerScores];
        let mut predicates = Vec::new();

        match &intent.target_behavior {
            TargetBehavior::AbandonedCart => {
                columns.extend(Column::cart_set());
                joins.push(Join::AbandonedCarts);

                let cutoff = Utc::now() - Duration::days(self.tuning.cart_recency_days as i64);
                predicates.push(Predicate::cart_recency(cutoff));
                predicates.push(Predicate::cart_status("abandoned"));
                debug!(
                    days = self.tuning.cart_recency_days,
                    "abandoned cart filter: recent abandoned carts"
                );
            }
            TargetBehavior::LapsedCustomer | TargetBehavior::Reactivation => {
                predicates.push(Predicate::score_above(
                    ScoreField::ChurnProbability,
                    self.tuning.churn_threshold,
                ));
                debug!(
                    threshold = self.tuning.churn_threshold,
                    "churn filter: churn probability above threshold"
                );
            }
            TargetBehavior::HighEngagement => {
                predicates.push(Predicate::score_above(
                    ScoreField::ContentEngagement,
                    self.tuning.engagement_threshold,
                ));
                debug!(
                    threshold = self.tuning.engagement_threshold,
                    "engagement filter: content engagement above threshold"
                );
            }
            TargetBehavior::CrossSell => {
                predicates.push(Predicate::RecentTransaction {
                    days: self.tuning.recent_transaction_days,
                });
                debug!(
                    days = self.tuning.recent_transaction_days,
                    "cross-sell filter: recent purchasers"
                );
            }
            TargetBehavior::NewCustomer => {
                predicates.push(Predicate::CreatedWithinDays {
                    days: self.tuning.new_customer_days,
                });
                debug!(
                    days = self.tuning.new_customer_days,
                    "new customer filter: recently acquired"
                );
            }
            TargetBehavior::Retention => {
                predicates.push(Predicate::TransactionBetween {
                    min_days: self.tuning.retention_min_days,
                    max_days: self.tuning.retention_max_days,
                });
                debug!(
                    min_days = self.tuning.retention_min_days,
                    max_days = self.tuning.retention_max_days,
                    "retention filter: purchase inside inactivity window"
                );
            }
            TargetBehavior::Unrecognized(raw) => {
                debug!(behavior = %raw, "unrecognized behavior, base filters only");
            }
        }

        if intent.targets_high_value() {
            predicates.push(Predicate::ClvAtLeast {
                threshold: self.tuning.high_value_clv,
            });
            debug!(
                threshold = self.tuning.high_value_clv,
                "high-value filter: CLV floor"
            );
        }

        if intent.is_win_back_lapsed() {
            predicates.push(Predicate::ExclusivitySeeker);
            debug!("win-back filter: exclusivity seekers");
        }

        if let Some(thresholds) = trigger_thresholds {
            let intervention = sanitize_identifier(&intent.proposed_intervention);
            let threshold = thresholds
                .get(&intervention)
                .copied()
                .unwrap_or(self.tuning.default_uplift_threshold);
            let field = trigger_score_field(&intervention);
            predicates.push(Predicate::score_above(field, threshold));
            debug!(
                trigger = %intervention,
                column = field.column_name(),
                threshold,
                "uplift filter: sensitivity above threshold"
            );
        }

        // Cart-recovery campaigns additionally target above-average carts
        if intent.target_behavior.is_abandoned_cart() {
            predicates.push(Predicate::CartValueAboveAverage);
            debug!("cart value filter: above average");
        }

        SegmentQuery {
            dataset: self.dataset.clone(),
            columns,
            joins,
            predicates,
            limit,
        }
    }
}

/// Score column gating a trigger; unmapped triggers use discount sensitivity
fn trigger_score_field(intervention: &str) -> ScoreField {
    match intervention {
        "personalized_discount_offer" | "discount" => ScoreField::DiscountSensitivity,
        "free_shipping" | "free_expedited_shipping" => ScoreField::FreeShippingSensitivity,
        _ => ScoreField::DiscountSensitivity,
    }
}
