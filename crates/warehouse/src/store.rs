//! Warehouse trait and the in-memory implementation
//!
//! The in-memory warehouse holds the same four tables as the production CDP
//! (customers, customer_scores, abandoned_carts, transactions) and evaluates
//! typed query plans directly instead of parsing SQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use aether_core::{Cohort, CohortRow, Column, ScoreField};
use aether_query::{Predicate, SegmentQuery};

use crate::WarehouseError;

/// Executes segment query plans against customer data
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Execute a plan and return the matched cohort
    async fn execute(&self, query: &SegmentQuery) -> Result<Cohort, WarehouseError>;
}

/// Row in the customers table
#[derive(Debug, Clone)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub email_address: String,
    pub first_name: String,
    pub location_city: String,
    pub location_country: String,
    pub acquisition_source: String,
    pub creation_date: DateTime<Utc>,
    pub clv_score: f64,
}

/// Row in the customer_scores table
#[derive(Debug, Clone)]
pub struct ScoreRecord {
    pub customer_id: String,
    pub discount_sensitivity_score: f64,
    pub free_shipping_sensitivity_score: f64,
    pub exclusivity_seeker_flag: bool,
    pub churn_probability_score: f64,
    pub social_proof_affinity: f64,
    pub content_engagement_score: f64,
}

impl ScoreRecord {
    fn value(&self, field: ScoreField) -> f64 {
        match field {
            ScoreField::DiscountSensitivity => self.discount_sensitivity_score,
            ScoreField::FreeShippingSensitivity => self.free_shipping_sensitivity_score,
            ScoreField::ExclusivitySeeker => {
                if self.exclusivity_seeker_flag {
                    1.0
                } else {
                    0.0
                }
            }
            ScoreField::SocialProofAffinity => self.social_proof_affinity,
            ScoreField::ChurnProbability => self.churn_probability_score,
            ScoreField::ContentEngagement => self.content_engagement_score,
        }
    }
}

/// Row in the abandoned_carts table
#[derive(Debug, Clone)]
pub struct CartRecord {
    pub cart_id: String,
    pub customer_id: String,
    pub cart_value: f64,
    /// JSON array of cart items
    pub items: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

/// Row in the transactions table
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub customer_id: String,
    pub order_value: f64,
    pub product_category: String,
    pub product_name: String,
    pub timestamp: DateTime<Utc>,
}

/// In-memory warehouse over synthetic CDP tables
///
/// Immutable after construction, so it is shared across request handlers
/// without locking.
pub struct InMemoryWarehouse {
    dataset: String,
    customers: Vec<CustomerRecord>,
    scores: HashMap<String, ScoreRecord>,
    carts_by_customer: HashMap<String, Vec<CartRecord>>,
    transactions_by_customer: HashMap<String, Vec<TransactionRecord>>,
    cart_count: usize,
    transaction_count: usize,
}

impl InMemoryWarehouse {
    pub fn new(
        dataset: impl Into<String>,
        customers: Vec<CustomerRecord>,
        scores: Vec<ScoreRecord>,
        carts: Vec<CartRecord>,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        let cart_count = carts.len();
        let transaction_count = transactions.len();

        let scores = scores
            .into_iter()
            .map(|s| (s.customer_id.clone(), s))
            .collect();

        let mut carts_by_customer: HashMap<String, Vec<CartRecord>> = HashMap::new();
        for cart in carts {
            carts_by_customer
                .entry(cart.customer_id.clone())
                .or_default()
                .push(cart);
        }

        let mut transactions_by_customer: HashMap<String, Vec<TransactionRecord>> = HashMap::new();
        for transaction in transactions {
            transactions_by_customer
                .entry(transaction.customer_id.clone())
                .or_default()
                .push(transaction);
        }

        Self {
            dataset: dataset.into(),
            customers,
            scores,
            carts_by_customer,
            transactions_by_customer,
            cart_count,
            transaction_count,
        }
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    pub fn cart_count(&self) -> usize {
        self.cart_count
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Mean cart value across the whole abandoned_carts table
    fn average_cart_value(&self) -> Option<f64> {
        if self.cart_count == 0 {
            return None;
        }
        let total: f64 = self
            .carts_by_customer
            .values()
            .flatten()
            .map(|c| c.cart_value)
            .sum();
        Some(total / self.cart_count as f64)
    }

    fn matches(
        &self,
        predicate: &Predicate,
        customer: &CustomerRecord,
        score: &ScoreRecord,
        cart: Option<&CartRecord>,
        now: DateTime<Utc>,
        average_cart_value: Option<f64>,
    ) -> bool {
        match predicate {
            Predicate::CartRecency { cutoff } => cart.is_some_and(|c| c.timestamp > *cutoff),
            Predicate::CartStatus { status } => cart.is_some_and(|c| c.status == *status),
            Predicate::ScoreAbove { field, threshold } => score.value(*field) > *threshold,
            Predicate::ClvAtLeast { threshold } => customer.clv_score >= *threshold,
            Predicate::ExclusivitySeeker => score.exclusivity_seeker_flag,
            Predicate::RecentTransaction { days } => {
                let cutoff = now - Duration::days(*days as i64);
                self.transactions_by_customer
                    .get(&customer.customer_id)
                    .is_some_and(|txns| txns.iter().any(|t| t.timestamp > cutoff))
            }
            Predicate::TransactionBetween { min_days, max_days } => {
                let lower = now - Duration::days(*max_days as i64);
                let upper = now - Duration::days(*min_days as i64);
                self.transactions_by_customer
                    .get(&customer.customer_id)
                    .is_some_and(|txns| {
                        txns.iter()
                            .any(|t| t.timestamp >= lower && t.timestamp <= upper)
                    })
            }
            Predicate::CreatedWithinDays { days } => {
                customer.creation_date > now - Duration::days(*days as i64)
            }
            Predicate::CartValueAboveAverage => match (cart, average_cart_value) {
                (Some(c), Some(average)) => c.cart_value > average,
                _ => false,
            },
        }
    }

    fn project(
        &self,
        query: &SegmentQuery,
        customer: &CustomerRecord,
        score: &ScoreRecord,
        cart: Option<&CartRecord>,
    ) -> CohortRow {
        let mut row = CohortRow {
            customer_id: customer.customer_id.clone(),
            email_address: customer.email_address.clone(),
            first_name: Some(customer.first_name.clone()),
            location_city: Some(customer.location_city.clone()),
            location_country: Some(customer.location_country.clone()),
            clv_score: Some(customer.clv_score),
            discount_sensitivity_score: Some(score.discount_sensitivity_score),
            free_shipping_sensitivity_score: Some(score.free_shipping_sensitivity_score),
            exclusivity_seeker_flag: Some(score.exclusivity_seeker_flag),
            social_proof_affinity: Some(score.social_proof_affinity),
            churn_probability_score: Some(score.churn_probability_score),
            content_engagement_score: Some(score.content_engagement_score),
            ..CohortRow::default()
        };

        if query.columns.contains(&Column::CartValue) {
            if let Some(cart) = cart {
                row.abandoned_cart_id = Some(cart.cart_id.clone());
                row.cart_value = Some(cart.cart_value);
                row.cart_items = Some(cart.items.clone());
                row.cart_abandoned_at = Some(cart.timestamp);
            }
        }

        row
    }
}

#[async_trait]
impl Warehouse for InMemoryWarehouse {
    async fn execute(&self, query: &SegmentQuery) -> Result<Cohort, WarehouseError> {
        if query.dataset != self.dataset {
            return Err(WarehouseError::DatasetNotFound(query.dataset.clone()));
        }

        let now = Utc::now();
        let average_cart_value = self.average_cart_value();
        let cart_join = query.has_cart_join();

        let mut matched: Vec<(&CustomerRecord, &ScoreRecord, Option<&CartRecord>)> = Vec::new();

        for customer in &self.customers {
            // customers INNER JOIN customer_scores
            let Some(score) = self.scores.get(&customer.customer_id) else {
                continue;
            };

            if cart_join {
                // INNER JOIN abandoned_carts: one candidate row per cart
                let Some(carts) = self.carts_by_customer.get(&customer.customer_id) else {
                    continue;
                };
                for cart in carts {
                    let keep = query.predicates.iter().all(|p| {
                        self.matches(p, customer, score, Some(cart), now, average_cart_value)
                    });
                    if keep {
                        matched.push((customer, score, Some(cart)));
                    }
                }
            } else {
                let keep = query
                    .predicates
                    .iter()
                    .all(|p| self.matches(p, customer, score, None, now, average_cart_value));
                if keep {
                    matched.push((customer, score, None));
                }
            }
        }

        // Fixed ordering: CLV descending, then discount sensitivity descending
        matched.sort_by(|a, b| {
            b.0.clv_score
                .total_cmp(&a.0.clv_score)
                .then(b.1.discount_sensitivity_score.total_cmp(&a.1.discount_sensitivity_score))
        });

        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }

        let rows = matched
            .into_iter()
            .map(|(customer, score, cart)| self.project(query, customer, score, cart))
            .collect();

        Ok(Cohort::new(query.columns.clone(), rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aether_config::QueryTuning;
    use aether_core::{CampaignIntent, TargetBehavior};
    use aether_query::SegmentQueryBuilder;

    const DATASET: &str = "aethersegment_cdp";

    fn customer(id: &str, clv: f64, created_days_ago: i64) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            email_address: format!("{id}@example.com"),
            first_name: "Emma".to_string(),
            location_city: "Seattle".to_string(),
            location_country: "United States".to_string(),
            acquisition_source: "organic_search".to_string(),
            creation_date: Utc::now() - Duration::days(created_days_ago),
            clv_score: clv,
        }
    }

    fn score(id: &str, discount: f64, churn: f64) -> ScoreRecord {
        ScoreRecord {
            customer_id: id.to_string(),
            discount_sensitivity_score: discount,
            free_shipping_sensitivity_score: 0.5,
            exclusivity_seeker_flag: false,
            churn_probability_score: churn,
            social_proof_affinity: 0.5,
            content_engagement_score: 0.5,
        }
    }

    fn cart(id: &str, customer_id: &str, value: f64, hours_ago: i64) -> CartRecord {
        CartRecord {
            cart_id: id.to_string(),
            customer_id: customer_id.to_string(),
            cart_value: value,
            items: "[]".to_string(),
            timestamp: Utc::now() - Duration::hours(hours_ago),
            status: "abandoned".to_string(),
        }
    }

    fn small_warehouse() -> InMemoryWarehouse {
        InMemoryWarehouse::new(
            DATASET,
            vec![
                customer("cust_000001", 0.9, 400),
                customer("cust_000002", 0.5, 400),
                customer("cust_000003", 0.8, 3),
            ],
            vec![
                score("cust_000001", 0.9, 0.7),
                score("cust_000002", 0.4, 0.2),
                score("cust_000003", 0.6, 0.5),
            ],
            vec![
                cart("cart_000001", "cust_000001", 900.0, 24),
                cart("cart_000002", "cust_000002", 100.0, 24),
            ],
            vec![],
        )
    }

    fn plan(behavior: TargetBehavior) -> aether_query::SegmentQuery {
        let intent = CampaignIntent::new("conversion", behavior, "discount");
        SegmentQueryBuilder::new(DATASET, QueryTuning::default()).build(&intent, None, None)
    }

    #[tokio::test]
    async fn test_base_plan_matches_all_and_orders_by_clv() {
        let warehouse = small_warehouse();
        let cohort = warehouse
            .execute(&plan(TargetBehavior::Unrecognized("general".to_string())))
            .await
            .unwrap();

        assert_eq!(cohort.len(), 3);
        assert_eq!(cohort.rows[0].customer_id, "cust_000001");
        assert_eq!(cohort.rows[1].customer_id, "cust_000003");
        assert!(cohort.rows[0].cart_value.is_none());
    }

    #[tokio::test]
    async fn test_cart_join_keeps_above_average_recent_carts() {
        let warehouse = small_warehouse();
        let cohort = warehouse
            .execute(&plan(TargetBehavior::AbandonedCart))
            .await
            .unwrap();

        // Average cart value is 500: only the 900 cart survives
        assert_eq!(cohort.len(), 1);
        let row = &cohort.rows[0];
        assert_eq!(row.customer_id, "cust_000001");
        assert_eq!(row.abandoned_cart_id.as_deref(), Some("cart_000001"));
        assert_eq!(row.cart_value, Some(900.0));
    }

    #[tokio::test]
    async fn test_churn_predicate_filters() {
        let warehouse = small_warehouse();
        let cohort = warehouse
            .execute(&plan(TargetBehavior::LapsedCustomer))
            .await
            .unwrap();

        assert_eq!(cohort.len(), 1);
        assert_eq!(cohort.rows[0].customer_id, "cust_000001");
    }

    #[tokio::test]
    async fn test_created_within_days_predicate() {
        let warehouse = small_warehouse();
        let cohort = warehouse
            .execute(&plan(TargetBehavior::NewCustomer))
            .await
            .unwrap();

        assert_eq!(cohort.len(), 1);
        assert_eq!(cohort.rows[0].customer_id, "cust_000003");
    }

    #[tokio::test]
    async fn test_unknown_dataset_is_rejected() {
        let warehouse = small_warehouse();
        let mut query = plan(TargetBehavior::AbandonedCart);
        query.dataset = "other_dataset".to_string();

        let err = warehouse.execute(&query).await.unwrap_err();
        assert!(matches!(err, WarehouseError::DatasetNotFound(_)));
    }

    #[tokio::test]
    async fn test_limit_truncates_after_ordering() {
        let warehouse = small_warehouse();
        let mut query = plan(TargetBehavior::Unrecognized("general".to_string()));
        query.limit = Some(2);

        let cohort = warehouse.execute(&query).await.unwrap();
        assert_eq!(cohort.len(), 2);
        assert_eq!(cohort.rows[0].customer_id, "cust_000001");
    }
}
