//! Typed query plans and their SQL rendering
//!
//! A segment query is a list of typed clauses, not a string. Predicates are
//! sanitized when constructed, evaluated directly by in-memory warehouses,
//! and rendered to SQL only at the edge.

use chrono::{DateTime, Utc};

use aether_core::{sanitize_identifier, Column, ScoreField};

/// Tables joined onto the customers base table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// `customer_scores` aliased `cs`, always present
    CustomerScores,
    /// `abandoned_carts` aliased `ac`, for cart-recovery campaigns
    AbandonedCarts,
}

impl Join {
    fn render(&self, dataset: &str) -> String {
        match self {
            Self::CustomerScores => format!(
                "INNER JOIN `{dataset}.customer_scores` cs ON c.customer_id = cs.customer_id"
            ),
            Self::AbandonedCarts => format!(
                "INNER JOIN `{dataset}.abandoned_carts` ac ON c.customer_id = ac.customer_id"
            ),
        }
    }
}

/// One WHERE-clause predicate
///
/// Variants are data, so an in-memory warehouse can evaluate them without
/// parsing SQL. String-bearing variants are sanitized by their constructors.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Cart abandoned after the cutoff instant
    CartRecency { cutoff: DateTime<Utc> },
    /// Cart status equals the (sanitized) token
    CartStatus { status: String },
    /// Sensitivity score strictly above a threshold
    ScoreAbove { field: ScoreField, threshold: f64 },
    /// CLV score at or above a threshold
    ClvAtLeast { threshold: f64 },
    /// Exclusivity-seeker flag set
    ExclusivitySeeker,
    /// At least one transaction within the last N days
    RecentTransaction { days: u32 },
    /// At least one transaction between max_days and min_days ago
    TransactionBetween { min_days: u32, max_days: u32 },
    /// Account created within the last N days
    CreatedWithinDays { days: u32 },
    /// Cart value above the table-wide average
    CartValueAboveAverage,
}

impl Predicate {
    /// Cart-recency predicate for carts abandoned after `cutoff`
    pub fn cart_recency(cutoff: DateTime<Utc>) -> Self {
        Self::CartRecency { cutoff }
    }

    /// Cart-status predicate; the status is reduced to a safe token
    pub fn cart_status(status: &str) -> Self {
        Self::CartStatus {
            status: sanitize_identifier(status),
        }
    }

    /// Sensitivity-threshold predicate on a score column
    pub fn score_above(field: ScoreField, threshold: f64) -> Self {
        Self::ScoreAbove { field, threshold }
    }

    fn render(&self, dataset: &str) -> String {
        match self {
            Self::CartRecency { cutoff } => format!(
                "TIMESTAMP(ac.timestamp) > TIMESTAMP('{}')",
                cutoff.format("%Y-%m-%dT%H:%M:%S%.6f")
            ),
            Self::CartStatus { status } => format!("ac.status = '{status}'"),
            Self::ScoreAbove { field, threshold } => {
                format!("cs.{} > {}", field.column_name(), threshold)
            }
            Self::ClvAtLeast { threshold } => format!("c.clv_score >= {threshold}"),
            Self::ExclusivitySeeker => "cs.exclusivity_seeker_flag = true".to_string(),
            Self::RecentTransaction { days } => format!(
                "EXISTS (SELECT 1 FROM `{dataset}.transactions` t \
                 WHERE t.customer_id = c.customer_id \
                 AND CAST(t.timestamp AS TIMESTAMP) > \
                 TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {days} DAY))"
            ),
            Self::TransactionBetween { min_days, max_days } => format!(
                "c.customer_id IN (SELECT DISTINCT customer_id \
                 FROM `{dataset}.transactions` \
                 WHERE CAST(timestamp AS TIMESTAMP) BETWEEN \
                 TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {max_days} DAY) AND \
                 TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {min_days} DAY))"
            ),
            Self::CreatedWithinDays { days } => format!(
                "CAST(c.creation_date AS TIMESTAMP) > \
                 TIMESTAMP_SUB(CURRENT_TIMESTAMP(), INTERVAL {days} DAY)"
            ),
            Self::CartValueAboveAverage => format!(
                "ac.cart_value > (SELECT AVG(cart_value) FROM `{dataset}.abandoned_carts`)"
            ),
        }
    }
}

/// A complete segment query plan
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentQuery {
    pub dataset: String,
    pub columns: Vec<Column>,
    pub joins: Vec<Join>,
    pub predicates: Vec<Predicate>,
    pub limit: Option<usize>,
}

impl SegmentQuery {
    /// Whether the plan joins the abandoned-carts table
    pub fn has_cart_join(&self) -> bool {
        self.joins.contains(&Join::AbandonedCarts)
    }

    /// Render the plan to SQL
    ///
    /// Ordering is fixed (CLV descending, then discount sensitivity
    /// descending) so limits page deterministically.
    pub fn render(&self) -> String {
        let mut sql = String::from("SELECT\n  ");
        let projections: Vec<&str> = self.columns.iter().map(select_expr).collect();
        sql.push_str(&projections.join(",\n  "));

        sql.push_str(&format!("\nFROM `{}.customers` c", self.dataset));
        for join in &self.joins {
            sql.push('\n');
            sql.push_str(&join.render(&self.dataset));
        }

        if !self.predicates.is_empty() {
            let rendered: Vec<String> = self
                .predicates
                .iter()
                .map(|p| p.render(&self.dataset))
                .collect();
            sql.push_str("\nWHERE\n  ");
            sql.push_str(&rendered.join("\n  AND "));
        }

        sql.push_str("\nORDER BY c.clv_score DESC, cs.discount_sensitivity_score DESC");

        if let Some(limit) = self.limit {
            sql.push_str(&format!("\nLIMIT {limit}"));
        }

        sql
    }

    /// Render an aggregation wrapper over this plan
    ///
    /// Wraps the base query as a CTE instead of re-deriving predicates. The
    /// cart-value average is included only when the plan selects cart fields.
    pub fn render_metadata(&self) -> String {
        let mut aggregates = vec![
            "COUNT(*) AS segment_size".to_string(),
            "AVG(clv_score) AS avg_clv_score".to_string(),
        ];
        if self.columns.contains(&Column::CartValue) {
            aggregates.push("AVG(cart_value) AS avg_cart_value".to_string());
        }
        aggregates.push("AVG(discount_sensitivity_score) AS avg_discount_sensitivity".to_string());
        aggregates
            .push("AVG(free_shipping_sensitivity_score) AS avg_shipping_sensitivity".to_string());
        aggregates.push("APPROX_TOP_COUNT(location_city, 5) AS top_cities".to_string());

        let base = self
            .render()
            .lines()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "WITH segment_data AS (\n{base}\n)\nSELECT\n  {}\nFROM segment_data",
            aggregates.join(",\n  ")
        )
    }
}

/// SELECT expression for a projected column, with table alias and rename
fn select_expr(column: &Column) -> &'static str {
    match column {
        Column::CustomerId => "c.customer_id",
        Column::EmailAddress => "c.email_address",
        Column::FirstName => "c.first_name",
        Column::LocationCity => "c.location_city",
        Column::LocationCountry => "c.location_country",
        Column::ClvScore => "c.clv_score",
        Column::DiscountSensitivity => "cs.discount_sensitivity_score",
        Column::FreeShippingSensitivity => "cs.free_shipping_sensitivity_score",
        Column::ExclusivitySeeker => "cs.exclusivity_seeker_flag",
        Column::SocialProofAffinity => "cs.social_proof_affinity",
        Column::ChurnProbability => "cs.churn_probability_score",
        Column::ContentEngagement => "cs.content_engagement_score",
        Column::AbandonedCartId => "ac.cart_id AS abandoned_cart_id",
        Column::CartValue => "ac.cart_value",
        Column::CartItems => "ac.items AS cart_items",
        Column::CartAbandonedAt => "ac.timestamp AS cart_abandoned_at",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_plan() -> SegmentQuery {
        SegmentQuery {
            dataset: "aethersegment_cdp".to_string(),
            columns: Column::base_set(),
            joins: vec![Join::CustomerScores],
            predicates: Vec::new(),
            limit: None,
        }
    }

    #[test]
    fn test_render_without_predicates_has_no_where() {
        let sql = base_plan().render();
        assert!(sql.starts_with("SELECT\n  c.customer_id"));
        assert!(sql.contains("FROM `aethersegment_cdp.customers` c"));
        assert!(!sql.contains("WHERE"));
        assert!(sql.contains("ORDER BY c.clv_score DESC, cs.discount_sensitivity_score DESC"));
    }

    #[test]
    fn test_predicates_join_with_and() {
        let mut plan = base_plan();
        plan.predicates = vec![
            Predicate::score_above(ScoreField::ChurnProbability, 0.6),
            Predicate::ClvAtLeast { threshold: 0.75 },
        ];
        let sql = plan.render();
        assert!(sql.contains("WHERE\n  cs.churn_probability_score > 0.6"));
        assert!(sql.contains("\n  AND c.clv_score >= 0.75"));
    }

    #[test]
    fn test_cart_status_sanitized_at_construction() {
        let predicate = Predicate::cart_status("abandoned'; DROP TABLE x");
        match &predicate {
            Predicate::CartStatus { status } => {
                assert!(status
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_'));
            }
            other => panic!("unexpected predicate {other:?}"),
        }
    }

    #[test]
    fn test_limit_appended_last() {
        let mut plan = base_plan();
        plan.limit = Some(1000);
        assert!(plan.render().ends_with("LIMIT 1000"));
    }

    #[test]
    fn test_metadata_wraps_base_query() {
        let mut plan = base_plan();
        plan.predicates = vec![Predicate::score_above(ScoreField::ChurnProbability, 0.6)];
        let sql = plan.render_metadata();
        assert!(sql.starts_with("WITH segment_data AS ("));
        assert!(sql.contains("cs.churn_probability_score > 0.6"));
        assert!(sql.contains("APPROX_TOP_COUNT(location_city, 5) AS top_cities"));
        assert!(!sql.contains("avg_cart_value"));

        plan.columns.extend(Column::cart_set());
        assert!(plan.render_metadata().contains("AVG(cart_value) AS avg_cart_value"));
    }
}
