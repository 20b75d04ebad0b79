//! Cohort tables returned by segmentation queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-customer sensitivity/propensity columns from the scores table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreField {
    DiscountSensitivity,
    FreeShippingSensitivity,
    ExclusivitySeeker,
    SocialProofAffinity,
    ChurnProbability,
    ContentEngagement,
}

impl ScoreField {
    /// Warehouse column name
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::DiscountSensitivity => "discount_sensitivity_score",
            Self::FreeShippingSensitivity => "free_shipping_sensitivity_score",
            Self::ExclusivitySeeker => "exclusivity_seeker_flag",
            Self::SocialProofAffinity => "social_proof_affinity",
            Self::ChurnProbability => "churn_probability_score",
            Self::ContentEngagement => "content_engagement_score",
        }
    }

    /// Cohort column carrying this score
    pub fn column(&self) -> Column {
        match self {
            Self::DiscountSensitivity => Column::DiscountSensitivity,
            Self::FreeShippingSensitivity => Column::FreeShippingSensitivity,
            Self::ExclusivitySeeker => Column::ExclusivitySeeker,
            Self::SocialProofAffinity => Column::SocialProofAffinity,
            Self::ChurnProbability => Column::ChurnProbability,
            Self::ContentEngagement => Column::ContentEngagement,
        }
    }
}

/// Columns a segmentation query can materialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    CustomerId,
    EmailAddress,
    FirstName,
    LocationCity,
    LocationCountry,
    ClvScore,
    DiscountSensitivity,
    FreeShippingSensitivity,
    ExclusivitySeeker,
    SocialProofAffinity,
    ChurnProbability,
    ContentEngagement,
    AbandonedCartId,
    CartValue,
    CartItems,
    CartAbandonedAt,
}

impl Column {
    /// Result-set column name
    pub fn name(&self) -> &'static str {
        match self {
            Self::CustomerId => "customer_id",
            Self::EmailAddress => "email_address",
            Self::FirstName => "first_name",
            Self::LocationCity => "location_city",
            Self::LocationCountry => "location_country",
            Self::ClvScore => "clv_score",
            Self::DiscountSensitivity => "discount_sensitivity_score",
            Self::FreeShippingSensitivity => "free_shipping_sensitivity_score",
            Self::ExclusivitySeeker => "exclusivity_seeker_flag",
            Self::SocialProofAffinity => "social_proof_affinity",
            Self::ChurnProbability => "churn_probability_score",
            Self::ContentEngagement => "content_engagement_score",
            Self::AbandonedCartId => "abandoned_cart_id",
            Self::CartValue => "cart_value",
            Self::CartItems => "cart_items",
            Self::CartAbandonedAt => "cart_abandoned_at",
        }
    }

    /// The fixed base projection every segment query selects
    pub fn base_set() -> Vec<Column> {
        vec![
            Column::CustomerId,
            Column::EmailAddress,
            Column::FirstName,
            Column::LocationCity,
            Column::LocationCountry,
            Column::ClvScore,
            Column::DiscountSensitivity,
            Column::FreeShippingSensitivity,
            Column::ExclusivitySeeker,
            Column::SocialProofAffinity,
            Column::ChurnProbability,
            Column::ContentEngagement,
        ]
    }

    /// Cart columns added for abandoned-cart campaigns
    pub fn cart_set() -> Vec<Column> {
        vec![
            Column::AbandonedCartId,
            Column::CartValue,
            Column::CartItems,
            Column::CartAbandonedAt,
        ]
    }
}

/// One line item inside an abandoned cart
///
/// Carts store their items as a JSON array string; this is the element shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: String,
    pub category: String,
    pub price: f64,
}

/// One customer row matched by a segmentation query
///
/// Optional fields are `None` either because the warehouse holds no value or
/// because the query did not materialize the column; `Cohort::has_column`
/// distinguishes the two.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CohortRow {
    pub customer_id: String,
    pub email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clv_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_sensitivity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_shipping_sensitivity_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusivity_seeker_flag: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_proof_affinity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub churn_probability_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_engagement_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandoned_cart_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_value: Option<f64>,
    /// Cart items as a JSON array string, as stored in the warehouse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_items: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_abandoned_at: Option<DateTime<Utc>>,
}

impl CohortRow {
    /// Parse the cart items JSON; malformed or absent payloads give an empty list
    pub fn parsed_cart_items(&self) -> Vec<CartItem> {
        self.cart_items
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }

    /// Resolve a sensitivity value, coercing boolean flags to 0/1
    pub fn sensitivity(&self, field: ScoreField) -> Option<f64> {
        match field {
            ScoreField::DiscountSensitivity => self.discount_sensitivity_score,
            ScoreField::FreeShippingSensitivity => self.free_shipping_sensitivity_score,
            ScoreField::ExclusivitySeeker => {
                self.exclusivity_seeker_flag.map(|f| if f { 1.0 } else { 0.0 })
            }
            ScoreField::SocialProofAffinity => self.social_proof_affinity,
            ScoreField::ChurnProbability => self.churn_probability_score,
            ScoreField::ContentEngagement => self.content_engagement_score,
        }
    }
}

/// A cohort table: rows plus the set of columns the query materialized
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cohort {
    pub columns: Vec<Column>,
    pub rows: Vec<CohortRow>,
}

impl Cohort {
    pub fn new(columns: Vec<Column>, rows: Vec<CohortRow>) -> Self {
        Self { columns, rows }
    }

    /// An empty cohort with the base column set
    pub fn empty() -> Self {
        Self::new(Column::base_set(), Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Derive a new cohort keeping rows that satisfy the predicate
    ///
    /// Filtering never mutates in place; the column set carries over.
    pub fn filtered(&self, keep: impl Fn(&CohortRow) -> bool) -> Cohort {
        Cohort {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Mean CLV over rows with a value; `None` when no values are present
    pub fn mean_clv(&self) -> Option<f64> {
        mean(self.rows.iter().filter_map(|row| row.clv_score))
    }

    /// Mean cart value over rows with a value
    pub fn mean_cart_value(&self) -> Option<f64> {
        if !self.has_column(Column::CartValue) {
            return None;
        }
        mean(self.rows.iter().filter_map(|row| row.cart_value))
    }

    /// Country -> customer count over all matched rows
    pub fn country_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            if let Some(country) = &row.location_country {
                *counts.entry(country.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Most frequent country, if any rows carry one
    pub fn primary_country(&self) -> Option<String> {
        self.country_counts()
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(country, _)| country)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        if v.is_finite() {
            sum += v;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, clv: Option<f64>, country: Option<&str>) -> CohortRow {
        CohortRow {
            customer_id: id.to_string(),
            email_address: format!("{id}@example.com"),
            clv_score: clv,
            location_country: country.map(str::to_string),
            ..CohortRow::default()
        }
    }

    #[test]
    fn test_sensitivity_coerces_flags() {
        let mut r = row("cust_000001", Some(0.8), None);
        r.exclusivity_seeker_flag = Some(true);
        r.discount_sensitivity_score = Some(0.42);

        assert_eq!(r.sensitivity(ScoreField::ExclusivitySeeker), Some(1.0));
        assert_eq!(r.sensitivity(ScoreField::DiscountSensitivity), Some(0.42));
        assert_eq!(r.sensitivity(ScoreField::SocialProofAffinity), None);
    }

    #[test]
    fn test_filtered_preserves_columns_and_never_mutates() {
        let cohort = Cohort::new(
            Column::base_set(),
            vec![
                row("cust_000001", Some(0.9), Some("Canada")),
                row("cust_000002", Some(0.3), Some("Canada")),
            ],
        );
        let filtered = cohort.filtered(|r| r.clv_score.unwrap_or(0.0) > 0.5);

        assert_eq!(filtered.len(), 1);
        assert_eq!(cohort.len(), 2);
        assert_eq!(filtered.columns, cohort.columns);
    }

    #[test]
    fn test_mean_clv_skips_missing_values() {
        let cohort = Cohort::new(
            Column::base_set(),
            vec![
                row("cust_000001", Some(0.8), None),
                row("cust_000002", None, None),
                row("cust_000003", Some(0.4), None),
            ],
        );
        let mean = cohort.mean_clv().unwrap();
        assert!((mean - 0.6).abs() < 1e-9);

        assert_eq!(Cohort::empty().mean_clv(), None);
    }

    #[test]
    fn test_country_counts_and_primary() {
        let cohort = Cohort::new(
            Column::base_set(),
            vec![
                row("cust_000001", None, Some("Canada")),
                row("cust_000002", None, Some("Australia")),
                row("cust_000003", None, Some("Canada")),
                row("cust_000004", None, None),
            ],
        );
        let counts = cohort.country_counts();
        assert_eq!(counts.get("Canada"), Some(&2));
        assert_eq!(counts.len(), 2);
        assert_eq!(cohort.primary_country().as_deref(), Some("Canada"));
    }

    #[test]
    fn test_cart_items_parse_leniently() {
        let mut r = row("cust_000001", None, None);
        r.cart_items = Some(
            r#"[{"product": "Sofa", "category": "Living Room", "price": 899.0}]"#.to_string(),
        );
        let items = r.parsed_cart_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product, "Sofa");

        r.cart_items = Some("not json".to_string());
        assert!(r.parsed_cart_items().is_empty());

        r.cart_items = None;
        assert!(r.parsed_cart_items().is_empty());
    }

    #[test]
    fn test_cart_value_mean_requires_column() {
        let mut with_cart = row("cust_000001", None, None);
        with_cart.cart_value = Some(250.0);

        let cohort = Cohort::new(Column::base_set(), vec![with_cart.clone()]);
        assert_eq!(cohort.mean_cart_value(), None);

        let mut columns = Column::base_set();
        columns.extend(Column::cart_set());
        let cohort = Cohort::new(columns, vec![with_cart]);
        assert_eq!(cohort.mean_cart_value(), Some(250.0));
    }
}
