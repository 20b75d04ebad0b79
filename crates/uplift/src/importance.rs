//! Data-driven feature importance for explainability
//!
//! Importance is derived from the cohort itself: spread in a feature means
//! the feature discriminates, concentration in location means geography
//! matters. Values are normalized to sum to 1.

use aether_core::{Cohort, Column};

const TOP_FEATURES: usize = 5;

/// Ranked (feature, importance) pairs for a trigger against a cohort
///
/// Falls back to a fixed prior when the cohort is empty.
pub fn feature_importance(trigger: &str, cohort: &Cohort) -> Vec<(String, f64)> {
    if cohort.is_empty() {
        return vec![
            ("clv_score".to_string(), 0.30),
            ("discount_sensitivity_score".to_string(), 0.25),
            ("cart_value".to_string(), 0.20),
            ("churn_probability_score".to_string(), 0.15),
            ("location".to_string(), 0.10),
        ];
    }

    let mut features: Vec<(String, f64)> = Vec::new();

    if cohort.has_column(Column::ClvScore) {
        let spread = std_dev(cohort.rows.iter().filter_map(|r| r.clv_score));
        features.push(("clv_score".to_string(), (spread * 0.5).min(0.35)));
    }

    let sensitivity = sensitivity_feature(trigger);
    if cohort.has_column(sensitivity) {
        let values = cohort.rows.iter().filter_map(|r| match sensitivity {
            Column::FreeShippingSensitivity => r.free_shipping_sensitivity_score,
            _ => r.discount_sensitivity_score,
        });
        let spread = std_dev(values);
        features.push((sensitivity.name().to_string(), (spread * 0.6).min(0.30)));
    }

    if cohort.has_column(Column::CartValue) {
        let values: Vec<f64> = cohort.rows.iter().filter_map(|r| r.cart_value).collect();
        let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
        if mean > 0.0 {
            let variation = std_dev(values.iter().copied()) / mean;
            features.push(("cart_value".to_string(), (variation * 0.2).min(0.25)));
        }
    }

    if cohort.has_column(Column::ChurnProbability) {
        let values: Vec<f64> = cohort
            .rows
            .iter()
            .filter_map(|r| r.churn_probability_score)
            .collect();
        if !values.is_empty() {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            features.push(("churn_probability_score".to_string(), (mean * 0.3).min(0.20)));
        }
    }

    if cohort.has_column(Column::LocationCity) {
        let mut cities: Vec<&str> = cohort
            .rows
            .iter()
            .filter_map(|r| r.location_city.as_deref())
            .collect();
        cities.sort_unstable();
        cities.dedup();
        if !cities.is_empty() {
            let diversity = cities.len() as f64 / cohort.len() as f64;
            if diversity < 0.3 {
                features.push(("location".to_string(), ((1.0 - diversity) * 0.2).min(0.15)));
            }
        }
    }

    let total: f64 = features.iter().map(|(_, v)| v).sum();
    if total > 0.0 {
        for (_, value) in features.iter_mut() {
            *value /= total;
        }
    }

    features.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    features.truncate(TOP_FEATURES);
    features
}

/// Sensitivity column explaining a trigger's response
fn sensitivity_feature(trigger: &str) -> Column {
    match trigger {
        "free_shipping" | "free_expedited_shipping" => Column::FreeShippingSensitivity,
        _ => Column::DiscountSensitivity,
    }
}

/// Sample standard deviation over finite values; 0 below two samples
fn std_dev(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}
