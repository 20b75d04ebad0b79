//! Manual refinement funnel
//!
//! Runs in memory after the warehouse query: stages apply in a fixed order
//! (country, city, CLV floor, cart-value floor), compose by intersection, and
//! each stage records how many customers remained after it ran.

use tracing::debug;

use aether_core::{AppliedFilter, Cohort, Column, FilterKind, ManualFilters};

/// Apply manual filters to a cohort, recording the per-stage funnel
///
/// Zero filters return the cohort unchanged with no stages recorded. The
/// cart-value stage is skipped when the cohort carries no cart column.
pub fn apply_manual_filters(
    cohort: Cohort,
    filters: &ManualFilters,
) -> (Cohort, Vec<AppliedFilter>) {
    let mut current = cohort;
    let mut applied = Vec::new();

    if let Some(country) = non_empty(filters.location_country.as_deref()) {
        let needle = country.to_lowercase();
        current = current.filtered(|row| {
            row.location_country
                .as_deref()
                .is_some_and(|c| c.to_lowercase() == needle)
        });
        debug!(country, remaining = current.len(), "country filter applied");
        applied.push(AppliedFilter {
            filter_type: FilterKind::Location,
            description: format!("Country: {country}"),
            impact: current.len(),
        });
    }

    if let Some(city) = non_empty(filters.location_city.as_deref()) {
        let needle = city.to_lowercase();
        current = current.filtered(|row| {
            row.location_city
                .as_deref()
                .is_some_and(|c| c.to_lowercase() == needle)
        });
        debug!(city, remaining = current.len(), "city filter applied");
        applied.push(AppliedFilter {
            filter_type: FilterKind::Location,
            description: format!("City: {city}"),
            impact: current.len(),
        });
    }

    if let Some(clv_min) = filters.clv_min {
        current = current.filtered(|row| row.clv_score.is_some_and(|clv| clv >= clv_min));
        debug!(clv_min, remaining = current.len(), "CLV floor applied");
        applied.push(AppliedFilter {
            filter_type: FilterKind::Value,
            description: format!("CLV Score ≥ {:.0}%", clv_min * 100.0),
            impact: current.len(),
        });
    }

    if let Some(cart_value_min) = filters.cart_value_min {
        if current.has_column(Column::CartValue) {
            current =
                current.filtered(|row| row.cart_value.is_some_and(|value| value >= cart_value_min));
            debug!(
                cart_value_min,
                remaining = current.len(),
                "cart value floor applied"
            );
            applied.push(AppliedFilter {
                filter_type: FilterKind::CartValue,
                description: format!("Cart Value ≥ ${cart_value_min:.2}"),
                impact: current.len(),
            });
        } else {
            debug!("cart value filter skipped, cohort has no cart column");
        }
    }

    (current, applied)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
