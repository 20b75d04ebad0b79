//! Uplift scoring and trigger ranking
//!
//! Provides:
//! - `UpliftModel` trait for scoring cohorts against marketing triggers
//! - `HeuristicScorer`, a sensitivity-based model with calibrated noise
//! - Trigger registry (effectiveness profiles, categories, copy)
//! - Data-driven feature importance for explainability

pub mod importance;
pub mod registry;
pub mod scorer;

pub use importance::feature_importance;
pub use registry::{
    trigger_category, trigger_description, trigger_profile, trigger_rationale, TriggerProfile,
    DEFAULT_TRIGGER_CANDIDATES,
};
pub use scorer::{HeuristicScorer, UpliftModel};

use thiserror::Error;

/// Uplift scoring errors
#[derive(Debug, Error)]
pub enum UpliftError {
    #[error("Invalid sampling distribution: {0}")]
    Distribution(String),
}
