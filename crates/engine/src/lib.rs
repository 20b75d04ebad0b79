//! Segment pipeline orchestration
//!
//! Ties the interpreter, query builder, warehouse, and uplift model together
//! into one request lifecycle:
//!
//! - [`SegmentOrchestrator`]: analyze, create, preview, and retrieve segments
//! - [`funnel`]: in-memory manual refinement with per-stage impact reporting
//! - [`metadata`] and [`narrative`]: aggregates, explainability, and the
//!   journey summary embedded in responses
//! - [`SegmentCache`]: bounded TTL cache for created segments

pub mod cache;
pub mod funnel;
pub mod metadata;
pub mod narrative;
pub mod orchestrator;

pub use cache::{CachedSegment, SegmentCache};
pub use funnel::apply_manual_filters;
pub use orchestrator::SegmentOrchestrator;

use thiserror::Error;

use aether_interpreter::InterpreterError;
use aether_uplift::UpliftError;
use aether_warehouse::WarehouseError;

/// Errors surfaced by the orchestration pipeline
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Intent interpretation failed: {0}")]
    Interpretation(#[from] InterpreterError),

    #[error("Warehouse query failed: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("Trigger scoring failed: {0}")]
    Scoring(#[from] UpliftError),

    #[error("Segment not found: {0}")]
    SegmentNotFound(String),
}
