//! Core domain types for the segmentation pipeline
//!
//! This crate provides the types shared across all other crates:
//! - Structured campaign intent (the interpreter's output contract)
//! - Cohort tables with column-presence tracking
//! - Trigger recommendations and filter descriptors
//! - Segment, analysis, and preview response payloads
//! - Fallible parsing with tagged defaults
//! - Segment-id generation and identifier sanitization

pub mod cohort;
pub mod filters;
pub mod helpers;
pub mod intent;
pub mod parse;
pub mod segment;
pub mod triggers;

pub use cohort::{CartItem, Cohort, CohortRow, Column, ScoreField};
pub use filters::{AiFilter, AppliedFilter, FilterKind, FilterPreview, ManualFilters};
pub use helpers::{generate_segment_id, generate_segment_id_at, sanitize_identifier, title_case};
pub use intent::{CampaignIntent, MetricTarget, TargetBehavior};
pub use parse::{
    parse_metric_value, parse_time_constraint, Parsed, DEFAULT_METRIC_VALUE,
    DEFAULT_TIME_WINDOW_DAYS,
};
pub use segment::{
    CampaignAnalysis, CustomerProfile, DemographicBreakdown, Explainability, JourneyStep,
    JourneySummary, KeyFactor, SegmentCharacteristics, SegmentMetadata, SegmentResponse,
};
pub use triggers::{TriggerCategory, TriggerRecommendation};
