//! Warehouse query construction for customer segmentation
//!
//! Provides:
//! - Typed query plans (projections, joins, predicates) with SQL rendering
//! - Intent-driven plan construction with per-facet clauses
//! - Aggregation wrappers for segment metadata

pub mod builder;
pub mod plan;

pub use builder::SegmentQueryBuilder;
pub use plan::{Join, Predicate, SegmentQuery};
