//! Customer data warehouse access
//!
//! Provides:
//! - `Warehouse` trait: executes typed segment query plans
//! - `InMemoryWarehouse`: four CDP tables held in memory, plan evaluation
//!   without SQL
//! - Synthetic data seeding with production-shaped distributions

pub mod seed;
pub mod store;

pub use store::{
    CartRecord, CustomerRecord, InMemoryWarehouse, ScoreRecord, TransactionRecord, Warehouse,
};

use thiserror::Error;

/// Warehouse access errors
#[derive(Debug, Error)]
pub enum WarehouseError {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Failed to seed warehouse: {0}")]
    Seed(String),
}
