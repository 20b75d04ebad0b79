//! Application State
//!
//! Shared service stack across all handlers.

use std::sync::Arc;

use aether_config::Settings;
use aether_engine::{SegmentCache, SegmentOrchestrator};
use aether_interpreter::{GeminiInterpreter, IntentInterpreter, RuleBasedInterpreter};
use aether_uplift::HeuristicScorer;
use aether_warehouse::InMemoryWarehouse;

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Pipeline orchestrator owning the interpreter, warehouse, model, and cache
    pub orchestrator: Arc<SegmentOrchestrator>,
    /// Loaded configuration
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Build the full service stack from settings: seeded warehouse,
    /// interpreter, scorer, cache, and the orchestrator wiring them together.
    pub fn new(settings: Settings) -> Result<Self, ServerError> {
        let warehouse = InMemoryWarehouse::seeded(&settings.warehouse)?;
        tracing::info!(
            customers = warehouse.customer_count(),
            carts = warehouse.cart_count(),
            transactions = warehouse.transaction_count(),
            "In-memory warehouse ready"
        );

        let interpreter = build_interpreter(&settings);

        // Reuse the warehouse seed so a pinned seed reproduces the whole stack
        let model = match settings.warehouse.seed {
            Some(seed) => HeuristicScorer::with_seed(settings.scoring.clone(), seed),
            None => HeuristicScorer::new(settings.scoring.clone()),
        };

        let cache = Arc::new(SegmentCache::new(&settings.cache));
        let orchestrator = SegmentOrchestrator::new(
            interpreter,
            Arc::new(warehouse),
            Arc::new(model),
            cache,
            &settings,
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            settings: Arc::new(settings),
        })
    }
}

/// Pick the intent interpreter: Gemini when an API key is configured,
/// otherwise the deterministic rule-based fallback.
fn build_interpreter(settings: &Settings) -> Arc<dyn IntentInterpreter> {
    match GeminiInterpreter::new(settings.interpreter.clone()) {
        Ok(gemini) => {
            tracing::info!(
                model = %settings.interpreter.model,
                "Using Gemini intent interpreter"
            );
            Arc::new(gemini)
        }
        Err(e) => {
            tracing::warn!(
                "Gemini interpreter unavailable ({}), using rule-based interpretation",
                e
            );
            Arc::new(RuleBasedInterpreter::new())
        }
    }
}
