//! Campaign objective interpretation
//!
//! Turns free-text marketing objectives into structured [`CampaignIntent`]s:
//! - Gemini-backed interpreter with a pinned JSON output contract
//! - Response repair for fenced, comma-damaged, or commented model output
//! - Field-level defaulting so partial responses still yield usable intents
//! - Rule-based fallback for offline operation and tests
//!
//! [`CampaignIntent`]: aether_core::CampaignIntent

pub mod gemini;
pub mod prompt;
pub mod response;
pub mod rules;

pub use gemini::{GeminiInterpreter, IntentInterpreter};
pub use prompt::build_interpreter_prompt;
pub use response::{clean_model_payload, parse_intent};
pub use rules::RuleBasedInterpreter;

use thiserror::Error;

/// Interpretation errors
#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for InterpreterError {
    fn from(err: reqwest::Error) -> Self {
        InterpreterError::Network(err.to_string())
    }
}
