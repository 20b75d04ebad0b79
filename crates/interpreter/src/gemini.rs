//! Gemini-backed campaign intent interpretation
//!
//! Calls the Generative Language API `generateContent` endpoint with a JSON
//! response mime type, then repairs and parses the returned payload into a
//! [`CampaignIntent`]. Request and response types cover only the fields
//! this crate uses.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use aether_config::InterpreterConfig;
use aether_core::CampaignIntent;

use crate::prompt::build_interpreter_prompt;
use crate::response::parse_intent;
use crate::InterpreterError;

/// Turns a natural-language campaign objective into a structured intent.
#[async_trait]
pub trait IntentInterpreter: Send + Sync {
    /// Interpret a campaign objective.
    ///
    /// Implementations must return a fully populated intent: fields the
    /// source text does not pin down carry their documented defaults.
    async fn interpret(&self, objective: &str) -> Result<CampaignIntent, InterpreterError>;
}

/// Interpreter backed by the Gemini `generateContent` API.
#[derive(Debug)]
pub struct GeminiInterpreter {
    config: InterpreterConfig,
    api_key: String,
    client: Client,
}

impl GeminiInterpreter {
    /// Create a new Gemini interpreter.
    ///
    /// Fails when no API key is configured; callers that want to run
    /// without one should fall back to [`crate::RuleBasedInterpreter`].
    pub fn new(config: InterpreterConfig) -> Result<Self, InterpreterError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                InterpreterError::Configuration(
                    "GEMINI_API_KEY not set. Set it via environment or config.".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| InterpreterError::Network(e.to_string()))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Build the `generateContent` URL for the configured model.
    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, objective: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: build_interpreter_prompt(objective),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                response_mime_type: "application/json".to_string(),
            },
        }
    }
}

#[async_trait]
impl IntentInterpreter for GeminiInterpreter {
    async fn interpret(&self, objective: &str) -> Result<CampaignIntent, InterpreterError> {
        let request = self.build_request(objective);

        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InterpreterError::Api(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| InterpreterError::InvalidResponse(e.to_string()))?;
        let text = body.first_text().ok_or_else(|| {
            InterpreterError::InvalidResponse("response contained no text parts".to_string())
        })?;

        tracing::debug!(
            model = %self.config.model,
            raw = %preview(&text),
            "interpreter response received"
        );

        let intent = parse_intent(&text)?;
        tracing::debug!(
            campaign_goal = %intent.campaign_goal,
            target_behavior = %intent.target_behavior,
            proposed_intervention = %intent.proposed_intervention,
            "campaign objective interpreted"
        );
        Ok(intent)
    }
}

/// First 300 characters, for debug logging.
fn preview(text: &str) -> String {
    text.chars().take(300).collect()
}

// =============================================================================
// Generative Language API types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate, if any.
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> InterpreterConfig {
        InterpreterConfig {
            api_key: Some("test-key".to_string()),
            ..InterpreterConfig::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = InterpreterConfig {
            api_key: None,
            ..InterpreterConfig::default()
        };
        let err = GeminiInterpreter::new(config).unwrap_err();
        assert!(matches!(err, InterpreterError::Configuration(_)));

        let config = InterpreterConfig {
            api_key: Some(String::new()),
            ..InterpreterConfig::default()
        };
        assert!(GeminiInterpreter::new(config).is_err());
    }

    #[test]
    fn test_request_url_includes_model() {
        let interpreter = GeminiInterpreter::new(config_with_key()).unwrap();
        assert_eq!(
            interpreter.request_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let interpreter = GeminiInterpreter::new(config_with_key()).unwrap();
        let request = interpreter.build_request("Recover abandoned carts");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["contents"][0]["role"], "user");
        let prompt = json["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("Recover abandoned carts"));
    }

    #[test]
    fn test_response_text_extraction() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "{\"campaign_goal\""}, {"text": ": \"conversion\"}"}]}}
            ]
        }"#;
        let response: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response.first_text().unwrap(),
            "{\"campaign_goal\": \"conversion\"}"
        );

        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(empty.first_text().is_none());
    }
}
