//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, simulated integrations allowed
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Warehouse configuration
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Intent interpreter (LLM) configuration
    #[serde(default)]
    pub interpreter: InterpreterConfig,

    /// Uplift scoring weights
    #[serde(default)]
    pub scoring: ScoringWeights,

    /// Query construction tuning
    #[serde(default)]
    pub query: QueryTuning,

    /// Segment sizing limits
    #[serde(default)]
    pub segmentation: SegmentationLimits,

    /// Segment cache policy
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_scoring()?;
        self.validate_query()?;
        self.validate_segmentation()?;
        self.validate_interpreter()?;
        self.validate_cache()?;
        Ok(())
    }

    /// Validate scoring weights
    fn validate_scoring(&self) -> Result<(), ConfigError> {
        let scoring = &self.scoring;

        for (field, value) in [
            ("scoring.sensitivity_weight", scoring.sensitivity_weight),
            ("scoring.effectiveness_weight", scoring.effectiveness_weight),
            ("scoring.alignment_bonus", scoring.alignment_bonus),
            ("scoring.confidence_threshold", scoring.confidence_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be between 0.0 and 1.0, got {}", value),
                });
            }
        }

        if !(0.0..=1.0).contains(&scoring.uplift_floor)
            || !(0.0..=1.0).contains(&scoring.uplift_ceiling)
        {
            return Err(ConfigError::InvalidValue {
                field: "scoring.uplift_floor".to_string(),
                message: "Uplift bounds must be between 0.0 and 1.0".to_string(),
            });
        }

        if scoring.uplift_floor >= scoring.uplift_ceiling {
            return Err(ConfigError::InvalidValue {
                field: "scoring.uplift_floor".to_string(),
                message: format!(
                    "Floor {} must be below ceiling {}",
                    scoring.uplift_floor, scoring.uplift_ceiling
                ),
            });
        }

        Ok(())
    }

    /// Validate query construction thresholds
    fn validate_query(&self) -> Result<(), ConfigError> {
        let query = &self.query;

        for (field, value) in [
            ("query.churn_threshold", query.churn_threshold),
            ("query.engagement_threshold", query.engagement_threshold),
            ("query.high_value_clv", query.high_value_clv),
            (
                "query.default_uplift_threshold",
                query.default_uplift_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be between 0.0 and 1.0, got {}", value),
                });
            }
        }

        if query.cart_recency_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "query.cart_recency_days".to_string(),
                message: "Must be at least 1 day".to_string(),
            });
        }

        if query.retention_min_days >= query.retention_max_days {
            return Err(ConfigError::InvalidValue {
                field: "query.retention_min_days".to_string(),
                message: format!(
                    "Lower bound {} must be below upper bound {}",
                    query.retention_min_days, query.retention_max_days
                ),
            });
        }

        Ok(())
    }

    /// Validate segment sizing limits
    fn validate_segmentation(&self) -> Result<(), ConfigError> {
        let limits = &self.segmentation;

        if limits.max_segment_size < limits.min_segment_size {
            return Err(ConfigError::InvalidValue {
                field: "segmentation.max_segment_size".to_string(),
                message: format!(
                    "Maximum {} is below minimum {}",
                    limits.max_segment_size, limits.min_segment_size
                ),
            });
        }

        if limits.sample_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "segmentation.sample_size".to_string(),
                message: "Sample size must be positive".to_string(),
            });
        }

        if limits.profile_preview_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "segmentation.profile_preview_limit".to_string(),
                message: "Preview limit must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// Validate interpreter configuration
    fn validate_interpreter(&self) -> Result<(), ConfigError> {
        let interpreter = &self.interpreter;

        if !(0.0..=2.0).contains(&interpreter.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "interpreter.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", interpreter.temperature),
            });
        }

        if interpreter.max_output_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interpreter.max_output_tokens".to_string(),
                message: "Token budget must be positive".to_string(),
            });
        }

        if interpreter.model.is_empty() {
            return Err(ConfigError::MissingField("interpreter.model".to_string()));
        }

        Ok(())
    }

    /// Validate cache policy
    fn validate_cache(&self) -> Result<(), ConfigError> {
        if self.cache.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.capacity".to_string(),
                message: "Capacity must be positive".to_string(),
            });
        }

        if self.cache.ttl_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_hours".to_string(),
                message: "TTL must be at least one hour".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// CORS allowed origins (empty = allow any origin)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_origins: Vec::new(),
        }
    }
}

/// Customer data warehouse configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Dataset holding the customer, score, cart and transaction tables
    #[serde(default = "default_dataset")]
    pub dataset: String,

    /// Number of customers to seed into the in-memory warehouse
    #[serde(default = "default_seed_customers")]
    pub seed_customers: usize,

    /// Fixed RNG seed for reproducible synthetic data (None = entropy)
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_dataset() -> String {
    "aethersegment_cdp".to_string()
}

fn default_seed_customers() -> usize {
    5000
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            seed_customers: default_seed_customers(),
            seed: None,
        }
    }
}

/// Intent interpreter (LLM) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum tokens in the model response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Generative Language API base URL
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// API key (falls back to the GEMINI_API_KEY env var)
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_interpreter_timeout")]
    pub timeout_seconds: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_api_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_api_key() -> Option<String> {
    std::env::var("GEMINI_API_KEY").ok()
}

fn default_interpreter_timeout() -> u64 {
    20
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            api_endpoint: default_api_endpoint(),
            api_key: default_api_key(),
            timeout_seconds: default_interpreter_timeout(),
        }
    }
}

/// Weights for the heuristic uplift model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight on the cohort's trigger sensitivity
    #[serde(default = "default_sensitivity_weight")]
    pub sensitivity_weight: f64,

    /// Weight on the trigger's base effectiveness
    #[serde(default = "default_effectiveness_weight")]
    pub effectiveness_weight: f64,

    /// CLV contribution to value-driven triggers
    #[serde(default = "default_clv_coefficient")]
    pub clv_coefficient: f64,

    /// Bonus when the trigger matches the campaign behavior
    #[serde(default = "default_alignment_bonus")]
    pub alignment_bonus: f64,

    /// Lower clip for predicted uplift
    #[serde(default = "default_uplift_floor")]
    pub uplift_floor: f64,

    /// Upper clip for predicted uplift
    #[serde(default = "default_uplift_ceiling")]
    pub uplift_ceiling: f64,

    /// Score above which a customer counts toward trigger confidence
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
}

fn default_sensitivity_weight() -> f64 {
    0.7
}

fn default_effectiveness_weight() -> f64 {
    0.3
}

fn default_clv_coefficient() -> f64 {
    0.15
}

fn default_alignment_bonus() -> f64 {
    0.08
}

fn default_uplift_floor() -> f64 {
    0.15
}

fn default_uplift_ceiling() -> f64 {
    0.95
}

fn default_confidence_threshold() -> f64 {
    0.65
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sensitivity_weight: default_sensitivity_weight(),
            effectiveness_weight: default_effectiveness_weight(),
            clv_coefficient: default_clv_coefficient(),
            alignment_bonus: default_alignment_bonus(),
            uplift_floor: default_uplift_floor(),
            uplift_ceiling: default_uplift_ceiling(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Thresholds and windows used when building segment queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTuning {
    /// Churn probability above which a customer counts as lapsing
    #[serde(default = "default_churn_threshold")]
    pub churn_threshold: f64,

    /// Content engagement score marking a highly engaged customer
    #[serde(default = "default_engagement_threshold")]
    pub engagement_threshold: f64,

    /// CLV score marking a high-value customer
    #[serde(default = "default_high_value_clv")]
    pub high_value_clv: f64,

    /// How recent an abandoned cart must be, in days
    #[serde(default = "default_cart_recency_days")]
    pub cart_recency_days: u32,

    /// Recent-transaction window for cross-sell targeting, in days
    #[serde(default = "default_recent_transaction_days")]
    pub recent_transaction_days: u32,

    /// Lower bound of the retention inactivity window, in days
    #[serde(default = "default_retention_min_days")]
    pub retention_min_days: u32,

    /// Upper bound of the retention inactivity window, in days
    #[serde(default = "default_retention_max_days")]
    pub retention_max_days: u32,

    /// Account age ceiling for new-customer targeting, in days
    #[serde(default = "default_new_customer_days")]
    pub new_customer_days: u32,

    /// Sensitivity threshold applied when a trigger implies one
    #[serde(default = "default_uplift_threshold")]
    pub default_uplift_threshold: f64,
}

fn default_churn_threshold() -> f64 {
    0.6
}

fn default_engagement_threshold() -> f64 {
    0.7
}

fn default_high_value_clv() -> f64 {
    0.75
}

fn default_cart_recency_days() -> u32 {
    7
}

fn default_recent_transaction_days() -> u32 {
    30
}

fn default_retention_min_days() -> u32 {
    30
}

fn default_retention_max_days() -> u32 {
    90
}

fn default_new_customer_days() -> u32 {
    7
}

fn default_uplift_threshold() -> f64 {
    0.65
}

impl Default for QueryTuning {
    fn default() -> Self {
        Self {
            churn_threshold: default_churn_threshold(),
            engagement_threshold: default_engagement_threshold(),
            high_value_clv: default_high_value_clv(),
            cart_recency_days: default_cart_recency_days(),
            recent_transaction_days: default_recent_transaction_days(),
            retention_min_days: default_retention_min_days(),
            retention_max_days: default_retention_max_days(),
            new_customer_days: default_new_customer_days(),
            default_uplift_threshold: default_uplift_threshold(),
        }
    }
}

/// Segment sizing limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationLimits {
    /// Smallest segment worth activating
    #[serde(default = "default_min_segment_size")]
    pub min_segment_size: usize,

    /// Hard cap on segment size
    #[serde(default = "default_max_segment_size")]
    pub max_segment_size: usize,

    /// Row cap for analysis-time sampling
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Customer profiles embedded in a segment response
    #[serde(default = "default_profile_preview_limit")]
    pub profile_preview_limit: usize,
}

fn default_min_segment_size() -> usize {
    100
}

fn default_max_segment_size() -> usize {
    50_000
}

fn default_sample_size() -> usize {
    1000
}

fn default_profile_preview_limit() -> usize {
    100
}

impl Default for SegmentationLimits {
    fn default() -> Self {
        Self {
            min_segment_size: default_min_segment_size(),
            max_segment_size: default_max_segment_size(),
            sample_size: default_sample_size(),
            profile_preview_limit: default_profile_preview_limit(),
        }
    }
}

/// Segment cache policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached segments before eviction
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Hours a cached segment stays valid
    #[serde(default = "default_cache_ttl_hours")]
    pub ttl_hours: u64,
}

fn default_cache_capacity() -> usize {
    256
}

fn default_cache_ttl_hours() -> u64 {
    24
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_hours: default_cache_ttl_hours(),
        }
    }
}

/// Load settings from configuration sources
///
/// Priority (highest to lowest):
/// 1. Environment variables (AETHER_ prefix)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix("AETHER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    // Validate
    settings.validate()?;

    Ok(settings)
}
