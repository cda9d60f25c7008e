/// Configuration management for Matching Service
///
/// Loads configuration from environment variables.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Compatibility inference configuration
    pub inference: InferenceConfig,
    /// Suggestion and swipe tuning
    pub matching: MatchingConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration. Without a URL the compatibility cache stays in-process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
}

/// External compatibility inference (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub enabled: bool,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl InferenceConfig {
    /// Inference is only attempted when switched on and a key is present.
    pub fn is_active(&self) -> bool {
        self.enabled && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            api_url: default_inference_url(),
            model: default_inference_model(),
            timeout_ms: 5_000,
            max_tokens: 150,
            temperature: 0.7,
        }
    }
}

/// Limits for the suggestion ranker and swipe processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Candidates fetched from the directory before scoring
    pub candidate_pool_limit: usize,
    /// Suggestions returned after ranking
    pub suggestion_limit: usize,
    /// Concurrent compatibility scoring calls per request
    pub scoring_concurrency: usize,
    /// Re-read attempts after a stale match write
    pub max_write_retries: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            candidate_pool_limit: 50,
            suggestion_limit: 10,
            scoring_concurrency: 8,
            max_write_retries: 3,
        }
    }
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_inference_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_inference_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_parse("PORT").unwrap_or(8020), // matching-service default HTTP port
        };

        let database = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable not set")?,
            max_connections: env_parse("DB_MAX_CONNECTIONS")
                .unwrap_or_else(default_max_connections),
            min_connections: env_parse("DB_MIN_CONNECTIONS")
                .unwrap_or_else(default_min_connections),
        };

        let redis = RedisConfig {
            url: std::env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),
        };

        let inference_defaults = InferenceConfig::default();
        let inference = InferenceConfig {
            enabled: env_flag("INFERENCE_ENABLED").unwrap_or(true),
            api_key: std::env::var("INFERENCE_API_KEY").ok(),
            api_url: std::env::var("INFERENCE_API_URL")
                .unwrap_or(inference_defaults.api_url),
            model: std::env::var("INFERENCE_MODEL").unwrap_or(inference_defaults.model),
            timeout_ms: env_parse("INFERENCE_TIMEOUT_MS")
                .unwrap_or(inference_defaults.timeout_ms),
            max_tokens: env_parse("INFERENCE_MAX_TOKENS")
                .unwrap_or(inference_defaults.max_tokens),
            temperature: env_parse("INFERENCE_TEMPERATURE")
                .unwrap_or(inference_defaults.temperature),
        };

        let matching_defaults = MatchingConfig::default();
        let matching = MatchingConfig {
            candidate_pool_limit: env_parse("MATCHING_CANDIDATE_POOL_LIMIT")
                .unwrap_or(matching_defaults.candidate_pool_limit),
            suggestion_limit: env_parse("MATCHING_SUGGESTION_LIMIT")
                .unwrap_or(matching_defaults.suggestion_limit),
            scoring_concurrency: env_parse::<usize>("MATCHING_SCORING_CONCURRENCY")
                .unwrap_or(matching_defaults.scoring_concurrency)
                .max(1),
            max_write_retries: env_parse("MATCHING_MAX_WRITE_RETRIES")
                .unwrap_or(matching_defaults.max_write_retries),
        };

        Ok(Config {
            app,
            database,
            redis,
            inference,
            matching,
        })
    }
}
