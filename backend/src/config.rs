//! Configuration management for the Larder backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with LARDER_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Outbound email configuration
    pub email: EmailConfig,

    /// Language model and embedding provider configuration
    pub ai: AiConfig,

    /// Trash retention configuration
    pub retention: RetentionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,

    /// Password reset token expiration in seconds
    pub reset_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    /// Transactional email API endpoint; empty disables outbound email
    pub api_endpoint: String,

    /// Email API key
    pub api_key: String,

    /// Sender address
    pub sender: String,

    /// Public application URL used in email links
    pub app_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// Whether the chat assistant and embeddings are enabled
    pub enabled: bool,

    /// OpenAI-compatible API endpoint
    pub endpoint: String,

    /// API key
    pub api_key: String,

    /// Chat completion model name
    pub chat_model: String,

    /// Embedding model name (must produce 1536-dimension vectors)
    pub embedding_model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetentionConfig {
    /// Days a soft-deleted item stays recoverable before the sweep purges it
    pub trash_days: i64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("LARDER_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("jwt.reset_token_expiry", 1800)?
            .set_default("email.api_endpoint", "")?
            .set_default("email.api_key", "")?
            .set_default("email.sender", "")?
            .set_default("email.app_url", "http://localhost:3000")?
            .set_default("ai.enabled", false)?
            .set_default("ai.endpoint", "")?
            .set_default("ai.api_key", "")?
            .set_default("ai.chat_model", "gpt-4o-mini")?
            .set_default("ai.embedding_model", "text-embedding-3-small")?
            .set_default("retention.trash_days", 30)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (LARDER_ prefix)
            .add_source(
                Environment::with_prefix("LARDER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
