//! Configuration management for ShowGraph
//!
//! Provides strongly-typed configuration with validation, environment variable parsing,
//! and sensible defaults. A `.env` file in the working directory is honoured.
//!
//! # Example
//! ```no_run
//! use showgraph::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("Neo4j URI: {}", config.neo4j.uri);
//! ```

use crate::error::{Error, Result};
use crate::recommendation::Strategy;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Neo4j connection settings
    pub neo4j: Neo4jConfig,
    /// API server configuration
    pub api: ApiConfig,
    /// Recommendation dispatcher configuration
    pub recommendation: RecommendationConfig,
    /// Log output configuration
    pub logging: LoggingConfig,
}

/// Neo4j connection configuration
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// Bolt/neo4j URI
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name
    pub database: String,
    /// Maximum connections in the driver pool
    pub max_connections: usize,
    /// Rows pulled per round trip
    pub fetch_size: usize,
    /// Connection attempts before giving up at startup
    pub connect_retries: u32,
    /// Base delay for exponential backoff between attempts
    pub retry_delay: Duration,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Host to bind to
    pub host: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Directory served under /static
    pub static_dir: PathBuf,
}

/// Recommendation dispatcher configuration
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    /// Directory holding the strategy query files
    pub query_dir: PathBuf,
    /// Limit used when a request does not name one
    pub default_limit: usize,
    /// Upper bound for requested limits
    pub max_limit: usize,
    /// Strategy used when a request does not name one
    pub default_strategy: Strategy,
    /// Serve the fixed title list when live results are unavailable
    pub mock_fallback: bool,
    /// Queries slower than this are logged at warn level
    pub slow_query_threshold: Duration,
    /// Where the CLI writes recommendation JSON files
    pub output_dir: PathBuf,
}

/// Log output configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_name: String,
    pub json: bool,
}

const NEO4J_SCHEMES: [&str; 6] = ["bolt", "bolt+s", "bolt+ssc", "neo4j", "neo4j+s", "neo4j+ssc"];

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Try to load .env file (ignore if not found)
        dotenvy::dotenv().ok();

        let config = Self {
            neo4j: Neo4jConfig::from_env()?,
            api: ApiConfig::from_env()?,
            recommendation: RecommendationConfig::from_env()?,
            logging: LoggingConfig::from_env(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let scheme = self.neo4j.uri.split("://").next().unwrap_or_default();
        if !self.neo4j.uri.contains("://") || !NEO4J_SCHEMES.contains(&scheme) {
            return Err(Error::InvalidConfig {
                key: "NEO4J_URI",
                message: format!("Unsupported Neo4j URI: {}", self.neo4j.uri).into(),
            });
        }

        if self.neo4j.user.is_empty() {
            return Err(Error::InvalidConfig {
                key: "NEO4J_USER",
                message: "Neo4j user cannot be empty".into(),
            });
        }

        if self.api.port == 0 {
            return Err(Error::InvalidConfig {
                key: "API_PORT",
                message: "Port must be non-zero".into(),
            });
        }

        let rec = &self.recommendation;
        if rec.max_limit == 0 || rec.default_limit == 0 || rec.default_limit > rec.max_limit {
            return Err(Error::InvalidConfig {
                key: "REC_DEFAULT_LIMIT",
                message: format!(
                    "default limit {} must be within 1..={}",
                    rec.default_limit, rec.max_limit
                )
                .into(),
            });
        }

        Ok(())
    }

    /// Log configuration summary (without sensitive data)
    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  Neo4j:");
        info!("    URI: {}", mask_url(&self.neo4j.uri));
        info!("    User: {}", self.neo4j.user);
        info!("    Database: {}", self.neo4j.database);
        info!("    Pool Size: {}", self.neo4j.max_connections);
        info!("  API:");
        info!("    Listening on: {}:{}", self.api.host, self.api.port);
        info!("    Static files: {}", self.api.static_dir.display());
        info!("  Recommendations:");
        info!("    Query dir: {}", self.recommendation.query_dir.display());
        info!(
            "    Default: {} (limit {}, max {})",
            self.recommendation.default_strategy,
            self.recommendation.default_limit,
            self.recommendation.max_limit
        );
        info!("    Mock fallback: {}", self.recommendation.mock_fallback);
    }
}

impl Neo4jConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            uri: get_env_or("NEO4J_URI", "bolt://localhost:7687"),
            user: get_env_or("NEO4J_USER", "neo4j"),
            password: get_env_or("NEO4J_PASSWORD", "password"),
            database: get_env_or("NEO4J_DATABASE", "neo4j"),
            max_connections: get_env_parsed_or("NEO4J_MAX_CONNECTIONS", 16)?,
            fetch_size: get_env_parsed_or("NEO4J_FETCH_SIZE", 200)?,
            connect_retries: get_env_parsed_or("NEO4J_CONNECT_RETRIES", 3)?,
            retry_delay: Duration::from_millis(get_env_parsed_or("NEO4J_RETRY_DELAY_MS", 500)?),
        })
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            port: get_env_parsed_or("API_PORT", 5000)?,
            host: get_env_or("API_HOST", "0.0.0.0"),
            request_timeout: Duration::from_secs(get_env_parsed_or(
                "API_REQUEST_TIMEOUT_SECS",
                30,
            )?),
            cors_enabled: get_env_parsed_or("API_CORS_ENABLED", true)?,
            static_dir: PathBuf::from(get_env_or("STATIC_DIR", "static")),
        })
    }
}

impl RecommendationConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            query_dir: PathBuf::from(get_env_or("QUERY_DIR", "cypher")),
            default_limit: get_env_parsed_or("REC_DEFAULT_LIMIT", 10)?,
            max_limit: get_env_parsed_or("REC_MAX_LIMIT", 50)?,
            default_strategy: get_env_parsed_or("REC_DEFAULT_STRATEGY", Strategy::Hybrid)?,
            mock_fallback: get_env_parsed_or("REC_MOCK_FALLBACK", true)?,
            slow_query_threshold: Duration::from_millis(get_env_parsed_or(
                "REC_SLOW_QUERY_MS",
                500,
            )?),
            output_dir: PathBuf::from(get_env_or("REC_OUTPUT_DIR", "outputs/recommendations")),
        })
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            query_dir: PathBuf::from("cypher"),
            default_limit: 10,
            max_limit: 50,
            default_strategy: Strategy::Hybrid,
            mock_fallback: true,
            slow_query_threshold: Duration::from_millis(500),
            output_dir: PathBuf::from("outputs/recommendations"),
        }
    }
}

impl LoggingConfig {
    fn from_env() -> Self {
        Self {
            dir: PathBuf::from(get_env_or("LOG_DIR", "outputs/logs")),
            file_name: get_env_or("LOG_FILE", "showgraph.log"),
            json: get_env_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get environment variable with default
fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when it is unset.
///
/// A value that is set but unparsable is a configuration error rather than a
/// silent fallback.
fn get_env_parsed_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
            key,
            message: format!("Invalid value '{}': {}", value, e).into(),
        }),
        Err(_) => Ok(default),
    }
}

/// Mask sensitive parts of URL
pub fn mask_url(url: &str) -> String {
    // Mask password if present
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // user without password: the only colon is the scheme separator
            if url[colon_pos..].starts_with("://") {
                return url.to_string();
            }
            let (before, after) = url.split_at(colon_pos + 1);
            let (_, rest) = after.split_at(at_pos - colon_pos - 1);
            return format!("{}****{}", before, rest);
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            neo4j: Neo4jConfig {
                uri: "bolt://localhost:7687".to_string(),
                user: "neo4j".to_string(),
                password: "secret".to_string(),
                database: "neo4j".to_string(),
                max_connections: 4,
                fetch_size: 100,
                connect_retries: 1,
                retry_delay: Duration::from_millis(10),
            },
            api: ApiConfig {
                port: 5000,
                host: "127.0.0.1".to_string(),
                request_timeout: Duration::from_secs(5),
                cors_enabled: true,
                static_dir: PathBuf::from("static"),
            },
            recommendation: RecommendationConfig::default(),
            logging: LoggingConfig {
                dir: PathBuf::from("outputs/logs"),
                file_name: "showgraph.log".to_string(),
                json: false,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_rejects_http_uri() {
        let mut config = sample();
        config.neo4j.uri = "http://localhost:7474".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfig { key: "NEO4J_URI", .. })
        ));
    }

    #[test]
    fn test_accepts_aura_uri() {
        let mut config = sample();
        config.neo4j.uri = "neo4j+s://abcd.databases.neo4j.io".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_default_limit_above_max() {
        let mut config = sample();
        config.recommendation.default_limit = 80;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("bolt://neo4j:hunter2@db:7687"),
            "bolt://neo4j:****@db:7687"
        );
        assert_eq!(mask_url("bolt://localhost:7687"), "bolt://localhost:7687");
        assert_eq!(mask_url("bolt://neo4j@db:7687"), "bolt://neo4j@db:7687");
    }
}
