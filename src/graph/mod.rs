//! Neo4j connection pool and utilities
//!
//! Provides the Bolt connection pool with:
//! - Configurable pool size and fetch size
//! - Lazy connections, with an optional startup wait using exponential backoff
//! - Health checking
//! - The `GraphStore` implementation used by the engine

pub mod script;
pub mod store;

use crate::config::Neo4jConfig;
use crate::error::{Error, Result};
use neo4rs::{query, ConfigBuilder, Graph};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub use script::{split_statements, QueryLibrary};
pub use store::Neo4jStore;

/// Neo4j connection pool
#[derive(Clone)]
pub struct GraphDatabase {
    graph: Graph,
    uri: String,
}

impl GraphDatabase {
    /// Open the pool and wait until Neo4j answers, retrying transient failures
    #[instrument(skip(config), fields(uri = %crate::config::mask_url(&config.uri)))]
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let db = Self::open(config).await?;
        db.wait_until_ready(config.connect_retries, config.retry_delay)
            .await?;
        Ok(db)
    }

    /// Build the connection pool without contacting the server.
    ///
    /// Connections are opened on first use, so a database that is down at
    /// startup is picked up once it comes back.
    pub async fn open(config: &Neo4jConfig) -> Result<Self> {
        debug!(
            "Graph config: db={}, max_connections={}, fetch_size={}",
            config.database, config.max_connections, config.fetch_size
        );

        let driver_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.as_str())
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| Error::config(format!("Invalid Neo4j configuration: {}", e)))?;

        let graph = Graph::connect(driver_config)
            .await
            .map_err(|e| Error::config(format!("Invalid Neo4j configuration: {}", e)))?;

        Ok(Self {
            graph,
            uri: config.uri.clone(),
        })
    }

    /// Run health checks until one succeeds or `attempts` are used up
    pub async fn wait_until_ready(&self, attempts: u32, delay: Duration) -> Result<()> {
        with_retry(|| self.health_check(), attempts.max(1), delay).await?;
        info!("Connected to Neo4j at {}", crate::config::mask_url(&self.uri));
        Ok(())
    }

    /// Get a handle to the underlying driver
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Check if the database answers queries
    pub async fn health_check(&self) -> Result<()> {
        let mut rows = self
            .graph
            .execute(query("RETURN 1 AS ok"))
            .await
            .map_err(|e| Error::graph_with_source("Health check failed", e))?;

        match rows.next().await? {
            Some(row) if row.get::<i64>("ok").ok() == Some(1) => Ok(()),
            _ => Err(Error::graph("Health check returned no rows")),
        }
    }

    /// Release this handle; the pool closes once every clone is gone
    pub fn close(self) {
        drop(self.graph);
        info!("Neo4j connection pool released");
    }
}

/// Retry helper for graph operations
pub async fn with_retry<T, F, Fut>(
    mut operation: F,
    max_retries: u32,
    initial_delay: Duration,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay = initial_delay;
    let mut last_error = None;

    for attempt in 0..max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() {
                    return Err(e);
                }

                warn!(
                    "Graph operation failed (attempt {}/{}): {}",
                    attempt + 1,
                    max_retries,
                    e
                );

                last_error = Some(e);

                if attempt + 1 < max_retries {
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, Duration::from_secs(30));
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::graph("Max retries exceeded")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::graph("connection refused"))
                } else {
                    Ok(42)
                }
            },
            3,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::config("bad uri"))
            },
            5,
            Duration::from_millis(1),
        )
        .await;

        assert!(matches!(result, Err(Error::Config { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn unreachable_config() -> Neo4jConfig {
        Neo4jConfig {
            uri: "bolt://127.0.0.1:1".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            max_connections: 2,
            fetch_size: 10,
            connect_retries: 2,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_open_does_not_need_a_running_server() {
        let db = GraphDatabase::open(&unreachable_config()).await.unwrap();

        let err = db.health_check().await.unwrap_err();
        assert!(err.is_unavailable());

        let err = db
            .wait_until_ready(2, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_connect_fails_when_server_never_answers() {
        let result = GraphDatabase::connect(&unreachable_config()).await;
        assert!(matches!(result, Err(Error::Graph { .. })));
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let result: Result<()> = with_retry(
            || async { Err(Error::graph("down")) },
            2,
            Duration::from_millis(1),
        )
        .await;

        assert!(matches!(result, Err(Error::Graph { .. })));
    }
}
