//! ShowGraph Server
//!
//! Serves title recommendations computed by Cypher strategies over Neo4j.
//!
//! # Architecture
//!
//! - **Router**: form endpoints and the JSON recommendation endpoint
//! - **Dispatcher**: maps a strategy to its query file and applies the fallback policy
//! - **Graph client**: pooled Bolt connections to Neo4j, opened lazily so the
//!   server also starts while the database is down
//!
//! # Graceful Shutdown
//!
//! The server handles SIGTERM and SIGINT signals, ensuring:
//! - In-flight requests complete
//! - The Neo4j pool is released

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use showgraph::api::{self, AppState};
use showgraph::logging::init_tracing;
use showgraph::{Config, GraphDatabase, Neo4jStore, RecommendationEngine, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing with structured logging
    let _log_guard = init_tracing(
        &config.logging,
        "showgraph=debug,tower_http=debug,neo4rs=warn,info",
    );

    info!("═══════════════════════════════════════════════════════════════");
    info!("  ShowGraph Recommendation Server v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════════════════════════");
    config.log_summary();

    // Initialize Neo4j connection pool; connections open lazily
    let db = GraphDatabase::open(&config.neo4j).await?;
    match db
        .wait_until_ready(config.neo4j.connect_retries, config.neo4j.retry_delay)
        .await
    {
        Ok(()) => info!("✅ Neo4j connection established successfully"),
        Err(e) => warn!(
            "Neo4j is unavailable at startup ({}); serving fallback recommendations until it answers",
            e
        ),
    }

    let store = Neo4jStore::new(
        db.graph().clone(),
        config.recommendation.slow_query_threshold,
    );
    let engine = RecommendationEngine::new(Arc::new(store), config.recommendation.clone());
    let state = Arc::new(AppState { engine });

    info!(
        "  📡 API: http://{}:{}",
        config.api.host, config.api.port
    );
    info!(
        "  🔗 Health: http://{}:{}/health",
        config.api.host, config.api.port
    );

    if let Err(e) = api::start_server(state, &config.api, shutdown_signal()).await {
        error!("API server error: {:?}", e);
    }

    db.close();
    info!("👋 ShowGraph stopped gracefully");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("📴 Shutdown signal received");
}
