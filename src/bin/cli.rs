//! Command-line tools for the ShowGraph database: connectivity check, one-off
//! recommendations, new-user onboarding and data loading.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use showgraph::graph::QueryLibrary;
use showgraph::logging::init_tracing;
use showgraph::{
    Config, GraphDatabase, GraphStore, InterestSelection, Neo4jStore, RecommendationEngine,
    RecommendationOutcome, Strategy,
};

#[derive(Parser, Debug)]
#[command(
    name = "showgraph-cli",
    version,
    about = "Command-line tools for the ShowGraph recommendation database"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that Neo4j is reachable with the configured credentials
    Ping,

    /// Print recommendations for a user and save them as JSON
    Recommend {
        /// collaborative, content, hybrid, genre or interest
        #[arg(value_parser = parse_strategy)]
        strategy: Strategy,
        user_id: i64,
        #[arg(long)]
        limit: Option<usize>,
        /// Directory for the JSON output (defaults to REC_OUTPUT_DIR)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Create a user with interests and show interest-based recommendations
    NewUser {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, num_args = 0..)]
        genres: Vec<String>,
        #[arg(long, num_args = 0..)]
        actors: Vec<String>,
        #[arg(long, num_args = 0..)]
        directors: Vec<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Create indexes and import the catalog using the scripts in QUERY_DIR
    LoadData {
        /// CSV file referenced by the import script as $csvPath
        #[arg(long, default_value = "data/raw/netflix_data.csv")]
        csv: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging, "showgraph=info,neo4rs=warn,warn");

    let db = match GraphDatabase::connect(&config.neo4j).await {
        Ok(db) => db,
        Err(e) => {
            if matches!(cli.command, Command::Ping) {
                println!("❌ Failed to connect to Neo4j: {}", e);
                return Ok(());
            }
            return Err(e).context("failed to connect to Neo4j");
        }
    };
    let store: Arc<dyn GraphStore> = Arc::new(Neo4jStore::new(
        db.graph().clone(),
        config.recommendation.slow_query_threshold,
    ));
    let engine = RecommendationEngine::new(store.clone(), config.recommendation.clone());

    match cli.command {
        Command::Ping => {
            store.ping().await?;
            println!("✅ Connected to Neo4j!");
        }
        Command::Recommend {
            strategy,
            user_id,
            limit,
            output_dir,
        } => {
            let limit = engine.effective_limit(limit);
            let outcome = engine.recommend(user_id, strategy, limit).await?;
            let dir = output_dir.unwrap_or_else(|| config.recommendation.output_dir.clone());
            let path = write_outcome(&dir, &outcome).await?;
            info!("Recommendations saved to {}", path.display());

            println!("Top recommendations for user {} ({}):", user_id, strategy);
            print_outcome(&outcome);
        }
        Command::NewUser {
            user_id,
            name,
            genres,
            actors,
            directors,
            limit,
        } => {
            let interests = engine.interests();
            println!("Creating user {}...", user_id);
            interests.create_user(user_id, name.as_deref()).await?;

            println!("Adding interests...");
            let selection = InterestSelection {
                genres,
                actors,
                directors,
            };
            let linked = interests.add_interests(user_id, &selection).await?;
            if linked.is_empty() {
                println!("No valid interests found in the database.");
            }

            println!("Recommendations for user {}:", user_id);
            let recs = interests
                .recommend_from_interests(user_id, limit.clamp(1, config.recommendation.max_limit))
                .await?;
            if recs.is_empty() {
                println!("No recommendations found.");
            }
            for (i, rec) in recs.iter().enumerate() {
                println!(
                    "{}. {} ({}) - matched: {} [{}]",
                    i + 1,
                    rec.title,
                    rec.kind.as_deref().unwrap_or("?"),
                    rec.matched_interest.as_deref().unwrap_or("?"),
                    rec.year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string())
                );
            }
        }
        Command::LoadData { csv } => {
            let library = QueryLibrary::new(config.recommendation.query_dir.clone());
            for script in ["index.cypher", "import_data.cypher"] {
                let statements = library.load_script(script).await?;
                info!("Running {} ({} statements)", script, statements.len());
                for statement in &statements {
                    store
                        .run_statement(statement, vec![("csvPath".to_string(), csv.clone())])
                        .await
                        .with_context(|| format!("statement in {} failed", script))?;
                }
                println!("✅ {} applied", script);
            }
        }
    }

    db.close();
    Ok(())
}

fn parse_strategy(raw: &str) -> std::result::Result<Strategy, String> {
    raw.parse::<Strategy>().map_err(|e| e.to_string())
}

/// Write `<dir>/<strategy>_<user_id>.json`
async fn write_outcome(dir: &std::path::Path, outcome: &RecommendationOutcome) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("cannot create {}", dir.display()))?;
    let path = dir.join(format!("{}_{}.json", outcome.strategy, outcome.user_id));
    let body = serde_json::to_vec_pretty(&outcome.items)?;
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

fn print_outcome(outcome: &RecommendationOutcome) {
    for message in &outcome.messages {
        println!("[{:?}] {}", message.level, message.text);
    }
    for rec in &outcome.items {
        match rec.score {
            Some(score) => println!("- {} (Score: {:.3})", rec.title, score),
            None => println!("- {} (Score: N/A)", rec.title),
        }
    }
}
