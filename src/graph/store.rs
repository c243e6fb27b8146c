//! `GraphStore` over the neo4rs driver.

use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, Graph, Query, Row};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::recommendation::metrics::PerformanceTimer;
use crate::recommendation::{GraphStore, InterestKind, Recommendation, UserProfile};

const USER_EXISTS: &str = "MATCH (u:User {userId: $userId}) RETURN count(u) > 0 AS exists";

const USER_PROFILE: &str = r#"
MATCH (u:User {userId: $userId})
OPTIONAL MATCH (u)-[r:RATED]->(:Show)
WITH u, count(r) AS rated
OPTIONAL MATCH (u)-[:INTERESTED_IN]->(i)
RETURN u.name AS name, rated AS rated_shows, count(i) AS interests
"#;

const UPSERT_USER: &str = r#"
MERGE (u:User {userId: $userId})
SET u.name = coalesce($name, u.name)
RETURN u.userId AS userId
"#;

const INTEREST_RECOMMENDATIONS: &str = r#"
MATCH (u:User {userId: $userId})-[:INTERESTED_IN]->(entity)
MATCH (s:Show)
WHERE ((s)-[:FEATURES]->(entity) OR (s)-[:DIRECTED_BY]->(entity) OR (s)-[:IN_GENRE]->(entity))
  AND NOT EXISTS { (u)-[:RATED]->(s) }
WITH s, collect(entity) AS matched
WITH s, matched[0] AS entity
RETURN s.title AS title,
       s.type AS type,
       labels(entity)[0] AS entityType,
       entity.name AS matchedInterest,
       s.release_year AS year
ORDER BY year DESC, title
LIMIT $limit
"#;

/// Score columns used by the strategy files, in lookup order
const SCORE_COLUMNS: [&str; 4] = ["score", "finalScore", "similarityScore", "predictedScore"];

/// Neo4j-backed graph access
#[derive(Clone)]
pub struct Neo4jStore {
    graph: Graph,
    slow_query_threshold: Duration,
}

impl Neo4jStore {
    pub fn new(graph: Graph, slow_query_threshold: Duration) -> Self {
        Self {
            graph,
            slow_query_threshold,
        }
    }

    /// Execute a query and collect every row
    async fn fetch_all(&self, label: &str, q: Query) -> Result<Vec<Row>> {
        let timer = PerformanceTimer::new(label);
        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| Error::graph_with_source(format!("{} failed", label), e))?;

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        timer.log_if_slow(self.slow_query_threshold);
        debug!("{} returned {} rows", label, rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn ping(&self) -> Result<()> {
        let rows = self.fetch_all("ping", query("RETURN 1 AS ok")).await?;
        if rows.is_empty() {
            return Err(Error::graph("Ping returned no rows"));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        let rows = self
            .fetch_all("user_exists", query(USER_EXISTS).param("userId", user_id))
            .await?;
        match rows.first() {
            Some(row) => row.get::<bool>("exists").map_err(|e| Error::RowDecode {
                column: "exists",
                message: e.to_string(),
            }),
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn user_profile(&self, user_id: i64) -> Result<UserProfile> {
        let rows = self
            .fetch_all("user_profile", query(USER_PROFILE).param("userId", user_id))
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| Error::not_found("user", user_id.to_string()))?;

        Ok(UserProfile {
            user_id,
            name: row.get::<Option<String>>("name").ok().flatten(),
            rated_shows: row.get::<i64>("rated_shows").unwrap_or(0),
            interests: row.get::<i64>("interests").unwrap_or(0),
        })
    }

    #[instrument(skip(self, cypher))]
    async fn run_recommendation_query(
        &self,
        cypher: &str,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let q = query(cypher)
            .param("userId", user_id)
            .param("limit", limit as i64);
        let rows = self.fetch_all("recommendation_query", q).await?;
        Ok(rows.iter().map(recommendation_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn interest_recommendations(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let q = query(INTEREST_RECOMMENDATIONS)
            .param("userId", user_id)
            .param("limit", limit as i64);
        let rows = self.fetch_all("interest_recommendations", q).await?;
        Ok(rows.iter().map(recommendation_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn upsert_user(&self, user_id: i64, name: Option<&str>) -> Result<()> {
        let name = match name {
            Some(name) => BoltType::from(name),
            None => BoltType::Null(BoltNull),
        };
        self.fetch_all(
            "upsert_user",
            query(UPSERT_USER).param("userId", user_id).param("name", name),
        )
        .await?;
        Ok(())
    }

    async fn existing_names(&self, kind: InterestKind, names: &[String]) -> Result<Vec<String>> {
        let cypher = format!(
            "MATCH (n:{}) WHERE n.name IN $items RETURN n.name AS name",
            kind.label()
        );
        let rows = self
            .fetch_all("existing_names", query(&cypher).param("items", names.to_vec()))
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get::<String>("name").ok())
            .collect())
    }

    async fn link_interests(
        &self,
        user_id: i64,
        kind: InterestKind,
        names: &[String],
    ) -> Result<()> {
        let cypher = format!(
            "MATCH (u:User {{userId: $userId}})\n\
             MATCH (n:{}) WHERE n.name IN $items\n\
             MERGE (u)-[:INTERESTED_IN]->(n)",
            kind.label()
        );
        self.graph
            .run(
                query(&cypher)
                    .param("userId", user_id)
                    .param("items", names.to_vec()),
            )
            .await
            .map_err(|e| Error::graph_with_source("link_interests failed", e))
    }

    async fn catalog_names(&self, kind: InterestKind, limit: Option<usize>) -> Result<Vec<String>> {
        let mut cypher = format!(
            "MATCH (n:{}) RETURN n.name AS name ORDER BY n.name",
            kind.label()
        );
        if let Some(limit) = limit {
            cypher.push_str(&format!(" LIMIT {}", limit));
        }
        let rows = self.fetch_all("catalog_names", query(&cypher)).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get::<String>("name").ok())
            .collect())
    }

    #[instrument(skip(self, cypher, params))]
    async fn run_statement(&self, cypher: &str, params: Vec<(String, String)>) -> Result<()> {
        let mut q = query(cypher);
        for (key, value) in params {
            q = q.param(&key, value);
        }
        self.graph
            .run(q)
            .await
            .map_err(|e| Error::graph_with_source("Statement failed", e))
    }
}

/// Map a result row onto a recommendation.
///
/// Strategy files name the title column either `title` or `recommendation`;
/// a row with neither yields a blank title that post-filtering drops.
fn recommendation_from_row(row: &Row) -> Recommendation {
    let title = row
        .get::<String>("title")
        .or_else(|_| row.get::<String>("recommendation"))
        .unwrap_or_default();

    Recommendation {
        title,
        kind: opt_string(row, "type"),
        year: row
            .get::<Option<i64>>("year")
            .or_else(|_| row.get::<Option<i64>>("release_year"))
            .ok()
            .flatten(),
        score: SCORE_COLUMNS
            .iter()
            .find_map(|column| row.get::<Option<f64>>(column).ok().flatten()),
        matched_interest: opt_string(row, "matchedInterest"),
        entity_type: opt_string(row, "entityType"),
    }
}

fn opt_string(row: &Row, column: &str) -> Option<String> {
    row.get::<Option<String>>(column).ok().flatten()
}
