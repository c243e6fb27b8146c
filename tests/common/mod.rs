//! In-memory `GraphStore` shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use showgraph::config::{ApiConfig, RecommendationConfig};
use showgraph::{Error, GraphStore, InterestKind, Recommendation, Result, UserProfile};

#[derive(Default)]
pub struct FakeStore {
    pub users: Mutex<HashMap<i64, UserProfile>>,
    pub catalog: HashMap<InterestKind, Vec<String>>,
    pub links: Mutex<Vec<(i64, InterestKind, String)>>,
    /// Rows returned by any strategy query file
    pub rows: Vec<Recommendation>,
    /// Rows returned by the interest query
    pub interest_rows: Vec<Recommendation>,
    /// Query text received by `run_recommendation_query`
    pub queries: Mutex<Vec<String>>,
    /// Every call fails as if Neo4j were down
    pub unavailable: bool,
    /// Profile reads fail while everything else works
    pub fail_profile: bool,
    /// Recommendation queries fail after the existence check succeeded
    pub fail_queries: bool,
}

impl FakeStore {
    pub fn with_user(self, user_id: i64, rated_shows: i64) -> Self {
        self.users.lock().unwrap().insert(
            user_id,
            UserProfile {
                user_id,
                rated_shows,
                ..Default::default()
            },
        );
        self
    }

    pub fn with_catalog(mut self, kind: InterestKind, names: &[&str]) -> Self {
        self.catalog
            .insert(kind, names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_rows(mut self, titles: &[&str]) -> Self {
        self.rows = scored(titles);
        self
    }

    pub fn down() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        fail_if(self.unavailable)
    }
}

fn fail_if(down: bool) -> Result<()> {
    if down {
        Err(Error::graph("Failed to connect to Neo4j"))
    } else {
        Ok(())
    }
}

pub fn scored(titles: &[&str]) -> Vec<Recommendation> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| Recommendation {
            score: Some(1.0 - i as f64 / 10.0),
            ..Recommendation::titled(*title)
        })
        .collect()
}

#[async_trait]
impl GraphStore for FakeStore {
    async fn ping(&self) -> Result<()> {
        self.check()
    }

    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        self.check()?;
        Ok(self.users.lock().unwrap().contains_key(&user_id))
    }

    async fn user_profile(&self, user_id: i64) -> Result<UserProfile> {
        self.check()?;
        fail_if(self.fail_profile)?;
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| Error::not_found("user", user_id.to_string()))
    }

    async fn run_recommendation_query(
        &self,
        cypher: &str,
        _user_id: i64,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        self.check()?;
        fail_if(self.fail_queries)?;
        self.queries.lock().unwrap().push(cypher.to_string());
        Ok(self.rows.iter().take(limit).cloned().collect())
    }

    async fn interest_recommendations(
        &self,
        _user_id: i64,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        self.check()?;
        fail_if(self.fail_queries)?;
        Ok(self.interest_rows.iter().take(limit).cloned().collect())
    }

    async fn upsert_user(&self, user_id: i64, name: Option<&str>) -> Result<()> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let user = users.entry(user_id).or_insert_with(|| UserProfile {
            user_id,
            ..Default::default()
        });
        if let Some(name) = name {
            user.name = Some(name.to_string());
        }
        Ok(())
    }

    async fn existing_names(&self, kind: InterestKind, names: &[String]) -> Result<Vec<String>> {
        self.check()?;
        let known = self.catalog.get(&kind).cloned().unwrap_or_default();
        Ok(names.iter().filter(|n| known.contains(n)).cloned().collect())
    }

    async fn link_interests(
        &self,
        user_id: i64,
        kind: InterestKind,
        names: &[String],
    ) -> Result<()> {
        self.check()?;
        let mut links = self.links.lock().unwrap();
        links.extend(names.iter().map(|n| (user_id, kind, n.clone())));
        Ok(())
    }

    async fn catalog_names(&self, kind: InterestKind, limit: Option<usize>) -> Result<Vec<String>> {
        self.check()?;
        let mut names = self.catalog.get(&kind).cloned().unwrap_or_default();
        names.sort();
        if let Some(limit) = limit {
            names.truncate(limit);
        }
        Ok(names)
    }

    async fn run_statement(&self, _cypher: &str, _params: Vec<(String, String)>) -> Result<()> {
        self.check()
    }
}

/// Write one query file per file-backed strategy, each tagged with its name
pub fn write_query_files(dir: &Path) {
    for (file, tag) in [
        ("collaborative_filtering.cypher", "collaborative"),
        ("content_based.cypher", "content"),
        ("Hybrid_Recommendation.cypher", "hybrid"),
        ("Genre_Based.cypher", "genre"),
    ] {
        std::fs::write(
            dir.join(file),
            format!("// {}\nMATCH (s:Show) RETURN s.title AS title LIMIT $limit;\n", tag),
        )
        .unwrap();
    }
}

pub fn rec_config(query_dir: &Path) -> RecommendationConfig {
    RecommendationConfig {
        query_dir: query_dir.to_path_buf(),
        ..Default::default()
    }
}

pub fn api_config(static_dir: &Path) -> ApiConfig {
    ApiConfig {
        port: 0,
        host: "127.0.0.1".to_string(),
        request_timeout: Duration::from_secs(5),
        cors_enabled: false,
        static_dir: static_dir.to_path_buf(),
    }
}
