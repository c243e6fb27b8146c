//! The graph access seam used by the dispatcher and the interest helper.
//!
//! `crate::graph::Neo4jStore` is the production implementation; tests supply
//! in-memory stores.

use async_trait::async_trait;

use super::interests::InterestKind;
use super::{Recommendation, UserProfile};
use crate::error::Result;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Cheap round trip used by health checks
    async fn ping(&self) -> Result<()>;

    async fn user_exists(&self, user_id: i64) -> Result<bool>;

    /// Rated-show and interest counts for an existing user
    async fn user_profile(&self, user_id: i64) -> Result<UserProfile>;

    /// Run an externally authored recommendation query with `$userId` and `$limit`
    async fn run_recommendation_query(
        &self,
        cypher: &str,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Recommendation>>;

    /// Titles connected to the user's declared interests
    async fn interest_recommendations(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<Recommendation>>;

    /// Create the user if missing; `None` keeps the stored name
    async fn upsert_user(&self, user_id: i64, name: Option<&str>) -> Result<()>;

    /// The subset of `names` that exist as nodes of the given kind
    async fn existing_names(&self, kind: InterestKind, names: &[String]) -> Result<Vec<String>>;

    async fn link_interests(&self, user_id: i64, kind: InterestKind, names: &[String])
        -> Result<()>;

    /// Sorted node names of the given kind, optionally capped
    async fn catalog_names(&self, kind: InterestKind, limit: Option<usize>) -> Result<Vec<String>>;

    /// Execute a statement for its side effects
    async fn run_statement(&self, cypher: &str, params: Vec<(String, String)>) -> Result<()>;
}
