//! Recommendation Module
//!
//! Produces recommended titles for ShowGraph users.
//!
//! ## Architecture
//!
//! 1. **Strategy** - Maps a strategy name to the Cypher file implementing it
//! 2. **Engine** - Dispatches a request: existence check, profile validation,
//!    query execution, post-filtering and fallback
//! 3. **Interests** - Creates users and links them to genres, actors and directors
//! 4. **Fallback** - Fixed title list served when the graph cannot answer
//!
//! The ranking itself lives in the Cypher files; this module only marshals
//! parameters and interprets rows.

pub mod engine;
pub mod fallback;
pub mod interests;
pub mod metrics;
pub mod store;
pub mod strategy;

use serde::{Deserialize, Serialize};

pub use engine::{RecommendationEngine, RecommendationOutcome};
pub use interests::{InterestKind, InterestManager, InterestSelection};
pub use store::GraphStore;
pub use strategy::Strategy;

/// A recommended title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    /// Movie or TV Show
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Interest that produced the match (interest strategy only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_interest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

impl Recommendation {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: None,
            year: None,
            score: None,
            matched_interest: None,
            entity_type: None,
        }
    }
}

/// Where a list of recommendations came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Graph,
    Fallback,
}

/// Facts about a user that decide which strategies make sense
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: i64,
    pub name: Option<String>,
    pub rated_shows: i64,
    pub interests: i64,
}

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    Success,
    Warning,
    Error,
}

/// A user-facing message returned alongside results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
        }
    }
}
