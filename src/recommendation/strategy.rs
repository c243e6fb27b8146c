//! Recommendation strategies and the query files that implement them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A named recommendation strategy.
///
/// Every strategy except `Interest` is backed by an externally authored Cypher
/// file; `Interest` uses the built-in interest query for users without ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Collaborative,
    Content,
    #[default]
    Hybrid,
    Genre,
    Interest,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Collaborative,
        Strategy::Content,
        Strategy::Hybrid,
        Strategy::Genre,
        Strategy::Interest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Collaborative => "collaborative",
            Strategy::Content => "content",
            Strategy::Hybrid => "hybrid",
            Strategy::Genre => "genre",
            Strategy::Interest => "interest",
        }
    }

    /// File name of the query resource, relative to the query directory
    pub fn query_file(&self) -> Option<&'static str> {
        match self {
            Strategy::Collaborative => Some("collaborative_filtering.cypher"),
            Strategy::Content => Some("content_based.cypher"),
            Strategy::Hybrid => Some("Hybrid_Recommendation.cypher"),
            Strategy::Genre => Some("Genre_Based.cypher"),
            Strategy::Interest => None,
        }
    }

    /// Whether the strategy relies on the user's ratings
    pub fn needs_ratings(&self) -> bool {
        !matches!(self, Strategy::Interest)
    }

    /// Display name: underscores become spaces and each word is capitalized
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownStrategy {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Hybrid".parse::<Strategy>().unwrap(), Strategy::Hybrid);
        assert_eq!(" genre ".parse::<Strategy>().unwrap(), Strategy::Genre);
        assert_eq!(
            "COLLABORATIVE".parse::<Strategy>().unwrap(),
            Strategy::Collaborative
        );
    }

    #[test]
    fn test_unknown_strategy() {
        match "popular".parse::<Strategy>() {
            Err(Error::UnknownStrategy { name }) => assert_eq!(name, "popular"),
            other => panic!("expected UnknownStrategy, got {:?}", other),
        }
    }

    #[test]
    fn test_query_files() {
        assert_eq!(
            Strategy::Hybrid.query_file(),
            Some("Hybrid_Recommendation.cypher")
        );
        assert_eq!(Strategy::Genre.query_file(), Some("Genre_Based.cypher"));
        assert_eq!(Strategy::Interest.query_file(), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Strategy::Content.label(), "Content");
        assert_eq!(Strategy::Collaborative.label(), "Collaborative");
    }

    #[test]
    fn test_default_is_hybrid() {
        assert_eq!(Strategy::default(), Strategy::Hybrid);
        assert!(!Strategy::Interest.needs_ratings());
    }
}
