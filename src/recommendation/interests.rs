//! User creation and interest tracking for new users.
//!
//! New users have no ratings, so they declare interests (genres, actors,
//! directors) instead. Only names that already exist in the graph are linked.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::store::GraphStore;
use super::{Message, Recommendation};
use crate::error::Result;

/// Actor and director dropdowns are capped; genres are listed in full
const DROPDOWN_LIMIT: usize = 100;

/// Node kinds a user can be interested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestKind {
    Genre,
    Actor,
    Director,
}

impl InterestKind {
    pub const ALL: [InterestKind; 3] = [InterestKind::Genre, InterestKind::Actor, InterestKind::Director];

    /// Node label in the graph
    pub fn label(&self) -> &'static str {
        match self {
            InterestKind::Genre => "Genre",
            InterestKind::Actor => "Actor",
            InterestKind::Director => "Director",
        }
    }

    /// Form field / JSON key holding names of this kind
    pub fn field(&self) -> &'static str {
        match self {
            InterestKind::Genre => "genres",
            InterestKind::Actor => "actors",
            InterestKind::Director => "directors",
        }
    }
}

/// Names chosen by a user, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterestSelection {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
}

impl InterestSelection {
    pub fn get(&self, kind: InterestKind) -> &[String] {
        match kind {
            InterestKind::Genre => &self.genres,
            InterestKind::Actor => &self.actors,
            InterestKind::Director => &self.directors,
        }
    }

    pub fn get_mut(&mut self, kind: InterestKind) -> &mut Vec<String> {
        match kind {
            InterestKind::Genre => &mut self.genres,
            InterestKind::Actor => &mut self.actors,
            InterestKind::Director => &mut self.directors,
        }
    }

    pub fn is_empty(&self) -> bool {
        InterestKind::ALL.iter().all(|kind| self.get(*kind).is_empty())
    }

    pub fn total(&self) -> usize {
        InterestKind::ALL.iter().map(|kind| self.get(*kind).len()).sum()
    }

    /// Trim names and drop blanks and repeats, keeping first occurrences
    pub fn normalized(&self) -> Self {
        let mut out = Self::default();
        for kind in InterestKind::ALL {
            *out.get_mut(kind) = dedup_names(self.get(kind));
        }
        out
    }
}

/// Values for the new-user form
#[derive(Debug, Clone, Default, Serialize)]
pub struct DropdownOptions {
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub directors: Vec<String>,
}

/// Creates users, validates and links their interests, and recommends from them
#[derive(Clone)]
pub struct InterestManager {
    store: Arc<dyn GraphStore>,
}

impl InterestManager {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Create the user, or update its name when one is given
    #[instrument(skip(self))]
    pub async fn create_user(&self, user_id: i64, name: Option<&str>) -> Result<()> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        self.store.upsert_user(user_id, name).await?;
        info!("Created/updated user {} with name: {:?}", user_id, name);
        Ok(())
    }

    /// Keep only the names that exist in the graph, in request order
    pub async fn validate_interests(&self, selection: &InterestSelection) -> Result<InterestSelection> {
        let requested = selection.normalized();
        let mut valid = InterestSelection::default();

        for kind in InterestKind::ALL {
            let names = requested.get(kind);
            if names.is_empty() {
                continue;
            }
            let found: HashSet<String> = self
                .store
                .existing_names(kind, names)
                .await?
                .into_iter()
                .collect();
            *valid.get_mut(kind) = names.iter().filter(|n| found.contains(*n)).cloned().collect();
            info!("Valid {}: {:?}", kind.field(), valid.get(kind));
        }

        Ok(valid)
    }

    /// Validate and link interests; returns what was linked
    #[instrument(skip(self, selection), fields(requested = selection.total()))]
    pub async fn add_interests(&self, user_id: i64, selection: &InterestSelection) -> Result<InterestSelection> {
        let valid = self.validate_interests(selection).await?;
        if valid.is_empty() {
            warn!("No valid interests provided for user {}", user_id);
            return Ok(valid);
        }

        for kind in InterestKind::ALL {
            let names = valid.get(kind);
            if names.is_empty() {
                continue;
            }
            self.store.link_interests(user_id, kind, names).await?;
            info!("Added {} {} for user {}", names.len(), kind.field(), user_id);
        }

        Ok(valid)
    }

    pub async fn recommend_from_interests(&self, user_id: i64, limit: usize) -> Result<Vec<Recommendation>> {
        let recs = self.store.interest_recommendations(user_id, limit).await?;
        info!(
            "Generated {} interest-based recommendations for user {}",
            recs.len(),
            user_id
        );
        Ok(recs)
    }

    /// Form options; a database failure yields empty lists and an error message
    pub async fn dropdown_options(&self) -> (DropdownOptions, Vec<Message>) {
        match self.load_options().await {
            Ok(options) => {
                debug!(
                    "Dropdown options: {} genres, {} actors, {} directors",
                    options.genres.len(),
                    options.actors.len(),
                    options.directors.len()
                );
                (options, Vec::new())
            }
            Err(e) => {
                error!("Error fetching dropdown options: {}", e);
                (
                    DropdownOptions::default(),
                    vec![Message::error(format!("Database error: {}", e))],
                )
            }
        }
    }

    async fn load_options(&self) -> Result<DropdownOptions> {
        Ok(DropdownOptions {
            genres: self.store.catalog_names(InterestKind::Genre, None).await?,
            actors: self
                .store
                .catalog_names(InterestKind::Actor, Some(DROPDOWN_LIMIT))
                .await?,
            directors: self
                .store
                .catalog_names(InterestKind::Director, Some(DROPDOWN_LIMIT))
                .await?,
        })
    }
}

fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty() && seen.insert(n.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalized_drops_blanks_and_repeats() {
        let selection = InterestSelection {
            genres: names(&["Dramas", " Dramas ", "", "Comedies"]),
            actors: names(&["  "]),
            directors: Vec::new(),
        };
        let normalized = selection.normalized();
        assert_eq!(normalized.genres, names(&["Dramas", "Comedies"]));
        assert!(normalized.actors.is_empty());
        assert_eq!(normalized.total(), 2);
    }

    #[test]
    fn test_empty_selection() {
        assert!(InterestSelection::default().is_empty());
        let selection = InterestSelection {
            directors: names(&["Martin Scorsese"]),
            ..Default::default()
        };
        assert!(!selection.is_empty());
        assert_eq!(selection.get(InterestKind::Director), &names(&["Martin Scorsese"])[..]);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(InterestKind::Actor.label(), "Actor");
        assert_eq!(InterestKind::Genre.field(), "genres");
    }
}
