//! Fixed title list served when the graph cannot produce recommendations.

use super::Recommendation;

const FALLBACK_TITLES: [(&str, &str, i64); 10] = [
    ("Stranger Things", "TV Show", 2016),
    ("The Crown", "TV Show", 2016),
    ("Money Heist", "TV Show", 2017),
    ("Dark", "TV Show", 2017),
    ("Narcos", "TV Show", 2015),
    ("The Irishman", "Movie", 2019),
    ("Roma", "Movie", 2018),
    ("Marriage Story", "Movie", 2019),
    ("Black Mirror", "TV Show", 2011),
    ("Extraction", "Movie", 2020),
];

/// The first `limit` fallback titles, in their fixed order
pub fn fallback_recommendations(limit: usize) -> Vec<Recommendation> {
    FALLBACK_TITLES
        .iter()
        .take(limit)
        .map(|&(title, kind, year)| Recommendation {
            kind: Some(kind.to_string()),
            year: Some(year),
            ..Recommendation::titled(title)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_truncated_in_order() {
        let recs = fallback_recommendations(3);
        let titles: Vec<_> = recs.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Stranger Things", "The Crown", "Money Heist"]);
    }

    #[test]
    fn test_fallback_never_exceeds_list() {
        assert_eq!(fallback_recommendations(50).len(), FALLBACK_TITLES.len());
        assert!(fallback_recommendations(0).is_empty());
    }

    #[test]
    fn test_fallback_has_no_scores() {
        assert!(fallback_recommendations(10).iter().all(|r| r.score.is_none()));
    }
}
