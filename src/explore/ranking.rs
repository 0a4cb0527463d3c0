use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::models::{Article, SwipeDirection};

/// Accumulated per-category affinity. Unbounded in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryPreferences {
    scores: HashMap<String, i64>,
}

impl CategoryPreferences {
    pub fn score(&self, category: &str) -> i64 {
        self.scores.get(category).copied().unwrap_or(0)
    }

    pub fn record(&mut self, category: &str, direction: SwipeDirection) -> i64 {
        let score = self.scores.entry(category.to_string()).or_insert(0);
        *score += direction.preference_delta();
        *score
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.scores.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Shuffle, then stable-sort by descending category score. Equal scores keep
/// their shuffled order, so preferences nudge the order without filtering.
pub fn rank_by_preferences<R: Rng + ?Sized>(
    mut articles: Vec<Article>,
    preferences: &CategoryPreferences,
    rng: &mut R,
) -> Vec<Article> {
    articles.shuffle(rng);
    articles.sort_by_key(|a| Reverse(preferences.score(&a.category)));
    articles
}

/// Keep the first article for each normalized title, skipping titles in `seen`.
pub fn dedup_by_title(articles: Vec<Article>, seen: &HashSet<String>) -> Vec<Article> {
    let mut kept = HashSet::new();
    let mut out = Vec::with_capacity(articles.len());
    for article in articles {
        let key = article.normalized_title();
        if seen.contains(&key) || !kept.insert(key) {
            tracing::debug!("Skipping duplicate article: {}", article.title);
            continue;
        }
        out.push(article);
    }
    out
}
