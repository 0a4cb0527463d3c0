use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use super::ranking::{dedup_by_title, rank_by_preferences, CategoryPreferences};
use super::topics::{extract_topics, TrendingTopics};
use crate::config::ExploreConfig;
use crate::error::Result;
use crate::models::{Article, SwipeDirection, SwipeRecord};

pub const FETCH_FAILED_MESSAGE: &str = "Failed to load news. Please try again.";
pub const NO_ARTICLES_MESSAGE: &str =
    "No articles found for selected categories. Please try different topics.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreSettings {
    /// Cards shown at once.
    pub stack_size: usize,
    /// Remaining-card count at or below which a refill is requested.
    pub refill_threshold: usize,
    pub trending_limit: usize,
    pub shuffle_seed: Option<u64>,
}

impl Default for ExploreSettings {
    fn default() -> Self {
        Self {
            stack_size: 3,
            refill_threshold: 5,
            trending_limit: 5,
            shuffle_seed: None,
        }
    }
}

impl From<&ExploreConfig> for ExploreSettings {
    fn from(config: &ExploreConfig) -> Self {
        Self {
            stack_size: config.stack_size,
            refill_threshold: config.refill_threshold,
            trending_limit: config.trending_limit,
            shuffle_seed: config.shuffle_seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Replace the candidate list and rewind the cursor.
    Replace,
    /// Append unseen articles behind the current ones.
    Refill,
}

#[derive(Debug, Clone)]
pub struct SwipeOutcome {
    pub record: SwipeRecord,
    pub needs_refill: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub current_articles: Vec<Article>,
    pub trending_topics: Vec<String>,
    pub has_more_articles: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub cursor: usize,
    pub total_articles: usize,
    pub swipe_count: usize,
    pub liked_count: usize,
    pub preferences: CategoryPreferences,
}

/// Synchronous explore state machine. Owns everything a session knows; the
/// controller wraps it for async access.
pub struct FeedState {
    settings: ExploreSettings,
    articles: Vec<Article>,
    cursor: usize,
    history: Vec<SwipeRecord>,
    preferences: CategoryPreferences,
    liked: Vec<Article>,
    trending: TrendingTopics,
    is_loading: bool,
    error: Option<String>,
    selection: Vec<String>,
    generation: u64,
    /// Last source page applied to the list.
    page: u32,
    /// Page requested by the load in flight.
    pending_page: u32,
    /// Set once a refill brought nothing new or failed. Cleared by the next
    /// explicit load or a reset.
    refills_exhausted: bool,
    rng: StdRng,
}

impl FeedState {
    pub fn new(settings: ExploreSettings) -> Self {
        let rng = match settings.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            trending: TrendingTopics::new(settings.trending_limit),
            settings,
            articles: Vec::new(),
            cursor: 0,
            history: Vec::new(),
            preferences: CategoryPreferences::default(),
            liked: Vec::new(),
            is_loading: false,
            error: None,
            selection: Vec::new(),
            generation: 0,
            page: 0,
            pending_page: 0,
            refills_exhausted: false,
            rng,
        }
    }

    pub fn settings(&self) -> &ExploreSettings {
        &self.settings
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The next few unconsumed articles, top card first.
    pub fn current_articles(&self) -> &[Article] {
        let end = (self.cursor + self.settings.stack_size).min(self.articles.len());
        &self.articles[self.cursor..end]
    }

    pub fn has_more_articles(&self) -> bool {
        self.cursor < self.articles.len()
    }

    pub fn remaining(&self) -> usize {
        self.articles.len() - self.cursor
    }

    pub fn history(&self) -> &[SwipeRecord] {
        &self.history
    }

    pub fn preferences(&self) -> &CategoryPreferences {
        &self.preferences
    }

    pub fn liked_articles(&self) -> &[Article] {
        &self.liked
    }

    pub fn trending_topics(&self) -> &[String] {
        self.trending.as_slice()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selection(&self) -> &[String] {
        &self.selection
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Source page the load in flight should fetch.
    pub fn pending_page(&self) -> u32 {
        self.pending_page
    }

    pub fn refills_exhausted(&self) -> bool {
        self.refills_exhausted
    }

    /// Consume the top card. Returns `None` once the feed is exhausted.
    pub fn swipe(&mut self, direction: SwipeDirection, now: DateTime<Utc>) -> Option<SwipeOutcome> {
        let article = self.articles.get(self.cursor)?.clone();

        let record = SwipeRecord {
            article_id: article.id.clone(),
            direction,
            category: article.category.clone(),
            timestamp: now,
        };
        self.history.push(record.clone());

        if direction == SwipeDirection::Right {
            self.trending.merge(extract_topics(&article));
            self.liked.push(article.clone());
        }

        let score = self.preferences.record(&article.category, direction);
        self.cursor += 1;

        tracing::debug!(
            "Swiped {} on {} ({} now {}), {} left",
            direction,
            article.id,
            article.category,
            score,
            self.remaining()
        );

        let needs_refill = !self.selection.is_empty()
            && !self.refills_exhausted
            && self.remaining() <= self.settings.refill_threshold;

        Some(SwipeOutcome {
            record,
            needs_refill,
        })
    }

    /// Mark a load as started for `categories` and return its generation.
    /// Any load started earlier becomes stale. An explicit load starts over at
    /// page 1; a refill asks for the page after the last one applied.
    pub fn begin_load(&mut self, categories: &[String], mode: LoadMode) -> u64 {
        match mode {
            LoadMode::Replace => {
                self.page = 0;
                self.pending_page = 1;
                self.refills_exhausted = false;
            }
            LoadMode::Refill => self.pending_page = self.page + 1,
        }
        self.selection = categories.to_vec();
        self.is_loading = true;
        self.error = None;
        self.generation += 1;
        self.generation
    }

    /// Apply a finished fetch. Stale generations are ignored and reported as
    /// `false`.
    pub fn finish_load(
        &mut self,
        generation: u64,
        mode: LoadMode,
        result: Result<Vec<Article>>,
    ) -> bool {
        if generation != self.generation {
            tracing::debug!(
                "Discarding stale load {} (current {})",
                generation,
                self.generation
            );
            return false;
        }

        self.is_loading = false;

        let fetched = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::error!("Error fetching news: {}", e);
                self.error = Some(FETCH_FAILED_MESSAGE.to_string());
                if mode == LoadMode::Refill {
                    self.refills_exhausted = true;
                }
                return true;
            }
        };

        match mode {
            LoadMode::Replace => {
                let fresh = dedup_by_title(fetched, &HashSet::new());
                if fresh.is_empty() {
                    tracing::warn!("No articles received for {:?}", self.selection);
                    self.error = Some(NO_ARTICLES_MESSAGE.to_string());
                    return true;
                }
                self.articles = rank_by_preferences(fresh, &self.preferences, &mut self.rng);
                self.cursor = 0;
                self.page = self.pending_page;
                tracing::info!(
                    "Loaded {} articles (generation {})",
                    self.articles.len(),
                    generation
                );
            }
            LoadMode::Refill => {
                let seen: HashSet<String> =
                    self.articles.iter().map(Article::normalized_title).collect();
                let fresh = dedup_by_title(fetched, &seen);
                self.page = self.pending_page;
                if fresh.is_empty() {
                    tracing::info!(
                        "Page {} had no unseen articles, no further refills",
                        self.page
                    );
                    self.refills_exhausted = true;
                    return true;
                }
                let ranked = rank_by_preferences(fresh, &self.preferences, &mut self.rng);
                tracing::info!(
                    "Refill appended {} articles (generation {})",
                    ranked.len(),
                    generation
                );
                self.articles.extend(ranked);
            }
        }

        true
    }

    /// Invalidate any in-flight load without applying it.
    pub fn cancel_load(&mut self) {
        self.generation += 1;
        self.is_loading = false;
    }

    /// Forget everything learned this session. The candidate list and the
    /// category selection are kept.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.history.clear();
        self.preferences.clear();
        self.liked.clear();
        self.trending.clear();
        self.error = None;
        self.refills_exhausted = false;
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            current_articles: self.current_articles().to_vec(),
            trending_topics: self.trending_topics().to_vec(),
            has_more_articles: self.has_more_articles(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            cursor: self.cursor,
            total_articles: self.articles.len(),
            swipe_count: self.history.len(),
            liked_count: self.liked.len(),
            preferences: self.preferences.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn article(n: usize, category: &str) -> Article {
        Article {
            id: format!("a{}", n),
            title: format!("Headline number {}", n),
            description: format!("Detailed coverage regarding {} developments", category),
            source: "Wire Service".to_string(),
            category: category.to_string(),
            url: format!("https://example.com/{}", n),
            publish_date: "1h ago".to_string(),
            image_url: None,
            summary: None,
            content: None,
            authors: Vec::new(),
            key_points: Vec::new(),
            notable_quotes: Vec::new(),
        }
    }

    fn seeded() -> FeedState {
        FeedState::new(ExploreSettings {
            shuffle_seed: Some(3),
            ..ExploreSettings::default()
        })
    }

    fn loaded(count: usize, category: &str) -> FeedState {
        let mut state = seeded();
        let generation = state.begin_load(&[category.to_string()], LoadMode::Replace);
        let articles = (0..count).map(|n| article(n, category)).collect();
        assert!(state.finish_load(generation, LoadMode::Replace, Ok(articles)));
        state
    }

    #[test]
    fn cursor_advances_by_one_and_never_overruns() {
        let mut state = loaded(4, "Tech");
        for expected in 1..=4 {
            assert!(state.swipe(SwipeDirection::Left, Utc::now()).is_some());
            assert_eq!(state.cursor(), expected);
        }
        assert!(!state.has_more_articles());
        assert!(state.swipe(SwipeDirection::Right, Utc::now()).is_none());
        assert_eq!(state.cursor(), 4);
        assert!(state.current_articles().is_empty());
    }

    #[test]
    fn swipe_on_exhausted_feed_changes_nothing() {
        let mut state = loaded(1, "Tech");
        state.swipe(SwipeDirection::Right, Utc::now());
        let before = state.snapshot();
        let history_before = state.history().to_vec();

        assert!(state.swipe(SwipeDirection::Left, Utc::now()).is_none());

        let after = state.snapshot();
        assert_eq!(after.cursor, before.cursor);
        assert_eq!(after.preferences, before.preferences);
        assert_eq!(after.trending_topics, before.trending_topics);
        assert_eq!(state.history(), history_before.as_slice());
    }

    #[test]
    fn right_then_left_nets_one_point() {
        let mut state = loaded(6, "Tech");
        state.swipe(SwipeDirection::Right, Utc::now());
        state.swipe(SwipeDirection::Left, Utc::now());
        assert_eq!(state.preferences().score("Tech"), 1);
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.liked_articles().len(), 1);
    }

    #[test]
    fn right_swipe_puts_category_first_in_trending() {
        let mut state = seeded();
        let generation = state.begin_load(&["Mixed".to_string()], LoadMode::Replace);
        let articles = (0..12)
            .map(|n| article(n, ["Tech", "Health", "Art"][n % 3]))
            .collect();
        state.finish_load(generation, LoadMode::Replace, Ok(articles));

        for _ in 0..12 {
            let category = state.current_articles()[0].category.clone();
            state.swipe(SwipeDirection::Right, Utc::now());
            assert!(state.trending_topics().len() <= 5);
            assert_eq!(state.trending_topics()[0], category);
        }
    }

    #[test]
    fn refill_is_requested_at_threshold() {
        let mut state = loaded(10, "Tech");
        for _ in 0..4 {
            assert!(!state.swipe(SwipeDirection::Left, Utc::now()).unwrap().needs_refill);
        }
        let fifth = state.swipe(SwipeDirection::Left, Utc::now()).unwrap();
        assert!(fifth.needs_refill);
        assert_eq!(state.remaining(), 5);
    }

    #[test]
    fn no_refill_without_a_selection() {
        let mut state = seeded();
        let generation = state.begin_load(&[], LoadMode::Replace);
        state.finish_load(generation, LoadMode::Replace, Ok(vec![article(1, "Tech")]));
        assert!(!state.swipe(SwipeDirection::Left, Utc::now()).unwrap().needs_refill);
    }

    #[test]
    fn failed_load_keeps_existing_articles() {
        let mut state = loaded(5, "Tech");
        state.swipe(SwipeDirection::Left, Utc::now());

        let generation = state.begin_load(&["Tech".to_string()], LoadMode::Replace);
        assert!(state.is_loading());
        state.finish_load(
            generation,
            LoadMode::Replace,
            Err(AppError::Fetch("offline".to_string())),
        );

        assert!(!state.is_loading());
        assert_eq!(state.error(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(state.articles().len(), 5);
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn empty_load_reports_no_articles() {
        let mut state = seeded();
        let generation = state.begin_load(&["Art".to_string()], LoadMode::Replace);
        state.finish_load(generation, LoadMode::Replace, Ok(Vec::new()));
        assert_eq!(state.error(), Some(NO_ARTICLES_MESSAGE));
        assert!(state.articles().is_empty());
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut state = seeded();
        let old = state.begin_load(&["Tech".to_string()], LoadMode::Replace);
        let new = state.begin_load(&["Art".to_string()], LoadMode::Replace);

        assert!(!state.finish_load(old, LoadMode::Replace, Ok(vec![article(1, "Tech")])));
        assert!(state.is_loading());
        assert!(state.articles().is_empty());

        assert!(state.finish_load(new, LoadMode::Replace, Ok(vec![article(2, "Art")])));
        assert_eq!(state.articles()[0].category, "Art");
    }

    #[test]
    fn refill_appends_only_unseen_titles_and_keeps_cursor() {
        let mut state = loaded(6, "Tech");
        state.swipe(SwipeDirection::Left, Utc::now());
        state.swipe(SwipeDirection::Left, Utc::now());
        let front: Vec<String> = state.articles().iter().map(|a| a.id.clone()).collect();

        let generation = state.begin_load(&["Tech".to_string()], LoadMode::Refill);
        assert_eq!(state.pending_page(), 2);
        let batch = (4..9).map(|n| article(n, "Tech")).collect();
        state.finish_load(generation, LoadMode::Refill, Ok(batch));

        assert_eq!(state.cursor(), 2);
        assert_eq!(state.articles().len(), 9);
        let ids: Vec<&str> = state.articles().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(&ids[..6], front.iter().map(String::as_str).collect::<Vec<_>>().as_slice());
        let mut appended: Vec<&str> = ids[6..].to_vec();
        appended.sort();
        assert_eq!(appended, vec!["a6", "a7", "a8"]);
    }

    #[test]
    fn failed_refill_keeps_list_and_cursor() {
        let mut state = loaded(8, "Tech");
        for _ in 0..3 {
            state.swipe(SwipeDirection::Left, Utc::now());
        }

        let generation = state.begin_load(&["Tech".to_string()], LoadMode::Refill);
        assert!(state.finish_load(
            generation,
            LoadMode::Refill,
            Err(AppError::Fetch("offline".to_string())),
        ));

        assert!(!state.is_loading());
        assert_eq!(state.error(), Some(FETCH_FAILED_MESSAGE));
        assert_eq!(state.cursor(), 3);
        assert_eq!(state.articles().len(), 8);
        assert!(!state.swipe(SwipeDirection::Left, Utc::now()).unwrap().needs_refill);
    }

    #[test]
    fn refill_without_new_titles_stops_further_refills() {
        let mut state = loaded(10, "Tech");
        for _ in 0..5 {
            state.swipe(SwipeDirection::Left, Utc::now());
        }

        let generation = state.begin_load(&["Tech".to_string()], LoadMode::Refill);
        assert_eq!(state.pending_page(), 2);
        let repeat = (0..10).map(|n| article(n, "Tech")).collect();
        state.finish_load(generation, LoadMode::Refill, Ok(repeat));

        assert!(state.refills_exhausted());
        assert_eq!(state.articles().len(), 10);
        assert_eq!(state.error(), None);
        assert!(!state.swipe(SwipeDirection::Left, Utc::now()).unwrap().needs_refill);

        state.begin_load(&["Tech".to_string()], LoadMode::Replace);
        assert!(!state.refills_exhausted());
        assert_eq!(state.pending_page(), 1);
    }

    #[test]
    fn refills_advance_one_page_at_a_time() {
        let mut state = loaded(6, "Tech");
        for page in 2..=4 {
            let generation = state.begin_load(&["Tech".to_string()], LoadMode::Refill);
            assert_eq!(state.pending_page(), page);
            let batch = vec![article(100 + page as usize, "Tech")];
            state.finish_load(generation, LoadMode::Refill, Ok(batch));
        }
        assert_eq!(state.articles().len(), 9);
        assert!(!state.refills_exhausted());
    }

    #[test]
    fn reset_allows_refills_again() {
        let mut state = loaded(6, "Tech");
        let generation = state.begin_load(&["Tech".to_string()], LoadMode::Refill);
        state.finish_load(generation, LoadMode::Refill, Ok(Vec::new()));
        assert!(state.refills_exhausted());

        state.reset();
        assert!(!state.refills_exhausted());
        assert!(state.swipe(SwipeDirection::Left, Utc::now()).unwrap().needs_refill);
    }

    #[test]
    fn duplicate_titles_collapse_on_load() {
        let mut state = seeded();
        let generation = state.begin_load(&["Tech".to_string()], LoadMode::Replace);
        let mut copy = article(1, "Tech");
        copy.id = "copy".to_string();
        copy.title = "HEADLINE number 1!".to_string();
        state.finish_load(
            generation,
            LoadMode::Replace,
            Ok(vec![article(1, "Tech"), copy, article(2, "Tech")]),
        );
        assert_eq!(state.articles().len(), 2);
    }

    #[test]
    fn reset_twice_gives_the_same_empty_state() {
        let mut state = loaded(8, "Tech");
        state.swipe(SwipeDirection::Right, Utc::now());
        state.swipe(SwipeDirection::Left, Utc::now());

        state.reset();
        let first = state.snapshot();
        state.reset();
        let second = state.snapshot();

        for snap in [&first, &second] {
            assert_eq!(snap.cursor, 0);
            assert_eq!(snap.swipe_count, 0);
            assert_eq!(snap.liked_count, 0);
            assert!(snap.preferences.is_empty());
            assert!(snap.trending_topics.is_empty());
        }
        assert_eq!(state.selection(), ["Tech"]);
    }

    #[test]
    fn stack_shows_at_most_three_cards() {
        let mut state = loaded(4, "Tech");
        assert_eq!(state.current_articles().len(), 3);
        state.swipe(SwipeDirection::Left, Utc::now());
        state.swipe(SwipeDirection::Left, Utc::now());
        assert_eq!(state.current_articles().len(), 2);
    }
}
