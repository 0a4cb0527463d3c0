use std::sync::OnceLock;

use regex::Regex;

use crate::models::Article;

const STOP_WORDS: &[&str] = &[
    "about", "their", "would", "could", "should", "which", "where", "there", "these", "those",
    "after", "before", "during", "while", "since", "until", "through", "against", "between",
    "among",
];

const GENERIC_SOURCE_WORDS: &[&str] = &["news", "times", "post", "daily", "weekly"];

const DESCRIPTION_MIN_LEN: usize = 5;
const TITLE_MIN_LEN: usize = 4;
const SOURCE_MIN_LEN: usize = 4;
const WORDS_PER_FIELD: usize = 3;

/// Anything that is not an ASCII word character or whitespace. Accented
/// letters split words, so "café" yields "caf".
fn punctuation() -> &'static Regex {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    PUNCTUATION.get_or_init(|| Regex::new(r"[^0-9A-Za-z_\s]").expect("valid punctuation pattern"))
}

fn tokenize(text: &str) -> Vec<String> {
    punctuation()
        .replace_all(&text.to_lowercase(), " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn keywords(text: &str, min_len: usize) -> impl Iterator<Item = String> {
    tokenize(text).into_iter().filter(move |word| {
        word.chars().count() >= min_len
            && !STOP_WORDS.contains(&word.as_str())
            && !word.chars().all(|c| c.is_ascii_digit())
    })
}

/// Topics a liked article contributes to the trending list, in precedence
/// order: category, description words, title words, one source word.
pub fn extract_topics(article: &Article) -> Vec<String> {
    let mut topics = vec![article.category.clone()];

    topics.extend(keywords(&article.description, DESCRIPTION_MIN_LEN).take(WORDS_PER_FIELD));
    topics.extend(keywords(&article.title, TITLE_MIN_LEN).take(WORDS_PER_FIELD));

    if article.source.chars().count() >= SOURCE_MIN_LEN {
        topics.extend(
            tokenize(&article.source)
                .into_iter()
                .filter(|w| w.chars().count() >= SOURCE_MIN_LEN)
                .filter(|w| !GENERIC_SOURCE_WORDS.contains(&w.as_str()))
                .take(1),
        );
    }

    dedup_case_insensitive(topics)
}

/// Drop blanks and later case-insensitive repeats, keeping the first spelling.
pub(crate) fn dedup_case_insensitive(topics: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for topic in topics {
        let trimmed = topic.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
    }
    out
}

/// Recency-ordered list of topics from liked articles, capped at `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingTopics {
    topics: Vec<String>,
    limit: usize,
}

impl TrendingTopics {
    pub fn new(limit: usize) -> Self {
        Self {
            topics: Vec::new(),
            limit,
        }
    }

    /// Put `fresh` in front of the existing topics, then drop repeats and
    /// anything past the limit.
    pub fn merge(&mut self, fresh: Vec<String>) {
        let previous = std::mem::take(&mut self.topics);
        let mut merged = dedup_case_insensitive(fresh.into_iter().chain(previous));
        merged.truncate(self.limit);
        self.topics = merged;
    }

    pub fn as_slice(&self) -> &[String] {
        &self.topics
    }

    pub fn clear(&mut self) {
        self.topics.clear();
    }
}
