use serde::{Deserialize, Serialize};

/// Tag labels offered on the category selection screen.
pub const CATEGORIES: &[&str] = &[
    "Entertainment",
    "Politics",
    "Stock Market",
    "Finance",
    "Technology",
    "Sports",
    "Health",
    "Science",
    "Art",
    "Business",
    "World News",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source: String,
    pub category: String,
    pub url: String,
    /// Relative label such as "2h ago", fixed when the article was fetched.
    pub publish_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notable_quotes: Vec<NotableQuote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotableQuote {
    pub speaker: Option<String>,
    pub quote: String,
}

impl Article {
    /// Title reduced to lowercase alphanumeric words separated by single spaces.
    /// Two articles with the same normalized title are treated as duplicates.
    pub fn normalized_title(&self) -> String {
        self.title
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
