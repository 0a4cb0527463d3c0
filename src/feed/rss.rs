use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;

use super::format::{relative_time, session_article_id};
use super::{fetch_all, ArticleSource};
use crate::config::HttpConfig;
use crate::error::{AppError, Result};
use crate::models::Article;

struct FeedTarget {
    category: String,
    url: String,
}

impl fmt::Display for FeedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.category, self.url)
    }
}

pub struct RssSource {
    client: Client,
    feeds: BTreeMap<String, Vec<String>>,
}

impl RssSource {
    pub fn new(feeds: BTreeMap<String, Vec<String>>, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .user_agent(http.user_agent.as_str())
            .build()?;

        Ok(Self { client, feeds })
    }

    async fn fetch_feed(&self, target: FeedTarget) -> Result<Vec<Article>> {
        let response = self.client.get(&target.url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        parse_feed(&bytes, &target.category, Utc::now())
    }
}

#[async_trait]
impl ArticleSource for RssSource {
    async fn fetch_articles(&self, categories: &[String], page: u32) -> Result<Vec<Article>> {
        // Feeds only publish their latest items.
        if page > 1 {
            tracing::debug!("RSS feeds have no page {}", page);
            return Ok(Vec::new());
        }

        let mut targets = Vec::new();
        for category in categories {
            match self.feeds.get(category) {
                Some(urls) if !urls.is_empty() => {
                    targets.extend(urls.iter().map(|url| FeedTarget {
                        category: category.clone(),
                        url: url.clone(),
                    }));
                }
                _ => tracing::warn!("No feeds configured for category {}", category),
            }
        }

        if targets.is_empty() && !categories.is_empty() {
            return Err(AppError::Fetch(format!(
                "no feeds configured for {}",
                categories.join(", ")
            )));
        }

        fetch_all(targets, |target| self.fetch_feed(target)).await
    }

    fn name(&self) -> &str {
        "rss"
    }
}

/// Turn an RSS/Atom document into articles tagged with `category`.
pub(crate) fn parse_feed(bytes: &[u8], category: &str, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let feed = parser::parse(bytes)?;
    let source = feed
        .title
        .map(|t| t.content)
        .unwrap_or_else(|| "Unknown".to_string());

    let articles = feed
        .entries
        .into_iter()
        .map(|entry| {
            // Try summary first, then fall back to content
            let description_html = entry
                .summary
                .as_ref()
                .map(|s| s.content.clone())
                .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()));

            let description = description_html
                .as_deref()
                .and_then(|html| html2text::from_read(html.as_bytes(), 200).ok())
                .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();

            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            let id = if !entry.id.is_empty() {
                entry.id
            } else if !url.is_empty() {
                url.clone()
            } else {
                session_article_id()
            };

            let image_url = entry
                .media
                .iter()
                .flat_map(|m| m.thumbnails.iter().map(|t| t.image.uri.clone()))
                .next();

            Article {
                id,
                title: entry
                    .title
                    .map(|t| t.content.trim().to_string())
                    .unwrap_or_else(|| "Untitled".to_string()),
                description,
                source: source.clone(),
                category: category.to_string(),
                url,
                publish_date: relative_time(entry.published.or(entry.updated), now),
                image_url,
                summary: None,
                content: entry.content.and_then(|c| c.body),
                authors: entry.authors.into_iter().map(|a| a.name).collect(),
                key_points: Vec::new(),
                notable_quotes: Vec::new(),
            }
        })
        .collect();

    Ok(articles)
}
