use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::format::{parse_published, relative_time};
use super::{fetch_all, ArticleSource};
use crate::config::{HttpConfig, NewsApiConfig};
use crate::error::{AppError, Result};
use crate::models::Article;

const REMOVED_MARKER: &str = "[Removed]";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeadlinesResponse {
    status: String,
    #[serde(default)]
    articles: Vec<ApiArticle>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    source: Option<ApiSource>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

/// Upstream query for one app category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryQuery {
    pub label: String,
    pub api_category: &'static str,
    pub keyword: Option<String>,
}

impl CategoryQuery {
    pub fn from_label(label: &str) -> Self {
        let (api_category, keyword) = match label {
            "Entertainment" => ("entertainment", None),
            "Politics" => ("general", Some("politics")),
            "Stock Market" => ("business", Some("stock market")),
            "Finance" => ("business", Some("finance")),
            "Technology" => ("technology", None),
            "Sports" => ("sports", None),
            "Health" => ("health", None),
            "Science" => ("science", None),
            "Art" => ("entertainment", Some("art")),
            "Business" => ("business", None),
            "World News" => ("general", None),
            other => {
                return Self {
                    label: other.to_string(),
                    api_category: "general",
                    keyword: Some(other.to_lowercase()),
                }
            }
        };

        Self {
            label: label.to_string(),
            api_category,
            keyword: keyword.map(str::to_string),
        }
    }
}

impl fmt::Display for CategoryQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.keyword {
            Some(keyword) => write!(f, "{} ({}/{})", self.label, self.api_category, keyword),
            None => write!(f, "{} ({})", self.label, self.api_category),
        }
    }
}

pub struct NewsApiSource {
    client: Client,
    endpoint: Url,
    api_key: String,
    page_size: u32,
    country: String,
}

impl NewsApiSource {
    pub fn new(config: &NewsApiConfig, http: &HttpConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Config("news_api.api_key is not set".to_string()))?;

        let endpoint = Url::parse(&format!(
            "{}/top-headlines",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| AppError::Config(format!("invalid news_api.base_url: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .user_agent(http.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            page_size: config.page_size,
            country: config.country.clone(),
        })
    }

    fn query_url(&self, query: &CategoryQuery, page: u32) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("category", query.api_category)
                .append_pair("country", &self.country)
                .append_pair("pageSize", &self.page_size.to_string())
                .append_pair("page", &page.max(1).to_string());
            if let Some(keyword) = &query.keyword {
                pairs.append_pair("q", keyword);
            }
        }
        url
    }

    async fn fetch_query(&self, query: CategoryQuery, page: u32) -> Result<Vec<Article>> {
        let url = self.query_url(&query, page);

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body: HeadlinesResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if !status.is_success() => {
                return Err(AppError::NewsApi(format!("HTTP {}: {}", status, e)));
            }
            Err(e) => return Err(e.into()),
        };

        if !status.is_success() || body.status != "ok" {
            return Err(AppError::NewsApi(format!(
                "HTTP {} {}: {}",
                status,
                body.code.as_deref().unwrap_or("error"),
                body.message.as_deref().unwrap_or("no message")
            )));
        }

        Ok(map_articles(body, &query.label, Utc::now()))
    }
}

#[async_trait]
impl ArticleSource for NewsApiSource {
    async fn fetch_articles(&self, categories: &[String], page: u32) -> Result<Vec<Article>> {
        let mut queries: Vec<CategoryQuery> = Vec::new();
        for label in categories {
            let query = CategoryQuery::from_label(label);
            if !queries.contains(&query) {
                queries.push(query);
            }
        }

        fetch_all(queries, |query| self.fetch_query(query, page)).await
    }

    fn name(&self) -> &str {
        "news_api"
    }
}

fn map_articles(body: HeadlinesResponse, category: &str, now: DateTime<Utc>) -> Vec<Article> {
    body.articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty() && t != REMOVED_MARKER)?;
            let url = a.url.filter(|u| !u.trim().is_empty())?;

            Some(Article {
                id: url.clone(),
                title: title.trim().to_string(),
                description: a.description.unwrap_or_default(),
                source: a
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                category: category.to_string(),
                url,
                publish_date: relative_time(a.published_at.as_deref().and_then(parse_published), now),
                image_url: a.url_to_image,
                summary: None,
                content: a.content,
                authors: a
                    .author
                    .map(|author| {
                        author
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                key_points: Vec::new(),
                notable_quotes: Vec::new(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"{
        "status": "ok",
        "totalResults": 3,
        "articles": [
            {
                "source": {"id": null, "name": "The Verge"},
                "author": "Jane Doe, John Roe",
                "title": "Chipmakers race to ship faster accelerators",
                "description": "New silicon promises lower latency.",
                "url": "https://example.com/chips",
                "urlToImage": "https://example.com/chips.jpg",
                "publishedAt": "2025-10-18T09:00:00Z",
                "content": "Full text"
            },
            {
                "source": {"id": null, "name": "[Removed]"},
                "author": null,
                "title": "[Removed]",
                "description": "[Removed]",
                "url": "https://removed.com",
                "urlToImage": null,
                "publishedAt": "2025-10-18T09:00:00Z",
                "content": null
            },
            {
                "source": {"id": null, "name": "Wire"},
                "author": null,
                "title": "No link here",
                "description": null,
                "url": null,
                "urlToImage": null,
                "publishedAt": null,
                "content": null
            }
        ]
    }"#;

    #[test]
    fn maps_usable_articles_and_drops_removed_ones() {
        let body: HeadlinesResponse = serde_json::from_str(SAMPLE).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 10, 18, 12, 0, 0).unwrap();
        let articles = map_articles(body, "Technology", now);

        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.id, "https://example.com/chips");
        assert_eq!(article.source, "The Verge");
        assert_eq!(article.category, "Technology");
        assert_eq!(article.publish_date, "3h ago");
        assert_eq!(article.authors, vec!["Jane Doe", "John Roe"]);
        assert_eq!(article.image_url.as_deref(), Some("https://example.com/chips.jpg"));
    }

    #[test]
    fn error_payload_deserializes() {
        let body: HeadlinesResponse = serde_json::from_str(
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid"}"#,
        )
        .unwrap();
        assert_eq!(body.status, "error");
        assert!(body.articles.is_empty());
        assert_eq!(body.code.as_deref(), Some("apiKeyInvalid"));
    }

    #[test]
    fn labels_map_to_api_queries() {
        let finance = CategoryQuery::from_label("Finance");
        assert_eq!(finance.api_category, "business");
        assert_eq!(finance.keyword.as_deref(), Some("finance"));

        assert_eq!(CategoryQuery::from_label("Technology").keyword, None);

        let custom = CategoryQuery::from_label("Gardening");
        assert_eq!(custom.api_category, "general");
        assert_eq!(custom.keyword.as_deref(), Some("gardening"));
        assert_eq!(custom.label, "Gardening");
    }

    #[test]
    fn query_url_carries_the_requested_page() {
        let config = NewsApiConfig {
            api_key: Some("secret".to_string()),
            ..NewsApiConfig::default()
        };
        let source = NewsApiSource::new(&config, &HttpConfig::default()).unwrap();

        let url = source.query_url(&CategoryQuery::from_label("Finance"), 3);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(url.path().ends_with("/top-headlines"));
        assert!(pairs.contains(&("category".to_string(), "business".to_string())));
        assert!(pairs.contains(&("q".to_string(), "finance".to_string())));
        assert!(pairs.contains(&("page".to_string(), "3".to_string())));
        assert!(!url.as_str().contains("secret"));
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let result = NewsApiSource::new(&NewsApiConfig::default(), &HttpConfig::default());
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
