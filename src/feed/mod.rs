use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::config::{Config, SourceKind};
use crate::error::{AppError, Result};
use crate::models::Article;

mod catalog;
pub mod format;
mod news_api;
mod rss;
mod subscriptions;

pub use catalog::CatalogSource;
pub use news_api::{CategoryQuery, NewsApiSource};
pub use rss::RssSource;
pub use subscriptions::{load_category_feeds, parse_category_feeds};

const MAX_CONCURRENT_FETCHES: usize = 5;

/// Supplies candidate articles for a set of category labels.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Best-effort fetch of one result page, starting at 1. Implementations
    /// tolerate per-category failures and return an error only when nothing
    /// could be fetched at all. A page past the end yields an empty batch.
    async fn fetch_articles(&self, categories: &[String], page: u32) -> Result<Vec<Article>>;

    fn name(&self) -> &str;
}

/// Build the source selected by the configuration.
pub fn build_source(config: &Config) -> Result<Arc<dyn ArticleSource>> {
    let source: Arc<dyn ArticleSource> = match config.resolved_source() {
        SourceKind::NewsApi => Arc::new(NewsApiSource::new(&config.news_api, &config.http)?),
        SourceKind::Rss => {
            let mut feeds = config.rss.feeds.clone();
            if let Some(path) = &config.rss.opml_path {
                for (category, urls) in load_category_feeds(path)? {
                    feeds.entry(category).or_default().extend(urls);
                }
            }
            Arc::new(RssSource::new(feeds, &config.http)?)
        }
        SourceKind::Catalog => Arc::new(CatalogSource::new()),
    };
    tracing::debug!("Using article source: {}", source.name());
    Ok(source)
}

/// Run one fetch per key with bounded concurrency. Failed keys contribute
/// nothing; the call fails only when every key failed.
pub(crate) async fn fetch_all<K, F, Fut>(keys: Vec<K>, fetch: F) -> Result<Vec<Article>>
where
    K: fmt::Display,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<Vec<Article>>>,
{
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let total = keys.len();
    let results: Vec<(String, Result<Vec<Article>>)> = stream::iter(keys)
        .map(|key| {
            let label = key.to_string();
            let fut = fetch(key);
            async move { (label, fut.await) }
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES)
        .collect()
        .await;

    let mut articles = Vec::new();
    let mut failures = Vec::new();
    for (label, result) in results {
        match result {
            Ok(batch) => {
                tracing::debug!("Fetched {} articles for {}", batch.len(), label);
                articles.extend(batch);
            }
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}", label, e);
                failures.push(format!("{}: {}", label, e));
            }
        }
    }

    if failures.len() == total {
        return Err(AppError::Fetch(failures.join("; ")));
    }

    Ok(articles)
}
