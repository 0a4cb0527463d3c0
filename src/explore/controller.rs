use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{watch, Mutex};
use tokio::task::{AbortHandle, JoinHandle};

use super::state::{ExploreSettings, FeedSnapshot, FeedState, LoadMode};
use crate::error::AppError;
use crate::feed::ArticleSource;
use crate::models::{Article, SwipeDirection, SwipeRecord};

struct InFlight {
    generation: u64,
    abort: AbortHandle,
}

struct Shared {
    state: Mutex<FeedState>,
    source: Arc<dyn ArticleSource>,
    in_flight: Mutex<Option<InFlight>>,
    busy: watch::Sender<bool>,
}

/// Single-owner front for one user's explore session.
///
/// All state sits behind one async mutex and is never held across a fetch.
/// Loads are serialized: an explicit load aborts whatever is in flight, a
/// background refill is skipped while another load is running, and results
/// from a superseded load are discarded by generation.
#[derive(Clone)]
pub struct ExploreController {
    shared: Arc<Shared>,
}

impl ExploreController {
    pub fn new(source: Arc<dyn ArticleSource>, settings: ExploreSettings) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(FeedState::new(settings)),
                source,
                in_flight: Mutex::new(None),
                busy,
            }),
        }
    }

    /// Fetch articles for `categories` and replace the candidate list.
    /// Failures end up in [`error`](Self::error), never in the return value.
    pub async fn load_categories(&self, categories: Vec<String>) {
        if categories.is_empty() {
            tracing::debug!("Ignoring load with no categories");
            return;
        }

        if let Some(handle) = self.shared.start_load(categories, LoadMode::Replace).await {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::error!("Load task failed: {}", e);
                }
            }
        }
    }

    /// Consume the top card. Starts a background refill when the queue runs
    /// low. Returns `None` if the feed is already exhausted.
    pub async fn swipe(&self, direction: SwipeDirection) -> Option<SwipeRecord> {
        let (outcome, selection) = {
            let mut state = self.shared.state.lock().await;
            let outcome = state.swipe(direction, Utc::now())?;
            (outcome, state.selection().to_vec())
        };

        if outcome.needs_refill
            && self.shared.start_load(selection, LoadMode::Refill).await.is_some()
        {
            tracing::info!("Refill requested after swiping {}", outcome.record.article_id);
        }

        Some(outcome.record)
    }

    /// Clear cursor, history, preferences, liked articles and trending topics,
    /// then reload the active selection if there is one.
    pub async fn reset_state(&self) {
        let selection = {
            let mut state = self.shared.state.lock().await;
            state.reset();
            state.selection().to_vec()
        };

        if selection.is_empty() {
            self.shared.cancel_in_flight().await;
            return;
        }

        self.load_categories(selection).await;
    }

    /// Resolves once no load is in flight.
    pub async fn wait_for_load(&self) {
        let mut rx = self.shared.busy.subscribe();
        let _ = rx.wait_for(|busy| !*busy).await;
    }

    pub async fn current_articles(&self) -> Vec<Article> {
        self.shared.state.lock().await.current_articles().to_vec()
    }

    pub async fn has_more_articles(&self) -> bool {
        self.shared.state.lock().await.has_more_articles()
    }

    pub async fn trending_topics(&self) -> Vec<String> {
        self.shared.state.lock().await.trending_topics().to_vec()
    }

    pub async fn liked_articles(&self) -> Vec<Article> {
        self.shared.state.lock().await.liked_articles().to_vec()
    }

    pub async fn swipe_history(&self) -> Vec<SwipeRecord> {
        self.shared.state.lock().await.history().to_vec()
    }

    pub async fn preference_score(&self, category: &str) -> i64 {
        self.shared.state.lock().await.preferences().score(category)
    }

    pub async fn cursor(&self) -> usize {
        self.shared.state.lock().await.cursor()
    }

    pub async fn is_loading(&self) -> bool {
        self.shared.state.lock().await.is_loading()
    }

    pub async fn error(&self) -> Option<String> {
        self.shared.state.lock().await.error().map(str::to_string)
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        self.shared.state.lock().await.snapshot()
    }

    pub fn source_name(&self) -> &str {
        self.shared.source.name()
    }
}

impl Shared {
    async fn start_load(
        self: &Arc<Self>,
        categories: Vec<String>,
        mode: LoadMode,
    ) -> Option<JoinHandle<()>> {
        let mut in_flight = self.in_flight.lock().await;

        if let Some(current) = in_flight.as_ref() {
            if !current.abort.is_finished() {
                if mode == LoadMode::Refill {
                    tracing::debug!("Load {} still running, skipping refill", current.generation);
                    return None;
                }
                tracing::debug!("Superseding load {}", current.generation);
                current.abort.abort();
            }
        }

        let (generation, page) = {
            let mut state = self.state.lock().await;
            let generation = state.begin_load(&categories, mode);
            (generation, state.pending_page())
        };
        self.busy.send_replace(true);

        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move {
            shared.run_load(generation, page, categories, mode).await;
        });

        *in_flight = Some(InFlight {
            generation,
            abort: handle.abort_handle(),
        });

        Some(handle)
    }

    async fn run_load(&self, generation: u64, page: u32, categories: Vec<String>, mode: LoadMode) {
        tracing::debug!(
            "Fetching {:?} page {} from {} (generation {})",
            categories,
            page,
            self.source.name(),
            generation
        );
        // A panicking source counts as a failed fetch so the load still finishes.
        let result = AssertUnwindSafe(self.source.fetch_articles(&categories, page))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(AppError::Fetch(format!(
                    "{} panicked while fetching",
                    self.source.name()
                )))
            });

        let mut state = self.state.lock().await;
        if state.finish_load(generation, mode, result) {
            self.busy.send_replace(false);
        }
    }

    async fn cancel_in_flight(&self) {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(current) = in_flight.take() {
            current.abort.abort();
        }
        self.state.lock().await.cancel_load();
        self.busy.send_replace(false);
    }
}
