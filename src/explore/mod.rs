mod controller;
mod ranking;
mod state;
pub mod topics;

pub use controller::ExploreController;
pub use ranking::{dedup_by_title, rank_by_preferences, CategoryPreferences};
pub use state::{
    ExploreSettings, FeedSnapshot, FeedState, LoadMode, SwipeOutcome, FETCH_FAILED_MESSAGE,
    NO_ARTICLES_MESSAGE,
};
pub use topics::{extract_topics, TrendingTopics};
