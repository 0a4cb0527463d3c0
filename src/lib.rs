pub mod config;
pub mod error;
pub mod explore;
pub mod feed;
pub mod models;

pub use config::Config;
pub use error::{AppError, Result};
pub use explore::{ExploreController, ExploreSettings, FeedSnapshot};
pub use feed::ArticleSource;
pub use models::{Article, SwipeDirection, SwipeRecord};
