mod article;
mod swipe;

pub use article::{Article, NotableQuote, CATEGORIES};
pub use swipe::{SwipeDirection, SwipeRecord};
