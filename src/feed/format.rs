use chrono::{DateTime, Utc};
use rand::Rng;

/// Human label for how long ago an article was published.
pub fn relative_time(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(published) = published else {
        return "Recently".to_string();
    };

    let hours = (now - published).num_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if hours < 48 {
        "Yesterday".to_string()
    } else {
        published.format("%b %-d").to_string()
    }
}

/// Id for articles whose upstream offers neither guid nor url.
pub fn session_article_id() -> String {
    let suffix: u32 = rand::thread_rng().gen();
    format!("{}-{:08x}", Utc::now().timestamp_millis(), suffix)
}

/// Parse an upstream timestamp, RFC 3339 first, then a bare SQL-style datetime.
pub fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}
