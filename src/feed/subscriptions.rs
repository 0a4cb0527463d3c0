use std::collections::BTreeMap;
use std::path::Path;

use opml::{Outline, OPML};

use crate::error::{AppError, Result};

/// Read an OPML file where each top-level outline is a category label and
/// the feeds nested below it belong to that category.
pub fn load_category_feeds(path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let content = std::fs::read_to_string(path)?;
    parse_category_feeds(&content)
}

pub fn parse_category_feeds(xml: &str) -> Result<BTreeMap<String, Vec<String>>> {
    let document = OPML::from_str(xml).map_err(|e| AppError::Opml(e.to_string()))?;

    let mut feeds: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for outline in &document.body.outlines {
        let category = outline
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| outline.text.clone());

        let mut urls = Vec::new();
        collect_feed_urls(&outline.outlines, &mut urls);
        if urls.is_empty() {
            tracing::debug!("OPML outline {} has no nested feeds", category);
            continue;
        }
        feeds.entry(category.trim().to_string()).or_default().extend(urls);
    }

    Ok(feeds)
}

fn collect_feed_urls(outlines: &[Outline], urls: &mut Vec<String>) {
    for outline in outlines {
        if let Some(url) = &outline.xml_url {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
        collect_feed_urls(&outline.outlines, urls);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
  <head><title>Subscriptions</title></head>
  <body>
    <outline text="Technology">
      <outline text="Ars" type="rss" xmlUrl="https://example.com/ars.xml"/>
      <outline text="Nested">
        <outline text="Verge" type="rss" xmlUrl="https://example.com/verge.xml"/>
      </outline>
    </outline>
    <outline text="science" title="Science">
      <outline text="Nature" type="rss" xmlUrl="https://example.com/nature.xml"/>
    </outline>
    <outline text="Loose" type="rss" xmlUrl="https://example.com/loose.xml"/>
  </body>
</opml>"#;

    #[test]
    fn groups_feeds_by_top_level_outline() {
        let feeds = parse_category_feeds(SAMPLE).unwrap();

        assert_eq!(feeds.len(), 2);
        assert_eq!(
            feeds["Technology"],
            vec!["https://example.com/ars.xml", "https://example.com/verge.xml"]
        );
        assert_eq!(feeds["Science"], vec!["https://example.com/nature.xml"]);
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeds.opml");
        std::fs::write(&path, SAMPLE).unwrap();

        let feeds = load_category_feeds(&path).unwrap();
        assert!(feeds.contains_key("Technology"));
    }

    #[test]
    fn invalid_document_is_an_opml_error() {
        assert!(matches!(parse_category_feeds("<nope>"), Err(AppError::Opml(_))));
    }
}
