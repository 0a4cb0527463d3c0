use async_trait::async_trait;

use super::ArticleSource;
use crate::error::Result;
use crate::models::Article;

// (category, title, description, source, publish label)
const ENTRIES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Technology",
        "Revolutionary AI Breakthrough Changes Everything",
        "Scientists have developed a new AI system that can understand and generate human-like responses with unprecedented accuracy.",
        "Tech Today",
        "2h ago",
    ),
    (
        "Technology",
        "Chipmakers Race to Ship Faster Accelerators",
        "Semiconductor companies unveiled processors promising dramatic efficiency gains for machine learning workloads.",
        "Silicon Report",
        "5h ago",
    ),
    (
        "Finance",
        "Global Markets Surge on Economic Recovery",
        "Stock markets worldwide are experiencing significant gains as economic indicators point to a strong recovery.",
        "Financial Times",
        "4h ago",
    ),
    (
        "Finance",
        "Central Banks Signal Patience on Rates",
        "Policymakers suggested interest rates will remain steady while inflation continues cooling across major economies.",
        "Money Matters",
        "Yesterday",
    ),
    (
        "Stock Market",
        "Tech Stocks Lead Broad Rally",
        "Investors poured into technology shares after quarterly earnings beat analyst expectations across the sector.",
        "Market Watch",
        "3h ago",
    ),
    (
        "Stock Market",
        "Volatility Returns as Traders Weigh Earnings",
        "Trading volumes climbed sharply as investors reacted to mixed corporate guidance and shifting forecasts.",
        "Exchange Desk",
        "Yesterday",
    ),
    (
        "World News",
        "Climate Change Summit Reaches Historic Agreement",
        "World leaders have reached a groundbreaking agreement on climate action that could reshape global environmental policy.",
        "World News",
        "6h ago",
    ),
    (
        "World News",
        "Coastal Cities Prepare for Rising Seas",
        "Planners across several continents announced coordinated investments in flood defenses and resilient infrastructure.",
        "Global Dispatch",
        "Yesterday",
    ),
    (
        "Health",
        "New Health Study Reveals Surprising Benefits",
        "A comprehensive study involving 50,000 participants has uncovered unexpected health benefits of a common daily habit.",
        "Health Weekly",
        "8h ago",
    ),
    (
        "Health",
        "Sleep Quality Linked to Heart Resilience",
        "Researchers found consistent sleep schedules strongly predicted cardiovascular recovery among adults over forty.",
        "Wellness Journal",
        "Yesterday",
    ),
    (
        "Sports",
        "Sports Championship Delivers Thrilling Finale",
        "The championship game delivered one of the most exciting finishes in sports history with a last-second victory.",
        "Sports Central",
        "Yesterday",
    ),
    (
        "Sports",
        "Marathon Record Falls in Perfect Conditions",
        "Cool temperatures and a flat course helped the winner shave nearly a minute off the previous record.",
        "Finish Line",
        "Yesterday",
    ),
    (
        "Science",
        "Breakthrough in Renewable Energy Storage",
        "New battery technology promises to revolutionize how we store and use renewable energy sources.",
        "Green Tech",
        "Yesterday",
    ),
    (
        "Science",
        "Telescope Spots Light From Early Galaxies",
        "Astronomers captured faint signals emitted shortly after the universe formed, refining cosmological models.",
        "Cosmos Review",
        "Oct 3",
    ),
    (
        "Art",
        "Art Exhibition Breaks Attendance Records",
        "The latest contemporary art exhibition has attracted record-breaking crowds showcasing innovative works from emerging artists.",
        "Art Weekly",
        "Oct 3",
    ),
    (
        "Art",
        "Restored Murals Reveal Hidden Sketches",
        "Conservators uncovered preliminary drawings beneath centuries-old paintings during a careful restoration project.",
        "Gallery Notes",
        "Oct 2",
    ),
    (
        "Business",
        "Business Leaders Discuss Future Trends",
        "Top executives gathered to discuss emerging trends shaping the business landscape, including sustainable practices.",
        "Business Today",
        "Oct 3",
    ),
    (
        "Business",
        "Startups Embrace Four-Day Workweek",
        "Several growing companies reported stronger retention after trialing shorter schedules with unchanged salaries.",
        "Venture Beat",
        "Oct 2",
    ),
    (
        "Politics",
        "Political Reform Gains Momentum",
        "New legislative proposals are gaining bipartisan support, potentially leading to significant changes in government.",
        "Political Review",
        "Oct 2",
    ),
    (
        "Politics",
        "Voters Weigh Infrastructure Referendum",
        "Residents will decide whether to fund transit upgrades through a temporary increase in regional taxes.",
        "Civic Ledger",
        "Oct 1",
    ),
    (
        "Entertainment",
        "Entertainment Industry Embraces New Technology",
        "Studios are adopting cutting-edge technology to create more immersive experiences for audiences worldwide.",
        "Entertainment Weekly",
        "Oct 1",
    ),
    (
        "Entertainment",
        "Indie Film Sweeps Festival Awards",
        "A low-budget drama collected top honors, surprising critics who had favored larger studio productions.",
        "Screen Daily",
        "Oct 1",
    ),
];

/// Pages after the first that carry follow-up stories.
const FOLLOW_UP_PAGES: u32 = 3;
const FOLLOW_UP_BATCH: usize = 5;

/// Offline catalog of sample articles, filtered by category label.
///
/// Page 1 is the catalog itself. The next few pages re-issue up to five of
/// the matching stories as numbered updates, after which pages are empty.
pub struct CatalogSource {
    articles: Vec<Article>,
}

impl CatalogSource {
    pub fn new() -> Self {
        let articles = ENTRIES
            .iter()
            .enumerate()
            .map(|(i, (category, title, description, source, published))| Article {
                id: format!("catalog-{}", i + 1),
                title: title.to_string(),
                description: description.to_string(),
                source: source.to_string(),
                category: category.to_string(),
                url: format!("https://example.com/articles/{}", i + 1),
                publish_date: published.to_string(),
                image_url: Some(format!("https://picsum.photos/400/250?random={}", i + 1)),
                summary: None,
                content: None,
                authors: Vec::new(),
                key_points: Vec::new(),
                notable_quotes: Vec::new(),
            })
            .collect();

        Self { articles }
    }

    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self { articles }
    }
}

impl Default for CatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleSource for CatalogSource {
    async fn fetch_articles(&self, categories: &[String], page: u32) -> Result<Vec<Article>> {
        let matching: Vec<&Article> = self
            .articles
            .iter()
            .filter(|a| categories.is_empty() || categories.contains(&a.category))
            .collect();

        match page {
            0 | 1 => Ok(matching.into_iter().cloned().collect()),
            n if n <= FOLLOW_UP_PAGES + 1 => Ok(matching
                .into_iter()
                .take(FOLLOW_UP_BATCH)
                .map(|a| follow_up(a, n))
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "catalog"
    }
}

fn follow_up(article: &Article, page: u32) -> Article {
    Article {
        id: format!("{}-p{}", article.id, page),
        title: format!("{}: Update {}", article.title, page - 1),
        url: format!("{}?page={}", article.url, page),
        ..article.clone()
    }
}
