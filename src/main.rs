use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use swipe_feed::config::Config;
use swipe_feed::error::Result;
use swipe_feed::explore::{ExploreController, ExploreSettings};
use swipe_feed::feed::{build_source, ArticleSource, CatalogSource};
use swipe_feed::models::{Article, SwipeDirection, CATEGORIES};

const USAGE: &str = "usage: swipe-feed [--offline] [--categories A,B,...]

commands:
  r, right   like the top card
  l, left    skip the top card
  topics     show trending topics
  state      print the session as JSON
  reset      start over
  q, quit    exit";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    // Load configuration
    let config = Config::load()?;

    let offline = args.iter().any(|a| a == "--offline");

    let categories = args
        .windows(2)
        .find(|pair| pair[0] == "--categories")
        .map(|pair| parse_categories(&pair[1]))
        .unwrap_or_else(|| config.explore.default_categories.clone());

    if categories.is_empty() {
        eprintln!("No categories selected. Choose from: {}", CATEGORIES.join(", "));
        return Ok(());
    }

    let source: Arc<dyn ArticleSource> = if offline {
        Arc::new(CatalogSource::new())
    } else {
        build_source(&config)?
    };

    let controller = ExploreController::new(source, ExploreSettings::from(&config.explore));
    println!(
        "Loading {} from {}...",
        categories.join(", "),
        controller.source_name()
    );
    controller.load_categories(categories).await;
    print_top(&controller).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = line.trim();
        match command {
            "" => continue,
            "q" | "quit" => break,
            "reset" => {
                controller.reset_state().await;
                print_top(&controller).await;
            }
            "topics" => print_topics(&controller.trending_topics().await),
            "state" => {
                let snapshot = controller.snapshot().await;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            other => match other.parse::<SwipeDirection>() {
                Ok(direction) => {
                    if controller.swipe(direction).await.is_none() {
                        println!("No more articles. Type 'reset' to start over.");
                        continue;
                    }
                    if direction == SwipeDirection::Right {
                        print_topics(&controller.trending_topics().await);
                    }
                    print_top(&controller).await;
                }
                Err(e) => println!("{}\n\n{}", e, USAGE),
            },
        }
    }

    Ok(())
}

fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn print_top(controller: &ExploreController) {
    if let Some(error) = controller.error().await {
        println!("! {}", error);
    }

    let stack = controller.current_articles().await;
    match stack.first() {
        Some(article) => print_card(article, stack.len()),
        None => println!("No more articles. Type 'reset' to start over."),
    }
}

fn print_card(article: &Article, stacked: usize) {
    println!();
    println!("[{}] {}", article.category, article.title);
    println!("{} · {}", article.source, article.publish_date);
    if !article.description.is_empty() {
        println!("{}", textwrap::fill(&article.description, 72));
    }
    println!("{}", article.url);
    if stacked > 1 {
        println!("(+{} more in stack)", stacked - 1);
    }
}

fn print_topics(topics: &[String]) {
    if topics.is_empty() {
        println!("Trending: (swipe right to build your topics)");
    } else {
        println!("Trending: {}", topics.join(" · "));
    }
}
