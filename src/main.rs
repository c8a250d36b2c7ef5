/// box-feed - feed synchronization diagnostic
///
/// Pages through the configured API the way a client would, then prints
/// the loaded feed grouped by category.
///
/// Usage: box-feed [PAGES] [--user=<ID>] [--metrics]
use anyhow::Context;
use box_feed::{
    config::FeedConfig,
    feed::{CategoryFilter, ALL_CATEGORIES},
    gateway::{CredentialProvider, HttpGateway, StaticCredentials},
    metrics::render_metrics,
    models::FeedScope,
    session::{FeedSession, PageOutcome},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PAGES: usize = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = FeedConfig::from_env().context("Failed to load configuration")?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "box_feed=debug".into());
    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    print_banner(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let show_metrics = args.iter().any(|a| a == "--metrics");
    let pages = args
        .iter()
        .find_map(|a| a.parse::<usize>().ok())
        .unwrap_or(DEFAULT_PAGES);
    let scope = match args.iter().find_map(|a| a.strip_prefix("--user=")) {
        Some(id) => FeedScope::User(id.parse().context("--user expects a numeric user id")?),
        None => FeedScope::All,
    };

    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(StaticCredentials::new(config.auth.bearer_token.clone()));
    let gateway = HttpGateway::new(&config.api, credentials).context("Failed to build HTTP client")?;
    let session = FeedSession::with_scope(Arc::new(gateway), &config, scope);

    for _ in 0..pages {
        match session.load_next_page().await {
            Ok(PageOutcome::Loaded { added }) => info!("Loaded {} new posts", added.len()),
            Ok(PageOutcome::Exhausted) => {
                info!("Feed exhausted");
                break;
            }
            Ok(PageOutcome::Skipped) => {}
            Err(e) if e.is_retryable() => {
                warn!("Page fetch failed, retrying once: {}", e);
                session.load_next_page().await.context("Page fetch failed twice")?;
            }
            Err(e) => return Err(e).context("Page fetch failed"),
        }
    }

    let store = session.snapshot().await;
    println!("\n{} posts loaded (newest id {:?})", store.len(), store.as_of().map(|id| id.0));

    let categories = std::iter::once(ALL_CATEGORIES.to_string()).chain(store.categories());
    for name in categories {
        let posts = session.filtered(&CategoryFilter::from(name.as_str())).await;
        println!("\n[{}] {} posts", name, posts.len());
        for post in posts {
            println!(
                "  #{:<6} {:<20} +{:<4} -{:<4} {} comments, {} media",
                post.id,
                post.author_label(),
                post.upvotes,
                post.downvotes,
                post.comments.len(),
                post.media.len()
            );
        }
    }

    if show_metrics {
        println!("\n{}", render_metrics());
    }

    Ok(())
}

fn print_banner(config: &FeedConfig) {
    println!(
        r#"
    ____                ______              __
   / __ )____  _  __   / ____/__  ___  ____/ /
  / __  / __ \| |/_/  / /_  / _ \/ _ \/ __  /
 / /_/ / /_/ />  <   / __/ /  __/  __/ /_/ /
/_____/\____/_/|_|  /_/    \___/\___/\__,_/

        Feed synchronization core v{}
        API: {}
        "#,
        env!("CARGO_PKG_VERSION"),
        config.api.base_url
    );
}
