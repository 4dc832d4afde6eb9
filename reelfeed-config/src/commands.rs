//! Implementations behind the `reelfeed` subcommands. Output goes to any
//! [`Write`] so the commands can be driven from tests.

use std::{io::Write, sync::Arc};

use anyhow::Context;
use futures::future::join_all;
use reelfeed_core::{
    CatalogClient, FeedOrder, FeedSession, PageOutcome, Resolution,
    TmdbCatalogClient, TrailerCache,
};
use reelfeed_model::{CatalogItem, ItemId, MediaKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::models::{ClientConfig, ConfigSource};

/// Build the live catalog client from a loaded configuration.
pub fn build_client(
    config: &ClientConfig,
) -> anyhow::Result<Arc<dyn CatalogClient>> {
    let token = config.api_token()?;
    let client = TmdbCatalogClient::new(&config.catalog, token)
        .context("failed to build catalog client")?;
    Ok(Arc::new(client))
}

fn session(
    config: &ClientConfig,
    client: Arc<dyn CatalogClient>,
    kind: MediaKind,
) -> anyhow::Result<FeedSession> {
    FeedSession::new(client, kind, &config.core())
        .context("invalid client configuration")
}

fn item_line(session: &FeedSession, item: &CatalogItem) -> String {
    let year = item
        .release_year()
        .map_or_else(|| "----".to_string(), |y| y.to_string());
    let poster = session.poster_url(item).unwrap_or_else(|| "-".to_string());
    format!("{:<14} {}  {}  {}", item.id.to_string(), year, item.title, poster)
}

/// `reelfeed feed`: one bounded accumulation.
pub async fn run_feed<W: Write>(
    config: &ClientConfig,
    client: Arc<dyn CatalogClient>,
    kind: MediaKind,
    target: Option<usize>,
    order: Option<FeedOrder>,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut config = config.clone();
    if let Some(order) = order {
        config.feed.order = order;
    }
    let target = target.unwrap_or(config.feed.target_size);
    let session = session(&config, client, kind)?;

    let feed = session.get_feed(target, Vec::new()).await;
    for item in &feed.items {
        writeln!(out, "{}", item_line(&session, item))?;
    }
    writeln!(
        out,
        "{} items from {} pages, stopped: {:?}",
        feed.len(),
        feed.pages_fetched,
        feed.stop
    )?;
    Ok(())
}

/// `reelfeed scroll`: drive the incremental pager `pages` times.
pub async fn run_scroll<W: Write>(
    config: &ClientConfig,
    client: Arc<dyn CatalogClient>,
    kind: MediaKind,
    pages: u32,
    out: &mut W,
) -> anyhow::Result<()> {
    let session = session(config, client, kind)?;

    for _ in 0..pages {
        let (outcome, snapshot) = session.get_next_page().await;
        match outcome {
            PageOutcome::Appended { page, added } => {
                writeln!(
                    out,
                    "page {page}: +{added} ({} total)",
                    snapshot.items.len()
                )?;
            }
            PageOutcome::Exhausted | PageOutcome::Failed => {
                writeln!(out, "no more pages ({outcome:?})")?;
                break;
            }
            PageOutcome::Busy => debug!("pager busy"),
        }
    }

    let snapshot = session.feed_snapshot();
    for item in &snapshot.items {
        writeln!(out, "{}", item_line(&session, item))?;
    }
    Ok(())
}

/// `reelfeed trailer`: resolve each id through one shared cache with
/// `concurrency` simultaneous callers, then print the cache counters.
pub async fn run_trailers<W: Write>(
    config: &ClientConfig,
    client: Arc<dyn CatalogClient>,
    ids: &[ItemId],
    concurrency: usize,
    out: &mut W,
) -> anyhow::Result<()> {
    let cache = TrailerCache::new(client, config.trailers.clone());
    let cancel = CancellationToken::new();
    let callers = concurrency.max(1);

    for &id in ids {
        let outcomes = join_all(
            (0..callers).map(|_| cache.resolve_outcome(id, &cancel)),
        )
        .await;

        match outcomes.first() {
            Some(Resolution::Found(trailer)) => writeln!(
                out,
                "{id}: {} {}",
                trailer.kind,
                trailer.embed_url()
            )?,
            Some(Resolution::Absent) => {
                writeln!(out, "{id}: no trailer available")?
            }
            Some(other) => writeln!(out, "{id}: lookup failed ({other:?})")?,
            None => {}
        }
    }

    let stats = cache.stats();
    info!(?stats, "trailer cache");
    writeln!(
        out,
        "hits={} leaders={} joiners={} failures={} cancelled={}",
        stats.hits, stats.leaders, stats.joiners, stats.failures, stats.cancelled
    )?;
    Ok(())
}

/// `reelfeed config`: effective configuration with the token masked.
pub fn show_config<W: Write>(
    config: &ClientConfig,
    source: &ConfigSource,
    out: &mut W,
) -> anyhow::Result<()> {
    writeln!(out, "# source: {source}")?;
    write!(out, "{}", config.redacted().to_toml()?)?;
    Ok(())
}
