use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use reelfeed_config::{ClientConfig, commands};
use reelfeed_core::FeedOrder;
use reelfeed_model::{ItemId, MediaKind};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "reelfeed",
    about = "Browse popular titles and resolve their trailers"
)]
struct Cli {
    /// Catalog half to browse: movie or tv
    #[arg(long, global = true, default_value = "movie")]
    kind: MediaKind,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Accumulate a bounded feed of distinct titles
    Feed {
        /// Number of titles to gather (defaults to the configured size)
        #[arg(long)]
        target: Option<usize>,
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
    },
    /// Page through the listing one page at a time
    Scroll {
        #[arg(long, default_value_t = 3)]
        pages: u32,
    },
    /// Resolve trailers for one or more ids (e.g. 550, tv/1399)
    Trailer {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Simultaneous resolves per id; they share one lookup
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },
    /// Print the effective configuration and where it came from
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    Preserve,
    Shuffle,
}

impl From<OrderArg> for FeedOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Preserve => FeedOrder::Preserve,
            OrderArg::Shuffle => FeedOrder::Shuffle,
        }
    }
}

/// Bare numbers take the kind from `--kind`; `tv/1399` style ids carry
/// their own.
fn parse_id(raw: &str, kind: MediaKind) -> Result<ItemId> {
    if let Ok(tmdb_id) = raw.trim().parse::<u64>() {
        return Ok(ItemId::new(kind, tmdb_id));
    }
    Ok(raw.parse::<ItemId>()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "reelfeed_core=info,reelfeed_config=info,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let env_file_loaded = dotenvy::dotenv().is_ok();
    let cli = Cli::parse();

    let (config, source) = ClientConfig::load_from_env()?;
    debug!(%source, env_file_loaded, "configuration loaded");
    config.validate()?;

    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Config => commands::show_config(&config, &source, &mut stdout),
        Command::Feed { target, order } => {
            let client = commands::build_client(&config)?;
            commands::run_feed(
                &config,
                client,
                cli.kind,
                target,
                order.map(FeedOrder::from),
                &mut stdout,
            )
            .await
        }
        Command::Scroll { pages } => {
            let client = commands::build_client(&config)?;
            commands::run_scroll(&config, client, cli.kind, pages, &mut stdout)
                .await
        }
        Command::Trailer { ids, concurrency } => {
            let ids = ids
                .iter()
                .map(|raw| parse_id(raw, cli.kind))
                .collect::<Result<Vec<_>>>()?;
            let client = commands::build_client(&config)?;
            commands::run_trailers(
                &config,
                client,
                &ids,
                concurrency,
                &mut stdout,
            )
            .await
        }
    }
}
