/// Walkup - walk-up song manager for recreational teams
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkup_cli::{AppConfig, Roster};
use walkup_client::{
    CatalogClient, RateLimitedClient, ReqwestTransport, StaticTokenProvider, WebPlaybackTransport,
    MAX_SEARCH_LIMIT,
};
use walkup_core::{rotation, AuthProvider, InitGuard, Player};
use walkup_playback::SegmentPlayer;

#[derive(Parser)]
#[command(name = "walkup")]
#[command(about = "Walk-up song manager for recreational teams", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./walkup.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current batter, on deck and in the hole
    Lineup {
        /// Roster JSON file
        #[arg(short, long)]
        roster: PathBuf,
        /// Current position in the batting order
        #[arg(short, long, default_value_t = 0)]
        position: usize,
    },
    /// Search the provider catalog for tracks
    Search {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
    /// Play a player's walk-up segment
    Play {
        /// Roster JSON file
        #[arg(short, long)]
        roster: PathBuf,
        /// Player id or name
        #[arg(short, long)]
        player: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "walkup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Lineup { roster, position } => lineup(&config, &roster, position)?,
        Commands::Search { query, limit } => search(&config, &query, limit).await?,
        Commands::Play { roster, player } => play(&config, &roster, &player).await?,
    }

    Ok(())
}

fn describe(player: Option<&Player>) -> String {
    match player {
        Some(p) => match &p.song {
            Some(song) => format!("{} ({})", p.name, song.track().display_name()),
            None => format!("{} (no walk-up song)", p.name),
        },
        None => "-".to_string(),
    }
}

fn lineup(config: &AppConfig, path: &Path, position: usize) -> anyhow::Result<()> {
    let roster = Roster::load(path, &config.segments)?;
    let order = roster.order(position)?;

    println!(
        "At bat:      {}",
        describe(rotation::current_batter(&order, &roster.players))
    );
    println!(
        "On deck:     {}",
        describe(rotation::on_deck(&order, &roster.players))
    );
    println!(
        "In the hole: {}",
        describe(rotation::in_the_hole(&order, &roster.players))
    );
    Ok(())
}

fn provider_client(config: &AppConfig) -> anyhow::Result<RateLimitedClient> {
    let auth: Arc<dyn AuthProvider> = Arc::new(StaticTokenProvider::new(config.access_token()?));
    let transport = ReqwestTransport::new(&config.client)?;
    Ok(RateLimitedClient::new(transport, &config.client, Some(auth))?)
}

async fn search(config: &AppConfig, query: &str, limit: u32) -> anyhow::Result<()> {
    let catalog = CatalogClient::new(provider_client(config)?);
    let tracks = catalog
        .search_tracks(query, limit.min(MAX_SEARCH_LIMIT))
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Search failed")?;

    if tracks.is_empty() {
        println!("No tracks found");
    }
    for track in tracks {
        let secs = track.duration().as_secs();
        println!(
            "{:<24} {:>2}:{:02}  {}",
            track.id,
            secs / 60,
            secs % 60,
            track.display_name()
        );
    }
    Ok(())
}

async fn play(config: &AppConfig, path: &Path, key: &str) -> anyhow::Result<()> {
    let roster = Roster::load(path, &config.segments)?;
    let batter = roster.find_player(key)?;

    let guard = Arc::new(InitGuard::new());
    let mut transport = WebPlaybackTransport::new(provider_client(config)?, guard);
    if let Some(device) = &config.playback.device_name {
        transport = transport.with_preferred_device(device.clone());
    }

    let player = SegmentPlayer::new(transport);
    let mut updates = player.subscribe();

    player
        .play_walkup(batter)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("Could not play walk-up for {}", batter.name))?;
    println!("Now playing walk-up for {}", batter.name);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = updates.borrow_and_update().status;
                if !status.is_active() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                player.shutdown().await;
                break;
            }
        }
    }

    println!("Done");
    Ok(())
}
