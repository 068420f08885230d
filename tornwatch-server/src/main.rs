use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use tornwatch_common::models::NotificationSettings;
use tornwatch_common::traits::CredentialStore;
use tornwatch_core::clock::SystemClock;
use tornwatch_core::config::{
    load_notification_settings, EngineConfig, DEFAULT_API_BASE, DEFAULT_RELEASES_URL,
};
use tornwatch_core::credential::{KeyringCredentialStore, MemoryCredentialStore};
use tornwatch_core::tasks::update_check::spawn_update_check;
use tornwatch_core::{Collaborators, DefaultHttpClient, Engine, HttpClient};

mod notifier;
mod projector;

use notifier::LogNotifier;
use projector::LogProjector;

#[derive(Parser, Debug, Clone)]
#[command(name = "tornwatch")]
#[command(author, version, about = "TornWatch - Torn status countdowns and notifications")]
struct Args {
    /// API key to use. Falls back to TORN_API_KEY, then to the stored key.
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Seconds between poll cycles
    #[arg(long, default_value_t = 15)]
    poll_interval_secs: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    fetch_timeout_secs: u64,

    /// JSON file with notification toggles
    #[arg(long)]
    notify_config: Option<PathBuf>,

    /// Also announce notifications on the voice channel
    #[arg(long, default_value = "false")]
    voice: bool,

    /// Disable push notifications
    #[arg(long, default_value = "false")]
    no_push: bool,

    /// Keep the API key in memory only instead of the OS keyring
    #[arg(long, default_value = "false")]
    memory_credentials: bool,

    /// Look for a newer release on startup
    #[arg(long, default_value = "false")]
    check_updates: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("tornwatch=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

fn engine_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut notifications = match &args.notify_config {
        Some(path) => load_notification_settings(path)
            .with_context(|| format!("reading notification settings from {}", path.display()))?,
        None => NotificationSettings::default(),
    };
    if args.voice {
        notifications.voice_enabled = true;
    }
    if args.no_push {
        notifications.push_enabled = false;
    }

    Ok(EngineConfig {
        api_base: args.api_base.clone(),
        poll_interval: Duration::from_secs(args.poll_interval_secs.max(1)),
        fetch_timeout: Duration::from_secs(args.fetch_timeout_secs.max(1)),
        notifications,
        ..EngineConfig::default()
    })
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = engine_config(&args)?;
    if config.fetch_timeout >= config.poll_interval {
        warn!(
            "Fetch timeout ({:?}) is not shorter than the poll interval ({:?}); some cycles will be skipped",
            config.fetch_timeout, config.poll_interval
        );
    }

    let credentials: Arc<dyn CredentialStore> = if args.memory_credentials {
        Arc::new(MemoryCredentialStore::new())
    } else {
        Arc::new(KeyringCredentialStore::new())
    };
    let http: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new()?);

    if args.check_updates {
        spawn_update_check(
            http.clone(),
            DEFAULT_RELEASES_URL.to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
    }

    let collaborators = Collaborators {
        projector: Box::new(LogProjector::new()),
        notifier: Arc::new(LogNotifier),
        credentials,
        http,
        clock: Arc::new(SystemClock),
    };
    let (engine, handle) = Engine::new(config, collaborators)?;
    let engine_task = engine.spawn();

    let supplied = args.api_key.clone().or_else(|| std::env::var("TORN_API_KEY").ok());
    if let Some(raw) = supplied {
        handle.set_credential(&raw).context("rejected API key")?;
    }

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C detected; shutting down.");
    handle.shutdown()?;
    if let Err(e) = engine_task.await {
        error!("Engine task ended abnormally: {:?}", e);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    info!(
        "TornWatch starting. poll_interval={}s fetch_timeout={}s",
        args.poll_interval_secs, args.fetch_timeout_secs
    );

    if let Err(e) = run(args).await {
        error!("TornWatch error: {:#}", e);
        return Err(e);
    }

    info!("Main finished. Goodbye!");
    Ok(())
}
