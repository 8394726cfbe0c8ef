mod config;
mod error;
mod event;
mod intercept;
mod lifecycle;
mod net;
mod notify;
mod platform;
mod queue;
mod replay;
mod store;
mod worker;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::Config;
use event::{Event, EventHandler};
use intercept::InterceptService;
use lifecycle::Lifecycle;
use net::HttpClient;
use notify::NotificationDispatcher;
use platform::StdioBridge;
use queue::SqliteQueue;
use replay::{NoopTransport, ReplayCoordinator};
use store::SqliteStore;
use worker::Worker;

#[derive(Parser, Debug)]
#[command(name = "ceritad")]
#[command(about = "Offline-first interception and sync worker for the Cerita story app")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/ceritad/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Directory holding the cache database and logs
  #[arg(long)]
  data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  // Override data directory if specified on command line
  let config = if let Some(data_dir) = args.data_dir {
    Config {
      data_dir: Some(data_dir),
      ..config
    }
  } else {
    config
  };

  let data_dir = config.resolve_data_dir()?;
  std::fs::create_dir_all(&data_dir)
    .map_err(|e| eyre!("Failed to create data directory {}: {}", data_dir.display(), e))?;

  // Logs go to a file; stdout belongs to the event bridge
  let _log_guard = init_logging(&data_dir);

  let store = Arc::new(
    SqliteStore::open(&data_dir.join("cache.db"))
      .map_err(|e| eyre!("Failed to open cache store: {}", e))?,
  );
  let queue = Arc::new(
    SqliteQueue::open(&data_dir.join("queue.db"))
      .map_err(|e| eyre!("Failed to open record queue: {}", e))?,
  );
  let bridge = Arc::new(StdioBridge::new());
  let client = HttpClient::new(config.app_origin.clone())
    .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

  let service = Arc::new(InterceptService::new(
    Arc::clone(&store),
    client.clone(),
    &config,
  ));
  let lifecycle = Arc::new(Lifecycle::new(
    Arc::clone(&store),
    Arc::clone(&bridge),
    config.store_names(),
    config.shell_urls()?,
  ));
  let notifier = Arc::new(NotificationDispatcher::new(
    Arc::clone(&bridge),
    Arc::clone(&bridge),
    config.app_origin.clone(),
  ));
  let replay = Arc::new(ReplayCoordinator::new(queue, Arc::new(NoopTransport)));

  let worker = Worker::new(service, lifecycle, notifier, replay, client);

  let events = EventHandler::new();
  events.spawn_stdin_bridge();

  // Activate on startup; further activations arrive as bridge events
  events
    .sender()
    .send(Event::Activate)
    .map_err(|_| eyre!("Event channel closed before startup"))?;

  worker.run(events).await
}

fn init_logging(data_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
  use tracing_subscriber::EnvFilter;

  let file_appender = tracing_appender::rolling::never(data_dir, "ceritad.log");
  let (writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  guard
}
