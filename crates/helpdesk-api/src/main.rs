//! helpdesk-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `HELPDESK_*` environment variables, hydrates the ticket engine from the
//! SQLite store, and serves the JSON API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use helpdesk_api::{AppState, ServerConfig};
use helpdesk_core::store::TicketStore as _;
use helpdesk_engine::Engine;
use helpdesk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Helpdesk ticket server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HELPDESK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Hydrate the engine from the durable snapshot.
  let tickets = store.load_tickets().await.context("failed to load tickets")?;
  let users = store.load_users().await.context("failed to load users")?;
  let engine = Engine::initialize(tickets, users);

  // Live delivery to clients belongs to the transport layer; until one is
  // attached, log what would be pushed.
  engine.subscribe_all(|notification, client_id| {
    tracing::debug!(
      client_id,
      ticket_id = %notification.ticket_id,
      title = %notification.title,
      "client notification"
    );
    Ok(())
  });

  let state = AppState {
    engine: Arc::new(engine),
    store:  Arc::new(store),
  };

  let app = helpdesk_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
