//! JSON HTTP surface for the helpdesk ticket engine.
//!
//! Exposes an axum [`Router`] over an [`Engine`] and a [`TicketStore`]. The
//! acting user's id travels in the request body; identity issuance and
//! transport security are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", helpdesk_api::router(state))
//! ```

pub mod commands;
pub mod error;
pub mod tickets;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use helpdesk_core::store::TicketStore;
use helpdesk_engine::Engine;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HELPDESK_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: TicketStore> {
  pub engine: Arc<Engine>,
  pub store:  Arc<S>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the helpdesk API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TicketStore + Clone + 'static,
{
  Router::new()
    // Queries
    .route("/tickets", get(tickets::list::<S>).post(tickets::create::<S>))
    .route("/tickets/{id}", get(tickets::get_one::<S>).patch(tickets::update::<S>))
    .route("/queue/{tier}", get(tickets::queue::<S>))
    .route("/staff/{user_id}/tickets", get(tickets::assigned::<S>))
    .route("/clients/{client_id}/tickets", get(tickets::for_client::<S>))
    // Lifecycle commands
    .route("/tickets/{id}/claim", post(commands::claim::<S>))
    .route("/tickets/{id}/start", post(commands::start::<S>))
    .route("/tickets/{id}/resolve", post(commands::resolve::<S>))
    .route("/tickets/{id}/escalate", post(commands::escalate::<S>))
    .route("/tickets/{id}/close", post(commands::close::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
