//! Handlers for the lifecycle commands.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/tickets/{id}/claim` | `{"user_id":"..."}` |
//! | `POST` | `/tickets/{id}/start` | `{"user_id":"..."}` |
//! | `POST` | `/tickets/{id}/resolve` | `{"user_id":"...","notes":"..."}` |
//! | `POST` | `/tickets/{id}/escalate` | `{"user_id":"...","target_level":"l2","reason":"..."}` |
//! | `POST` | `/tickets/{id}/close` | `{"user_id":"..."}` |
//!
//! Every successful command writes the ticket back to the store before
//! responding. A failed write-back answers 500 with `"applied": true` and the
//! ticket as the engine now holds it.

use axum::{
  Json,
  extract::{Path, State},
};
use helpdesk_core::{store::TicketStore, tier::Tier};
use helpdesk_engine::{CommandOutcome, CommandResult};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ActorBody {
  pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub user_id: String,
  pub notes:   Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EscalateBody {
  pub user_id:      String,
  pub target_level: Tier,
  pub reason:       Option<String>,
}

/// Persist a successful command's ticket and wrap it in a
/// [`CommandOutcome`].
///
/// Write-backs of one ticket may finish out of order; the store keeps the
/// revision with the longest history.
pub(crate) async fn persist<S>(
  state: &AppState<S>,
  result: CommandResult,
  message: &str,
) -> Result<Json<CommandOutcome>, ApiError>
where
  S: TicketStore,
{
  let ticket = result?;
  if let Err(e) = state.store.put_ticket(ticket.clone()).await {
    return Err(ApiError::NotPersisted {
      ticket: Box::new(ticket),
      source: Box::new(e),
    });
  }
  Ok(Json(CommandOutcome::from_result(Ok(ticket), message)))
}

/// `POST /tickets/{id}/claim`
pub async fn claim<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<ActorBody>,
) -> Result<Json<CommandOutcome>, ApiError>
where
  S: TicketStore + Clone,
{
  let result = state.engine.claim(&id, &body.user_id);
  persist(&state, result, "Ticket claimed").await
}

/// `POST /tickets/{id}/start`
pub async fn start<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<ActorBody>,
) -> Result<Json<CommandOutcome>, ApiError>
where
  S: TicketStore + Clone,
{
  let result = state.engine.start_work(&id, &body.user_id);
  persist(&state, result, "Work started").await
}

/// `POST /tickets/{id}/resolve`
pub async fn resolve<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<CommandOutcome>, ApiError>
where
  S: TicketStore + Clone,
{
  let result = state
    .engine
    .resolve(&id, &body.user_id, body.notes.as_deref());
  persist(&state, result, "Ticket resolved").await
}

/// `POST /tickets/{id}/escalate`
pub async fn escalate<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<EscalateBody>,
) -> Result<Json<CommandOutcome>, ApiError>
where
  S: TicketStore + Clone,
{
  let result = state
    .engine
    .escalate(&id, &body.user_id, body.target_level, body.reason);
  let message = format!("Ticket escalated to {}", body.target_level.label());
  persist(&state, result, &message).await
}

/// `POST /tickets/{id}/close`
pub async fn close<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<ActorBody>,
) -> Result<Json<CommandOutcome>, ApiError>
where
  S: TicketStore + Clone,
{
  let result = state.engine.close(&id, &body.user_id);
  persist(&state, result, "Ticket closed").await
}
