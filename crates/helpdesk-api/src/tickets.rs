//! Handlers for ticket queries, intake and administrative updates.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/tickets` | All tickets, oldest first |
//! | `POST`  | `/tickets` | Body: [`NewTicket`]; returns 201 |
//! | `GET`   | `/tickets/{id}` | 404 if not found |
//! | `PATCH` | `/tickets/{id}` | Body: [`UpdateBody`] |
//! | `GET`   | `/queue/{tier}` | Tickets claimable at `l1`/`l2`/`l3` |
//! | `GET`   | `/staff/{user_id}/tickets` | Tickets claimed by a staff member |
//! | `GET`   | `/clients/{client_id}/tickets` | Tickets owned by a client |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use helpdesk_core::{
  store::TicketStore,
  ticket::{NewTicket, Severity, Ticket, TicketPatch},
  tier::Tier,
};
use helpdesk_engine::CommandOutcome;
use serde::Deserialize;

use crate::{AppState, commands::persist, error::ApiError};

// ─── Queries ──────────────────────────────────────────────────────────────────

/// `GET /tickets`
pub async fn list<S>(State(state): State<AppState<S>>) -> Json<Vec<Ticket>>
where
  S: TicketStore + Clone,
{
  Json(state.engine.all_tickets())
}

/// `GET /tickets/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError>
where
  S: TicketStore + Clone,
{
  state
    .engine
    .ticket(&id)
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("ticket {id} not found")))
}

/// `GET /queue/{tier}`
pub async fn queue<S>(
  State(state): State<AppState<S>>,
  Path(tier): Path<String>,
) -> Result<Json<Vec<Ticket>>, ApiError>
where
  S: TicketStore + Clone,
{
  let tier: Tier = tier
    .parse()
    .map_err(|e: helpdesk_core::Error| ApiError::BadRequest(e.to_string()))?;
  Ok(Json(state.engine.available_tickets(tier)))
}

/// `GET /staff/{user_id}/tickets`
pub async fn assigned<S>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
) -> Json<Vec<Ticket>>
where
  S: TicketStore + Clone,
{
  Json(state.engine.tickets_assigned_to(&user_id))
}

/// `GET /clients/{client_id}/tickets`
pub async fn for_client<S>(
  State(state): State<AppState<S>>,
  Path(client_id): Path<String>,
) -> Json<Vec<Ticket>>
where
  S: TicketStore + Clone,
{
  Json(state.engine.tickets_for_client(&client_id))
}

// ─── Intake ───────────────────────────────────────────────────────────────────

/// `POST /tickets`: returns 201 + a [`CommandOutcome`] carrying the new
/// ticket.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewTicket>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TicketStore + Clone,
{
  if body.title.trim().is_empty() {
    return Err(ApiError::BadRequest("title must not be empty".into()));
  }
  let result = state.engine.open_ticket(body);
  let outcome = persist(&state, result, "Ticket submitted").await?;
  Ok((StatusCode::CREATED, outcome))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /tickets/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub user_id:     String,
  pub title:       Option<String>,
  pub description: Option<String>,
  pub severity:    Option<Severity>,
}

impl From<UpdateBody> for TicketPatch {
  fn from(b: UpdateBody) -> Self {
    TicketPatch {
      title:       b.title,
      description: b.description,
      severity:    b.severity,
    }
  }
}

/// `PATCH /tickets/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<CommandOutcome>, ApiError>
where
  S: TicketStore + Clone,
{
  let user_id = body.user_id.clone();
  let result = state.engine.update(&id, &user_id, TicketPatch::from(body));
  persist(&state, result, "Ticket updated").await
}
