//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use helpdesk_core::ticket::Ticket;
use helpdesk_engine::{CommandError, CommandOutcome};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The engine rejected the command.
  #[error(transparent)]
  Command(#[from] CommandError),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The engine applied the command but writing the ticket back failed.
  /// The store catches up on the ticket's next successful write.
  #[error("command applied but not persisted: {source}")]
  NotPersisted {
    ticket: Box<Ticket>,
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

/// HTTP status for each command failure kind.
pub fn status_for(e: &CommandError) -> StatusCode {
  match e {
    CommandError::TicketNotFound(_) | CommandError::UserNotFound(_) => {
      StatusCode::NOT_FOUND
    }
    CommandError::WrongLevel { .. }
    | CommandError::NotYourTicket(_)
    | CommandError::InvalidEscalation { .. } => StatusCode::FORBIDDEN,
    CommandError::NotAvailable(_)
    | CommandError::InvalidState { .. }
    | CommandError::TicketExists(_)
    | CommandError::HistoryConflict(_) => StatusCode::CONFLICT,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Command(e) => (status_for(&e), Json(CommandOutcome::from(e))).into_response(),
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::NotPersisted { ticket, source } => {
        tracing::error!(ticket_id = %ticket.ticket_id, error = %source, "ticket write-back failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({
            "applied": true,
            "error":   source.to_string(),
            "ticket":  ticket,
          })),
        )
          .into_response()
      }
    }
  }
}
