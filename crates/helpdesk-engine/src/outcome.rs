//! Command results.
//!
//! Expected business failures are data, not panics: every command returns a
//! [`CommandResult`] and the caller must handle each [`CommandError`] kind.

use helpdesk_core::{ticket::{Ticket, TicketStatus}, tier::Tier};
use serde::Serialize;
use thiserror::Error;

/// A rejected command. The `Display` text is the human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
  #[error("ticket not found: {0}")]
  TicketNotFound(String),

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("ticket {0} is not available for assignment")]
  NotAvailable(String),

  #[error("ticket is not available to {user_tier} staff")]
  WrongLevel { user_tier: Tier },

  #[error("ticket {0} is not assigned to you")]
  NotYourTicket(String),

  #[error("cannot {action} a ticket that is {status}")]
  InvalidState {
    action: &'static str,
    status: TicketStatus,
  },

  #[error("cannot escalate to {target}: target must be above your own tier ({user_tier})")]
  InvalidEscalation { user_tier: Tier, target: Tier },

  #[error("ticket {0} already exists")]
  TicketExists(String),

  /// A replacement record would rewrite history or lifecycle state that
  /// only commands may change.
  #[error("ticket {0} does not extend the live record")]
  HistoryConflict(String),
}

impl CommandError {
  /// A stable machine-readable tag for the failure kind.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::TicketNotFound(_) => "ticket_not_found",
      Self::UserNotFound(_) => "user_not_found",
      Self::NotAvailable(_) => "not_available",
      Self::WrongLevel { .. } => "wrong_level",
      Self::NotYourTicket(_) => "not_your_ticket",
      Self::InvalidState { .. } => "invalid_state",
      Self::InvalidEscalation { .. } => "invalid_escalation",
      Self::TicketExists(_) => "ticket_exists",
      Self::HistoryConflict(_) => "history_conflict",
    }
  }
}

pub type CommandResult = Result<Ticket, CommandError>;

/// The uniform `{success, message, ticket?}` shape handed to transports.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
  pub success: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<&'static str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ticket:  Option<Ticket>,
}

impl CommandOutcome {
  /// Wrap a command result, using `success_message` when it succeeded.
  pub fn from_result(result: CommandResult, success_message: &str) -> Self {
    match result {
      Ok(ticket) => Self {
        success: true,
        message: success_message.to_owned(),
        error:   None,
        ticket:  Some(ticket),
      },
      Err(e) => Self::from(e),
    }
  }
}

impl From<CommandError> for CommandOutcome {
  fn from(e: CommandError) -> Self {
    Self {
      success: false,
      message: e.to_string(),
      error:   Some(e.kind()),
      ticket:  None,
    }
  }
}
