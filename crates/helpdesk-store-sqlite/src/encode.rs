//! Encoding and decoding helpers between domain types and the plain-text
//! columns stored in SQLite.
//!
//! Timestamps are RFC 3339 strings; documents are compact JSON.

use chrono::{DateTime, Utc};
use helpdesk_core::{
  ticket::{Ticket, TicketDocument},
  user::{Role, User},
};

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_role(role: Role) -> &'static str {
  match role {
    Role::EmployeeL1 => "employee_l1",
    Role::EmployeeL2 => "employee_l2",
    Role::EmployeeL3 => "employee_l3",
    Role::Client => "client",
    Role::Admin => "admin",
  }
}

/// Column values for one `tickets` row.
pub struct TicketRow {
  pub ticket_id:     String,
  pub client_id:     String,
  pub status:        String,
  pub current_level: String,
  pub revision:      i64,
  pub document:      String,
  pub updated_at:    String,
}

pub fn encode_ticket(ticket: &Ticket) -> Result<TicketRow> {
  Ok(TicketRow {
    ticket_id:     ticket.ticket_id.clone(),
    client_id:     ticket.client_id.clone(),
    status:        ticket.status.as_str().to_owned(),
    current_level: ticket.current_level.as_str().to_owned(),
    revision:      revision_of(ticket),
    document:      serde_json::to_string(ticket)?,
    updated_at:    encode_dt(ticket.last_updated),
  })
}

/// Every accepted command appends exactly one activity, so the log length
/// orders successive states of the same ticket.
pub fn revision_of(ticket: &Ticket) -> i64 {
  i64::try_from(ticket.activity_log.len()).unwrap_or(i64::MAX)
}

pub fn decode_ticket(ticket_id: &str, document: &str) -> Result<TicketDocument> {
  let doc = TicketDocument::from_json(document)?;
  if doc.ticket_id != ticket_id {
    return Err(Error::Corrupt {
      table:   "tickets",
      message: format!("row {ticket_id:?} holds document for {:?}", doc.ticket_id),
    });
  }
  Ok(doc)
}

/// A `users` row as read back: the role column is cross-checked against the
/// document.
pub struct RawUser {
  pub user_id:  String,
  pub role:     String,
  pub document: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    let user: User = serde_json::from_str(&self.document)?;
    let role: Role = self.role.parse()?;
    if user.user_id != self.user_id || user.role != role {
      return Err(Error::Corrupt {
        table:   "users",
        message: format!("row {:?} disagrees with its document", self.user_id),
      });
    }
    Ok(user)
  }
}
