//! State transition engine: start of work, resolution and closure.
//!
//! Only forward edges exist:
//!
//! ```text
//! open (claimed) → in-progress → resolved → closed
//! ```

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use helpdesk_core::{
  history::{ActivityAction, ActivityMetadata},
  notification::{ClientNotification, NotificationKind, NotificationMetadata},
  ticket::{Ticket, TicketStatus},
  user::User,
};

use crate::{dispatch::compose, outcome::CommandError, recorder};

fn require_claimant(ticket: &Ticket, user: &User) -> Result<(), CommandError> {
  if ticket.is_assigned_to(&user.user_id) {
    Ok(())
  } else {
    Err(CommandError::NotYourTicket(ticket.ticket_id.clone()))
  }
}

fn require_status(
  ticket: &Ticket,
  expected: TicketStatus,
  action: &'static str,
) -> Result<(), CommandError> {
  if ticket.status == expected {
    Ok(())
  } else {
    Err(CommandError::InvalidState { action, status: ticket.status })
  }
}

fn status_change(from: TicketStatus, to: TicketStatus) -> ActivityMetadata {
  ActivityMetadata {
    previous_status: Some(from),
    new_status: Some(to),
    ..Default::default()
  }
}

/// `open → in-progress`, claimant only.
pub(crate) fn start_work(
  ticket: &mut Ticket,
  user:   &User,
  now:    DateTime<Utc>,
) -> Result<ClientNotification, CommandError> {
  require_claimant(ticket, user)?;
  require_status(ticket, TicketStatus::Open, "start work on")?;

  ticket.status = TicketStatus::InProgress;
  ticket.last_updated = now;

  recorder::record(
    ticket,
    user,
    ActivityAction::Started,
    format!("Work started by {}", user.name),
    Some(status_change(TicketStatus::Open, TicketStatus::InProgress)),
    now,
  );

  let message = format!(
    "{} has started working on your ticket \"{}\".",
    user.name, ticket.title
  );
  Ok(compose(
    ticket,
    NotificationKind::StatusUpdate,
    "Work Started",
    message,
    Some(NotificationMetadata {
      assignee_name: Some(user.name.clone()),
      ..Default::default()
    }),
    now,
  ))
}

/// `in-progress → resolved`, claimant only. Releases the claim;
/// `last_assigned_to` keeps the resolver.
pub(crate) fn resolve(
  ticket: &mut Ticket,
  user:   &User,
  notes:  Option<&str>,
  now:    DateTime<Utc>,
) -> Result<ClientNotification, CommandError> {
  require_claimant(ticket, user)?;
  require_status(ticket, TicketStatus::InProgress, "resolve")?;

  let notes = notes.map(str::trim).filter(|n| !n.is_empty());

  ticket.status = TicketStatus::Resolved;
  ticket.assigned_to = None;
  ticket.assigned_to_name = None;
  ticket.resolved_date = Some(now);
  ticket.last_updated = now;

  let description = match notes {
    Some(n) => format!("Ticket resolved by {}: {n}", user.name),
    None => format!("Ticket resolved by {}", user.name),
  };
  let mut metadata = status_change(TicketStatus::InProgress, TicketStatus::Resolved);
  metadata.previous_assignee = Some(user.user_id.clone());
  recorder::record(ticket, user, ActivityAction::Resolved, description, Some(metadata), now);

  let mut message = format!(
    "Your ticket \"{}\" has been resolved by {}.",
    ticket.title, user.name
  );
  if let Some(n) = notes {
    let _ = write!(message, " Resolution notes: {n}");
  }
  Ok(compose(
    ticket,
    NotificationKind::Resolution,
    "Ticket Resolved",
    message,
    Some(NotificationMetadata {
      assignee_name: Some(user.name.clone()),
      ..Default::default()
    }),
    now,
  ))
}

/// `resolved → closed`, by the owning client or any staff member.
pub(crate) fn close(
  ticket: &mut Ticket,
  user:   &User,
  now:    DateTime<Utc>,
) -> Result<ClientNotification, CommandError> {
  if user.user_id != ticket.client_id && !user.role.is_staff() {
    return Err(CommandError::NotYourTicket(ticket.ticket_id.clone()));
  }
  require_status(ticket, TicketStatus::Resolved, "close")?;

  ticket.status = TicketStatus::Closed;
  ticket.closed_date = Some(now);
  ticket.last_updated = now;

  recorder::record(
    ticket,
    user,
    ActivityAction::Closed,
    format!("Ticket closed by {}", user.name),
    Some(status_change(TicketStatus::Resolved, TicketStatus::Closed)),
    now,
  );

  let message = format!("Your ticket \"{}\" has been closed.", ticket.title);
  Ok(compose(
    ticket,
    NotificationKind::StatusUpdate,
    "Ticket Closed",
    message,
    None,
    now,
  ))
}
