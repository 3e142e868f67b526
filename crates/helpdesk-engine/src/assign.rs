//! Assignment manager: the exclusivity gate for claiming a ticket.

use chrono::{DateTime, Utc};
use helpdesk_core::{
  history::{ActivityAction, ActivityMetadata},
  level::level_of,
  notification::{ClientNotification, NotificationKind, NotificationMetadata},
  ticket::{Ticket, TicketStatus},
  user::User,
};

use crate::{
  dispatch::{claim_eta, compose},
  outcome::CommandError,
  recorder,
};

/// Claim `ticket` for `user`.
///
/// The ticket must be available for assignment and its current tier must
/// include the claimant's tier. All checks happen before the first write.
pub(crate) fn claim(
  ticket: &mut Ticket,
  user:   &User,
  now:    DateTime<Utc>,
) -> Result<ClientNotification, CommandError> {
  if !ticket.is_available_for_assignment {
    return Err(CommandError::NotAvailable(ticket.ticket_id.clone()));
  }
  let tier = level_of(user);
  if !user.role.is_staff() || !ticket.available_to_levels.contains(&tier) {
    return Err(CommandError::WrongLevel { user_tier: tier });
  }

  let previous_status = ticket.status;
  let previous_assignee = ticket.assigned_to.take();
  let level = ticket.current_level;

  ticket.assigned_to = Some(user.user_id.clone());
  ticket.assigned_to_name = Some(user.name.clone());
  ticket.last_assigned_to = Some(user.user_id.clone());
  ticket.last_assigned_to_name = Some(user.name.clone());
  ticket.status = TicketStatus::Open;
  ticket.is_available_for_assignment = false;
  ticket.assignment_timestamp = Some(now);
  ticket.last_updated = now;

  recorder::record(
    ticket,
    user,
    ActivityAction::Taken,
    format!("Ticket taken by {} ({} support)", user.name, tier.label()),
    Some(ActivityMetadata {
      previous_status: Some(previous_status),
      new_status: Some(TicketStatus::Open),
      previous_assignee,
      new_assignee: Some(user.user_id.clone()),
      escalation_level: Some(level),
      reason: None,
    }),
    now,
  );

  let eta = claim_eta(ticket.severity);
  let message = format!(
    "Your ticket \"{}\" has been taken by {} ({} support). Estimated resolution time: {}.",
    ticket.title,
    user.name,
    tier.label(),
    eta,
  );
  Ok(compose(
    ticket,
    NotificationKind::Assignment,
    "Ticket Assigned",
    message,
    Some(NotificationMetadata {
      assignee_name:             Some(user.name.clone()),
      estimated_resolution_time: Some(eta.to_owned()),
    }),
    now,
  ))
}
