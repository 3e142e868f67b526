//! Escalation manager: moves a ticket up a tier and reopens it for claim.

use chrono::{DateTime, Utc};
use helpdesk_core::{
  history::{ActivityAction, ActivityMetadata},
  level::level_of,
  notification::{ClientNotification, NotificationKind, NotificationMetadata},
  ticket::{Ticket, TicketStatus},
  tier::Tier,
  user::User,
};

use crate::{
  dispatch::{compose, escalation_eta},
  outcome::CommandError,
  recorder,
};

/// Escalate `ticket` to `target`.
///
/// `target` is compared with the initiator's own tier, not the ticket's
/// current tier, so an L1 agent may push a ticket straight to L3.
pub(crate) fn escalate(
  ticket: &mut Ticket,
  user:   &User,
  target: Tier,
  reason: Option<String>,
  now:    DateTime<Utc>,
) -> Result<ClientNotification, CommandError> {
  let user_tier = level_of(user);
  if !user.role.is_staff() || target <= user_tier {
    return Err(CommandError::InvalidEscalation { user_tier, target });
  }
  if ticket.status.is_finished() {
    return Err(CommandError::InvalidState {
      action: "escalate",
      status: ticket.status,
    });
  }

  let reason = reason.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
  let from = ticket.current_level;
  let previous_status = ticket.status;
  let previous_assignee = ticket.assigned_to.take();

  ticket.assigned_to_name = None;
  ticket.current_level = target;
  ticket.available_to_levels = vec![target];
  ticket.is_available_for_assignment = true;
  ticket.status = TicketStatus::Unassigned;
  ticket.last_updated = now;

  recorder::record_escalation(ticket, user, from, target, reason.clone(), now);

  let description = match &reason {
    Some(r) => format!(
      "Ticket escalated from {} to {} by {}: {r}",
      from.label(),
      target.label(),
      user.name
    ),
    None => format!(
      "Ticket escalated from {} to {} by {}",
      from.label(),
      target.label(),
      user.name
    ),
  };
  recorder::record(
    ticket,
    user,
    ActivityAction::pushed_to(target),
    description,
    Some(ActivityMetadata {
      previous_status: Some(previous_status),
      new_status: Some(TicketStatus::Unassigned),
      previous_assignee,
      new_assignee: None,
      escalation_level: Some(target),
      reason,
    }),
    now,
  );

  let eta = escalation_eta(target);
  let message = format!(
    "Your ticket \"{}\" has been escalated to {} support for specialist attention. \
     Estimated resolution time: {}.",
    ticket.title,
    target.label(),
    eta,
  );
  Ok(compose(
    ticket,
    NotificationKind::Escalation,
    "Ticket Escalated",
    message,
    Some(NotificationMetadata {
      assignee_name:             None,
      estimated_resolution_time: Some(eta.to_owned()),
    }),
    now,
  ))
}
