//! Activity recorder: appends immutable audit entries to a ticket.
//!
//! Nothing here ever rewrites or removes an existing entry.

use chrono::{DateTime, Utc};
use helpdesk_core::{
  history::{ActivityAction, ActivityMetadata, EscalationRecord, TicketActivity},
  ticket::Ticket,
  tier::Tier,
  user::User,
};
use uuid::Uuid;

/// Append one activity record attributed to `actor`.
pub(crate) fn record(
  ticket:      &mut Ticket,
  actor:       &User,
  action:      ActivityAction,
  description: String,
  metadata:    Option<ActivityMetadata>,
  at:          DateTime<Utc>,
) {
  let entry = TicketActivity {
    activity_id: Uuid::new_v4(),
    ticket_id: ticket.ticket_id.clone(),
    user_id: actor.user_id.clone(),
    user_name: actor.name.clone(),
    action,
    description,
    timestamp: at,
    metadata,
  };
  ticket.activity_log.push(entry);
}

/// Append one escalation record for a move from `from` to `to`.
pub(crate) fn record_escalation(
  ticket: &mut Ticket,
  actor:  &User,
  from:   Tier,
  to:     Tier,
  reason: Option<String>,
  at:     DateTime<Utc>,
) {
  let entry = EscalationRecord {
    escalation_id:     Uuid::new_v4(),
    ticket_id:         ticket.ticket_id.clone(),
    from_level:        from,
    to_level:          to,
    escalated_by:      actor.user_id.clone(),
    escalated_by_name: actor.name.clone(),
    reason,
    timestamp:         at,
  };
  ticket.escalation_history.push(entry);
}
