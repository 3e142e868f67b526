//! Append-only history records owned by a ticket.
//!
//! Both record types are immutable facts: once appended to a ticket they are
//! never rewritten or removed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ticket::TicketStatus, tier::Tier};

// ─── Activity ────────────────────────────────────────────────────────────────

/// The kind of action an activity record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
  Created,
  Assigned,
  Started,
  Resolved,
  Closed,
  Updated,
  Escalated,
  Taken,
  #[serde(rename = "pushed_to_l2")]
  PushedToL2,
  #[serde(rename = "pushed_to_l3")]
  PushedToL3,
}

impl ActivityAction {
  /// The escalation action recorded when a ticket is pushed to `target`.
  pub fn pushed_to(target: Tier) -> Self {
    match target {
      Tier::L2 => Self::PushedToL2,
      Tier::L3 => Self::PushedToL3,
      Tier::L1 => Self::Escalated,
    }
  }
}

/// Structured context attached to an activity record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMetadata {
  pub previous_status:   Option<TicketStatus>,
  pub new_status:        Option<TicketStatus>,
  pub previous_assignee: Option<String>,
  pub new_assignee:      Option<String>,
  pub escalation_level:  Option<Tier>,
  pub reason:            Option<String>,
}

/// One audit-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketActivity {
  pub activity_id: Uuid,
  pub ticket_id:   String,
  pub user_id:     String,
  pub user_name:   String,
  pub action:      ActivityAction,
  pub description: String,
  pub timestamp:   DateTime<Utc>,
  #[serde(default)]
  pub metadata:    Option<ActivityMetadata>,
}

// ─── Escalation ──────────────────────────────────────────────────────────────

/// Records that a ticket moved from one tier to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRecord {
  pub escalation_id:     Uuid,
  pub ticket_id:         String,
  pub from_level:        Tier,
  pub to_level:          Tier,
  pub escalated_by:      String,
  pub escalated_by_name: String,
  pub reason:            Option<String>,
  pub timestamp:         DateTime<Utc>,
}
