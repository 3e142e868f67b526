//! Tickets, the central entity of the helpdesk.
//!
//! A [`Ticket`] is only ever mutated through the engine's commands. Its two
//! history sequences (`activity_log`, `escalation_history`) are append-only.
//!
//! Snapshots hydrated from a durable store arrive as [`TicketDocument`]s,
//! which tolerate missing escalation fields; [`TicketDocument::into_ticket`]
//! backfills them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  history::{EscalationRecord, TicketActivity},
  notification::ClientNotification,
  tier::Tier,
};

// ─── Classification ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  #[default]
  Medium,
  High,
  Critical,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
      Self::Critical => "critical",
    }
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of a ticket.
///
/// ```text
/// unassigned/open (unclaimed) → open (claimed) → in-progress → resolved → closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
  Open,
  Unassigned,
  InProgress,
  Resolved,
  Closed,
}

impl TicketStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Open => "open",
      Self::Unassigned => "unassigned",
      Self::InProgress => "in-progress",
      Self::Resolved => "resolved",
      Self::Closed => "closed",
    }
  }

  /// Whether an unclaimed ticket in this status may be picked up.
  pub fn is_claimable(self) -> bool {
    matches!(self, Self::Open | Self::Unassigned)
  }

  /// `resolved` and `closed` admit no further work.
  pub fn is_finished(self) -> bool {
    matches!(self, Self::Resolved | Self::Closed)
  }
}

impl fmt::Display for TicketStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Ticket ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
  pub ticket_id:   String,
  pub title:       String,
  pub description: String,
  pub severity:    Severity,

  // ── Ownership ───────────────────────────────────────────────────────────
  pub client_id:             String,
  pub assigned_to:           Option<String>,
  pub assigned_to_name:      Option<String>,
  /// Most recent claimant; survives escalation and resolution.
  pub last_assigned_to:      Option<String>,
  pub last_assigned_to_name: Option<String>,

  pub status: TicketStatus,

  // ── Escalation ──────────────────────────────────────────────────────────
  pub current_level:               Tier,
  pub available_to_levels:         Vec<Tier>,
  pub is_available_for_assignment: bool,

  // ── History ─────────────────────────────────────────────────────────────
  pub activity_log:         Vec<TicketActivity>,
  pub escalation_history:   Vec<EscalationRecord>,
  pub client_notifications: Vec<ClientNotification>,

  // ── Timestamps ──────────────────────────────────────────────────────────
  pub submitted_at:         DateTime<Utc>,
  pub last_updated:         DateTime<Utc>,
  pub assignment_timestamp: Option<DateTime<Utc>>,
  pub resolved_date:        Option<DateTime<Utc>>,
  pub closed_date:          Option<DateTime<Utc>>,
}

impl Ticket {
  /// Whether `user_id` currently holds the claim on this ticket.
  pub fn is_assigned_to(&self, user_id: &str) -> bool {
    self.assigned_to.as_deref() == Some(user_id)
  }

  /// Whether staff working at `tier` may claim this ticket right now.
  pub fn is_claimable_at(&self, tier: Tier) -> bool {
    self.is_available_for_assignment && self.available_to_levels.contains(&tier)
  }
}

// ─── TicketDocument ──────────────────────────────────────────────────────────

/// A ticket as supplied by an external store. Escalation fields and history
/// may be missing on records written before escalation existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDocument {
  pub ticket_id:   String,
  pub title:       String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub severity:    Severity,
  pub client_id:   String,

  #[serde(default)]
  pub assigned_to:           Option<String>,
  #[serde(default)]
  pub assigned_to_name:      Option<String>,
  #[serde(default)]
  pub last_assigned_to:      Option<String>,
  #[serde(default)]
  pub last_assigned_to_name: Option<String>,

  pub status: TicketStatus,

  #[serde(default)]
  pub current_level:               Option<Tier>,
  #[serde(default)]
  pub available_to_levels:         Option<Vec<Tier>>,
  #[serde(default)]
  pub is_available_for_assignment: Option<bool>,

  #[serde(default)]
  pub activity_log:         Vec<TicketActivity>,
  #[serde(default)]
  pub escalation_history:   Vec<EscalationRecord>,
  #[serde(default)]
  pub client_notifications: Vec<ClientNotification>,

  pub submitted_at:         DateTime<Utc>,
  #[serde(default)]
  pub last_updated:         Option<DateTime<Utc>>,
  #[serde(default)]
  pub assignment_timestamp: Option<DateTime<Utc>>,
  #[serde(default)]
  pub resolved_date:        Option<DateTime<Utc>>,
  #[serde(default)]
  pub closed_date:          Option<DateTime<Utc>>,
}

impl TicketDocument {
  /// Parse a stored JSON document.
  pub fn from_json(json: &str) -> Result<Self> { Ok(serde_json::from_str(json)?) }

  /// Fill in missing escalation fields with safe defaults:
  ///
  /// - `current_level` defaults to [`Tier::L1`];
  /// - `available_to_levels` defaults to `[current_level]`;
  /// - `is_available_for_assignment` is derived from status and assignee.
  pub fn into_ticket(self) -> Ticket {
    let current_level = self.current_level.unwrap_or_default();
    let available_to_levels = match self.available_to_levels {
      Some(levels) if !levels.is_empty() => levels,
      _ => vec![current_level],
    };
    let is_available_for_assignment =
      self.is_available_for_assignment.unwrap_or_else(|| {
        self.assigned_to.is_none() && self.status.is_claimable()
      });

    Ticket {
      ticket_id: self.ticket_id,
      title: self.title,
      description: self.description,
      severity: self.severity,
      client_id: self.client_id,
      assigned_to: self.assigned_to,
      assigned_to_name: self.assigned_to_name,
      last_assigned_to: self.last_assigned_to,
      last_assigned_to_name: self.last_assigned_to_name,
      status: self.status,
      current_level,
      available_to_levels,
      is_available_for_assignment,
      activity_log: self.activity_log,
      escalation_history: self.escalation_history,
      client_notifications: self.client_notifications,
      last_updated: self.last_updated.unwrap_or(self.submitted_at),
      submitted_at: self.submitted_at,
      assignment_timestamp: self.assignment_timestamp,
      resolved_date: self.resolved_date,
      closed_date: self.closed_date,
    }
  }
}

impl From<Ticket> for TicketDocument {
  fn from(t: Ticket) -> Self {
    Self {
      ticket_id:                   t.ticket_id,
      title:                       t.title,
      description:                 t.description,
      severity:                    t.severity,
      client_id:                   t.client_id,
      assigned_to:                 t.assigned_to,
      assigned_to_name:            t.assigned_to_name,
      last_assigned_to:            t.last_assigned_to,
      last_assigned_to_name:       t.last_assigned_to_name,
      status:                      t.status,
      current_level:               Some(t.current_level),
      available_to_levels:         Some(t.available_to_levels),
      is_available_for_assignment: Some(t.is_available_for_assignment),
      activity_log:                t.activity_log,
      escalation_history:          t.escalation_history,
      client_notifications:        t.client_notifications,
      submitted_at:                t.submitted_at,
      last_updated:                Some(t.last_updated),
      assignment_timestamp:        t.assignment_timestamp,
      resolved_date:               t.resolved_date,
      closed_date:                 t.closed_date,
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to ticket intake. Timestamps and escalation state are assigned by
/// the engine, as is the id when `ticket_id` is absent or blank.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
  #[serde(default)]
  pub ticket_id:   Option<String>,
  pub client_id:   String,
  pub title:       String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub severity:    Severity,
}

/// Administrative field-level correction. Escalation state and assignment
/// are intentionally not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub severity:    Option<Severity>,
}

impl TicketPatch {
  /// Names of the fields this patch sets, in declaration order.
  pub fn fields(&self) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if self.title.is_some() {
      fields.push("title");
    }
    if self.description.is_some() {
      fields.push("description");
    }
    if self.severity.is_some() {
      fields.push("severity");
    }
    fields
  }
}
