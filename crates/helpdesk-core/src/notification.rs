//! Client-facing notifications generated by ticket state changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  StatusUpdate,
  Assignment,
  Resolution,
  General,
  Escalation,
  Taken,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMetadata {
  pub assignee_name:             Option<String>,
  /// Free-text hint such as "within 1 business day".
  pub estimated_resolution_time: Option<String>,
}

/// A message addressed to the ticket's client.
///
/// `read` belongs to the notification consumer; the engine always writes
/// `false` and never touches it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientNotification {
  pub notification_id: Uuid,
  pub ticket_id:       String,
  #[serde(rename = "type")]
  pub kind:            NotificationKind,
  pub title:           String,
  pub message:         String,
  pub timestamp:       DateTime<Utc>,
  #[serde(default)]
  pub read:            bool,
  #[serde(default)]
  pub metadata:        Option<NotificationMetadata>,
}
