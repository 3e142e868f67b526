//! Notification dispatcher.
//!
//! Builds client notifications, appends them to the ticket (the durable
//! record), and fans them out to in-process subscribers. Delivery is
//! fire-and-forget: by the time [`Dispatcher::publish`] runs, the ticket
//! mutation is already committed, and a failing subscriber neither stops
//! delivery to the others nor affects the command result.

use std::{
  collections::HashMap,
  fmt,
  panic::{self, AssertUnwindSafe},
  sync::Arc,
};

use chrono::{DateTime, Utc};
use helpdesk_core::{
  notification::{ClientNotification, NotificationKind, NotificationMetadata},
  ticket::{Severity, Ticket},
  tier::Tier,
};
use parking_lot::RwLock;
use thiserror::Error;
use uuid::Uuid;

// ─── Composition ─────────────────────────────────────────────────────────────

/// Append a notification to `ticket` and return a copy for dispatch.
pub(crate) fn compose(
  ticket:   &mut Ticket,
  kind:     NotificationKind,
  title:    &str,
  message:  String,
  metadata: Option<NotificationMetadata>,
  at:       DateTime<Utc>,
) -> ClientNotification {
  let notification = ClientNotification {
    notification_id: Uuid::new_v4(),
    ticket_id: ticket.ticket_id.clone(),
    kind,
    title: title.to_owned(),
    message,
    timestamp: at,
    read: false,
    metadata,
  };
  ticket.client_notifications.push(notification.clone());
  notification
}

/// Expected time to resolution once a ticket has been claimed.
pub fn claim_eta(severity: Severity) -> &'static str {
  match severity {
    Severity::Critical => "within 4 hours",
    Severity::High => "within 1 business day",
    Severity::Medium => "within 2-3 business days",
    Severity::Low => "within 5 business days",
  }
}

/// Expected time to resolution after escalation to `tier`.
pub fn escalation_eta(tier: Tier) -> &'static str {
  match tier {
    Tier::L1 => "within 1 business day",
    Tier::L2 => "within 1-2 business days",
    Tier::L3 => "within 3-5 business days",
  }
}

// ─── Subscribers ─────────────────────────────────────────────────────────────

/// Error a subscriber may report. It is logged and otherwise ignored.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SubscriberError(String);

impl SubscriberError {
  pub fn new(message: impl Into<String>) -> Self { Self(message.into()) }
}

/// A subscriber callback. Receives the notification and the client id it is
/// addressed to.
pub type Subscriber = Arc<
  dyn Fn(&ClientNotification, &str) -> Result<(), SubscriberError> + Send + Sync,
>;

/// Handle returned by the `subscribe_*` methods; pass it to
/// [`Dispatcher::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

#[derive(Default)]
struct Registry {
  by_client: HashMap<String, Vec<(SubscriptionId, Subscriber)>>,
  global:    Vec<(SubscriptionId, Subscriber)>,
}

/// In-process fan-out of client notifications.
#[derive(Default)]
pub struct Dispatcher {
  registry: RwLock<Registry>,
}

impl Dispatcher {
  pub fn new() -> Self { Self::default() }

  /// Receive notifications for every client.
  pub fn subscribe_all<F>(&self, f: F) -> SubscriptionId
  where
    F: Fn(&ClientNotification, &str) -> Result<(), SubscriberError>
      + Send
      + Sync
      + 'static,
  {
    let id = SubscriptionId(Uuid::new_v4());
    self.registry.write().global.push((id, Arc::new(f)));
    id
  }

  /// Receive notifications addressed to `client_id` only.
  pub fn subscribe_client<F>(
    &self,
    client_id: impl Into<String>,
    f: F,
  ) -> SubscriptionId
  where
    F: Fn(&ClientNotification, &str) -> Result<(), SubscriberError>
      + Send
      + Sync
      + 'static,
  {
    let id = SubscriptionId(Uuid::new_v4());
    self
      .registry
      .write()
      .by_client
      .entry(client_id.into())
      .or_default()
      .push((id, Arc::new(f)));
    id
  }

  /// Remove one subscription. Returns `false` if `id` was not registered.
  pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
    let mut registry = self.registry.write();

    let before = registry.global.len();
    registry.global.retain(|(sid, _)| *sid != id);
    if registry.global.len() != before {
      return true;
    }

    let mut removed = false;
    registry.by_client.retain(|_, subs| {
      let before = subs.len();
      subs.retain(|(sid, _)| *sid != id);
      removed |= subs.len() != before;
      !subs.is_empty()
    });
    removed
  }

  /// Drop every subscription registered for `client_id`. Returns how many
  /// were removed.
  pub fn unsubscribe_client(&self, client_id: &str) -> usize {
    self
      .registry
      .write()
      .by_client
      .remove(client_id)
      .map_or(0, |subs| subs.len())
  }

  /// Deliver `notification` to the subscribers of `client_id` and then to
  /// the global subscribers, each in registration order.
  ///
  /// Returns the number of subscribers that accepted the notification.
  pub fn publish(&self, notification: &ClientNotification, client_id: &str) -> usize {
    // Clone the handles so subscribers can (un)subscribe without deadlocking.
    let targets: Vec<(SubscriptionId, Subscriber)> = {
      let registry = self.registry.read();
      registry
        .by_client
        .get(client_id)
        .into_iter()
        .flatten()
        .chain(registry.global.iter())
        .cloned()
        .collect()
    };

    let mut delivered = 0;
    for (id, subscriber) in targets {
      let outcome =
        panic::catch_unwind(AssertUnwindSafe(|| (*subscriber)(notification, client_id)));
      match outcome {
        Ok(Ok(())) => delivered += 1,
        Ok(Err(e)) => tracing::warn!(
          subscription = %id,
          client_id,
          ticket_id = %notification.ticket_id,
          error = %e,
          "notification subscriber failed"
        ),
        Err(_) => tracing::warn!(
          subscription = %id,
          client_id,
          ticket_id = %notification.ticket_id,
          "notification subscriber panicked"
        ),
      }
    }
    delivered
  }
}
