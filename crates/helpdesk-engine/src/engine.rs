//! [`Engine`]: the single entry point for ticket commands and queries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use helpdesk_core::{
  history::{ActivityAction, ActivityMetadata},
  notification::{ClientNotification, NotificationKind},
  ticket::{NewTicket, Ticket, TicketDocument, TicketPatch, TicketStatus},
  tier::Tier,
  user::User,
};
use uuid::Uuid;

use crate::{
  assign,
  dispatch::{Dispatcher, SubscriberError, SubscriptionId, compose},
  escalate,
  outcome::{CommandError, CommandResult},
  recorder,
  snapshot::Snapshot,
  transition,
};

/// The ticket lifecycle and escalation engine.
///
/// `Engine` is `Send + Sync`; share it as `Arc<Engine>`. Several engines
/// over independent snapshots may coexist in one process.
pub struct Engine {
  snapshot:   Arc<Snapshot>,
  dispatcher: Dispatcher,
}

impl Engine {
  /// Wrap an existing snapshot handle.
  pub fn new(snapshot: Arc<Snapshot>) -> Self {
    Self { snapshot, dispatcher: Dispatcher::new() }
  }

  /// Build an engine from externally supplied tickets and users.
  pub fn initialize(
    tickets: impl IntoIterator<Item = TicketDocument>,
    users: impl IntoIterator<Item = User>,
  ) -> Self {
    let snapshot = Snapshot::new(tickets, users);
    tracing::info!(
      tickets = snapshot.ticket_count(),
      users = snapshot.user_count(),
      "ticket engine initialised"
    );
    Self::new(Arc::new(snapshot))
  }

  pub fn snapshot(&self) -> &Arc<Snapshot> { &self.snapshot }

  pub fn dispatcher(&self) -> &Dispatcher { &self.dispatcher }

  // ── Queries ───────────────────────────────────────────────────────────

  /// Tickets staff at `tier` may claim right now.
  pub fn available_tickets(&self, tier: Tier) -> Vec<Ticket> {
    self.snapshot.tickets_where(|t| t.is_claimable_at(tier))
  }

  /// Tickets currently claimed by `user_id`.
  pub fn tickets_assigned_to(&self, user_id: &str) -> Vec<Ticket> {
    self.snapshot.tickets_where(|t| t.is_assigned_to(user_id))
  }

  pub fn tickets_for_client(&self, client_id: &str) -> Vec<Ticket> {
    self.snapshot.tickets_where(|t| t.client_id == client_id)
  }

  pub fn ticket(&self, ticket_id: &str) -> Option<Ticket> {
    self.snapshot.ticket(ticket_id)
  }

  pub fn all_tickets(&self) -> Vec<Ticket> { self.snapshot.tickets_where(|_| true) }

  // ── Commands ──────────────────────────────────────────────────────────

  /// Claim an available ticket for `user_id`.
  pub fn claim(&self, ticket_id: &str, user_id: &str) -> CommandResult {
    self.execute("claim", ticket_id, user_id, |ticket, user, now| {
      assign::claim(ticket, user, now).map(Some)
    })
  }

  /// Move a claimed ticket from `open` to `in-progress`.
  pub fn start_work(&self, ticket_id: &str, user_id: &str) -> CommandResult {
    self.execute("start_work", ticket_id, user_id, |ticket, user, now| {
      transition::start_work(ticket, user, now).map(Some)
    })
  }

  /// Move an `in-progress` ticket to `resolved`.
  pub fn resolve(
    &self,
    ticket_id: &str,
    user_id: &str,
    notes: Option<&str>,
  ) -> CommandResult {
    self.execute("resolve", ticket_id, user_id, |ticket, user, now| {
      transition::resolve(ticket, user, notes, now).map(Some)
    })
  }

  /// Push a ticket to `target`, releasing its claim.
  pub fn escalate(
    &self,
    ticket_id: &str,
    user_id: &str,
    target: Tier,
    reason: Option<String>,
  ) -> CommandResult {
    self.execute("escalate", ticket_id, user_id, |ticket, user, now| {
      escalate::escalate(ticket, user, target, reason, now).map(Some)
    })
  }

  /// Move a `resolved` ticket to `closed`.
  pub fn close(&self, ticket_id: &str, user_id: &str) -> CommandResult {
    self.execute("close", ticket_id, user_id, |ticket, user, now| {
      transition::close(ticket, user, now).map(Some)
    })
  }

  /// Administrative field correction. Bypasses lifecycle rules and sends no
  /// client notification.
  pub fn update(
    &self,
    ticket_id: &str,
    user_id: &str,
    patch: TicketPatch,
  ) -> CommandResult {
    self.execute("update", ticket_id, user_id, |ticket, user, now| {
      let fields = patch.fields();
      if let Some(title) = patch.title {
        ticket.title = title;
      }
      if let Some(description) = patch.description {
        ticket.description = description;
      }
      if let Some(severity) = patch.severity {
        ticket.severity = severity;
      }
      ticket.last_updated = now;

      let description = if fields.is_empty() {
        format!("Ticket touched by {}", user.name)
      } else {
        format!("Ticket updated by {}: {}", user.name, fields.join(", "))
      };
      recorder::record(ticket, user, ActivityAction::Updated, description, None, now);
      Ok(None)
    })
  }

  /// Register a newly submitted ticket at tier L1, unclaimed.
  pub fn open_ticket(&self, input: NewTicket) -> CommandResult {
    let client = self
      .snapshot
      .user(&input.client_id)
      .ok_or_else(|| CommandError::UserNotFound(input.client_id.clone()))?;

    let requested = input
      .ticket_id
      .as_deref()
      .map(str::trim)
      .filter(|id| !id.is_empty());

    let (ticket, notification) = match requested {
      Some(id) => {
        let (ticket, notification) = intake(id.to_owned(), &input, &client, Utc::now());
        if !self.snapshot.insert_new(ticket.clone()) {
          return Err(CommandError::TicketExists(ticket.ticket_id));
        }
        (ticket, notification)
      }
      None => loop {
        let (ticket, notification) = intake(new_ticket_id(), &input, &client, Utc::now());
        if self.snapshot.insert_new(ticket.clone()) {
          break (ticket, notification);
        }
      },
    };

    tracing::debug!(
      ticket_id = %ticket.ticket_id,
      client_id = %ticket.client_id,
      severity = ticket.severity.as_str(),
      "ticket opened"
    );
    self.dispatcher.publish(&notification, &ticket.client_id);
    Ok(ticket)
  }

  // ── Snapshot maintenance ──────────────────────────────────────────────

  /// Feed a ticket persisted elsewhere into the live snapshot. A record that
  /// would drop history from a live ticket is rejected with
  /// [`CommandError::HistoryConflict`].
  pub fn upsert_ticket(&self, doc: TicketDocument) -> CommandResult {
    let ticket_id = doc.ticket_id.clone();
    let result = self.snapshot.upsert_ticket(doc);
    if let Err(e) = &result {
      tracing::warn!(ticket_id = %ticket_id, reason = e.kind(), "ticket upsert rejected");
    }
    result
  }

  pub fn upsert_user(&self, user: User) { self.snapshot.upsert_user(user) }

  // ── Subscriptions ─────────────────────────────────────────────────────

  pub fn subscribe_all<F>(&self, f: F) -> SubscriptionId
  where
    F: Fn(&ClientNotification, &str) -> Result<(), SubscriberError>
      + Send
      + Sync
      + 'static,
  {
    self.dispatcher.subscribe_all(f)
  }

  pub fn subscribe_client<F>(&self, client_id: impl Into<String>, f: F) -> SubscriptionId
  where
    F: Fn(&ClientNotification, &str) -> Result<(), SubscriberError>
      + Send
      + Sync
      + 'static,
  {
    self.dispatcher.subscribe_client(client_id, f)
  }

  pub fn unsubscribe(&self, id: SubscriptionId) -> bool { self.dispatcher.unsubscribe(id) }

  pub fn unsubscribe_client(&self, client_id: &str) -> usize {
    self.dispatcher.unsubscribe_client(client_id)
  }

  // ── Internals ─────────────────────────────────────────────────────────

  /// Run `op` against the locked ticket, then dispatch its notification
  /// once the lock is released.
  fn execute<F>(
    &self,
    command: &'static str,
    ticket_id: &str,
    user_id: &str,
    op: F,
  ) -> CommandResult
  where
    F: FnOnce(
      &mut Ticket,
      &User,
      DateTime<Utc>,
    ) -> Result<Option<ClientNotification>, CommandError>,
  {
    let result = self.apply(ticket_id, user_id, op);

    match result {
      Ok((ticket, notification)) => {
        tracing::debug!(
          command,
          ticket_id,
          user_id,
          status = %ticket.status,
          level = %ticket.current_level,
          "ticket command applied"
        );
        if matches!(command, "claim" | "escalate" | "resolve") {
          tracing::info!(
            command,
            ticket_id,
            user_id,
            assignee = ticket.assigned_to.as_deref(),
            level = %ticket.current_level,
            "ticket {command}"
          );
        }
        if let Some(n) = notification {
          self.dispatcher.publish(&n, &ticket.client_id);
        }
        Ok(ticket)
      }
      Err(e) => {
        tracing::debug!(command, ticket_id, user_id, reason = e.kind(), "ticket command rejected");
        Err(e)
      }
    }
  }

  fn apply<F>(
    &self,
    ticket_id: &str,
    user_id: &str,
    op: F,
  ) -> Result<(Ticket, Option<ClientNotification>), CommandError>
  where
    F: FnOnce(
      &mut Ticket,
      &User,
      DateTime<Utc>,
    ) -> Result<Option<ClientNotification>, CommandError>,
  {
    let handle = self
      .snapshot
      .handle(ticket_id)
      .ok_or_else(|| CommandError::TicketNotFound(ticket_id.to_owned()))?;
    let user = self
      .snapshot
      .user(user_id)
      .ok_or_else(|| CommandError::UserNotFound(user_id.to_owned()))?;

    let mut ticket = handle.lock();
    let notification = op(&mut *ticket, &user, Utc::now())?;
    Ok((ticket.clone(), notification))
  }
}

/// A fresh ticket at the creation defaults, with its `created` activity and
/// receipt notification already appended.
fn intake(
  ticket_id: String,
  input:     &NewTicket,
  client:    &User,
  now:       DateTime<Utc>,
) -> (Ticket, ClientNotification) {
  let mut ticket = Ticket {
    ticket_id,
    title: input.title.clone(),
    description: input.description.clone(),
    severity: input.severity,
    client_id: client.user_id.clone(),
    assigned_to: None,
    assigned_to_name: None,
    last_assigned_to: None,
    last_assigned_to_name: None,
    status: TicketStatus::Unassigned,
    current_level: Tier::L1,
    available_to_levels: vec![Tier::L1],
    is_available_for_assignment: true,
    activity_log: Vec::new(),
    escalation_history: Vec::new(),
    client_notifications: Vec::new(),
    submitted_at: now,
    last_updated: now,
    assignment_timestamp: None,
    resolved_date: None,
    closed_date: None,
  };

  recorder::record(
    &mut ticket,
    client,
    ActivityAction::Created,
    format!("Ticket created by {}", client.name),
    Some(ActivityMetadata {
      new_status: Some(TicketStatus::Unassigned),
      escalation_level: Some(Tier::L1),
      ..Default::default()
    }),
    now,
  );
  let message = format!(
    "Your ticket \"{}\" has been received and is waiting for {} support.",
    ticket.title,
    Tier::L1.label()
  );
  let notification = compose(
    &mut ticket,
    NotificationKind::General,
    "Ticket Received",
    message,
    None,
    now,
  );
  (ticket, notification)
}

fn new_ticket_id() -> String {
  let raw = Uuid::new_v4().simple().to_string();
  format!("TKT-{}", raw[..8].to_ascii_uppercase())
}
