//! [`Snapshot`]: the engine's owned, injectable in-memory store handle.
//!
//! Each ticket sits behind its own mutex. A command holds that mutex from
//! its first precondition check until its last write, which makes every
//! command atomic with respect to every other command on the same ticket.
//! The maps themselves are only write-locked to insert records.

use std::{collections::HashMap, sync::Arc};

use helpdesk_core::{
  ticket::{Ticket, TicketDocument},
  user::User,
};
use parking_lot::{Mutex, RwLock};

use crate::outcome::CommandError;

pub(crate) type TicketHandle = Arc<Mutex<Ticket>>;

/// Tickets and users loaded from an external store.
#[derive(Default)]
pub struct Snapshot {
  tickets: RwLock<HashMap<String, TicketHandle>>,
  users:   RwLock<HashMap<String, User>>,
}

impl Snapshot {
  /// Build a snapshot, backfilling missing escalation fields on every
  /// ticket.
  pub fn new(
    tickets: impl IntoIterator<Item = TicketDocument>,
    users: impl IntoIterator<Item = User>,
  ) -> Self {
    let tickets = tickets
      .into_iter()
      .map(|doc| {
        let ticket = doc.into_ticket();
        (ticket.ticket_id.clone(), Arc::new(Mutex::new(ticket)))
      })
      .collect();
    let users = users
      .into_iter()
      .map(|u| (u.user_id.clone(), u))
      .collect();

    Self {
      tickets: RwLock::new(tickets),
      users:   RwLock::new(users),
    }
  }

  pub fn ticket_count(&self) -> usize { self.tickets.read().len() }

  pub fn user_count(&self) -> usize { self.users.read().len() }

  pub(crate) fn handle(&self, ticket_id: &str) -> Option<TicketHandle> {
    self.tickets.read().get(ticket_id).cloned()
  }

  /// A copy of the ticket as of now.
  pub fn ticket(&self, ticket_id: &str) -> Option<Ticket> {
    self.handle(ticket_id).map(|h| h.lock().clone())
  }

  pub fn user(&self, user_id: &str) -> Option<User> {
    self.users.read().get(user_id).cloned()
  }

  /// Copies of every ticket matching `predicate`, oldest submission first.
  pub fn tickets_where(&self, predicate: impl Fn(&Ticket) -> bool) -> Vec<Ticket> {
    let handles: Vec<TicketHandle> = self.tickets.read().values().cloned().collect();
    let mut out: Vec<Ticket> = handles
      .iter()
      .filter_map(|h| {
        let ticket = h.lock();
        predicate(&ticket).then(|| ticket.clone())
      })
      .collect();
    out.sort_by(|a, b| {
      a.submitted_at
        .cmp(&b.submitted_at)
        .then_with(|| a.ticket_id.cmp(&b.ticket_id))
    });
    out
  }

  /// Insert a ticket, or replace a live one with a record that extends it.
  ///
  /// A replacement must carry the live activity log, escalation history and
  /// client notifications as prefixes. Lifecycle fields (status, assignee,
  /// tier) may only move alongside new activity.
  pub fn upsert_ticket(&self, doc: TicketDocument) -> Result<Ticket, CommandError> {
    let ticket = doc.into_ticket();
    let handle = {
      let mut tickets = self.tickets.write();
      match tickets.get(&ticket.ticket_id) {
        Some(handle) => Arc::clone(handle),
        None => {
          tickets.insert(ticket.ticket_id.clone(), Arc::new(Mutex::new(ticket.clone())));
          return Ok(ticket);
        }
      }
    };

    let mut live = handle.lock();
    if !extends(&live, &ticket) {
      return Err(CommandError::HistoryConflict(ticket.ticket_id));
    }
    *live = ticket.clone();
    Ok(ticket)
  }

  /// Insert a ticket only if its id is free. Returns `false` on collision.
  pub(crate) fn insert_new(&self, ticket: Ticket) -> bool {
    let mut tickets = self.tickets.write();
    if tickets.contains_key(&ticket.ticket_id) {
      return false;
    }
    tickets.insert(ticket.ticket_id.clone(), Arc::new(Mutex::new(ticket)));
    true
  }

  pub fn upsert_user(&self, user: User) {
    self.users.write().insert(user.user_id.clone(), user);
  }
}

fn is_prefix<T: PartialEq>(old: &[T], new: &[T]) -> bool {
  new.len() >= old.len() && new[..old.len()] == *old
}

/// Whether `next` may replace `live`.
///
/// With no new activity only descriptive fields (title, description,
/// severity, names) may differ. With new activity the tier must be the live
/// tier, or the target of the newest escalation record when escalations were
/// added.
fn extends(live: &Ticket, next: &Ticket) -> bool {
  if live.client_id != next.client_id
    || !is_prefix(&live.activity_log, &next.activity_log)
    || !is_prefix(&live.escalation_history, &next.escalation_history)
    || !is_prefix(&live.client_notifications, &next.client_notifications)
  {
    return false;
  }

  if next.activity_log.len() == live.activity_log.len() {
    return next.escalation_history.len() == live.escalation_history.len()
      && next.status == live.status
      && next.assigned_to == live.assigned_to
      && next.last_assigned_to == live.last_assigned_to
      && next.current_level == live.current_level
      && next.available_to_levels == live.available_to_levels
      && next.is_available_for_assignment == live.is_available_for_assignment;
  }

  if next.escalation_history.len() > live.escalation_history.len() {
    next
      .escalation_history
      .last()
      .is_some_and(|r| next.current_level == r.to_level && next.available_to_levels == [r.to_level])
  } else {
    next.current_level == live.current_level
      && next.available_to_levels == live.available_to_levels
  }
}
