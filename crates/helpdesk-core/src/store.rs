//! The `TicketStore` trait, the durable collaborator behind the engine.
//!
//! The engine never persists on its own. Callers hydrate it from a store at
//! startup and write each mutated ticket back after a successful command.

use std::future::Future;

use crate::{
  ticket::{Ticket, TicketDocument},
  user::User,
};

/// Abstraction over a durable ticket/user store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TicketStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Load every stored ticket. Documents may predate escalation and are
  /// backfilled by the engine.
  fn load_tickets(
    &self,
  ) -> impl Future<Output = Result<Vec<TicketDocument>, Self::Error>> + Send + '_;

  /// Load every stored user.
  fn load_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Retrieve a ticket by id. Returns `None` if not found.
  fn get_ticket(
    &self,
    ticket_id: String,
  ) -> impl Future<Output = Result<Option<TicketDocument>, Self::Error>> + Send + '_;

  /// Insert or replace a ticket.
  fn put_ticket(
    &self,
    ticket: Ticket,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert or replace a user.
  fn put_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
