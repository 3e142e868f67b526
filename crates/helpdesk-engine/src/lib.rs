//! The ticket lifecycle and escalation engine.
//!
//! [`Engine`] owns a [`Snapshot`] of tickets and users and exposes every
//! command (claim, start, resolve, escalate, close, update) and query over
//! it. Commands never fail with an exception-like error: each returns a
//! [`CommandResult`] whose error side is one of the [`CommandError`] kinds.
//!
//! State changes are committed under a per-ticket lock before any
//! notification is dispatched to subscribers.

mod assign;
mod escalate;
mod recorder;
mod transition;

pub mod dispatch;
pub mod engine;
pub mod outcome;
pub mod snapshot;

pub use dispatch::{Dispatcher, SubscriberError, SubscriptionId};
pub use engine::Engine;
pub use outcome::{CommandError, CommandOutcome, CommandResult};
pub use snapshot::Snapshot;
