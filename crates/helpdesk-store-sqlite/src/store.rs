//! [`SqliteStore`]: the SQLite implementation of [`TicketStore`].

use std::path::Path;

use helpdesk_core::{
  store::TicketStore,
  ticket::{Ticket, TicketDocument},
  user::User,
};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{RawUser, decode_ticket, encode_role, encode_ticket},
  schema::{MIGRATE_V1_TO_V2, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A helpdesk store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  pub(crate) async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version == 1 {
          conn.execute_batch(MIGRATE_V1_TO_V2)?;
        }
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── TicketStore impl ────────────────────────────────────────────────────────

impl TicketStore for SqliteStore {
  type Error = crate::Error;

  async fn load_tickets(&self) -> Result<Vec<TicketDocument>> {
    let rows: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT ticket_id, document FROM tickets ORDER BY ticket_id")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .iter()
      .map(|(id, document)| decode_ticket(id, document))
      .collect()
  }

  async fn load_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT user_id, role, document FROM users ORDER BY user_id")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawUser {
              user_id:  row.get(0)?,
              role:     row.get(1)?,
              document: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn get_ticket(&self, ticket_id: String) -> Result<Option<TicketDocument>> {
    let id = ticket_id.clone();
    let document: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT document FROM tickets WHERE ticket_id = ?1",
              rusqlite::params![id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    document
      .map(|d| decode_ticket(&ticket_id, &d))
      .transpose()
  }

  /// Upsert `ticket` unless the stored row already holds a later revision,
  /// in which case the write is a no-op.
  async fn put_ticket(&self, ticket: Ticket) -> Result<()> {
    let row = encode_ticket(&ticket)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tickets (
             ticket_id, client_id, status, current_level, revision, document, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (ticket_id) DO UPDATE SET
             client_id     = excluded.client_id,
             status        = excluded.status,
             current_level = excluded.current_level,
             revision      = excluded.revision,
             document      = excluded.document,
             updated_at    = excluded.updated_at
           WHERE excluded.revision >= tickets.revision",
          rusqlite::params![
            row.ticket_id,
            row.client_id,
            row.status,
            row.current_level,
            row.revision,
            row.document,
            row.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn put_user(&self, user: User) -> Result<()> {
    let document = serde_json::to_string(&user)?;
    let role     = encode_role(user.role).to_owned();
    let user_id  = user.user_id;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, role, document) VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id) DO UPDATE SET
             role     = excluded.role,
             document = excluded.document",
          rusqlite::params![user_id, role, document],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
