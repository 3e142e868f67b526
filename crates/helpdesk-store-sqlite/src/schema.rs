//! SQL schema for the helpdesk SQLite store.
//!
//! Executed once at connection startup. Migrations are gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One JSON document per ticket. The indexed columns are copies of fields
-- inside `document`, kept for ad-hoc inspection only. `revision` orders
-- write-backs: a row is never replaced by one with a shorter history.
CREATE TABLE IF NOT EXISTS tickets (
    ticket_id     TEXT PRIMARY KEY,
    client_id     TEXT NOT NULL,
    status        TEXT NOT NULL,   -- 'open' | 'unassigned' | 'in-progress' | ...
    current_level TEXT NOT NULL,   -- 'l1' | 'l2' | 'l3'
    revision      INTEGER NOT NULL DEFAULT 0,  -- activity_log length
    document      TEXT NOT NULL,
    updated_at    TEXT NOT NULL    -- ISO 8601 UTC
);

CREATE TABLE IF NOT EXISTS users (
    user_id  TEXT PRIMARY KEY,
    role     TEXT NOT NULL,        -- 'employee_l1' | ... | 'client' | 'admin'
    document TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS tickets_client_idx ON tickets(client_id);
CREATE INDEX IF NOT EXISTS tickets_status_idx ON tickets(status);

PRAGMA user_version = 2;
";

/// Version 1 databases predate the `revision` column. Existing rows start at
/// 0 so their next write-back always lands.
pub const MIGRATE_V1_TO_V2: &str = "
ALTER TABLE tickets ADD COLUMN revision INTEGER NOT NULL DEFAULT 0;
PRAGMA user_version = 2;
";
