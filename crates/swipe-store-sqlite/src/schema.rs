//! SQL schema for the Swipe SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Sessions are never mutated or deleted.
CREATE TABLE IF NOT EXISTS sessions (
    id          TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rooms (
    id          TEXT PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,   -- upper case, ROOM_CODE_ALPHABET
    title       TEXT NOT NULL,
    set_id      TEXT NOT NULL DEFAULT 'default',
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    closed_at   TEXT
);

-- At most one current answer per (session, room, scenario).
CREATE TABLE IF NOT EXISTS answers (
    session_id  TEXT NOT NULL REFERENCES sessions(id),
    room_id     TEXT NOT NULL REFERENCES rooms(id),
    scenario_id TEXT NOT NULL,
    value       TEXT NOT NULL CHECK (value IN ('yes', 'no')),
    answered_at TEXT NOT NULL,
    UNIQUE (session_id, room_id, scenario_id)
);

-- Materialised counts over `answers`, adjusted in the same transaction as
-- every answer write. Rows are never deleted.
CREATE TABLE IF NOT EXISTS aggregates (
    room_id     TEXT NOT NULL REFERENCES rooms(id),
    scenario_id TEXT NOT NULL,
    yes_count   INTEGER NOT NULL DEFAULT 0 CHECK (yes_count >= 0),
    no_count    INTEGER NOT NULL DEFAULT 0 CHECK (no_count >= 0),
    updated_at  TEXT NOT NULL,
    UNIQUE (room_id, scenario_id)
);

CREATE INDEX IF NOT EXISTS answers_room_idx   ON answers(room_id);
CREATE INDEX IF NOT EXISTS rooms_created_idx  ON rooms(created_at);

PRAGMA user_version = 1;
";
