//! [`SqliteStore`] — the SQLite implementation of [`SwipeStore`].

use std::{collections::BTreeMap, path::Path};

use chrono::Utc;
use rand_core::OsRng;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use swipe_core::{
  answer::{Answer, AnswerValue, ScenarioId, SessionId},
  room::{MAX_CODE_ATTEMPTS, NewRoom, Room, RoomUpdate, generate_room_code},
  store::SwipeStore,
  tally::{Aggregates, Delta, Tally},
};

use crate::{
  Error, Result,
  encode::{
    ROOM_COLUMNS, RawAnswer, RawRoom, answer_column, decode_count, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Swipe store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised on the connection's thread; cross-row consistency comes
/// from transactions, not from that serialisation.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Statement helpers ───────────────────────────────────────────────────────
//
// These run inside `Connection::call` closures, usually on an open
// transaction (which derefs to `Connection`).

fn insert_session(
  conn: &rusqlite::Connection,
  session_id: &str,
  now: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO sessions (id, created_at) VALUES (?1, ?2)
     ON CONFLICT (id) DO NOTHING",
    rusqlite::params![session_id, now],
  )?;
  Ok(())
}

fn current_answer(
  conn: &rusqlite::Connection,
  session_id: &str,
  room_id: &str,
  scenario_id: &str,
) -> rusqlite::Result<Option<AnswerValue>> {
  conn
    .query_row(
      "SELECT value FROM answers
       WHERE session_id = ?1 AND room_id = ?2 AND scenario_id = ?3",
      rusqlite::params![session_id, room_id, scenario_id],
      |row| answer_column(row, 0),
    )
    .optional()
}

/// Create the aggregate row if absent, then apply `delta` in one statement
/// so concurrent writers can never lose an increment.
fn adjust_aggregate(
  conn: &rusqlite::Connection,
  room_id: &str,
  scenario_id: &str,
  delta: Delta,
  now: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO aggregates (room_id, scenario_id, yes_count, no_count, updated_at)
     VALUES (?1, ?2, 0, 0, ?3)
     ON CONFLICT (room_id, scenario_id) DO NOTHING",
    rusqlite::params![room_id, scenario_id, now],
  )?;

  if delta.is_zero() {
    return Ok(());
  }

  conn.execute(
    "UPDATE aggregates
     SET yes_count  = MAX(0, yes_count + ?3),
         no_count   = MAX(0, no_count + ?4),
         updated_at = ?5
     WHERE room_id = ?1 AND scenario_id = ?2",
    rusqlite::params![room_id, scenario_id, delta.yes, delta.no, now],
  )?;
  Ok(())
}

fn read_room(
  conn: &rusqlite::Connection,
  column: &str,
  value: &str,
) -> rusqlite::Result<Option<RawRoom>> {
  conn
    .query_row(
      &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE {column} = ?1"),
      rusqlite::params![value],
      RawRoom::from_row,
    )
    .optional()
}

type RawTallies = Vec<(String, i64, i64)>;

fn into_aggregates(rows: RawTallies, participants: i64) -> Result<Aggregates> {
  let mut aggregates = BTreeMap::new();
  for (scenario_id, yes, no) in rows {
    let scenario_id = ScenarioId::parse(&scenario_id).map_err(|_| Error::Corrupt {
      column: "aggregates.scenario_id",
      value:  scenario_id.clone(),
    })?;
    aggregates.insert(scenario_id, Tally::new(decode_count(yes), decode_count(no)));
  }
  Ok(Aggregates { aggregates, total_participants: decode_count(participants) })
}

// ─── SwipeStore impl ─────────────────────────────────────────────────────────

impl SwipeStore for SqliteStore {
  type Error = Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn ensure_session(&self, session_id: SessionId) -> Result<()> {
    let id_str = session_id.as_str().to_owned();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        insert_session(conn, &id_str, &at_str)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Rooms ─────────────────────────────────────────────────────────────────

  async fn create_room(&self, input: NewRoom) -> Result<Room> {
    for _ in 0..MAX_CODE_ATTEMPTS {
      let room = Room {
        id:         Uuid::new_v4(),
        code:       generate_room_code(&mut OsRng),
        title:      input.title.clone(),
        set_id:     input.set_id.clone(),
        is_active:  true,
        created_at: Utc::now(),
        closed_at:  None,
      };

      let id_str = encode_uuid(room.id);
      let code   = room.code.clone();
      let title  = room.title.clone();
      let set_id = room.set_id.clone();
      let at_str = encode_dt(room.created_at);

      let inserted = self
        .conn
        .call(move |conn| {
          Ok(conn.execute(
            "INSERT INTO rooms (id, code, title, set_id, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)
             ON CONFLICT (code) DO NOTHING",
            rusqlite::params![id_str, code, title, set_id, at_str],
          )?)
        })
        .await?;

      if inserted == 1 {
        return Ok(room);
      }
      tracing::debug!(code = %room.code, "room code collision; drawing another");
    }

    Err(Error::RoomCodeExhausted(MAX_CODE_ATTEMPTS))
  }

  async fn get_room(&self, id: Uuid) -> Result<Option<Room>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| Ok(read_room(conn, "id", &id_str)?))
      .await?;

    raw.map(RawRoom::into_room).transpose()
  }

  async fn get_room_by_code(&self, code: String) -> Result<Option<Room>> {
    let raw = self
      .conn
      .call(move |conn| Ok(read_room(conn, "code", &code)?))
      .await?;

    raw.map(RawRoom::into_room).transpose()
  }

  async fn list_rooms(&self) -> Result<Vec<Room>> {
    let raws: Vec<RawRoom> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ROOM_COLUMNS} FROM rooms ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawRoom::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRoom::into_room).collect()
  }

  async fn update_room(&self, id: Uuid, update: RoomUpdate) -> Result<Option<Room>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        // Right-hand sides see the pre-update row, so `is_active = 1` in the
        // CASE means "currently open".
        let changed = tx.execute(
          "UPDATE rooms SET
             title     = COALESCE(?2, title),
             closed_at = CASE
                           WHEN ?3 IS NULL   THEN closed_at
                           WHEN ?3 = 1       THEN NULL
                           WHEN is_active = 1 THEN ?4
                           ELSE closed_at
                         END,
             is_active = COALESCE(?3, is_active)
           WHERE id = ?1",
          rusqlite::params![id_str, update.title, update.is_active, at_str],
        )?;
        let raw = if changed == 0 { None } else { read_room(&tx, "id", &id_str)? };
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawRoom::into_room).transpose()
  }

  // ── Answers ───────────────────────────────────────────────────────────────

  async fn upsert_answer(
    &self,
    session_id:  SessionId,
    room_id:     Uuid,
    scenario_id: ScenarioId,
    value:       AnswerValue,
  ) -> Result<Option<AnswerValue>> {
    let session_str  = session_id.as_str().to_owned();
    let room_str     = encode_uuid(room_id);
    let scenario_str = scenario_id.as_str().to_owned();
    let at_str       = encode_dt(Utc::now());

    let previous = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        insert_session(&tx, &session_str, &at_str)?;
        let previous = current_answer(&tx, &session_str, &room_str, &scenario_str)?;

        tx.execute(
          "INSERT INTO answers (session_id, room_id, scenario_id, value, answered_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (session_id, room_id, scenario_id)
           DO UPDATE SET value = excluded.value, answered_at = excluded.answered_at",
          rusqlite::params![session_str, room_str, scenario_str, value.as_ref(), at_str],
        )?;

        adjust_aggregate(
          &tx,
          &room_str,
          &scenario_str,
          Delta::between(previous, Some(value)),
          &at_str,
        )?;

        tx.commit()?;
        Ok(previous)
      })
      .await?;

    Ok(previous)
  }

  async fn delete_answer(
    &self,
    session_id:  SessionId,
    room_id:     Uuid,
    scenario_id: ScenarioId,
  ) -> Result<Option<AnswerValue>> {
    let session_str  = session_id.as_str().to_owned();
    let room_str     = encode_uuid(room_id);
    let scenario_str = scenario_id.as_str().to_owned();
    let at_str       = encode_dt(Utc::now());

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(removed) = current_answer(&tx, &session_str, &room_str, &scenario_str)?
        else {
          // Nothing to undo; leave the aggregates alone.
          return Ok(None);
        };

        tx.execute(
          "DELETE FROM answers
           WHERE session_id = ?1 AND room_id = ?2 AND scenario_id = ?3",
          rusqlite::params![session_str, room_str, scenario_str],
        )?;

        adjust_aggregate(
          &tx,
          &room_str,
          &scenario_str,
          Delta::between(Some(removed), None),
          &at_str,
        )?;

        tx.commit()?;
        Ok(Some(removed))
      })
      .await?;

    Ok(removed)
  }

  async fn session_answers(
    &self,
    session_id: SessionId,
    room_id:    Uuid,
  ) -> Result<Vec<Answer>> {
    let session_str = session_id.as_str().to_owned();
    let room_str    = encode_uuid(room_id);

    let raws: Vec<RawAnswer> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT session_id, room_id, scenario_id, value, answered_at
           FROM answers
           WHERE session_id = ?1 AND room_id = ?2
           ORDER BY scenario_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![session_str, room_str], |row| {
            Ok(RawAnswer {
              session_id:  row.get(0)?,
              room_id:     row.get(1)?,
              scenario_id: row.get(2)?,
              value:       row.get(3)?,
              answered_at: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnswer::into_answer).collect()
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  async fn room_aggregates(&self, room_id: Uuid) -> Result<Aggregates> {
    let room_str = encode_uuid(room_id);

    let (rows, participants) = self
      .conn
      .call(move |conn| {
        // One read transaction so counts and participants share a snapshot.
        let tx = conn.transaction()?;
        let rows = {
          let mut stmt = tx.prepare(
            "SELECT scenario_id, yes_count, no_count
             FROM aggregates WHERE room_id = ?1",
          )?;
          stmt
            .query_map(rusqlite::params![room_str], |row| {
              Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<rusqlite::Result<RawTallies>>()?
        };
        let participants: i64 = tx.query_row(
          "SELECT COUNT(DISTINCT session_id) FROM answers WHERE room_id = ?1",
          rusqlite::params![room_str],
          |row| row.get(0),
        )?;
        tx.commit()?;
        Ok((rows, participants))
      })
      .await?;

    into_aggregates(rows, participants)
  }

  async fn global_aggregates(&self) -> Result<Aggregates> {
    let (rows, participants) = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let rows = {
          let mut stmt = tx.prepare(
            "SELECT scenario_id, SUM(yes_count), SUM(no_count)
             FROM aggregates GROUP BY scenario_id",
          )?;
          stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<RawTallies>>()?
        };
        let participants: i64 = tx.query_row(
          "SELECT COUNT(DISTINCT session_id) FROM answers",
          [],
          |row| row.get(0),
        )?;
        tx.commit()?;
        Ok((rows, participants))
      })
      .await?;

    into_aggregates(rows, participants)
  }
}
