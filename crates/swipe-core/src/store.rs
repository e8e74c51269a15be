//! The `SwipeStore` trait.
//!
//! Implemented by storage backends (`swipe-store-sqlite`,
//! `swipe-store-memory`). The HTTP layer never calls it directly for answer
//! writes; it goes through [`crate::ballot`], which validates input and
//! resolves the room first.

use std::future::Future;

use uuid::Uuid;

use crate::{
  answer::{Answer, AnswerValue, ScenarioId, SessionId},
  room::{NewRoom, Room, RoomUpdate},
  tally::Aggregates,
};

/// Abstraction over a Swipe storage backend.
///
/// # Consistency
///
/// Every answer mutation adjusts the matching aggregate row in the same
/// backend operation: both are applied or neither is. Aggregate rows are
/// created with insert-if-absent semantics and adjusted with an atomic
/// add-delta-floor-at-zero step, never a read-modify-write from a snapshot
/// taken outside the store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SwipeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Record `session_id` if unseen. Inserting a known id is a no-op.
  fn ensure_session(
    &self,
    session_id: SessionId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Rooms ─────────────────────────────────────────────────────────────

  /// Create a room with a freshly generated unique code.
  fn create_room(
    &self,
    input: NewRoom,
  ) -> impl Future<Output = Result<Room, Self::Error>> + Send + '_;

  /// Retrieve a room by id, open or closed.
  fn get_room(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Room>, Self::Error>> + Send + '_;

  /// Retrieve a room by its normalised (upper-case) code, open or closed.
  fn get_room_by_code(
    &self,
    code: String,
  ) -> impl Future<Output = Result<Option<Room>, Self::Error>> + Send + '_;

  /// All rooms, newest first.
  fn list_rooms(
    &self,
  ) -> impl Future<Output = Result<Vec<Room>, Self::Error>> + Send + '_;

  /// Apply `update` and return the updated room, or `None` if `id` is
  /// unknown.
  fn update_room(
    &self,
    id: Uuid,
    update: RoomUpdate,
  ) -> impl Future<Output = Result<Option<Room>, Self::Error>> + Send + '_;

  // ── Answers ───────────────────────────────────────────────────────────

  /// Ensure the session exists, then insert or overwrite the answer for the
  /// triple and adjust the aggregate. Returns the value held before the call.
  ///
  /// An identical resubmission still bumps `answered_at` and leaves the
  /// aggregate untouched.
  fn upsert_answer(
    &self,
    session_id: SessionId,
    room_id: Uuid,
    scenario_id: ScenarioId,
    value: AnswerValue,
  ) -> impl Future<Output = Result<Option<AnswerValue>, Self::Error>> + Send + '_;

  /// Remove the answer for the triple and decrement the aggregate. Returns
  /// the removed value, or `None` (touching nothing) if there was none.
  fn delete_answer(
    &self,
    session_id: SessionId,
    room_id: Uuid,
    scenario_id: ScenarioId,
  ) -> impl Future<Output = Result<Option<AnswerValue>, Self::Error>> + Send + '_;

  /// Current answers of one session in one room, ordered by scenario id.
  fn session_answers(
    &self,
    session_id: SessionId,
    room_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Answer>, Self::Error>> + Send + '_;

  // ── Aggregates ────────────────────────────────────────────────────────

  /// Per-scenario counts and distinct participants for one room.
  fn room_aggregates(
    &self,
    room_id: Uuid,
  ) -> impl Future<Output = Result<Aggregates, Self::Error>> + Send + '_;

  /// Per-scenario counts summed over every room, with participants counted
  /// distinctly across rooms.
  fn global_aggregates(
    &self,
  ) -> impl Future<Output = Result<Aggregates, Self::Error>> + Send + '_;
}
