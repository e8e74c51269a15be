//! Integration tests for `SqliteStore` against an in-memory database.

use swipe_core::{
  answer::{AnswerValue, ScenarioId, SessionId},
  room::{NewRoom, Room, RoomUpdate},
  store::SwipeStore,
  tally::Tally,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn room(s: &SqliteStore) -> Room {
  s.create_room(NewRoom::new("Ethics 101", None).unwrap())
    .await
    .unwrap()
}

fn session(id: &str) -> SessionId { SessionId::parse(id).unwrap() }

fn scenario(id: &str) -> ScenarioId { ScenarioId::parse(id).unwrap() }

async fn tally(s: &SqliteStore, room_id: Uuid, id: &str) -> Tally {
  s.room_aggregates(room_id)
    .await
    .unwrap()
    .aggregates
    .get(&scenario(id))
    .copied()
    .unwrap_or_default()
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_session_is_idempotent() {
  let s = store().await;
  s.ensure_session(session("s1")).await.unwrap();
  s.ensure_session(session("s1")).await.unwrap();
}

// ─── Rooms ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_room() {
  let s = store().await;
  let created = room(&s).await;

  assert_eq!(created.code.len(), 6);
  assert!(created.is_active);
  assert_eq!(created.set_id, "default");

  let by_id = s.get_room(created.id).await.unwrap();
  assert_eq!(by_id.as_ref().map(|r| r.id), Some(created.id));

  let by_code = s.get_room_by_code(created.code.clone()).await.unwrap();
  assert_eq!(by_code.map(|r| r.id), Some(created.id));
}

#[tokio::test]
async fn get_room_missing_returns_none() {
  let s = store().await;
  assert!(s.get_room(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.get_room_by_code("NOPE22".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_rooms_newest_first() {
  let s = store().await;
  let first = room(&s).await;
  let second = room(&s).await;

  let ids: Vec<Uuid> = s.list_rooms().await.unwrap().iter().map(|r| r.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn closing_stamps_closed_at_and_reopening_clears_it() {
  let s = store().await;
  let r = room(&s).await;

  let closed = s
    .update_room(r.id, RoomUpdate::new(None, Some(false)).unwrap())
    .await
    .unwrap()
    .unwrap();
  assert!(!closed.is_active);
  let stamp = closed.closed_at.expect("closed_at set");

  // Closing again keeps the original timestamp.
  let again = s
    .update_room(r.id, RoomUpdate::new(Some("Renamed"), Some(false)).unwrap())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(again.closed_at, Some(stamp));
  assert_eq!(again.title, "Renamed");

  let reopened = s
    .update_room(r.id, RoomUpdate::new(None, Some(true)).unwrap())
    .await
    .unwrap()
    .unwrap();
  assert!(reopened.is_active);
  assert!(reopened.closed_at.is_none());
  assert_eq!(reopened.title, "Renamed");
}

#[tokio::test]
async fn update_unknown_room_returns_none() {
  let s = store().await;
  let result = s
    .update_room(Uuid::new_v4(), RoomUpdate::new(Some("x"), None).unwrap())
    .await
    .unwrap();
  assert!(result.is_none());
}

// ─── Answers ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_answer_increments_its_counter() {
  let s = store().await;
  let r = room(&s).await;

  let previous = s
    .upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::Yes)
    .await
    .unwrap();
  assert_eq!(previous, None);
  assert_eq!(tally(&s, r.id, "q1").await, Tally::new(1, 0));
}

#[tokio::test]
async fn changing_an_answer_moves_the_count() {
  let s = store().await;
  let r = room(&s).await;

  s.upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::Yes)
    .await
    .unwrap();
  let previous = s
    .upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::No)
    .await
    .unwrap();

  assert_eq!(previous, Some(AnswerValue::Yes));
  assert_eq!(tally(&s, r.id, "q1").await, Tally::new(0, 1));
}

#[tokio::test]
async fn identical_resubmission_bumps_timestamp_only() {
  let s = store().await;
  let r = room(&s).await;

  s.upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::Yes)
    .await
    .unwrap();
  let before = s.session_answers(session("s1"), r.id).await.unwrap();

  let previous = s
    .upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::Yes)
    .await
    .unwrap();
  let after = s.session_answers(session("s1"), r.id).await.unwrap();

  assert_eq!(previous, Some(AnswerValue::Yes));
  assert_eq!(tally(&s, r.id, "q1").await, Tally::new(1, 0));
  assert_eq!(after.len(), 1);
  assert!(after[0].answered_at >= before[0].answered_at);
}

#[tokio::test]
async fn undo_decrements_and_is_idempotent() {
  let s = store().await;
  let r = room(&s).await;

  s.upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::No)
    .await
    .unwrap();

  let removed = s
    .delete_answer(session("s1"), r.id, scenario("q1"))
    .await
    .unwrap();
  assert_eq!(removed, Some(AnswerValue::No));
  assert_eq!(tally(&s, r.id, "q1").await, Tally::new(0, 0));

  let removed = s
    .delete_answer(session("s1"), r.id, scenario("q1"))
    .await
    .unwrap();
  assert_eq!(removed, None);
  assert_eq!(tally(&s, r.id, "q1").await, Tally::new(0, 0));
}

#[tokio::test]
async fn undo_without_answer_creates_no_aggregate_row() {
  let s = store().await;
  let r = room(&s).await;

  s.delete_answer(session("s1"), r.id, scenario("q1"))
    .await
    .unwrap();

  let agg = s.room_aggregates(r.id).await.unwrap();
  assert!(agg.aggregates.is_empty());
}

#[tokio::test]
async fn answer_against_unknown_room_fails_without_side_effects() {
  let s = store().await;
  let r = room(&s).await;

  let result = s
    .upsert_answer(session("s1"), Uuid::new_v4(), scenario("q1"), AnswerValue::Yes)
    .await;
  assert!(result.is_err());

  let global = s.global_aggregates().await.unwrap();
  assert!(global.aggregates.is_empty());
  assert_eq!(global.total_participants, 0);
  assert!(s.session_answers(session("s1"), r.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn session_answers_are_scoped_and_ordered() {
  let s = store().await;
  let r = room(&s).await;
  let other = room(&s).await;

  s.upsert_answer(session("s1"), r.id, scenario("q2"), AnswerValue::No)
    .await
    .unwrap();
  s.upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::Yes)
    .await
    .unwrap();
  s.upsert_answer(session("s1"), other.id, scenario("q3"), AnswerValue::Yes)
    .await
    .unwrap();
  s.upsert_answer(session("s2"), r.id, scenario("q4"), AnswerValue::Yes)
    .await
    .unwrap();

  let answers = s.session_answers(session("s1"), r.id).await.unwrap();
  let ids: Vec<&str> = answers.iter().map(|a| a.scenario_id.as_str()).collect();
  assert_eq!(ids, vec!["q1", "q2"]);
  assert!(answers.iter().all(|a| a.room_id == r.id));
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn participants_count_distinct_sessions() {
  let s = store().await;
  let r = room(&s).await;

  for (sid, q, v) in [
    ("s1", "q1", AnswerValue::Yes),
    ("s1", "q2", AnswerValue::No),
    ("s2", "q1", AnswerValue::No),
  ] {
    s.upsert_answer(session(sid), r.id, scenario(q), v).await.unwrap();
  }

  let agg = s.room_aggregates(r.id).await.unwrap();
  assert_eq!(agg.total_participants, 2);
  assert_eq!(agg.aggregates[&scenario("q1")], Tally::new(1, 1));
  assert_eq!(agg.aggregates[&scenario("q2")], Tally::new(0, 1));
}

#[tokio::test]
async fn global_aggregates_sum_across_rooms() {
  let s = store().await;
  let a = room(&s).await;
  let b = room(&s).await;

  s.upsert_answer(session("s1"), a.id, scenario("q1"), AnswerValue::Yes)
    .await
    .unwrap();
  s.upsert_answer(session("s1"), b.id, scenario("q1"), AnswerValue::Yes)
    .await
    .unwrap();
  s.upsert_answer(session("s2"), b.id, scenario("q1"), AnswerValue::No)
    .await
    .unwrap();

  let global = s.global_aggregates().await.unwrap();
  assert_eq!(global.aggregates[&scenario("q1")], Tally::new(2, 1));
  assert_eq!(global.total_participants, 2);
}

#[tokio::test]
async fn counts_match_answers_after_mixed_history() {
  let s = store().await;
  let r = room(&s).await;

  s.upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::Yes).await.unwrap();
  s.upsert_answer(session("s2"), r.id, scenario("q1"), AnswerValue::Yes).await.unwrap();
  s.upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::No).await.unwrap();
  s.delete_answer(session("s2"), r.id, scenario("q1")).await.unwrap();
  s.upsert_answer(session("s3"), r.id, scenario("q1"), AnswerValue::No).await.unwrap();
  s.delete_answer(session("s3"), r.id, scenario("q1")).await.unwrap();
  s.delete_answer(session("s3"), r.id, scenario("q1")).await.unwrap();

  let mut expected = Tally::default();
  for sid in ["s1", "s2", "s3"] {
    for answer in s.session_answers(session(sid), r.id).await.unwrap() {
      expected = expected + match answer.value {
        AnswerValue::Yes => Tally::new(1, 0),
        AnswerValue::No => Tally::new(0, 1),
      };
    }
  }

  assert_eq!(tally(&s, r.id, "q1").await, expected);
  assert_eq!(expected, Tally::new(0, 1));
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sessions_lose_no_increments() {
  let s = store().await;
  let room_id = room(&s).await.id;

  let handles: Vec<_> = (0..50)
    .map(|i| {
      let s = s.clone();
      let value = if i % 2 == 0 { AnswerValue::Yes } else { AnswerValue::No };
      tokio::spawn(async move {
        s.upsert_answer(session(&format!("s{i}")), room_id, scenario("q1"), value)
          .await
      })
    })
    .collect();

  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  let agg = s.room_aggregates(room_id).await.unwrap();
  assert_eq!(agg.aggregates[&scenario("q1")], Tally::new(25, 25));
  assert_eq!(agg.total_participants, 50);
}

// ─── Durability ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn reopening_a_file_store_keeps_answers_and_counts() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("swipe.db");

  let room_id = {
    let s = SqliteStore::open(&path).await.unwrap();
    let r = room(&s).await;
    s.upsert_answer(session("s1"), r.id, scenario("q1"), AnswerValue::Yes)
      .await
      .unwrap();
    r.id
  };

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(tally(&s, room_id, "q1").await, Tally::new(1, 0));
  assert_eq!(s.session_answers(session("s1"), room_id).await.unwrap().len(), 1);
}
