//! Handlers for `/answers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/answers` | Body: `{"sessionId","scenarioId","answer","roomId"?,"roomCode"?}` |
//! | `DELETE` | `/answers` | `?sessionId=&scenarioId=&roomId=\|roomCode=`, idempotent |
//! | `GET`    | `/answers` | `?sessionId=&roomId=\|roomCode=` |
//!
//! Every field arrives as an optional string so that a missing or blank value
//! is reported in the same envelope as any other validation failure.

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
};
use serde::{Deserialize, Serialize};
use swipe_core::{
  answer::{AnswerValue, ScenarioId, SessionId},
  ballot::{self, RoomSelector},
  store::SwipeStore,
  tally::Transition,
};

use crate::{AppState, Empty, Envelope, error::ApiError, ok};

fn log_transition(
  action: &'static str,
  session_id: &SessionId,
  scenario_id: &ScenarioId,
  transition: Transition,
) {
  let delta = transition.delta();
  tracing::debug!(
    session = %session_id,
    scenario = %scenario_id,
    yes_delta = delta.yes,
    no_delta = delta.no,
    "{action}"
  );
}

// ─── Submit ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
  pub session_id:  Option<String>,
  pub scenario_id: Option<String>,
  pub answer:      Option<String>,
  pub room_id:     Option<String>,
  pub room_code:   Option<String>,
}

/// `POST /answers`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<Json<Envelope<Empty>>, ApiError>
where
  S: SwipeStore + Clone + 'static,
{
  let Json(body) = body?;

  let session_id = SessionId::parse(body.session_id.as_deref().unwrap_or_default())?;
  let scenario_id = ScenarioId::parse(body.scenario_id.as_deref().unwrap_or_default())?;
  let value = match body.answer.as_deref() {
    Some(raw) => AnswerValue::parse(raw)?,
    None => return Err(ApiError::Validation("answer is required".to_owned())),
  };
  let selector = RoomSelector::new(body.room_id.as_deref(), body.room_code.as_deref());

  let transition = ballot::submit_answer(
    &*state.store,
    selector,
    session_id.clone(),
    scenario_id.clone(),
    value,
  )
  .await?;

  log_transition("answer recorded", &session_id, &scenario_id, transition);
  Ok(ok(Empty {}))
}

// ─── Undo ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoParams {
  pub session_id:  Option<String>,
  pub scenario_id: Option<String>,
  pub room_id:     Option<String>,
  pub room_code:   Option<String>,
}

/// `DELETE /answers`
pub async fn undo<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<UndoParams>, QueryRejection>,
) -> Result<Json<Envelope<Empty>>, ApiError>
where
  S: SwipeStore + Clone + 'static,
{
  let Query(params) = params?;

  let session_id = SessionId::parse(params.session_id.as_deref().unwrap_or_default())?;
  let scenario_id = ScenarioId::parse(params.scenario_id.as_deref().unwrap_or_default())?;
  let selector = RoomSelector::new(params.room_id.as_deref(), params.room_code.as_deref());

  let transition = ballot::undo_answer(
    &*state.store,
    selector,
    session_id.clone(),
    scenario_id.clone(),
  )
  .await?;

  log_transition("answer undone", &session_id, &scenario_id, transition);
  Ok(ok(Empty {}))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub session_id: Option<String>,
  pub room_id:    Option<String>,
  pub room_code:  Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerItem {
  pub scenario_id: ScenarioId,
  pub answer:      AnswerValue,
}

#[derive(Debug, Serialize)]
pub struct AnswerList {
  pub answers: Vec<AnswerItem>,
}

/// `GET /answers`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Envelope<AnswerList>>, ApiError>
where
  S: SwipeStore + Clone + 'static,
{
  let Query(params) = params?;

  let session_id = SessionId::parse(params.session_id.as_deref().unwrap_or_default())?;
  let selector = RoomSelector::new(params.room_id.as_deref(), params.room_code.as_deref());

  let answers = ballot::session_answers(&*state.store, selector, session_id)
    .await?
    .into_iter()
    .map(|a| AnswerItem { scenario_id: a.scenario_id, answer: a.value })
    .collect();

  Ok(ok(AnswerList { answers }))
}
