//! `GET /aggregates[?roomId=|roomCode=]`
//!
//! With neither parameter the counts are summed across every room.

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use swipe_core::{
  ballot::{self, RoomSelector},
  store::SwipeStore,
  tally::Aggregates,
};

use crate::{AppState, Envelope, error::ApiError, ok};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateParams {
  pub room_id:   Option<String>,
  pub room_code: Option<String>,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  params: Result<Query<AggregateParams>, QueryRejection>,
) -> Result<Json<Envelope<Aggregates>>, ApiError>
where
  S: SwipeStore + Clone + 'static,
{
  let Query(params) = params?;
  let selector = RoomSelector::new(params.room_id.as_deref(), params.room_code.as_deref());
  let aggregates = ballot::aggregates(&*state.store, selector).await?;
  Ok(ok(aggregates))
}
