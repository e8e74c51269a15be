//! Handlers for `/rooms` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rooms?code=<code>` | Public; 404 if unknown or closed |
//! | `GET`  | `/rooms` | Admin; newest first |
//! | `POST` | `/rooms` | Admin; body `{"title","setId"?}` |
//! | `PUT`  | `/rooms` | Admin; body `{"id","title"?,"isActive"?}` |

use axum::{
  Json,
  extract::{
    Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use swipe_core::{
  ballot::{self, RoomSelector},
  room::{NewRoom, Room, RoomUpdate},
  store::SwipeStore,
};
use uuid::Uuid;

use crate::{
  AppState, Envelope,
  auth::{AdminAuth, verify_auth},
  error::{ApiError, store_error},
  ok,
};

#[derive(Debug, Serialize)]
pub struct RoomBody {
  pub room: Room,
}

#[derive(Debug, Serialize)]
pub struct RoomList {
  pub rooms: Vec<Room>,
}

// ─── Get / list ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GetParams {
  pub code: Option<String>,
}

/// `GET /rooms[?code=<code>]`
///
/// A join code lookup is public; listing every room needs the admin.
pub async fn get<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  params: Result<Query<GetParams>, QueryRejection>,
) -> Result<axum::response::Response, ApiError>
where
  S: SwipeStore + Clone + 'static,
{
  let Query(params) = params?;

  if let Some(code) = params.code.as_deref() {
    let room = ballot::resolve_room(&*state.store, RoomSelector::new(None, Some(code)))
      .await?
      .filter(|room| room.is_active)
      .ok_or(ApiError::RoomNotFound)?;
    return Ok(ok(RoomBody { room }).into_response());
  }

  verify_auth(&headers, &state.auth)?;
  let rooms = state.store.list_rooms().await.map_err(store_error)?;
  Ok(ok(RoomList { rooms }).into_response())
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub title:  Option<String>,
  pub set_id: Option<String>,
}

/// `POST /rooms`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  _admin: AdminAuth,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<RoomBody>>), ApiError>
where
  S: SwipeStore + Clone + 'static,
{
  let Json(body) = body?;
  let input = NewRoom::new(body.title.as_deref().unwrap_or_default(), body.set_id.as_deref())?;

  let room = state.store.create_room(input).await.map_err(store_error)?;
  tracing::info!(room = %room.id, code = %room.code, "room created");
  Ok((StatusCode::CREATED, ok(RoomBody { room })))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub id:        Option<String>,
  pub title:     Option<String>,
  pub is_active: Option<bool>,
}

/// `PUT /rooms`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  _admin: AdminAuth,
  body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<Envelope<RoomBody>>, ApiError>
where
  S: SwipeStore + Clone + 'static,
{
  let Json(body) = body?;

  let raw_id = body
    .id
    .as_deref()
    .map(str::trim)
    .filter(|id| !id.is_empty())
    .ok_or_else(|| ApiError::Validation("id is required".to_owned()))?;
  let update = RoomUpdate::new(body.title.as_deref(), body.is_active)?;

  // A malformed id names no room, the same as an unknown one.
  let Ok(id) = Uuid::parse_str(raw_id) else {
    return Err(ApiError::RoomNotFound);
  };

  let room = state
    .store
    .update_room(id, update)
    .await
    .map_err(store_error)?
    .ok_or(ApiError::RoomNotFound)?;

  tracing::info!(room = %room.id, active = room.is_active, "room updated");
  Ok(ok(RoomBody { room }))
}
