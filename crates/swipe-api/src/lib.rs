//! JSON REST API for Swipe.
//!
//! Exposes an axum [`Router`] backed by any [`swipe_core::store::SwipeStore`].
//! Every response is a `{"success": bool, ...}` envelope and carries headers
//! that forbid caching, since aggregates change with every swipe. TLS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", swipe_api::api_router(state))
//! ```

pub mod aggregates;
pub mod answers;
pub mod auth;
pub mod error;
pub mod rooms;

use std::sync::Arc;

use axum::{
  Json, Router,
  http::{HeaderValue, header},
  routing::get,
};
use serde::Serialize;
use swipe_core::store::SwipeStore;
use tower_http::set_header::SetResponseHeaderLayer;

use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: SwipeStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// Successful response body: `{"success": true}` merged with the fields of
/// `body`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  success: bool,
  #[serde(flatten)]
  body:    T,
}

/// Body for responses that carry nothing beyond `success`.
#[derive(Debug, Serialize)]
pub struct Empty {}

pub fn ok<T: Serialize>(body: T) -> Json<Envelope<T>> {
  Json(Envelope { success: true, body })
}

// ─── Router ──────────────────────────────────────────────────────────────────

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, max-age=0";

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SwipeStore + Clone + 'static,
{
  Router::new()
    // Answers
    .route(
      "/answers",
      get(answers::list::<S>)
        .post(answers::submit::<S>)
        .delete(answers::undo::<S>),
    )
    // Aggregates
    .route("/aggregates", get(aggregates::handler::<S>))
    // Rooms
    .route(
      "/rooms",
      get(rooms::get::<S>)
        .post(rooms::create::<S>)
        .put(rooms::update::<S>),
    )
    .route("/health", get(health))
    .with_state(state)
    .layer(SetResponseHeaderLayer::overriding(
      header::CACHE_CONTROL,
      HeaderValue::from_static(NO_CACHE),
    ))
    .layer(SetResponseHeaderLayer::overriding(
      header::PRAGMA,
      HeaderValue::from_static("no-cache"),
    ))
}

/// `GET /health`
async fn health() -> Json<Envelope<Empty>> { ok(Empty {}) }
