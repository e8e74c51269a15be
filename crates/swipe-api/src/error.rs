//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler. Every variant renders as
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),

  #[error("room not found")]
  RoomNotFound,

  #[error("unauthorized")]
  Unauthorized,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<swipe_core::Error> for ApiError {
  fn from(err: swipe_core::Error) -> Self {
    match err {
      swipe_core::Error::Validation(m) => ApiError::Validation(m),
      swipe_core::Error::RoomNotFound => ApiError::RoomNotFound,
      swipe_core::Error::Persistence(e) => ApiError::Store(e),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::Validation(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError::Validation(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::RoomNotFound => {
        tracing::warn!("request named no open room");
        StatusCode::NOT_FOUND
      }
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    let body = Json(json!({ "success": false, "error": self.to_string() }));
    let mut res = (status, body).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"swipe\""),
      );
    }
    res
  }
}

pub(crate) fn store_error<E>(err: E) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  ApiError::Store(Box::new(err))
}
