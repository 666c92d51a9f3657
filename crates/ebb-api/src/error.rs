//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Neither model has ever been successfully trained; predictions cannot
  /// be served yet. Retriable once the first retrain lands.
  #[error("no model has been trained yet")]
  ModelUnavailable,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Translate a prediction-path core error into its API shape.
  pub fn from_core(err: ebb_core::Error) -> Self {
    match err {
      ebb_core::Error::UserNotFound(id) => {
        ApiError::NotFound(format!("user {id} not found"))
      }
      ebb_core::Error::ModelUnavailable => ApiError::ModelUnavailable,
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::ModelUnavailable => {
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
      }
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
