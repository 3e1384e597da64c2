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

  #[error("store not ready")]
  Unavailable,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<canvass_core::Error> for ApiError {
  fn from(err: canvass_core::Error) -> Self {
    use canvass_core::Error as E;
    match err {
      E::Validation(m) => Self::BadRequest(m),
      E::ContactNotFound(id) => Self::NotFound(format!("contact {id} not found")),
      E::ViewNotFound(id) => Self::NotFound(format!("view {id} not found")),
      E::NotInitialized => Self::Unavailable,
      other => Self::Store(Box::new(other)),
    }
  }
}

/// Map a backend error through the core taxonomy.
pub fn store_err<E: Into<canvass_core::Error>>(err: E) -> ApiError {
  err.into().into()
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
