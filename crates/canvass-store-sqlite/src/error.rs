//! Error type for `canvass-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("contact not found: {0}")]
  ContactNotFound(uuid::Uuid),

  #[error("view not found: {0}")]
  ViewNotFound(uuid::Uuid),
}

impl From<Error> for canvass_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Validation(msg) => Self::Validation(msg),
      Error::ContactNotFound(id) => Self::ContactNotFound(id),
      Error::ViewNotFound(id) => Self::ViewNotFound(id),
      other => Self::network(other),
    }
  }
}

impl From<canvass_core::Error> for Error {
  fn from(err: canvass_core::Error) -> Self {
    match err {
      canvass_core::Error::Validation(msg) => Self::Validation(msg),
      other => Self::Decode(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
