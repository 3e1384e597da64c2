//! Error types for `canvass-core`.
//!
//! Every operation boundary in the workspace converts its failures into this
//! taxonomy. Store backends implement `From<TheirError> for Error` so that
//! callers generic over [`CrmStore`](crate::store::CrmStore) can classify
//! failures without knowing the backend.

use thiserror::Error;
use uuid::Uuid;

use crate::contact::ChildCollection;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or malformed. Nothing was persisted.
  #[error("validation failed: {0}")]
  Validation(String),

  /// The backing store rejected or failed a call.
  #[error("network error: {0}")]
  Network(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The store handle has not been installed yet.
  #[error("store client is not initialised")]
  NotInitialized,

  /// The parent contact was created but one or more child collections were
  /// not.
  #[error(
    "contact {contact_id} was created but {} could not be saved",
    describe_failures(.failures)
  )]
  PartialFailure {
    contact_id: Uuid,
    failures:   Vec<ChildFailure>,
  },

  #[error("contact not found: {0}")]
  ContactNotFound(Uuid),

  #[error("view not found: {0}")]
  ViewNotFound(Uuid),

  #[error("no view is selected")]
  NoViewSelected,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap any backend error as a [`Error::Network`].
  pub fn network<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Network(Box::new(err))
  }

  pub fn is_not_initialized(&self) -> bool {
    matches!(self, Self::NotInitialized)
  }
}

/// One child collection that failed to save during a multi-entity create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildFailure {
  pub collection: ChildCollection,
  pub message:    String,
}

fn describe_failures(failures: &[ChildFailure]) -> String {
  failures
    .iter()
    .map(|f| format!("{} ({})", f.collection, f.message))
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
