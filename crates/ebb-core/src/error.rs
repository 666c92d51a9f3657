//! Error types for `ebb-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(u64),

  #[error("no model has been trained yet")]
  ModelUnavailable,

  #[error("insufficient training data: {have} records, need at least {need}")]
  InsufficientData { have: usize, need: usize },

  #[error("training failed: {0}")]
  Training(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
