//! Model artifacts — immutable, versioned snapshots of fitted estimators.
//!
//! Exactly one artifact per model kind is "current" at any time. A new
//! artifact replaces the previous one atomically, and only after a
//! successful training run; readers never observe a partial write. Prior
//! versions are retained for rollback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── ModelKind ───────────────────────────────────────────────────────────────

/// Which of the two churn models an artifact or counter row belongs to.
///
/// Model A consumes only numeric behavioural features. Model B consumes the
/// same behavioural features plus the derived review-sentiment compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
  ModelA,
  ModelB,
}

impl ModelKind {
  pub const ALL: [ModelKind; 2] = [ModelKind::ModelA, ModelKind::ModelB];

  /// Short label used in logs and API payloads.
  pub fn label(self) -> &'static str {
    match self {
      ModelKind::ModelA => "model_a",
      ModelKind::ModelB => "model_b",
    }
  }
}

impl std::fmt::Display for ModelKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

// ─── ModelArtifact ───────────────────────────────────────────────────────────

/// A persisted snapshot of a fitted estimator together with the feature
/// schema it was trained on. Immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
  pub artifact_id:   Uuid,
  pub kind:          ModelKind,
  /// Monotonically increasing per kind; assigned by the store at publish.
  pub version:       u64,
  /// Server-assigned publish timestamp.
  pub trained_at:    DateTime<Utc>,
  /// Ordered feature names the payload's weight vector is aligned with.
  pub schema:        Vec<String>,
  /// Serialised fitted estimator; interpreted by the model crate.
  pub payload:       serde_json::Value,
  /// SHA-256 hex digest of the payload, for integrity checks.
  pub content_hash:  String,
  /// Number of dataset rows the estimator was fitted on.
  pub training_rows: u64,
}

// ─── NewArtifact ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::ChurnStore::publish_artifact`].
/// `artifact_id`, `version`, and `trained_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewArtifact {
  pub kind:          ModelKind,
  pub schema:        Vec<String>,
  pub payload:       serde_json::Value,
  pub content_hash:  String,
  pub training_rows: u64,
}
