//! Training glue: dataset snapshot in, publishable artifact out.

use std::collections::HashMap;

use ebb_core::{
  Error, Result,
  artifact::{ModelArtifact, ModelKind, NewArtifact},
  record::{SentimentScore, UserRecord},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{linear::LinearModel, unit::unit_for};

/// Training below this many records is rejected outright — fitting on
/// degenerate data produces a worse model than keeping the previous one.
pub const MIN_TRAINING_RECORDS: usize = 10;

// ─── TrainingSnapshot ────────────────────────────────────────────────────────

/// The dataset view a training job works from: every record as of job
/// start, plus whatever sentiment scores were already cached. Records
/// ingested after the snapshot is taken are not part of this run; the
/// counters preserve them for the next one.
#[derive(Debug, Clone)]
pub struct TrainingSnapshot {
  pub records:    Vec<UserRecord>,
  pub sentiments: HashMap<Uuid, SentimentScore>,
}

impl TrainingSnapshot {
  /// The sentiment for a record: the cached score when present, computed
  /// from the review text otherwise, imputed neutral when there is none.
  pub fn sentiment_for(&self, record: &UserRecord) -> SentimentScore {
    if let Some(score) = self.sentiments.get(&record.record_id) {
      return *score;
    }
    match record.review.as_deref() {
      Some(text) => ebb_sentiment::analyze(text),
      None => SentimentScore::neutral(),
    }
  }
}

// ─── Training ────────────────────────────────────────────────────────────────

/// Train one model over a snapshot and package the result for publishing.
///
/// Fails with [`Error::InsufficientData`] below the record floor and
/// [`Error::Training`] on estimator problems; in both cases nothing has
/// been written anywhere and the caller's artifact/counters are untouched.
pub fn train(kind: ModelKind, snapshot: &TrainingSnapshot) -> Result<NewArtifact> {
  let have = snapshot.records.len();
  if have < MIN_TRAINING_RECORDS {
    return Err(Error::InsufficientData { have, need: MIN_TRAINING_RECORDS });
  }

  let unit = unit_for(kind);
  let rows: Vec<Vec<f64>> = snapshot
    .records
    .iter()
    .map(|r| unit.vectorize(r, &snapshot.sentiment_for(r)))
    .collect();
  let labels: Vec<bool> = snapshot.records.iter().map(|r| r.churned).collect();

  let model = LinearModel::fit(&rows, &labels)?;
  let payload = serde_json::to_value(&model)?;
  let content_hash = payload_digest(&payload);

  tracing::debug!(
    model = %kind,
    rows = have,
    hash = %content_hash,
    "fitted estimator"
  );

  Ok(NewArtifact {
    kind,
    schema: unit.schema(),
    payload,
    content_hash,
    training_rows: have as u64,
  })
}

/// Rehydrate the fitted estimator from a published artifact.
pub fn fitted_from(artifact: &ModelArtifact) -> Result<LinearModel> {
  Ok(serde_json::from_value(artifact.payload.clone())?)
}

/// SHA-256 hex digest over the canonical JSON payload.
fn payload_digest(payload: &serde_json::Value) -> String {
  let mut hasher = Sha256::new();
  hasher.update(payload.to_string().as_bytes());
  hex::encode(hasher.finalize())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
