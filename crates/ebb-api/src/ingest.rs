//! Handler for `POST /ingest`.
//!
//! Accepts either a JSON array of raw rows (file-of-records upload) or a
//! single raw row (form submission). Rows are validated individually; the
//! response reports every rejection with its reason, and one bad row never
//! aborts the batch.

use std::sync::Arc;

use axum::{Json, extract::State};
use ebb_core::{
  record::{RawRecord, screen_batch},
  store::ChurnStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The two accepted request shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IngestBody {
  Batch(Vec<RawRecord>),
  Single(RawRecord),
}

#[derive(Debug, Serialize)]
pub struct RejectedRow {
  pub row:    RawRecord,
  pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct IngestReport {
  pub accepted: usize,
  pub rejected: Vec<RejectedRow>,
}

/// `POST /ingest`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<IngestBody>,
) -> Result<Json<IngestReport>, ApiError>
where
  S: ChurnStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = match body {
    IngestBody::Batch(rows) => rows,
    IngestBody::Single(row) => vec![row],
  };

  let (valid, rejected) = screen_batch(rows);
  for (_, reason) in &rejected {
    tracing::warn!(%reason, "rejected ingestion row");
  }

  let appended = store
    .ingest(valid)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  // Sentiment is a side effect of ingestion: compute and cache it for rows
  // that carried review text. The records are already durable, so a cache
  // failure is logged rather than failing the request — the score is
  // recomputed on demand wherever the cache misses.
  for record in &appended {
    if let Some(text) = record.review.as_deref() {
      let score = ebb_sentiment::analyze(text);
      if let Err(e) = store.cache_sentiment(record.record_id, score).await {
        tracing::warn!(record_id = %record.record_id, error = %e,
          "failed to cache sentiment score");
      }
    }
  }

  tracing::info!(
    accepted = appended.len(),
    rejected = rejected.len(),
    "processed ingestion batch"
  );

  Ok(Json(IngestReport {
    accepted: appended.len(),
    rejected: rejected
      .into_iter()
      .map(|(row, reason)| RejectedRow { row, reason: reason.to_string() })
      .collect(),
  }))
}
