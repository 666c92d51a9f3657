//! The retraining scheduler: a fixed-interval poll loop that evaluates each
//! model's trigger and dispatches training jobs.
//!
//! Per model the state machine is `Idle → Training → Idle`. A slot with an
//! unfinished job is skipped on subsequent ticks — at most one retrain in
//! flight per model — while the two models are free to train concurrently
//! with respect to each other. Failures are contained: the attempt is
//! logged, the previous artifact and the counters stay untouched, and the
//! loop continues.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use ebb_core::{
  artifact::{ModelArtifact, ModelKind},
  counters::{TriggerConfig, should_retrain},
  store::ChurnStore,
};
use ebb_model::{MIN_TRAINING_RECORDS, TrainingSnapshot};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::ServerConfig;

// ─── Scheduler ───────────────────────────────────────────────────────────────

/// One model's slot in the poll loop.
struct ModelSlot {
  kind:         ModelKind,
  trigger:      TriggerConfig,
  /// `Some` while a training job is in flight — the `Training` state.
  in_flight:    Option<JoinHandle<()>>,
  /// Set once the data-floor warning has been emitted, so the standing
  /// condition is reported on the transition instead of every tick.
  floor_warned: bool,
}

/// The retraining scheduler. Owns one slot per model and a shared store
/// handle; ingestion and prediction continue concurrently through their own
/// handles while jobs run.
pub struct Scheduler<S> {
  store:         Arc<S>,
  poll_interval: std::time::Duration,
  slots:         Vec<ModelSlot>,
  /// Jobs dispatched over this scheduler's lifetime.
  dispatched:    u64,
}

impl<S> Scheduler<S>
where
  S: ChurnStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  pub fn new(store: Arc<S>, config: &ServerConfig) -> Self {
    let slots = ModelKind::ALL
      .into_iter()
      .map(|kind| ModelSlot {
        kind,
        trigger: config.trigger_config(kind),
        in_flight: None,
        floor_warned: false,
      })
      .collect();

    Self {
      store,
      poll_interval: std::time::Duration::from_secs(
        config.poll_interval_seconds,
      ),
      slots,
      dispatched: 0,
    }
  }

  /// Run the poll loop forever. Never returns; every failure path inside a
  /// tick is contained and logged.
  pub async fn run(mut self) {
    let mut ticker = tokio::time::interval(self.poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tracing::info!(
      poll_interval_seconds = self.poll_interval.as_secs(),
      "retraining scheduler started"
    );
    loop {
      ticker.tick().await;
      self.tick().await;
    }
  }

  /// One scheduler pass: for each model independently, reap a finished job,
  /// evaluate the trigger, and dispatch when due.
  pub async fn tick(&mut self) {
    let now = Utc::now();

    for slot in &mut self.slots {
      // Reap a finished job; a still-running one keeps the slot in the
      // Training state and it is skipped this tick.
      if let Some(handle) = slot.in_flight.take() {
        if handle.is_finished() {
          if let Err(e) = handle.await {
            tracing::error!(model = %slot.kind, error = %e,
              "training task panicked");
          }
        } else {
          slot.in_flight = Some(handle);
          continue;
        }
      }

      let counters = match self.store.counters(slot.kind).await {
        Ok(counters) => counters,
        Err(e) => {
          tracing::error!(model = %slot.kind, error = %e,
            "failed to read retrain counters");
          continue;
        }
      };

      if !should_retrain(&counters, &slot.trigger, now) {
        continue;
      }

      // The data floor is a standing condition, not a transient failure:
      // an elapsed interval alone must not put training into a tight retry
      // loop while the dataset is still too small. Warn once and hold.
      let have = match self.store.record_count().await {
        Ok(count) => count as usize,
        Err(e) => {
          tracing::error!(model = %slot.kind, error = %e,
            "failed to read record count");
          continue;
        }
      };
      if have < MIN_TRAINING_RECORDS {
        if !slot.floor_warned {
          tracing::warn!(model = %slot.kind, have, need = MIN_TRAINING_RECORDS,
            "retrain due but dataset is below the training floor; holding");
          slot.floor_warned = true;
        }
        continue;
      }
      slot.floor_warned = false;

      tracing::info!(model = %slot.kind,
        records_seen = counters.records_seen,
        "retrain trigger fired; starting training");

      let store = Arc::clone(&self.store);
      let kind = slot.kind;
      slot.in_flight = Some(tokio::spawn(async move {
        match train_and_publish(store.as_ref(), kind).await {
          Ok(artifact) => {
            tracing::info!(model = %kind, version = artifact.version,
              rows = artifact.training_rows, hash = %artifact.content_hash,
              "published new model artifact");
          }
          Err(e) => {
            tracing::error!(model = %kind, error = %e,
              "training attempt failed; previous artifact and counters unchanged");
          }
        }
      }));
      self.dispatched += 1;
    }
  }
}

// ─── Training job ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TrainJobError<E: std::error::Error> {
  #[error("store error: {0}")]
  Store(#[source] E),

  #[error(transparent)]
  Model(#[from] ebb_core::Error),

  #[error("training task join error: {0}")]
  Join(#[from] tokio::task::JoinError),
}

/// Run one training job to completion: snapshot the dataset, warm the
/// sentiment cache for Model B, fit off the async runtime, and publish.
///
/// The snapshot is taken once at job start; records ingested afterwards are
/// not part of this run but remain counted toward the next one. On any
/// error the store is left exactly as it was.
pub async fn train_and_publish<S>(
  store: &S,
  kind: ModelKind,
) -> Result<ModelArtifact, TrainJobError<S::Error>>
where
  S: ChurnStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let records = store.all_records().await.map_err(TrainJobError::Store)?;

  // Model B's feature pipeline needs per-record sentiment. Scores are
  // computed lazily on first use and cached alongside the record, so later
  // jobs and the prediction path reuse them.
  let mut sentiments = HashMap::new();
  if kind == ModelKind::ModelB {
    for record in records.iter().filter(|r| r.review.is_some()) {
      let cached = store
        .cached_sentiment(record.record_id)
        .await
        .map_err(TrainJobError::Store)?;
      let score = match cached {
        Some(score) => score,
        None => {
          let text = record.review.as_deref().unwrap_or_default();
          let score = ebb_sentiment::analyze(text);
          store
            .cache_sentiment(record.record_id, score)
            .await
            .map_err(TrainJobError::Store)?;
          score
        }
      };
      sentiments.insert(record.record_id, score);
    }
  }

  let snapshot = TrainingSnapshot { records, sentiments };

  // The fit is CPU-bound; keep it off the async worker threads.
  let new_artifact =
    tokio::task::spawn_blocking(move || ebb_model::train(kind, &snapshot))
      .await??;

  let artifact = store
    .publish_artifact(new_artifact)
    .await
    .map_err(TrainJobError::Store)?;
  Ok(artifact)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
