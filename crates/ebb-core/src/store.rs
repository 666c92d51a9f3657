//! The `ChurnStore` trait — the persistence boundary of the system.
//!
//! The trait is implemented by storage backends (e.g. `ebb-store-sqlite`).
//! Higher layers (`ebb-api`, the scheduler in `ebb-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  artifact::{ModelArtifact, ModelKind, NewArtifact},
  counters::RetrainCounters,
  record::{NewRecord, SentimentScore, UserRecord},
};

/// Abstraction over the ebb dataset, counter, and artifact storage.
///
/// The record table is append-only. Two operations carry multi-row
/// invariants and MUST be atomic in any implementation:
///
/// - [`ingest`](ChurnStore::ingest) appends records and advances BOTH
///   models' `records_seen` counters as one durable unit — a crash can
///   never leave a record appended but uncounted, or counted but dropped.
/// - [`publish_artifact`](ChurnStore::publish_artifact) swaps the current
///   artifact and resets that model's counters together — readers never
///   observe a new artifact with stale counters or vice versa.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ChurnStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Append validated records in arrival order and advance both models'
  /// `records_seen` counters by the batch size, atomically.
  ///
  /// Rows without a `user_id` are assigned monotonically increasing ids by
  /// the store. `record_id` and `recorded_at` are always store-assigned.
  /// Appending an empty batch changes nothing.
  fn ingest(
    &self,
    rows: Vec<NewRecord>,
  ) -> impl Future<Output = Result<Vec<UserRecord>, Self::Error>> + Send + '_;

  // ── Dataset reads ─────────────────────────────────────────────────────

  /// The full dataset in arrival order — a consistent snapshot taken in a
  /// single read; used as training input.
  fn all_records(
    &self,
  ) -> impl Future<Output = Result<Vec<UserRecord>, Self::Error>> + Send + '_;

  /// The latest record for each user, for bulk scoring.
  fn latest_records(
    &self,
  ) -> impl Future<Output = Result<Vec<UserRecord>, Self::Error>> + Send + '_;

  /// The latest record for one user. Returns `None` if the user is unknown.
  fn latest_record(
    &self,
    user_id: u64,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + '_;

  /// Total number of records in the dataset.
  fn record_count(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Counters ──────────────────────────────────────────────────────────

  /// The current retrain counters for one model.
  fn counters(
    &self,
    kind: ModelKind,
  ) -> impl Future<Output = Result<RetrainCounters, Self::Error>> + Send + '_;

  // ── Sentiment cache ───────────────────────────────────────────────────

  /// A previously computed sentiment score for a record, if any.
  fn cached_sentiment(
    &self,
    record_id: Uuid,
  ) -> impl Future<Output = Result<Option<SentimentScore>, Self::Error>> + Send + '_;

  /// Cache a computed sentiment score alongside its record. Idempotent.
  fn cache_sentiment(
    &self,
    record_id: Uuid,
    score: SentimentScore,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Artifacts ─────────────────────────────────────────────────────────

  /// The current artifact for a model, or `None` if it has never been
  /// successfully trained.
  fn current_artifact(
    &self,
    kind: ModelKind,
  ) -> impl Future<Output = Result<Option<ModelArtifact>, Self::Error>> + Send + '_;

  /// Publish a freshly trained artifact: assign id/version/timestamp, mark
  /// it current, demote the previous artifact (retained for rollback), and
  /// reset the model's counters — all atomically.
  fn publish_artifact(
    &self,
    artifact: NewArtifact,
  ) -> impl Future<Output = Result<ModelArtifact, Self::Error>> + Send + '_;
}
