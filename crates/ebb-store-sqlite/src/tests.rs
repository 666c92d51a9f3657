//! Integration tests for `SqliteStore` against an in-memory database.

use ebb_core::{
  artifact::{ModelKind, NewArtifact},
  record::{DAILY_USAGE_WINDOW, NewRecord, SentimentScore},
  store::ChurnStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_record(user_id: Option<u64>) -> NewRecord {
  NewRecord {
    user_id,
    avg_screen_time: 55.0,
    avg_spend: 210.0,
    rating: 4.0,
    password_resets: 1.0,
    last_visit_minutes: 720.0,
    daily_usage: [12.0; DAILY_USAGE_WINDOW],
    review: None,
    churned: false,
  }
}

fn reviewed_record(user_id: Option<u64>, review: &str) -> NewRecord {
  NewRecord {
    review: Some(review.to_string()),
    ..new_record(user_id)
  }
}

fn new_artifact(kind: ModelKind) -> NewArtifact {
  NewArtifact {
    kind,
    schema: vec!["avg_screen_time".into(), "avg_spend".into()],
    payload: serde_json::json!({"weights": [0.4, -0.1], "bias": 0.0,
                                "means": [50.0, 200.0], "scales": [10.0, 40.0]}),
    content_hash: "a".repeat(64),
    training_rows: 12,
  }
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn ingest_appends_in_arrival_order() {
  let s = store().await;

  let appended = s
    .ingest(vec![new_record(Some(1)), new_record(Some(2))])
    .await
    .unwrap();
  assert_eq!(appended.len(), 2);

  let all = s.all_records().await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].user_id, 1);
  assert_eq!(all[1].user_id, 2);
}

#[tokio::test]
async fn ingest_assigns_ids_from_2000() {
  let s = store().await;

  let appended = s
    .ingest(vec![new_record(None), new_record(None)])
    .await
    .unwrap();
  assert_eq!(appended[0].user_id, 2000);
  assert_eq!(appended[1].user_id, 2001);

  // A later batch continues from the watermark.
  let next = s.ingest(vec![new_record(None)]).await.unwrap();
  assert_eq!(next[0].user_id, 2002);
}

#[tokio::test]
async fn explicit_ids_advance_the_watermark() {
  let s = store().await;

  let appended = s
    .ingest(vec![new_record(Some(5000)), new_record(None)])
    .await
    .unwrap();
  assert_eq!(appended[0].user_id, 5000);
  assert_eq!(appended[1].user_id, 5001);
}

#[tokio::test]
async fn ingest_bumps_both_counters_by_accepted_count() {
  let s = store().await;
  s.ingest(vec![new_record(None); 5]).await.unwrap();

  let a = s.counters(ModelKind::ModelA).await.unwrap();
  let b = s.counters(ModelKind::ModelB).await.unwrap();
  assert_eq!(a.records_seen, 5);
  assert_eq!(b.records_seen, 5);
}

#[tokio::test]
async fn empty_ingest_changes_nothing() {
  let s = store().await;
  let before_a = s.counters(ModelKind::ModelA).await.unwrap();

  let appended = s.ingest(Vec::new()).await.unwrap();
  assert!(appended.is_empty());

  let after_a = s.counters(ModelKind::ModelA).await.unwrap();
  assert_eq!(before_a, after_a);
  assert_eq!(s.record_count().await.unwrap(), 0);
}

// ─── Dataset reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn latest_record_wins_over_earlier_ones() {
  let s = store().await;

  s.ingest(vec![new_record(Some(7))]).await.unwrap();
  let mut correction = new_record(Some(7));
  correction.rating = 1.0;
  s.ingest(vec![correction]).await.unwrap();

  // Both rows are retained...
  assert_eq!(s.all_records().await.unwrap().len(), 2);

  // ...but the latest wins for reads.
  let latest = s.latest_record(7).await.unwrap().unwrap();
  assert_eq!(latest.rating, 1.0);

  let per_user = s.latest_records().await.unwrap();
  assert_eq!(per_user.len(), 1);
  assert_eq!(per_user[0].rating, 1.0);
}

#[tokio::test]
async fn latest_record_missing_user_is_none() {
  let s = store().await;
  assert!(s.latest_record(999).await.unwrap().is_none());
}

#[tokio::test]
async fn record_roundtrips_review_and_usage() {
  let s = store().await;

  let mut rec = reviewed_record(Some(3), "Terrible, cancelling now");
  rec.daily_usage[0] = 33.5;
  s.ingest(vec![rec]).await.unwrap();

  let back = s.latest_record(3).await.unwrap().unwrap();
  assert_eq!(back.review.as_deref(), Some("Terrible, cancelling now"));
  assert_eq!(back.daily_usage[0], 33.5);
  assert_eq!(back.daily_usage[1], 12.0);
}

// ─── Counters ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn counters_start_clean() {
  let s = store().await;
  let c = s.counters(ModelKind::ModelB).await.unwrap();
  assert_eq!(c.kind, ModelKind::ModelB);
  assert_eq!(c.records_seen, 0);
  assert_eq!(c.total_records_at_last_retrain, 0);
}

// ─── Sentiment cache ─────────────────────────────────────────────────────────

#[tokio::test]
async fn sentiment_cache_roundtrip() {
  let s = store().await;
  let appended = s
    .ingest(vec![reviewed_record(None, "worst app")])
    .await
    .unwrap();
  let record_id = appended[0].record_id;

  assert!(s.cached_sentiment(record_id).await.unwrap().is_none());

  let score = SentimentScore::from_compound(-0.62);
  s.cache_sentiment(record_id, score).await.unwrap();

  let cached = s.cached_sentiment(record_id).await.unwrap().unwrap();
  assert_eq!(cached, score);
}

#[tokio::test]
async fn sentiment_cache_is_idempotent() {
  let s = store().await;
  let appended = s
    .ingest(vec![reviewed_record(None, "great app")])
    .await
    .unwrap();
  let record_id = appended[0].record_id;

  let score = SentimentScore::from_compound(0.55);
  s.cache_sentiment(record_id, score).await.unwrap();
  s.cache_sentiment(record_id, score).await.unwrap();

  let cached = s.cached_sentiment(record_id).await.unwrap().unwrap();
  assert_eq!(cached, score);
}

#[tokio::test]
async fn sentiment_for_unknown_record_is_none() {
  let s = store().await;
  assert!(s.cached_sentiment(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Artifacts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn no_artifact_until_first_publish() {
  let s = store().await;
  assert!(s.current_artifact(ModelKind::ModelA).await.unwrap().is_none());
}

#[tokio::test]
async fn publish_makes_artifact_current_and_resets_counters() {
  let s = store().await;
  s.ingest(vec![new_record(None); 12]).await.unwrap();

  let before = s.counters(ModelKind::ModelA).await.unwrap();
  assert_eq!(before.records_seen, 12);

  let published = s
    .publish_artifact(new_artifact(ModelKind::ModelA))
    .await
    .unwrap();
  assert_eq!(published.version, 1);

  let current = s
    .current_artifact(ModelKind::ModelA)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(current.artifact_id, published.artifact_id);
  assert_eq!(current.schema, published.schema);
  assert_eq!(current.payload, published.payload);

  // Counters reset in the same transaction as the swap.
  let after = s.counters(ModelKind::ModelA).await.unwrap();
  assert_eq!(after.records_seen, 0);
  assert_eq!(after.total_records_at_last_retrain, 12);
  assert!(after.last_retrain_at > before.last_retrain_at);
}

#[tokio::test]
async fn publish_only_touches_its_own_model() {
  let s = store().await;
  s.ingest(vec![new_record(None); 4]).await.unwrap();

  s.publish_artifact(new_artifact(ModelKind::ModelA))
    .await
    .unwrap();

  // Model B's counters are untouched, and it still has no artifact.
  let b = s.counters(ModelKind::ModelB).await.unwrap();
  assert_eq!(b.records_seen, 4);
  assert!(s.current_artifact(ModelKind::ModelB).await.unwrap().is_none());
}

#[tokio::test]
async fn republish_bumps_version_and_swaps_current() {
  let s = store().await;

  let first = s
    .publish_artifact(new_artifact(ModelKind::ModelB))
    .await
    .unwrap();
  let second = s
    .publish_artifact(new_artifact(ModelKind::ModelB))
    .await
    .unwrap();

  assert_eq!(first.version, 1);
  assert_eq!(second.version, 2);

  let current = s
    .current_artifact(ModelKind::ModelB)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(current.artifact_id, second.artifact_id);
}

#[tokio::test]
async fn ingest_after_publish_counts_toward_next_retrain() {
  let s = store().await;
  s.ingest(vec![new_record(None); 3]).await.unwrap();
  s.publish_artifact(new_artifact(ModelKind::ModelA))
    .await
    .unwrap();

  s.ingest(vec![new_record(None); 2]).await.unwrap();

  let a = s.counters(ModelKind::ModelA).await.unwrap();
  assert_eq!(a.records_seen, 2);
  assert_eq!(a.total_records_at_last_retrain, 3);
}
