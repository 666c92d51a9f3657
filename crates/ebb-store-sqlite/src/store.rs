//! [`SqliteStore`] — the SQLite implementation of [`ChurnStore`].

use std::path::Path;

use chrono::Utc;
use ebb_core::{
  artifact::{ModelArtifact, ModelKind, NewArtifact},
  counters::RetrainCounters,
  record::{NewRecord, SentimentScore, UserRecord},
  store::ChurnStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawArtifact, RawCounters, RawRecordRow, RawSentiment, encode_daily_usage,
    encode_dt, encode_model_kind, encode_polarity, encode_uuid,
  },
  schema::SCHEMA,
};

/// Store-assigned user ids start here; the seeded datasets this service was
/// built around number their users below 2000.
const FIRST_ASSIGNED_ID: i64 = 2000;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An ebb churn store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    // Counter rows are seeded at first open; `last_retrain_at` starts at
    // the seed time so the time trigger is well-defined before any retrain.
    let seeded_at = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(SCHEMA)?;
        for kind in ModelKind::ALL {
          conn.execute(
            "INSERT OR IGNORE INTO retrain_counters
               (model, last_retrain_at, records_seen, total_at_last_retrain)
             VALUES (?1, ?2, 0, 0)",
            rusqlite::params![encode_model_kind(kind), seeded_at],
          )?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a record SELECT and decode the rows.
  async fn select_records(&self, sql: &'static str) -> Result<Vec<UserRecord>> {
    let raws: Vec<RawRecordRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], record_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecordRow::into_record).collect()
  }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecordRow> {
  Ok(RawRecordRow {
    record_id:          row.get(0)?,
    user_id:            row.get(1)?,
    avg_screen_time:    row.get(2)?,
    avg_spend:          row.get(3)?,
    rating:             row.get(4)?,
    password_resets:    row.get(5)?,
    last_visit_minutes: row.get(6)?,
    daily_usage:        row.get(7)?,
    review:             row.get(8)?,
    churned:            row.get(9)?,
    recorded_at:        row.get(10)?,
  })
}

fn artifact_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawArtifact> {
  Ok(RawArtifact {
    artifact_id:   row.get(0)?,
    model:         row.get(1)?,
    version:       row.get(2)?,
    trained_at:    row.get(3)?,
    schema_json:   row.get(4)?,
    payload_json:  row.get(5)?,
    content_hash:  row.get(6)?,
    training_rows: row.get(7)?,
  })
}

// ─── ChurnStore impl ─────────────────────────────────────────────────────────

impl ChurnStore for SqliteStore {
  type Error = Error;

  // ── Ingestion ─────────────────────────────────────────────────────────────

  async fn ingest(&self, rows: Vec<NewRecord>) -> Result<Vec<UserRecord>> {
    // An empty batch must not touch the database: no append, no counter
    // movement, no transaction.
    if rows.is_empty() {
      return Ok(Vec::new());
    }

    let recorded_at = Utc::now();
    let recorded_at_str = encode_dt(recorded_at);

    // Pre-encode everything fallible before entering the transaction.
    let mut prepared = Vec::with_capacity(rows.len());
    for row in rows {
      let usage_json = encode_daily_usage(&row.daily_usage)?;
      prepared.push((row, Uuid::new_v4(), usage_json));
    }

    let appended: Vec<UserRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Rows without an explicit user id get the next free id at or
        // above FIRST_ASSIGNED_ID. Explicit ids in the same batch advance
        // the watermark so a later auto-assign can never collide.
        let max_id: Option<i64> =
          tx.query_row("SELECT MAX(user_id) FROM records", [], |r| r.get(0))?;
        let mut next_id =
          max_id.map(|m| m + 1).unwrap_or(FIRST_ASSIGNED_ID).max(FIRST_ASSIGNED_ID);

        let mut out = Vec::with_capacity(prepared.len());
        for (row, record_id, usage_json) in prepared {
          let user_id = match row.user_id {
            Some(id) => {
              next_id = next_id.max(id as i64 + 1);
              id as i64
            }
            None => {
              let id = next_id;
              next_id += 1;
              id
            }
          };

          tx.execute(
            "INSERT INTO records (
               record_id, user_id, avg_screen_time, avg_spend, rating,
               password_resets, last_visit_minutes, daily_usage, review,
               churned, recorded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
              encode_uuid(record_id),
              user_id,
              row.avg_screen_time,
              row.avg_spend,
              row.rating,
              row.password_resets,
              row.last_visit_minutes,
              usage_json,
              row.review,
              row.churned,
              recorded_at_str,
            ],
          )?;

          out.push(UserRecord {
            record_id,
            user_id: user_id as u64,
            avg_screen_time: row.avg_screen_time,
            avg_spend: row.avg_spend,
            rating: row.rating,
            password_resets: row.password_resets,
            last_visit_minutes: row.last_visit_minutes,
            daily_usage: row.daily_usage,
            review: row.review,
            churned: row.churned,
            recorded_at,
          });
        }

        // Both models' counters advance in the same transaction as the
        // append — the durable unit the trigger bookkeeping relies on.
        tx.execute(
          "UPDATE retrain_counters SET records_seen = records_seen + ?1",
          rusqlite::params![out.len() as i64],
        )?;

        tx.commit()?;
        Ok(out)
      })
      .await?;

    Ok(appended)
  }

  // ── Dataset reads ─────────────────────────────────────────────────────────

  async fn all_records(&self) -> Result<Vec<UserRecord>> {
    self
      .select_records(
        "SELECT record_id, user_id, avg_screen_time, avg_spend, rating,
                password_resets, last_visit_minutes, daily_usage, review,
                churned, recorded_at
         FROM records ORDER BY rowid",
      )
      .await
  }

  async fn latest_records(&self) -> Result<Vec<UserRecord>> {
    self
      .select_records(
        "SELECT record_id, user_id, avg_screen_time, avg_spend, rating,
                password_resets, last_visit_minutes, daily_usage, review,
                churned, recorded_at
         FROM records WHERE rowid IN (
           SELECT MAX(rowid) FROM records GROUP BY user_id
         ) ORDER BY user_id",
      )
      .await
  }

  async fn latest_record(&self, user_id: u64) -> Result<Option<UserRecord>> {
    let raw: Option<RawRecordRow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT record_id, user_id, avg_screen_time, avg_spend, rating,
                      password_resets, last_visit_minutes, daily_usage, review,
                      churned, recorded_at
               FROM records WHERE user_id = ?1 ORDER BY rowid DESC LIMIT 1",
              rusqlite::params![user_id as i64],
              record_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecordRow::into_record).transpose()
  }

  async fn record_count(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?)
      })
      .await?;
    Ok(count as u64)
  }

  // ── Counters ──────────────────────────────────────────────────────────────

  async fn counters(&self, kind: ModelKind) -> Result<RetrainCounters> {
    let model = encode_model_kind(kind);
    let raw: Option<RawCounters> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT model, last_retrain_at, records_seen, total_at_last_retrain
               FROM retrain_counters WHERE model = ?1",
              rusqlite::params![model],
              |row| {
                Ok(RawCounters {
                  model:                 row.get(0)?,
                  last_retrain_at:       row.get(1)?,
                  records_seen:          row.get(2)?,
                  total_at_last_retrain: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .ok_or_else(|| Error::Corrupt(format!("missing counter row for {kind}")))?
      .into_counters()
  }

  // ── Sentiment cache ───────────────────────────────────────────────────────

  async fn cached_sentiment(
    &self,
    record_id: Uuid,
  ) -> Result<Option<SentimentScore>> {
    let id_str = encode_uuid(record_id);
    let raw: Option<RawSentiment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT compound, polarity FROM sentiment_scores WHERE record_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawSentiment { compound: row.get(0)?, polarity: row.get(1)? })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSentiment::into_score).transpose()
  }

  async fn cache_sentiment(
    &self,
    record_id: Uuid,
    score: SentimentScore,
  ) -> Result<()> {
    let id_str = encode_uuid(record_id);
    let polarity = encode_polarity(score.polarity);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO sentiment_scores (record_id, compound, polarity)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, score.compound, polarity],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Artifacts ─────────────────────────────────────────────────────────────

  async fn current_artifact(&self, kind: ModelKind) -> Result<Option<ModelArtifact>> {
    let model = encode_model_kind(kind);
    let raw: Option<RawArtifact> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT artifact_id, model, version, trained_at, schema_json,
                      payload_json, content_hash, training_rows
               FROM model_artifacts WHERE model = ?1 AND is_current = 1",
              rusqlite::params![model],
              artifact_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawArtifact::into_artifact).transpose()
  }

  async fn publish_artifact(&self, artifact: NewArtifact) -> Result<ModelArtifact> {
    let artifact_id = Uuid::new_v4();
    let trained_at = Utc::now();

    let model = encode_model_kind(artifact.kind);
    let id_str = encode_uuid(artifact_id);
    let at_str = encode_dt(trained_at);
    let schema_json = serde_json::to_string(&artifact.schema)?;
    let payload_json = artifact.payload.to_string();
    let content_hash = artifact.content_hash.clone();
    let training_rows = artifact.training_rows as i64;

    let version: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let version: i64 = tx.query_row(
          "SELECT COALESCE(MAX(version), 0) + 1 FROM model_artifacts WHERE model = ?1",
          rusqlite::params![model],
          |r| r.get(0),
        )?;

        // Demote the previous artifact but keep its row for rollback.
        tx.execute(
          "UPDATE model_artifacts SET is_current = 0 WHERE model = ?1 AND is_current = 1",
          rusqlite::params![model],
        )?;

        tx.execute(
          "INSERT INTO model_artifacts (
             artifact_id, model, version, trained_at, schema_json,
             payload_json, content_hash, training_rows, is_current
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
          rusqlite::params![
            id_str,
            model,
            version,
            at_str,
            schema_json,
            payload_json,
            content_hash,
            training_rows,
          ],
        )?;

        // Resetting the counters rides the same transaction as the swap:
        // a reader can never see the new artifact with stale counters.
        let total: i64 =
          tx.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?;
        tx.execute(
          "UPDATE retrain_counters
           SET records_seen = 0, last_retrain_at = ?1, total_at_last_retrain = ?2
           WHERE model = ?3",
          rusqlite::params![at_str, total, model],
        )?;

        tx.commit()?;
        Ok(version)
      })
      .await?;

    Ok(ModelArtifact {
      artifact_id,
      kind: artifact.kind,
      version: version as u64,
      trained_at,
      schema: artifact.schema,
      payload: artifact.payload,
      content_hash: artifact.content_hash,
      training_rows: artifact.training_rows,
    })
  }
}
