//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The daily-usage window is
//! stored as a compact JSON array. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, Utc};
use ebb_core::{
  artifact::{ModelArtifact, ModelKind},
  counters::RetrainCounters,
  record::{DAILY_USAGE_WINDOW, Polarity, SentimentScore, UserRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ModelKind ───────────────────────────────────────────────────────────────

pub fn encode_model_kind(k: ModelKind) -> &'static str {
  match k {
    ModelKind::ModelA => "model_a",
    ModelKind::ModelB => "model_b",
  }
}

pub fn decode_model_kind(s: &str) -> Result<ModelKind> {
  match s {
    "model_a" => Ok(ModelKind::ModelA),
    "model_b" => Ok(ModelKind::ModelB),
    other => Err(Error::Corrupt(format!("unknown model kind: {other:?}"))),
  }
}

// ─── Polarity ────────────────────────────────────────────────────────────────

pub fn encode_polarity(p: Polarity) -> &'static str {
  match p {
    Polarity::Positive => "positive",
    Polarity::Neutral => "neutral",
    Polarity::Negative => "negative",
  }
}

pub fn decode_polarity(s: &str) -> Result<Polarity> {
  match s {
    "positive" => Ok(Polarity::Positive),
    "neutral" => Ok(Polarity::Neutral),
    "negative" => Ok(Polarity::Negative),
    other => Err(Error::Corrupt(format!("unknown polarity: {other:?}"))),
  }
}

// ─── Daily usage window ──────────────────────────────────────────────────────

pub fn encode_daily_usage(usage: &[f64; DAILY_USAGE_WINDOW]) -> Result<String> {
  Ok(serde_json::to_string(usage.as_slice())?)
}

pub fn decode_daily_usage(s: &str) -> Result<[f64; DAILY_USAGE_WINDOW]> {
  let values: Vec<f64> = serde_json::from_str(s)?;
  values.try_into().map_err(|v: Vec<f64>| {
    Error::Corrupt(format!(
      "daily usage window holds {} values, expected {DAILY_USAGE_WINDOW}",
      v.len()
    ))
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `records` row.
pub struct RawRecordRow {
  pub record_id:          String,
  pub user_id:            i64,
  pub avg_screen_time:    f64,
  pub avg_spend:          f64,
  pub rating:             f64,
  pub password_resets:    f64,
  pub last_visit_minutes: f64,
  pub daily_usage:        String,
  pub review:             Option<String>,
  pub churned:            bool,
  pub recorded_at:        String,
}

impl RawRecordRow {
  pub fn into_record(self) -> Result<UserRecord> {
    Ok(UserRecord {
      record_id:          decode_uuid(&self.record_id)?,
      user_id:            self.user_id as u64,
      avg_screen_time:    self.avg_screen_time,
      avg_spend:          self.avg_spend,
      rating:             self.rating,
      password_resets:    self.password_resets,
      last_visit_minutes: self.last_visit_minutes,
      daily_usage:        decode_daily_usage(&self.daily_usage)?,
      review:             self.review,
      churned:            self.churned,
      recorded_at:        decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw values read directly from a `retrain_counters` row.
pub struct RawCounters {
  pub model:                 String,
  pub last_retrain_at:       String,
  pub records_seen:          i64,
  pub total_at_last_retrain: i64,
}

impl RawCounters {
  pub fn into_counters(self) -> Result<RetrainCounters> {
    Ok(RetrainCounters {
      kind:                          decode_model_kind(&self.model)?,
      last_retrain_at:               decode_dt(&self.last_retrain_at)?,
      records_seen:                  self.records_seen as u64,
      total_records_at_last_retrain: self.total_at_last_retrain as u64,
    })
  }
}

/// Raw values read directly from a `model_artifacts` row.
pub struct RawArtifact {
  pub artifact_id:   String,
  pub model:         String,
  pub version:       i64,
  pub trained_at:    String,
  pub schema_json:   String,
  pub payload_json:  String,
  pub content_hash:  String,
  pub training_rows: i64,
}

impl RawArtifact {
  pub fn into_artifact(self) -> Result<ModelArtifact> {
    Ok(ModelArtifact {
      artifact_id:   decode_uuid(&self.artifact_id)?,
      kind:          decode_model_kind(&self.model)?,
      version:       self.version as u64,
      trained_at:    decode_dt(&self.trained_at)?,
      schema:        serde_json::from_str(&self.schema_json)?,
      payload:       serde_json::from_str(&self.payload_json)?,
      content_hash:  self.content_hash,
      training_rows: self.training_rows as u64,
    })
  }
}

/// Raw values read from a `sentiment_scores` row.
pub struct RawSentiment {
  pub compound: f64,
  pub polarity: String,
}

impl RawSentiment {
  pub fn into_score(self) -> Result<SentimentScore> {
    Ok(SentimentScore {
      compound: self.compound,
      polarity: decode_polarity(&self.polarity)?,
    })
  }
}
