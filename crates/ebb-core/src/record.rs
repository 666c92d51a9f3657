//! User records — the fundamental unit of the ebb dataset.
//!
//! A record is an immutable snapshot of one user's behaviour at a point in
//! time. Records are never updated; corrections arrive as new records and the
//! latest record per user wins at prediction time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ─── Bounds ──────────────────────────────────────────────────────────────────

/// Length of the per-day usage window carried by every record.
pub const DAILY_USAGE_WINDOW: usize = 30;

/// Per-day usage values are capped at this many minutes before storage.
pub const DAILY_USAGE_CAP: f64 = 300.0;

/// Ratings are bounded to `0.0..=RATING_MAX`.
pub const RATING_MAX: f64 = 5.0;

// ─── Sentiment ───────────────────────────────────────────────────────────────

/// Discrete polarity derived from a compound sentiment value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
  Positive,
  Neutral,
  Negative,
}

/// Compound values at or above this are classified [`Polarity::Positive`].
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Compound values at or below this are classified [`Polarity::Negative`].
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// A lexicon-derived summary of a record's review text: a single compound
/// value in `[-1.0, 1.0]` plus its discrete polarity.
///
/// Computed lazily the first time a record with review text is needed by the
/// sentiment-aware model, then cached alongside the record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
  pub compound: f64,
  pub polarity: Polarity,
}

impl SentimentScore {
  /// Classify a compound value using the fixed polarity thresholds.
  pub fn from_compound(compound: f64) -> Self {
    let polarity = if compound >= POSITIVE_THRESHOLD {
      Polarity::Positive
    } else if compound <= NEGATIVE_THRESHOLD {
      Polarity::Negative
    } else {
      Polarity::Neutral
    };
    Self { compound, polarity }
  }

  /// The imputed score for a record without review text: the midpoint of the
  /// scorer's range, classified neutral.
  pub fn neutral() -> Self {
    Self { compound: 0.0, polarity: Polarity::Neutral }
  }
}

// ─── UserRecord ──────────────────────────────────────────────────────────────

/// An immutable user-behaviour snapshot. Once written, no field is ever
/// updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
  pub record_id:          Uuid,
  /// Stable across updates; a user may have several records.
  pub user_id:            u64,
  /// Average daily time in the app, minutes.
  pub avg_screen_time:    f64,
  /// Average spend per period, account currency.
  pub avg_spend:          f64,
  /// Rating the user gave, `0.0..=5.0`.
  pub rating:             f64,
  /// Password-reset requests — a proxy for login friction.
  pub password_resets:    f64,
  /// Minutes elapsed since the user last opened the app.
  pub last_visit_minutes: f64,
  /// Per-day usage minutes over a fixed 30-day window, oldest first.
  /// Zero-filled where absent, capped at [`DAILY_USAGE_CAP`].
  pub daily_usage:        [f64; DAILY_USAGE_WINDOW],
  /// Free-text review, if the user left one.
  pub review:             Option<String>,
  /// Churn label used for training.
  pub churned:            bool,
  /// Server-assigned timestamp; never changes after creation.
  pub recorded_at:        DateTime<Utc>,
}

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// A validated row ready for [`crate::store::ChurnStore::ingest`].
/// `record_id` and `recorded_at` are always set by the store; `user_id` is
/// assigned by the store when the input carried none.
#[derive(Debug, Clone)]
pub struct NewRecord {
  pub user_id:            Option<u64>,
  pub avg_screen_time:    f64,
  pub avg_spend:          f64,
  pub rating:             f64,
  pub password_resets:    f64,
  pub last_visit_minutes: f64,
  pub daily_usage:        [f64; DAILY_USAGE_WINDOW],
  pub review:             Option<String>,
  pub churned:            bool,
}

// ─── RawRecord ───────────────────────────────────────────────────────────────

/// An unvalidated row as it arrives over the ingestion boundary.
///
/// Every field is optional so that a malformed row can be rejected with a
/// precise reason instead of failing deserialisation for the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
  pub user_id:            Option<u64>,
  pub avg_screen_time:    Option<f64>,
  pub avg_spend:          Option<f64>,
  pub rating:             Option<f64>,
  pub password_resets:    Option<f64>,
  pub last_visit_minutes: Option<f64>,
  /// Up to [`DAILY_USAGE_WINDOW`] per-day values, oldest first.
  #[serde(default)]
  pub daily_usage:        Vec<f64>,
  pub review:             Option<String>,
  pub churned:            Option<bool>,
}

/// Why a raw row was rejected at the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("field {0} must be non-negative")]
  NegativeValue(&'static str),

  #[error("field {0} must be a finite number")]
  NotFinite(&'static str),

  #[error("rating out of range: {0} (must be 0..=5)")]
  RatingOutOfRange(String),

  #[error("daily usage window holds {0} values (maximum {DAILY_USAGE_WINDOW})")]
  UsageWindowTooLong(usize),
}

impl RawRecord {
  /// Validate this row against the record schema.
  ///
  /// Daily-usage values beyond [`DAILY_USAGE_CAP`] are clamped rather than
  /// rejected; missing trailing days are zero-filled. A review consisting
  /// only of whitespace counts as no review.
  pub fn validate(&self) -> Result<NewRecord, RejectReason> {
    let avg_screen_time =
      required(self.avg_screen_time, "avg_screen_time")?;
    let avg_spend = required(self.avg_spend, "avg_spend")?;
    let rating = required(self.rating, "rating")?;
    let password_resets = required(self.password_resets, "password_resets")?;
    let last_visit_minutes =
      required(self.last_visit_minutes, "last_visit_minutes")?;

    if rating > RATING_MAX {
      return Err(RejectReason::RatingOutOfRange(format!("{rating}")));
    }

    if self.daily_usage.len() > DAILY_USAGE_WINDOW {
      return Err(RejectReason::UsageWindowTooLong(self.daily_usage.len()));
    }
    let mut daily_usage = [0.0; DAILY_USAGE_WINDOW];
    for (i, &v) in self.daily_usage.iter().enumerate() {
      if !v.is_finite() {
        return Err(RejectReason::NotFinite("daily_usage"));
      }
      if v < 0.0 {
        return Err(RejectReason::NegativeValue("daily_usage"));
      }
      daily_usage[i] = v.min(DAILY_USAGE_CAP);
    }

    let churned = self
      .churned
      .ok_or(RejectReason::MissingField("churned"))?;

    let review = self
      .review
      .as_deref()
      .map(str::trim)
      .filter(|r| !r.is_empty())
      .map(str::to_owned);

    Ok(NewRecord {
      user_id: self.user_id,
      avg_screen_time,
      avg_spend,
      rating,
      password_resets,
      last_visit_minutes,
      daily_usage,
      review,
      churned,
    })
  }
}

/// Check presence, finiteness, and non-negativity of a required numeric.
fn required(
  value: Option<f64>,
  field: &'static str,
) -> Result<f64, RejectReason> {
  let v = value.ok_or(RejectReason::MissingField(field))?;
  if !v.is_finite() {
    return Err(RejectReason::NotFinite(field));
  }
  if v < 0.0 {
    return Err(RejectReason::NegativeValue(field));
  }
  Ok(v)
}

// ─── Batch screening ─────────────────────────────────────────────────────────

/// Validate a batch row by row. Malformed rows are collected with their
/// reasons; one bad row never aborts the batch.
pub fn screen_batch(
  rows: Vec<RawRecord>,
) -> (Vec<NewRecord>, Vec<(RawRecord, RejectReason)>) {
  let mut accepted = Vec::with_capacity(rows.len());
  let mut rejected = Vec::new();
  for row in rows {
    match row.validate() {
      Ok(valid) => accepted.push(valid),
      Err(reason) => rejected.push((row, reason)),
    }
  }
  (accepted, rejected)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn full_row() -> RawRecord {
    RawRecord {
      user_id:            Some(42),
      avg_screen_time:    Some(95.0),
      avg_spend:          Some(120.5),
      rating:             Some(4.0),
      password_resets:    Some(1.0),
      last_visit_minutes: Some(30.0),
      daily_usage:        vec![10.0; 7],
      review:             Some("Works great".into()),
      churned:            Some(false),
    }
  }

  #[test]
  fn valid_row_passes() {
    let rec = full_row().validate().unwrap();
    assert_eq!(rec.user_id, Some(42));
    assert_eq!(rec.daily_usage.len(), DAILY_USAGE_WINDOW);
    // trailing days zero-filled
    assert_eq!(rec.daily_usage[7], 0.0);
    assert_eq!(rec.review.as_deref(), Some("Works great"));
  }

  #[test]
  fn missing_numeric_is_rejected() {
    let mut row = full_row();
    row.avg_spend = None;
    assert_eq!(
      row.validate().unwrap_err(),
      RejectReason::MissingField("avg_spend")
    );
  }

  #[test]
  fn negative_numeric_is_rejected() {
    let mut row = full_row();
    row.last_visit_minutes = Some(-5.0);
    assert_eq!(
      row.validate().unwrap_err(),
      RejectReason::NegativeValue("last_visit_minutes")
    );
  }

  #[test]
  fn rating_above_bound_is_rejected() {
    let mut row = full_row();
    row.rating = Some(5.5);
    assert!(matches!(
      row.validate().unwrap_err(),
      RejectReason::RatingOutOfRange(_)
    ));
  }

  #[test]
  fn oversized_usage_window_is_rejected() {
    let mut row = full_row();
    row.daily_usage = vec![1.0; DAILY_USAGE_WINDOW + 1];
    assert_eq!(
      row.validate().unwrap_err(),
      RejectReason::UsageWindowTooLong(DAILY_USAGE_WINDOW + 1)
    );
  }

  #[test]
  fn usage_values_are_capped() {
    let mut row = full_row();
    row.daily_usage = vec![1000.0];
    let rec = row.validate().unwrap();
    assert_eq!(rec.daily_usage[0], DAILY_USAGE_CAP);
  }

  #[test]
  fn whitespace_review_becomes_none() {
    let mut row = full_row();
    row.review = Some("   ".into());
    assert!(row.validate().unwrap().review.is_none());
  }

  #[test]
  fn screen_batch_partitions_by_validity() {
    let mut bad = full_row();
    bad.rating = Some(9.0);
    let batch = vec![full_row(), bad, full_row()];
    let total = batch.len();

    let (accepted, rejected) = screen_batch(batch);
    assert_eq!(accepted.len(), 2);
    assert_eq!(rejected.len(), 1);
    assert_eq!(accepted.len() + rejected.len(), total);
  }

  #[test]
  fn polarity_thresholds_are_inclusive() {
    assert_eq!(SentimentScore::from_compound(0.05).polarity, Polarity::Positive);
    assert_eq!(SentimentScore::from_compound(-0.05).polarity, Polarity::Negative);
    assert_eq!(SentimentScore::from_compound(0.0).polarity, Polarity::Neutral);
    assert_eq!(SentimentScore::from_compound(0.049).polarity, Polarity::Neutral);
  }
}
