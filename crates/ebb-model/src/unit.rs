//! The `ModelUnit` capability seam and its two variants.
//!
//! Everything outside this module treats a model as "a schema plus a way to
//! vectorise a record" — the combiner and the trainer depend on this
//! interface, never on which concrete variant is active.

use ebb_core::{
  artifact::ModelKind,
  record::{SentimentScore, UserRecord},
};

use crate::features::{
  SENTIMENT_FEATURE, behavioural_schema, behavioural_vector,
};

/// What a model variant must provide: its feature schema and the mapping
/// from a record (plus derived sentiment) into that schema's vector.
pub trait ModelUnit: Send + Sync {
  fn kind(&self) -> ModelKind;

  /// Ordered feature names; the fitted weight vector aligns with this.
  fn schema(&self) -> Vec<String>;

  /// Vectorise one record. The sentiment argument is the record's derived
  /// (or imputed-neutral) score; variants that ignore text ignore it.
  fn vectorize(
    &self,
    record: &UserRecord,
    sentiment: &SentimentScore,
  ) -> Vec<f64>;
}

/// Model A: numeric behavioural features only, no text.
pub struct BehaviouralUnit;

impl ModelUnit for BehaviouralUnit {
  fn kind(&self) -> ModelKind {
    ModelKind::ModelA
  }

  fn schema(&self) -> Vec<String> {
    behavioural_schema()
  }

  fn vectorize(
    &self,
    record: &UserRecord,
    _sentiment: &SentimentScore,
  ) -> Vec<f64> {
    behavioural_vector(record)
  }
}

/// Model B: behavioural features plus the review-sentiment compound.
/// Records without a review carry the imputed-neutral compound, so the
/// vector shape is fixed regardless of whether text exists.
pub struct SentimentUnit;

impl ModelUnit for SentimentUnit {
  fn kind(&self) -> ModelKind {
    ModelKind::ModelB
  }

  fn schema(&self) -> Vec<String> {
    let mut schema = behavioural_schema();
    schema.push(SENTIMENT_FEATURE.to_string());
    schema
  }

  fn vectorize(
    &self,
    record: &UserRecord,
    sentiment: &SentimentScore,
  ) -> Vec<f64> {
    let mut row = behavioural_vector(record);
    row.push(sentiment.compound);
    row
  }
}

/// The variant for a model kind.
pub fn unit_for(kind: ModelKind) -> &'static dyn ModelUnit {
  match kind {
    ModelKind::ModelA => &BehaviouralUnit,
    ModelKind::ModelB => &SentimentUnit,
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use ebb_core::record::DAILY_USAGE_WINDOW;
  use uuid::Uuid;

  use super::*;

  fn record(review: Option<&str>) -> UserRecord {
    UserRecord {
      record_id: Uuid::new_v4(),
      user_id: 1,
      avg_screen_time: 45.0,
      avg_spend: 80.0,
      rating: 3.0,
      password_resets: 0.0,
      last_visit_minutes: 1500.0,
      daily_usage: [5.0; DAILY_USAGE_WINDOW],
      review: review.map(str::to_owned),
      churned: false,
      recorded_at: Utc::now(),
    }
  }

  #[test]
  fn model_a_has_no_sentiment_column() {
    let unit = unit_for(ModelKind::ModelA);
    assert!(!unit.schema().contains(&SENTIMENT_FEATURE.to_string()));
    let row = unit.vectorize(&record(None), &SentimentScore::neutral());
    assert_eq!(row.len(), unit.schema().len());
  }

  #[test]
  fn model_b_vector_is_full_length_without_review() {
    let unit = unit_for(ModelKind::ModelB);
    let schema = unit.schema();
    assert_eq!(schema.last().map(String::as_str), Some(SENTIMENT_FEATURE));

    // No review text: the imputed-neutral compound still fills the slot.
    let row = unit.vectorize(&record(None), &SentimentScore::neutral());
    assert_eq!(row.len(), schema.len());
    assert_eq!(*row.last().unwrap(), 0.0);
  }

  #[test]
  fn model_b_carries_the_compound() {
    let unit = unit_for(ModelKind::ModelB);
    let score = SentimentScore::from_compound(-0.6);
    let row = unit.vectorize(&record(Some("terrible")), &score);
    assert_eq!(*row.last().unwrap(), -0.6);
  }
}
