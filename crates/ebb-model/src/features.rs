//! Feature naming and vectorisation shared by both model units.
//!
//! Feature order is load-bearing: artifact weight vectors are aligned with
//! the schema produced here, so names and positions must never be reordered
//! between training and prediction.

use ebb_core::record::{DAILY_USAGE_WINDOW, UserRecord};

/// Names of the scalar behavioural features, in vector order.
pub const SCALAR_FEATURES: [&str; 5] = [
  "avg_screen_time",
  "avg_spend",
  "rating",
  "password_resets",
  "last_visit_minutes",
];

/// Name of the sentiment feature appended by Model B.
pub const SENTIMENT_FEATURE: &str = "sentiment_compound";

/// The ordered behavioural schema: five scalars followed by the 30-day
/// usage window (`day_1` oldest … `day_30` newest).
pub fn behavioural_schema() -> Vec<String> {
  let mut schema: Vec<String> =
    SCALAR_FEATURES.iter().map(|s| s.to_string()).collect();
  schema.extend((1..=DAILY_USAGE_WINDOW).map(|d| format!("day_{d}")));
  schema
}

/// Vectorise a record's behavioural features, aligned with
/// [`behavioural_schema`].
pub fn behavioural_vector(record: &UserRecord) -> Vec<f64> {
  let mut row = Vec::with_capacity(SCALAR_FEATURES.len() + DAILY_USAGE_WINDOW);
  row.push(record.avg_screen_time);
  row.push(record.avg_spend);
  row.push(record.rating);
  row.push(record.password_resets);
  row.push(record.last_visit_minutes);
  row.extend_from_slice(&record.daily_usage);
  row
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn record() -> UserRecord {
    let mut daily_usage = [0.0; DAILY_USAGE_WINDOW];
    daily_usage[0] = 12.0;
    daily_usage[DAILY_USAGE_WINDOW - 1] = 48.0;
    UserRecord {
      record_id: Uuid::new_v4(),
      user_id: 7,
      avg_screen_time: 90.0,
      avg_spend: 250.0,
      rating: 4.0,
      password_resets: 1.0,
      last_visit_minutes: 60.0,
      daily_usage,
      review: None,
      churned: false,
      recorded_at: Utc::now(),
    }
  }

  #[test]
  fn schema_and_vector_are_aligned() {
    let schema = behavioural_schema();
    let row = behavioural_vector(&record());
    assert_eq!(schema.len(), row.len());
    assert_eq!(schema[0], "avg_screen_time");
    assert_eq!(row[0], 90.0);
    assert_eq!(schema[5], "day_1");
    assert_eq!(row[5], 12.0);
    assert_eq!(schema.last().unwrap(), "day_30");
    assert_eq!(*row.last().unwrap(), 48.0);
  }
}
