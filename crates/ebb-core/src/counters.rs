//! Retrain counters and the trigger evaluator.
//!
//! One [`RetrainCounters`] row exists per model, persisted through the store
//! so trigger decisions survive restarts. The evaluator itself is a pure
//! function: identical counters and configuration always produce the same
//! answer, and evaluating twice with no intervening ingestion or retrain
//! cannot disagree with itself.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::ModelKind;

// ─── RetrainCounters ─────────────────────────────────────────────────────────

/// Durable per-model bookkeeping of time and volume since the last retrain.
///
/// `records_seen` is incremented by the ingestion path on every accepted
/// record and reset to zero only after a *successful* retrain, in the same
/// transaction that publishes the new artifact. `last_retrain_at` starts at
/// the row's creation time (service first start) so the time trigger is
/// well-defined before the first training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrainCounters {
  pub kind:                          ModelKind,
  pub last_retrain_at:               DateTime<Utc>,
  pub records_seen:                  u64,
  pub total_records_at_last_retrain: u64,
}

// ─── TriggerConfig ───────────────────────────────────────────────────────────

/// Per-model trigger thresholds. Each model carries its own copy; Model A is
/// conventionally configured with the longer interval and higher threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerConfig {
  /// Retrain once this much time has passed since the last retrain.
  pub interval:         Duration,
  /// Retrain once this many records arrived since the last retrain.
  pub record_threshold: u64,
}

// ─── Evaluator ───────────────────────────────────────────────────────────────

/// Decide whether a model is due for retraining.
///
/// Retrains when **either** condition holds (OR, not AND) — whichever signal
/// fires first wins. Both boundaries are inclusive: the decision flips from
/// false to true at the exact moment a threshold is crossed, never before.
pub fn should_retrain(
  counters: &RetrainCounters,
  config: &TriggerConfig,
  now: DateTime<Utc>,
) -> bool {
  let due_by_time = now - counters.last_retrain_at >= config.interval;
  let due_by_data = counters.records_seen >= config.record_threshold;
  due_by_time || due_by_data
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn counters(records_seen: u64, minutes_ago: i64) -> RetrainCounters {
    RetrainCounters {
      kind:                          ModelKind::ModelA,
      last_retrain_at:               Utc::now() - Duration::minutes(minutes_ago),
      records_seen,
      total_records_at_last_retrain: 0,
    }
  }

  fn config(interval_minutes: i64, record_threshold: u64) -> TriggerConfig {
    TriggerConfig {
      interval: Duration::minutes(interval_minutes),
      record_threshold,
    }
  }

  #[test]
  fn not_due_when_neither_condition_holds() {
    let now = Utc::now();
    assert!(!should_retrain(&counters(5, 10), &config(60, 20), now));
  }

  #[test]
  fn data_threshold_is_inclusive() {
    let now = Utc::now();
    assert!(!should_retrain(&counters(19, 0), &config(60, 20), now));
    assert!(should_retrain(&counters(20, 0), &config(60, 20), now));
    assert!(should_retrain(&counters(21, 0), &config(60, 20), now));
  }

  #[test]
  fn time_threshold_is_inclusive() {
    let last = Utc::now() - Duration::minutes(60);
    let c = RetrainCounters {
      kind:                          ModelKind::ModelB,
      last_retrain_at:               last,
      records_seen:                  0,
      total_records_at_last_retrain: 0,
    };
    let cfg = config(60, 1000);
    // Exactly at the boundary.
    assert!(should_retrain(&c, &cfg, last + Duration::minutes(60)));
    // One second before.
    assert!(!should_retrain(
      &c,
      &cfg,
      last + Duration::minutes(60) - Duration::seconds(1)
    ));
  }

  #[test]
  fn either_condition_suffices() {
    let now = Utc::now();
    // Data fires, time does not.
    assert!(should_retrain(&counters(25, 10), &config(60, 20), now));
    // Time fires, data does not.
    assert!(should_retrain(&counters(3, 90), &config(60, 20), now));
  }

  #[test]
  fn evaluation_is_pure() {
    let now = Utc::now();
    let c = counters(25, 10);
    let cfg = config(60, 20);
    let first = should_retrain(&c, &cfg, now);
    let second = should_retrain(&c, &cfg, now);
    assert_eq!(first, second);
  }

  /// Interval 60 minutes, threshold 20 records, no prior retrain, 25
  /// records ingested in one batch at t = 10 minutes: the data trigger
  /// fires while the time trigger has not.
  #[test]
  fn batch_crossing_threshold_fires_data_trigger_before_time() {
    let start = Utc::now();
    let c = RetrainCounters {
      kind:                          ModelKind::ModelA,
      last_retrain_at:               start,
      records_seen:                  25,
      total_records_at_last_retrain: 0,
    };
    let cfg = config(60, 20);
    let t = start + Duration::minutes(10);

    assert!(should_retrain(&c, &cfg, t));
    // Isolate the two conditions: time alone is not yet due.
    let time_only = RetrainCounters { records_seen: 0, ..c };
    assert!(!should_retrain(&time_only, &cfg, t));
  }
}
