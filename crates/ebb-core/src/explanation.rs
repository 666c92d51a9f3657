//! Explanations — the combined, attributed prediction for one user.
//!
//! An explanation is derived fresh on each request from the current model
//! artifacts and the user's latest record; it is never persisted.

use serde::{Deserialize, Serialize};

use crate::artifact::ModelKind;

// ─── Risk buckets ────────────────────────────────────────────────────────────

/// Discrete risk bucket over the combined churn probability (percent).
/// Boundaries are inclusive on the lower bound: Low `< 30`,
/// Medium `30..70`, High `>= 70`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
}

impl RiskLevel {
  /// Bucket a probability expressed in percent (`0.0..=100.0`).
  pub fn from_probability(percent: f64) -> Self {
    if percent >= 70.0 {
      RiskLevel::High
    } else if percent >= 30.0 {
      RiskLevel::Medium
    } else {
      RiskLevel::Low
    }
  }
}

// ─── Attribution ─────────────────────────────────────────────────────────────

/// One feature's contribution to a user's combined churn score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureAttribution {
  /// Feature name from the model schema.
  pub feature:     String,
  /// The user's observed value for this feature.
  pub value:       f64,
  /// Signed contribution: positive pushes toward churn, negative away.
  pub attribution: f64,
  /// Plain-language reading of the value and its direction.
  pub rationale:   String,
  /// Which model the attribution came from. Features both models share are
  /// reported under Model A; sentiment comes only from Model B.
  pub model:       ModelKind,
}

// ─── Explanation ─────────────────────────────────────────────────────────────

/// The combined prediction for one user: probability, risk bucket, ranked
/// top-contributing features, and recommended actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
  pub user_id:           u64,
  /// Combined churn probability in percent, `0.0..=100.0`.
  pub churn_probability: f64,
  pub risk_level:        RiskLevel,
  /// Top contributors ordered by absolute attribution descending, ties
  /// broken by feature name.
  pub top_features:      Vec<FeatureAttribution>,
  pub recommendations:   Vec<String>,
  /// False when the result was produced from Model A alone.
  pub model_b_used:      bool,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bucket_boundaries_are_lower_inclusive() {
    assert_eq!(RiskLevel::from_probability(72.0), RiskLevel::High);
    assert_eq!(RiskLevel::from_probability(70.0), RiskLevel::High);
    assert_eq!(RiskLevel::from_probability(69.999), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_probability(30.0), RiskLevel::Medium);
    assert_eq!(RiskLevel::from_probability(29.999), RiskLevel::Low);
    assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::Low);
  }
}
