//! The prediction combiner and explainer.
//!
//! Scores a user through whichever model artifacts currently exist, blends
//! the probabilities with a fixed deterministic weighting, and merges the
//! two models' per-feature attributions into one ranked explanation.

use std::collections::HashMap;

use ebb_core::{
  Error, Result,
  artifact::{ModelArtifact, ModelKind},
  explanation::{Explanation, FeatureAttribution, RiskLevel},
  record::{SentimentScore, UserRecord},
};

use crate::{
  recommend::{rationale, recommendations},
  train::fitted_from,
  unit::unit_for,
};

/// Model B's blend weight when the user left real review text: sentiment is
/// informative, so B dominates.
pub const BLEND_B_WITH_REVIEW: f64 = 0.6;

/// Model B's blend weight when the sentiment was imputed neutral: the text
/// signal carries nothing, so the blend falls back toward Model A.
pub const BLEND_B_IMPUTED: f64 = 0.25;

/// How many top contributing features an explanation carries.
pub const TOP_FEATURES: usize = 5;

// ─── Current models ──────────────────────────────────────────────────────────

/// The pair of currently published artifacts, either of which may not exist
/// yet. Artifacts are immutable, so holding this snapshot stays valid even
/// while a newer artifact is being trained.
#[derive(Debug, Clone, Default)]
pub struct CurrentModels {
  pub model_a: Option<ModelArtifact>,
  pub model_b: Option<ModelArtifact>,
}

impl CurrentModels {
  pub fn is_empty(&self) -> bool {
    self.model_a.is_none() && self.model_b.is_none()
  }
}

/// The derived sentiment to score with: the cached value when one exists,
/// computed from the review text otherwise, imputed neutral without text.
pub fn sentiment_of(
  record: &UserRecord,
  cached: Option<SentimentScore>,
) -> SentimentScore {
  if let Some(score) = cached {
    return score;
  }
  match record.review.as_deref() {
    Some(text) => ebb_sentiment::analyze(text),
    None => SentimentScore::neutral(),
  }
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// A user's combined score without the attribution work — the cheap path
/// for bulk listings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredUser {
  /// Combined churn probability in percent.
  pub probability:  f64,
  pub risk_level:   RiskLevel,
  pub model_b_used: bool,
}

/// Score one user through the current artifacts.
pub fn score(
  record: &UserRecord,
  sentiment: &SentimentScore,
  models: &CurrentModels,
) -> Result<ScoredUser> {
  if models.is_empty() {
    return Err(Error::ModelUnavailable);
  }

  let (weight_a, weight_b) = blend_weights(record, models);

  let mut probability = 0.0;
  if let Some(artifact) = &models.model_a {
    probability += weight_a * predict(artifact, record, sentiment)?;
  }
  if let Some(artifact) = &models.model_b {
    probability += weight_b * predict(artifact, record, sentiment)?;
  }

  let percent = round2(probability * 100.0);
  Ok(ScoredUser {
    probability:  percent,
    risk_level:   RiskLevel::from_probability(percent),
    model_b_used: models.model_b.is_some(),
  })
}

/// Build the full explanation for one user: blended probability, risk
/// bucket, ranked merged attributions, and rule-table recommendations.
pub fn explain(
  record: &UserRecord,
  sentiment: &SentimentScore,
  models: &CurrentModels,
) -> Result<Explanation> {
  let scored = score(record, sentiment, models)?;
  let (weight_a, weight_b) = blend_weights(record, models);

  // feature name → (observed value, blended attribution, owning model).
  // Shared features keep Model A's tag; sentiment arrives only from B.
  let mut merged: HashMap<String, (f64, f64, ModelKind)> = HashMap::new();

  if let Some(artifact) = &models.model_a {
    for (name, value, attr) in attributions(artifact, record, sentiment)? {
      merged.insert(name, (value, weight_a * attr, ModelKind::ModelA));
    }
  }
  if let Some(artifact) = &models.model_b {
    for (name, value, attr) in attributions(artifact, record, sentiment)? {
      merged
        .entry(name)
        .and_modify(|(_, a, _)| *a += weight_b * attr)
        .or_insert((value, weight_b * attr, ModelKind::ModelB));
    }
  }

  let mut ranked: Vec<(String, (f64, f64, ModelKind))> =
    merged.into_iter().collect();
  // Absolute attribution descending; ties broken by name for determinism.
  ranked.sort_by(|(name_a, (_, attr_a, _)), (name_b, (_, attr_b, _))| {
    attr_b
      .abs()
      .partial_cmp(&attr_a.abs())
      .unwrap_or(std::cmp::Ordering::Equal)
      .then_with(|| name_a.cmp(name_b))
  });
  ranked.truncate(TOP_FEATURES);

  let top_features = ranked
    .into_iter()
    .map(|(feature, (value, attribution, model))| FeatureAttribution {
      rationale: rationale(&feature, value, attribution),
      feature,
      value,
      attribution,
      model,
    })
    .collect();

  Ok(Explanation {
    user_id: record.user_id,
    churn_probability: scored.probability,
    risk_level: scored.risk_level,
    top_features,
    recommendations: recommendations(record, sentiment),
    model_b_used: scored.model_b_used,
  })
}

// ─── Internals ───────────────────────────────────────────────────────────────

/// The fixed blend rule. With both models present, B is weighted higher when
/// real review text backs the sentiment feature and dialled down toward A
/// when the sentiment was imputed. A missing model hands its weight to the
/// other.
fn blend_weights(record: &UserRecord, models: &CurrentModels) -> (f64, f64) {
  match (&models.model_a, &models.model_b) {
    (Some(_), Some(_)) => {
      let b = if record.review.is_some() {
        BLEND_B_WITH_REVIEW
      } else {
        BLEND_B_IMPUTED
      };
      (1.0 - b, b)
    }
    (Some(_), None) => (1.0, 0.0),
    (None, Some(_)) => (0.0, 1.0),
    (None, None) => (0.0, 0.0),
  }
}

fn predict(
  artifact: &ModelArtifact,
  record: &UserRecord,
  sentiment: &SentimentScore,
) -> Result<f64> {
  let fitted = fitted_from(artifact)?;
  let row = unit_for(artifact.kind).vectorize(record, sentiment);
  Ok(fitted.predict(&row))
}

fn attributions(
  artifact: &ModelArtifact,
  record: &UserRecord,
  sentiment: &SentimentScore,
) -> Result<Vec<(String, f64, f64)>> {
  let fitted = fitted_from(artifact)?;
  let row = unit_for(artifact.kind).vectorize(record, sentiment);
  let attrs = fitted.attributions(&row);
  Ok(
    artifact
      .schema
      .iter()
      .cloned()
      .zip(row)
      .zip(attrs)
      .map(|((name, value), attr)| (name, value, attr))
      .collect(),
  )
}

fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use chrono::Utc;
  use ebb_core::record::DAILY_USAGE_WINDOW;
  use uuid::Uuid;

  use super::*;
  use crate::{features::SENTIMENT_FEATURE, train::TrainingSnapshot};

  fn record(user_id: u64, screen_time: f64, churned: bool) -> UserRecord {
    UserRecord {
      record_id: Uuid::new_v4(),
      user_id,
      avg_screen_time: screen_time,
      avg_spend: 100.0,
      rating: 3.0,
      password_resets: 0.0,
      last_visit_minutes: 120.0,
      daily_usage: [screen_time / 3.0; DAILY_USAGE_WINDOW],
      review: None,
      churned,
      recorded_at: Utc::now(),
    }
  }

  fn snapshot() -> TrainingSnapshot {
    let mut records: Vec<UserRecord> = (0..20)
      .map(|i| {
        let churned = i % 2 == 0;
        let screen = if churned { 10.0 + i as f64 } else { 150.0 + i as f64 };
        record(i, screen, churned)
      })
      .collect();
    // Give some rows review text so the sentiment column varies.
    records[0].review = Some("terrible, uninstalled".into());
    records[1].review = Some("love it, works great".into());
    TrainingSnapshot { records, sentiments: HashMap::new() }
  }

  fn publish(kind: ModelKind) -> ModelArtifact {
    let new = crate::train::train(kind, &snapshot()).unwrap();
    ModelArtifact {
      artifact_id:   Uuid::new_v4(),
      kind:          new.kind,
      version:       1,
      trained_at:    Utc::now(),
      schema:        new.schema,
      payload:       new.payload,
      content_hash:  new.content_hash,
      training_rows: new.training_rows,
    }
  }

  fn both_models() -> CurrentModels {
    CurrentModels {
      model_a: Some(publish(ModelKind::ModelA)),
      model_b: Some(publish(ModelKind::ModelB)),
    }
  }

  #[test]
  fn no_models_is_unavailable() {
    let user = record(1, 50.0, false);
    let err = explain(&user, &SentimentScore::neutral(), &CurrentModels::default())
      .unwrap_err();
    assert!(matches!(err, Error::ModelUnavailable));
  }

  #[test]
  fn model_a_only_flags_and_excludes_sentiment() {
    let models = CurrentModels {
      model_a: Some(publish(ModelKind::ModelA)),
      model_b: None,
    };
    let user = record(1, 12.0, false);
    let out = explain(&user, &SentimentScore::neutral(), &models).unwrap();

    assert!(!out.model_b_used);
    assert!(
      out
        .top_features
        .iter()
        .all(|f| f.feature != SENTIMENT_FEATURE)
    );
    assert!(
      out
        .top_features
        .iter()
        .all(|f| f.model == ModelKind::ModelA)
    );
  }

  #[test]
  fn explain_is_deterministic() {
    let models = both_models();
    let user = record(5, 20.0, false);
    let sentiment = SentimentScore::neutral();

    let first = explain(&user, &sentiment, &models).unwrap();
    let second = explain(&user, &sentiment, &models).unwrap();

    assert_eq!(first.churn_probability, second.churn_probability);
    let names: Vec<_> =
      first.top_features.iter().map(|f| f.feature.clone()).collect();
    let names2: Vec<_> =
      second.top_features.iter().map(|f| f.feature.clone()).collect();
    assert_eq!(names, names2);
  }

  #[test]
  fn blend_sits_between_the_two_models() {
    let models = both_models();
    let mut user = record(3, 15.0, false);
    user.review = Some("terrible, cancelling".into());
    let sentiment = sentiment_of(&user, None);

    let p_a = predict(models.model_a.as_ref().unwrap(), &user, &sentiment)
      .unwrap();
    let p_b = predict(models.model_b.as_ref().unwrap(), &user, &sentiment)
      .unwrap();
    let combined =
      score(&user, &sentiment, &models).unwrap().probability / 100.0;

    let lo = p_a.min(p_b) - 1e-6;
    let hi = p_a.max(p_b) + 1e-6;
    assert!(combined >= lo && combined <= hi);

    let expected = 0.4 * p_a + 0.6 * p_b;
    assert!((combined - expected).abs() < 0.005);
  }

  #[test]
  fn imputed_sentiment_leans_on_model_a() {
    let models = both_models();
    let user = record(3, 15.0, false);
    let sentiment = SentimentScore::neutral();

    let p_a = predict(models.model_a.as_ref().unwrap(), &user, &sentiment)
      .unwrap();
    let p_b = predict(models.model_b.as_ref().unwrap(), &user, &sentiment)
      .unwrap();
    let combined =
      score(&user, &sentiment, &models).unwrap().probability / 100.0;

    let expected = 0.75 * p_a + 0.25 * p_b;
    assert!((combined - expected).abs() < 0.005);
  }

  #[test]
  fn top_features_are_ranked_by_absolute_attribution() {
    let models = both_models();
    let user = record(9, 10.0, false);
    let out = explain(&user, &SentimentScore::neutral(), &models).unwrap();

    assert!(out.top_features.len() <= TOP_FEATURES);
    assert!(!out.top_features.is_empty());
    for pair in out.top_features.windows(2) {
      assert!(pair[0].attribution.abs() >= pair[1].attribution.abs());
    }
  }

  #[test]
  fn every_top_feature_carries_a_rationale() {
    let models = both_models();
    let user = record(2, 200.0, false);
    let out = explain(&user, &SentimentScore::neutral(), &models).unwrap();
    assert!(out.top_features.iter().all(|f| !f.rationale.is_empty()));
    assert_eq!(out.recommendations.len(), 3);
  }
}
