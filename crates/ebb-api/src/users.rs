//! Handlers for the prediction read endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/users` | Summary rows for every scorable user |
//! | `GET`  | `/users/:id/explanation` | 404 unknown user, 503 no model |
//! | `GET`  | `/churn-predictions` | Full explanations in bulk/export form |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use ebb_core::{
  explanation::{Explanation, RiskLevel},
  record::UserRecord,
  store::ChurnStore,
};
use ebb_model::combine::{self, CurrentModels};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct UserSummary {
  pub user_id:           u64,
  pub churn_probability: f64,
  pub risk_level:        RiskLevel,
}

/// Load the currently published artifact pair.
async fn current_models<S>(store: &S) -> Result<CurrentModels, ApiError>
where
  S: ChurnStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let model_a = store
    .current_artifact(ebb_core::artifact::ModelKind::ModelA)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let model_b = store
    .current_artifact(ebb_core::artifact::ModelKind::ModelB)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(CurrentModels { model_a, model_b })
}

/// The sentiment to score with: cached when available, derived otherwise.
async fn sentiment_for<S>(
  store: &S,
  record: &UserRecord,
) -> ebb_core::record::SentimentScore
where
  S: ChurnStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let cached = match store.cached_sentiment(record.record_id).await {
    Ok(cached) => cached,
    Err(e) => {
      tracing::warn!(record_id = %record.record_id, error = %e,
        "sentiment cache read failed; recomputing");
      None
    }
  };
  combine::sentiment_of(record, cached)
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users` — one summary row per user under the current artifacts.
/// An empty list until the first model has trained.
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<UserSummary>>, ApiError>
where
  S: ChurnStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let models = current_models(store.as_ref()).await?;
  if models.is_empty() {
    return Ok(Json(Vec::new()));
  }

  let records = store
    .latest_records()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let mut out = Vec::with_capacity(records.len());
  for record in &records {
    let sentiment = sentiment_for(store.as_ref(), record).await;
    let scored = combine::score(record, &sentiment, &models)
      .map_err(ApiError::from_core)?;
    out.push(UserSummary {
      user_id:           record.user_id,
      churn_probability: scored.probability,
      risk_level:        scored.risk_level,
    });
  }
  Ok(Json(out))
}

// ─── Explanation ──────────────────────────────────────────────────────────────

/// `GET /users/:id/explanation`
pub async fn explanation<S>(
  State(store): State<Arc<S>>,
  Path(user_id): Path<u64>,
) -> Result<Json<Explanation>, ApiError>
where
  S: ChurnStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = store
    .latest_record(user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

  let models = current_models(store.as_ref()).await?;
  let sentiment = sentiment_for(store.as_ref(), &record).await;

  let explanation = combine::explain(&record, &sentiment, &models)
    .map_err(ApiError::from_core)?;
  Ok(Json(explanation))
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /churn-predictions` — full explanations for every scorable user.
pub async fn export<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Explanation>>, ApiError>
where
  S: ChurnStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let models = current_models(store.as_ref()).await?;
  if models.is_empty() {
    return Ok(Json(Vec::new()));
  }

  let records = store
    .latest_records()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let mut out = Vec::with_capacity(records.len());
  for record in &records {
    let sentiment = sentiment_for(store.as_ref(), record).await;
    let explanation = combine::explain(record, &sentiment, &models)
      .map_err(ApiError::from_core)?;
    out.push(explanation);
  }
  Ok(Json(out))
}
