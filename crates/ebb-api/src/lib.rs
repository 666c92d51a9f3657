//! JSON REST API for the ebb churn service.
//!
//! Exposes an axum [`Router`] backed by any [`ebb_core::store::ChurnStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", ebb_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod ingest;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use ebb_core::store::ChurnStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ChurnStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Ingestion
    .route("/ingest", post(ingest::handler::<S>))
    // Predictions
    .route("/users", get(users::list::<S>))
    .route("/users/{id}/explanation", get(users::explanation::<S>))
    .route("/churn-predictions", get(users::export::<S>))
    .with_state(store)
}
