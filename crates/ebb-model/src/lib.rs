//! Model units for the ebb churn service: feature schemas, the two
//! estimator variants, training glue, and the prediction combiner.
//!
//! The estimators themselves are deliberately simple — regularised linear
//! models fitted by deterministic gradient descent — behind the narrow
//! `fit`/`predict` contract the rest of the system depends on. Everything
//! downstream (artifacts, attribution, blending) is estimator-agnostic.

pub mod combine;
pub mod features;
pub mod linear;
pub mod recommend;
pub mod train;
pub mod unit;

pub use combine::{CurrentModels, explain, score};
pub use train::{MIN_TRAINING_RECORDS, TrainingSnapshot, train};
