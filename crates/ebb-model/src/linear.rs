//! The fitted estimator: a class-weighted, L2-regularised logistic model
//! trained by deterministic batch gradient descent.
//!
//! Determinism is a contract, not an accident: weights start at zero, the
//! iteration count and learning rate are fixed, and no randomness enters the
//! fit — the same dataset always produces the same artifact. Features are
//! standardised inside the model, so per-feature attributions are the exact
//! additive terms of the decision logit.

use ebb_core::{Error, Result};
use serde::{Deserialize, Serialize};

const EPOCHS: usize = 300;
const LEARNING_RATE: f64 = 0.3;
const L2_PENALTY: f64 = 1e-3;

/// A fitted linear-in-logit churn model, serialised verbatim into the
/// artifact payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
  /// Per-feature weights over standardised inputs.
  pub weights: Vec<f64>,
  pub bias:    f64,
  /// Training-set feature means, for standardisation at predict time.
  pub means:   Vec<f64>,
  /// Training-set feature deviations; constant features carry 1.0.
  pub scales:  Vec<f64>,
}

impl LinearModel {
  /// Fit a model on `rows` (one feature vector per record) against boolean
  /// churn labels.
  ///
  /// Class imbalance is handled by inverse-frequency sample weighting.
  /// Fails with [`Error::Training`] on a malformed matrix (ragged rows,
  /// non-finite values), a single-class label column, or divergence.
  pub fn fit(rows: &[Vec<f64>], labels: &[bool]) -> Result<Self> {
    let n = rows.len();
    if n == 0 || n != labels.len() {
      return Err(Error::Training(format!(
        "feature matrix has {n} rows for {} labels",
        labels.len()
      )));
    }
    let dims = rows[0].len();
    if rows.iter().any(|r| r.len() != dims) {
      return Err(Error::Training("ragged feature matrix".into()));
    }
    if rows.iter().flatten().any(|v| !v.is_finite()) {
      return Err(Error::Training("non-finite feature value".into()));
    }

    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
      return Err(Error::Training(
        "labels are single-class; nothing to discriminate".into(),
      ));
    }

    let (means, scales) = standardisation(rows, dims);
    let standardised: Vec<Vec<f64>> = rows
      .iter()
      .map(|row| {
        row
          .iter()
          .zip(means.iter().zip(scales.iter()))
          .map(|(&x, (&m, &s))| (x - m) / s)
          .collect()
      })
      .collect();

    // Inverse-frequency class weights keep the minority class visible.
    let weight_pos = n as f64 / (2.0 * positives as f64);
    let weight_neg = n as f64 / (2.0 * negatives as f64);

    let mut weights = vec![0.0; dims];
    let mut bias = 0.0;

    for _ in 0..EPOCHS {
      let mut grad_w = vec![0.0; dims];
      let mut grad_b = 0.0;

      for (row, &label) in standardised.iter().zip(labels) {
        let z = bias + dot(&weights, row);
        let y = if label { 1.0 } else { 0.0 };
        let sample_weight = if label { weight_pos } else { weight_neg };
        let residual = sample_weight * (sigmoid(z) - y);

        for (g, &x) in grad_w.iter_mut().zip(row) {
          *g += residual * x;
        }
        grad_b += residual;
      }

      let inv_n = 1.0 / n as f64;
      for (w, g) in weights.iter_mut().zip(&grad_w) {
        *w -= LEARNING_RATE * (g * inv_n + L2_PENALTY * *w);
      }
      bias -= LEARNING_RATE * grad_b * inv_n;
    }

    if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
      return Err(Error::Training("gradient descent diverged".into()));
    }

    Ok(Self { weights, bias, means, scales })
  }

  /// Churn probability in `0.0..1.0` for one feature vector.
  pub fn predict(&self, row: &[f64]) -> f64 {
    sigmoid(self.bias + dot(&self.weights, &self.standardise(row)))
  }

  /// Signed per-feature contributions to the decision logit: positive
  /// pushes toward churn, negative away. Aligned with the schema order.
  pub fn attributions(&self, row: &[f64]) -> Vec<f64> {
    self
      .standardise(row)
      .iter()
      .zip(&self.weights)
      .map(|(&z, &w)| w * z)
      .collect()
  }

  fn standardise(&self, row: &[f64]) -> Vec<f64> {
    row
      .iter()
      .zip(self.means.iter().zip(self.scales.iter()))
      .map(|(&x, (&m, &s))| (x - m) / s)
      .collect()
  }
}

fn standardisation(rows: &[Vec<f64>], dims: usize) -> (Vec<f64>, Vec<f64>) {
  let n = rows.len() as f64;
  let mut means = vec![0.0; dims];
  for row in rows {
    for (m, &x) in means.iter_mut().zip(row) {
      *m += x;
    }
  }
  for m in &mut means {
    *m /= n;
  }

  let mut scales = vec![0.0; dims];
  for row in rows {
    for ((s, &m), &x) in scales.iter_mut().zip(&means).zip(row) {
      *s += (x - m) * (x - m);
    }
  }
  for s in &mut scales {
    *s = (*s / n).sqrt();
    if *s < 1e-12 {
      *s = 1.0;
    }
  }
  (means, scales)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
  a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(z: f64) -> f64 {
  1.0 / (1.0 + (-z).exp())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
