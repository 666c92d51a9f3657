//! The scoring pass: tokenize, apply modifiers, normalise.

use ebb_core::record::SentimentScore;

use crate::lexicon::{booster_delta, is_negator, valence_of};

/// How many preceding tokens are inspected for negators and boosters.
pub const MODIFIER_LOOKBACK: usize = 3;

/// Negated valences are flipped and dampened by this factor.
const NEGATION_FACTOR: f64 = -0.74;

/// Normalisation constant: compound = s / sqrt(s² + ALPHA).
const ALPHA: f64 = 15.0;

/// Score a piece of review text.
///
/// Text with no lexicon hits (including empty text) scores a neutral 0.0.
pub fn analyze(text: &str) -> SentimentScore {
  let tokens = tokenize(text);

  let mut sum = 0.0;
  for (i, token) in tokens.iter().enumerate() {
    let Some(base) = valence_of(token) else {
      continue;
    };

    let mut valence = base;
    let lookback_start = i.saturating_sub(MODIFIER_LOOKBACK);
    for prior in &tokens[lookback_start..i] {
      if is_negator(prior) {
        valence *= NEGATION_FACTOR;
      } else if let Some(delta) = booster_delta(prior) {
        // Boosters scale in the direction of the valence.
        valence += delta * valence.signum();
      }
    }
    sum += valence;
  }

  SentimentScore::from_compound(normalize(sum))
}

/// Lowercased alphabetic tokens; punctuation and digits are separators.
/// Apostrophes are dropped so "don't" matches the lexicon's "dont".
fn tokenize(text: &str) -> Vec<String> {
  text
    .to_lowercase()
    .replace('\'', "")
    .split(|c: char| !c.is_alphabetic())
    .filter(|t| !t.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Map an unbounded valence sum into `[-1.0, 1.0]`.
fn normalize(sum: f64) -> f64 {
  if sum == 0.0 {
    return 0.0;
  }
  (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
