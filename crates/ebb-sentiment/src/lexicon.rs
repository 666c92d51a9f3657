//! The valence lexicon and modifier word lists.
//!
//! Valences follow the usual rule-based-scorer convention: roughly -4.0
//! (maximally negative) to +4.0 (maximally positive). The lexicon is biased
//! toward vocabulary that shows up in app-store style product reviews.

/// Word → valence. Lookup is over lowercased tokens.
pub const LEXICON: &[(&str, f64)] = &[
  // ── Positive ─────────────────────────────────────────────────────────
  ("amazing", 2.8),
  ("awesome", 3.1),
  ("best", 3.2),
  ("brilliant", 2.8),
  ("convenient", 1.6),
  ("delighted", 2.9),
  ("easy", 1.3),
  ("enjoy", 2.0),
  ("enjoyable", 2.2),
  ("excellent", 2.7),
  ("fantastic", 2.6),
  ("fast", 1.2),
  ("favorite", 2.0),
  ("fun", 2.3),
  ("good", 1.9),
  ("great", 3.1),
  ("happy", 2.7),
  ("helpful", 1.8),
  ("impressed", 2.2),
  ("intuitive", 1.6),
  ("like", 1.5),
  ("love", 3.2),
  ("loved", 2.9),
  ("perfect", 3.0),
  ("pleasant", 2.0),
  ("recommend", 1.7),
  ("reliable", 1.8),
  ("satisfied", 2.0),
  ("smooth", 1.5),
  ("useful", 1.9),
  ("wonderful", 2.7),
  ("worth", 1.4),
  // ── Negative ─────────────────────────────────────────────────────────
  ("annoying", -1.9),
  ("awful", -2.0),
  ("bad", -2.5),
  ("broken", -1.7),
  ("buggy", -1.8),
  ("cancel", -1.3),
  ("cancelled", -1.3),
  ("cancelling", -1.3),
  ("confusing", -1.4),
  ("crash", -2.0),
  ("crashes", -2.0),
  ("disappointed", -2.1),
  ("disappointing", -2.1),
  ("expensive", -1.1),
  ("fail", -2.2),
  ("fails", -2.2),
  ("frustrated", -2.1),
  ("frustrating", -2.1),
  ("garbage", -2.5),
  ("hate", -2.7),
  ("horrible", -2.5),
  ("issue", -1.0),
  ("issues", -1.0),
  ("laggy", -1.5),
  ("mediocre", -0.7),
  ("poor", -2.0),
  ("problem", -1.3),
  ("problems", -1.3),
  ("refund", -1.4),
  ("scam", -2.9),
  ("slow", -1.2),
  ("terrible", -2.1),
  ("uninstall", -1.6),
  ("uninstalled", -1.6),
  ("unreliable", -1.8),
  ("unusable", -2.3),
  ("useless", -1.8),
  ("waste", -2.2),
  ("worst", -3.1),
  ("worthless", -2.3),
];

/// Preceding any valenced word within [`super::score::MODIFIER_LOOKBACK`]
/// tokens, flips and dampens its valence.
pub const NEGATORS: &[&str] = &[
  "cannot", "cant", "dont", "doesnt", "didnt", "isnt", "wasnt", "wont",
  "never", "no", "none", "nor", "not", "nothing",
];

/// Intensity modifiers: positive deltas strengthen, negative dampen.
pub const BOOSTERS: &[(&str, f64)] = &[
  ("absolutely", 0.293),
  ("completely", 0.293),
  ("extremely", 0.293),
  ("incredibly", 0.293),
  ("really", 0.267),
  ("so", 0.267),
  ("totally", 0.267),
  ("very", 0.267),
  ("barely", -0.293),
  ("hardly", -0.293),
  ("kinda", -0.267),
  ("slightly", -0.293),
  ("somewhat", -0.267),
];

pub fn valence_of(token: &str) -> Option<f64> {
  LEXICON
    .iter()
    .find(|(word, _)| *word == token)
    .map(|(_, v)| *v)
}

pub fn is_negator(token: &str) -> bool {
  NEGATORS.contains(&token)
}

pub fn booster_delta(token: &str) -> Option<f64> {
  BOOSTERS
    .iter()
    .find(|(word, _)| *word == token)
    .map(|(_, d)| *d)
}
