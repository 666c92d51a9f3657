//! Lexicon/rule-based sentiment scoring for review text.
//!
//! Produces a single compound value in `[-1.0, 1.0]` plus a discrete
//! polarity, in the manner of rule-based social-media scorers: token
//! valences from a fixed lexicon, negation flips, booster scaling, and a
//! bounded normalisation of the summed valence. Entirely deterministic —
//! the same text always yields the same score.

mod lexicon;
mod score;

pub use score::analyze;
