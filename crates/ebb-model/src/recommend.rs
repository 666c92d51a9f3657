//! Deterministic rationale templates and the recommendation rule table.
//!
//! Both mappings are fixed tables, not free-text generation: the same
//! record, sentiment, and attribution always produce the same words.

use ebb_core::record::{DAILY_USAGE_WINDOW, SentimentScore, UserRecord};

use crate::features::SENTIMENT_FEATURE;

// ─── Rationales ──────────────────────────────────────────────────────────────

/// Plain-language reading of one feature's observed value and the direction
/// of its attribution.
pub fn rationale(feature: &str, value: f64, attribution: f64) -> String {
  let direction = if attribution > 0.0 { "increases" } else { "reduces" };
  let strength = if attribution.abs() > 0.3 {
    "strongly"
  } else if attribution.abs() > 0.1 {
    "moderately"
  } else {
    "slightly"
  };
  let reading = feature_reading(feature, value);
  format!("{reading} — {strength} {direction} churn risk.")
}

fn feature_reading(feature: &str, value: f64) -> String {
  match feature {
    "avg_screen_time" => {
      if value < 30.0 {
        format!("Low engagement ({value:.0} min/day)")
      } else if value < 120.0 {
        format!("Moderate usage ({value:.0} min/day)")
      } else {
        format!("Heavy usage ({value:.0} min/day)")
      }
    }
    "avg_spend" => format!("Average spend of {value:.0} per period"),
    "rating" => {
      if value >= 4.0 {
        format!("High rating ({value:.0}/5)")
      } else if value >= 3.0 {
        format!("Average rating ({value:.0}/5)")
      } else {
        format!("Low rating ({value:.0}/5)")
      }
    }
    "password_resets" => {
      if value == 0.0 {
        "No password resets".to_string()
      } else if value <= 1.0 {
        "One password reset".to_string()
      } else {
        format!("{value:.0} password resets, notable login friction")
      }
    }
    "last_visit_minutes" => {
      let hours = value / 60.0;
      if hours < 24.0 {
        format!("Seen {hours:.1} hours ago")
      } else if hours < 168.0 {
        format!("Inactive for {:.1} days", hours / 24.0)
      } else {
        format!("Absent for {:.0} days", hours / 24.0)
      }
    }
    SENTIMENT_FEATURE => {
      if value < -0.3 {
        format!("Strongly negative review sentiment ({value:.2})")
      } else if value < -0.1 {
        format!("Somewhat negative review sentiment ({value:.2})")
      } else if value > 0.3 {
        format!("Strongly positive review sentiment ({value:.2})")
      } else if value > 0.1 {
        format!("Positive review sentiment ({value:.2})")
      } else {
        format!("Neutral review sentiment ({value:.2})")
      }
    }
    day if day.starts_with("day_") => {
      let index = day.trim_start_matches("day_");
      if value == 0.0 {
        format!("No activity on window day {index}")
      } else {
        format!("{value:.0} minutes of use on window day {index}")
      }
    }
    other => format!("{other} at {value:.2}"),
  }
}

// ─── Recommendations ─────────────────────────────────────────────────────────

/// Exactly this many recommendations are returned for every user.
pub const RECOMMENDATION_COUNT: usize = 3;

/// Generic actions used to pad the list when few rules fire.
const FALLBACKS: [&str; 3] = [
  "Surface recently shipped features the user has not tried yet.",
  "Ask for quick in-app feedback to understand their needs.",
  "Suggest enabling notifications for timely, relevant updates.",
];

/// Derive recommended actions from a fixed, priority-ordered rule table.
///
/// Rules are evaluated highest priority first; matches are deduplicated and
/// the list padded from the fallbacks to exactly
/// [`RECOMMENDATION_COUNT`] entries.
pub fn recommendations(
  record: &UserRecord,
  sentiment: &SentimentScore,
) -> Vec<String> {
  let mut recs: Vec<&str> = Vec::new();

  if record.password_resets > 5.0 {
    recs.push(
      "Reach out with account-security help; repeated password resets signal login friction.",
    );
  }
  if record.review.is_some() && sentiment.compound < -0.2 {
    recs.push(
      "Follow up on the negative review with a direct support conversation.",
    );
  }
  if record.rating > 0.0 && record.rating <= 2.0 {
    recs.push("Apologise for the poor experience and offer priority support.");
  }
  // More than a week away.
  if record.last_visit_minutes > 7.0 * 24.0 * 60.0 {
    recs.push(
      "Send a win-back nudge highlighting what changed since their last visit.",
    );
  }
  if recent_activity_dropped(record) {
    recs.push(
      "Re-engage with a personalised check-in; recent activity is well below their usual level.",
    );
  }
  if record.avg_spend > 500.0 {
    recs.push("Offer premium perks; high spenders respond to loyalty rewards.");
  }
  if record.avg_screen_time < 30.0 {
    recs.push("Walk the user through key features; overall engagement is minimal.");
  }
  if record.review.is_some() && sentiment.compound > 0.2 {
    recs.push("Invite a public review or referral while satisfaction is high.");
  }

  let mut out: Vec<String> = Vec::with_capacity(RECOMMENDATION_COUNT);
  for rec in recs.into_iter().chain(FALLBACKS) {
    if out.iter().any(|r| r == rec) {
      continue;
    }
    out.push(rec.to_string());
    if out.len() == RECOMMENDATION_COUNT {
      break;
    }
  }
  out
}

/// Mean usage over the newest seven window days against half the user's
/// overall daily average.
fn recent_activity_dropped(record: &UserRecord) -> bool {
  if record.avg_screen_time <= 0.0 {
    return false;
  }
  let recent: f64 =
    record.daily_usage[DAILY_USAGE_WINDOW - 7..].iter().sum::<f64>() / 7.0;
  recent < record.avg_screen_time * 0.5
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  fn record() -> UserRecord {
    UserRecord {
      record_id: Uuid::new_v4(),
      user_id: 1,
      avg_screen_time: 60.0,
      avg_spend: 100.0,
      rating: 4.0,
      password_resets: 0.0,
      last_visit_minutes: 30.0,
      daily_usage: [40.0; DAILY_USAGE_WINDOW],
      review: None,
      churned: false,
      recorded_at: Utc::now(),
    }
  }

  #[test]
  fn always_exactly_three() {
    let recs = recommendations(&record(), &SentimentScore::neutral());
    assert_eq!(recs.len(), RECOMMENDATION_COUNT);
  }

  #[test]
  fn password_friction_rule_leads() {
    let mut r = record();
    r.password_resets = 7.0;
    let recs = recommendations(&r, &SentimentScore::neutral());
    assert!(recs[0].contains("account-security"));
  }

  #[test]
  fn negative_review_prompts_support_outreach() {
    let mut r = record();
    r.review = Some("terrible".into());
    let recs = recommendations(&r, &SentimentScore::from_compound(-0.5));
    assert!(recs.iter().any(|s| s.contains("negative review")));
  }

  #[test]
  fn imputed_sentiment_never_triggers_review_rules() {
    // No review text: even a negative compound must not fire review rules.
    let recs = recommendations(&record(), &SentimentScore::from_compound(-0.9));
    assert!(!recs.iter().any(|s| s.contains("negative review")));
  }

  #[test]
  fn quiet_profile_gets_fallbacks() {
    let recs = recommendations(&record(), &SentimentScore::neutral());
    assert_eq!(recs, FALLBACKS.map(str::to_string).to_vec());
  }

  #[test]
  fn rationale_states_direction_and_strength() {
    let text = rationale("password_resets", 6.0, 0.5);
    assert!(text.contains("strongly increases churn risk"));
    let text = rationale("avg_screen_time", 200.0, -0.05);
    assert!(text.contains("slightly reduces churn risk"));
  }

  #[test]
  fn rationale_is_deterministic() {
    assert_eq!(
      rationale(SENTIMENT_FEATURE, -0.6, 0.4),
      rationale(SENTIMENT_FEATURE, -0.6, 0.4)
    );
  }
}
