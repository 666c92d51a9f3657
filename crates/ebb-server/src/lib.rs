//! Orchestration layer for the ebb churn service: runtime configuration and
//! the retraining scheduler. The `server` binary wires these to the SQLite
//! store and the HTTP API.

pub mod scheduler;

use std::path::PathBuf;

use chrono::Duration;
use ebb_core::{artifact::ModelKind, counters::TriggerConfig};
use serde::Deserialize;
use thiserror::Error;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Per-model trigger settings as they appear in `config.toml`.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TriggerSettings {
  /// Retrain after this much elapsed time, minutes.
  pub interval_minutes: u64,
  /// Retrain after this many new records.
  pub record_threshold: u64,
}

/// Runtime server configuration, deserialised from `config.toml` with
/// `EBB_`-prefixed environment overrides.
///
/// Defaults follow the service's conventional shape: Model A on the longer
/// interval and higher threshold, Model B on the shorter and lower.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  /// How often the scheduler polls the trigger evaluator, seconds.
  #[serde(default = "default_poll_interval")]
  pub poll_interval_seconds: u64,
  #[serde(default = "default_model_a")]
  pub model_a:               TriggerSettings,
  #[serde(default = "default_model_b")]
  pub model_b:               TriggerSettings,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("ebb.db") }
fn default_poll_interval() -> u64 { 60 }

fn default_model_a() -> TriggerSettings {
  TriggerSettings { interval_minutes: 24 * 60, record_threshold: 20 }
}

fn default_model_b() -> TriggerSettings {
  TriggerSettings { interval_minutes: 6 * 60, record_threshold: 10 }
}

/// A configuration value that fails startup validation.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("{0} must be positive and non-zero")]
  NonPositive(&'static str),
}

impl ServerConfig {
  /// Validate every externally supplied knob at startup. All intervals and
  /// thresholds must be positive and non-zero.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.poll_interval_seconds == 0 {
      return Err(ConfigError::NonPositive("poll_interval_seconds"));
    }
    for (name_interval, name_threshold, settings) in [
      ("model_a.interval_minutes", "model_a.record_threshold", self.model_a),
      ("model_b.interval_minutes", "model_b.record_threshold", self.model_b),
    ] {
      if settings.interval_minutes == 0 {
        return Err(ConfigError::NonPositive(name_interval));
      }
      if settings.record_threshold == 0 {
        return Err(ConfigError::NonPositive(name_threshold));
      }
    }
    Ok(())
  }

  /// The trigger configuration for one model.
  pub fn trigger_config(&self, kind: ModelKind) -> TriggerConfig {
    let settings = match kind {
      ModelKind::ModelA => self.model_a,
      ModelKind::ModelB => self.model_b,
    };
    TriggerConfig {
      interval:         Duration::minutes(settings.interval_minutes as i64),
      record_threshold: settings.record_threshold,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config() -> ServerConfig {
    ServerConfig {
      host:                  default_host(),
      port:                  default_port(),
      store_path:            default_store_path(),
      poll_interval_seconds: 60,
      model_a:               default_model_a(),
      model_b:               default_model_b(),
    }
  }

  #[test]
  fn defaults_validate() {
    assert!(config().validate().is_ok());
  }

  #[test]
  fn zero_poll_interval_is_rejected() {
    let mut cfg = config();
    cfg.poll_interval_seconds = 0;
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn zero_threshold_is_rejected() {
    let mut cfg = config();
    cfg.model_b.record_threshold = 0;
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn trigger_config_converts_minutes() {
    let cfg = config();
    let trigger = cfg.trigger_config(ModelKind::ModelB);
    assert_eq!(trigger.interval, Duration::minutes(6 * 60));
    assert_eq!(trigger.record_threshold, 10);
  }
}
