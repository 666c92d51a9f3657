//! SQL schema for the ebb SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- User records are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table; corrections arrive
-- as new rows and the latest row per user wins at prediction time. Arrival
-- order is the implicit rowid.
CREATE TABLE IF NOT EXISTS records (
    record_id          TEXT PRIMARY KEY,
    user_id            INTEGER NOT NULL,
    avg_screen_time    REAL NOT NULL,
    avg_spend          REAL NOT NULL,
    rating             REAL NOT NULL,
    password_resets    REAL NOT NULL,
    last_visit_minutes REAL NOT NULL,
    daily_usage        TEXT NOT NULL,   -- JSON array, exactly 30 entries
    review             TEXT,
    churned            INTEGER NOT NULL,
    recorded_at        TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- One row per model. records_seen is advanced by ingestion in the same
-- transaction that appends the rows, and reset only by a successful
-- artifact publish.
CREATE TABLE IF NOT EXISTS retrain_counters (
    model                 TEXT PRIMARY KEY,   -- 'model_a' | 'model_b'
    last_retrain_at       TEXT NOT NULL,
    records_seen          INTEGER NOT NULL,
    total_at_last_retrain INTEGER NOT NULL
);

-- Lazily computed sentiment, cached alongside its record.
CREATE TABLE IF NOT EXISTS sentiment_scores (
    record_id TEXT PRIMARY KEY REFERENCES records(record_id),
    compound  REAL NOT NULL,
    polarity  TEXT NOT NULL               -- 'positive' | 'neutral' | 'negative'
);

-- Fitted-model snapshots. Immutable once inserted; publishing flips
-- is_current within a transaction, and prior versions are retained for
-- rollback.
CREATE TABLE IF NOT EXISTS model_artifacts (
    artifact_id   TEXT PRIMARY KEY,
    model         TEXT NOT NULL,
    version       INTEGER NOT NULL,
    trained_at    TEXT NOT NULL,
    schema_json   TEXT NOT NULL,          -- ordered feature names
    payload_json  TEXT NOT NULL,          -- serialised fitted estimator
    content_hash  TEXT NOT NULL,          -- SHA-256 hex of payload_json
    training_rows INTEGER NOT NULL,
    is_current    INTEGER NOT NULL DEFAULT 0,
    UNIQUE (model, version)
);

CREATE INDEX IF NOT EXISTS records_user_idx      ON records(user_id);
CREATE INDEX IF NOT EXISTS artifacts_current_idx ON model_artifacts(model, is_current);

PRAGMA user_version = 1;
";
