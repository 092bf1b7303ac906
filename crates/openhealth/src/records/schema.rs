//! `SQLite` schema for the health record store.

/// Minimal anonymised profiles, keyed by a short opaque id.
pub const CREATE_PROFILES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    alias TEXT NOT NULL,
    birth_year INTEGER,
    conditions TEXT NOT NULL DEFAULT '',
    meds TEXT NOT NULL DEFAULT '',
    allergies TEXT NOT NULL DEFAULT '',
    critical_flags TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL
)
";

/// Provider visits appended to a profile.
pub const CREATE_VISITS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_id TEXT NOT NULL REFERENCES profiles(id),
    visited_at TEXT NOT NULL,
    provider TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL DEFAULT ''
)
";

/// Index for listing a profile's visits newest first.
pub const CREATE_VISITS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_visits_profile ON visits(profile_id, visited_at DESC)
";

/// Key-value metadata, including the schema version.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_PROFILES_TABLE,
    CREATE_VISITS_TABLE,
    CREATE_VISITS_INDEX,
    CREATE_METADATA_TABLE,
];
