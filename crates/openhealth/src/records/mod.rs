//! Health record store.
//!
//! `SQLite`-backed storage for minimal profiles and their visit history,
//! addressed by a short opaque id. This is independent of the resource
//! catalog; the two never touch each other's data.

pub mod migrations;
pub mod model;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use model::{generate_profile_id, NewProfile, NewVisit, Profile, ProfileCard, Visit};

/// How many fresh ids to try before giving up on a collision streak.
const MAX_ID_ATTEMPTS: usize = 8;

const PROFILE_COLUMNS: &str =
    "id, alias, birth_year, conditions, meds, allergies, critical_flags, notes, updated_at";

/// Profile and visit storage.
#[derive(Debug)]
pub struct RecordStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl RecordStore {
    /// Open or create a record database at the given path.
    ///
    /// Creates parent directories and initialises the schema as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening record database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        info!("Record database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a new person under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is invalid or the write fails.
    pub fn register(&self, input: NewProfile) -> Result<Profile> {
        let input = input.normalized()?;

        let mut attempts = 0;
        let id = loop {
            let candidate = generate_profile_id();
            if !self.exists(&candidate)? {
                break candidate;
            }
            attempts += 1;
            warn!("Profile id collision on {candidate}, retrying");
            if attempts >= MAX_ID_ATTEMPTS {
                return Err(Error::invalid_profile("could not allocate a free profile id"));
            }
        };

        let mut profile = input.into_profile(id, Utc::now());
        profile.updated_at = self.upsert(&profile)?;
        info!("Registered profile {}", profile.id);
        Ok(profile)
    }

    /// Insert a profile, or overwrite the one with the same id.
    ///
    /// `updated_at` is stamped with the current time; the stored value is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert(&self, profile: &Profile) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        let updated_at = now.to_rfc3339();

        if self.exists(&profile.id)? {
            self.conn.execute(
                r"
                UPDATE profiles SET alias = ?2, birth_year = ?3, conditions = ?4, meds = ?5,
                       allergies = ?6, critical_flags = ?7, notes = ?8, updated_at = ?9
                WHERE id = ?1
                ",
                params![
                    profile.id,
                    profile.alias,
                    profile.birth_year,
                    profile.conditions,
                    profile.meds,
                    profile.allergies,
                    profile.critical_flags,
                    profile.notes,
                    updated_at,
                ],
            )?;
            debug!("Updated profile {}", profile.id);
        } else {
            self.conn.execute(
                r"
                INSERT INTO profiles (id, alias, birth_year, conditions, meds, allergies,
                                      critical_flags, notes, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
                params![
                    profile.id,
                    profile.alias,
                    profile.birth_year,
                    profile.conditions,
                    profile.meds,
                    profile.allergies,
                    profile.critical_flags,
                    profile.notes,
                    updated_at,
                ],
            )?;
            debug!("Inserted profile {}", profile.id);
        }

        Ok(now)
    }

    /// Update an existing profile's fields from new input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileNotFound`] for an unknown id, or an error if
    /// the input is invalid or the write fails.
    pub fn update(&self, id: &str, input: NewProfile) -> Result<Profile> {
        let id = id.trim();
        if !self.exists(id)? {
            return Err(Error::profile_not_found(id));
        }
        let mut profile = input.normalized()?.into_profile(id.to_string(), Utc::now());
        profile.updated_at = self.upsert(&profile)?;
        Ok(profile)
    }

    /// Look up a profile. Surrounding whitespace in `id` is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn profile(&self, id: &str) -> Result<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
        let profile = self
            .conn
            .query_row(&sql, [id.trim()], Self::row_to_profile)
            .optional()?;
        Ok(profile)
    }

    /// Append a visit to a profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileNotFound`] for an unknown id,
    /// [`Error::InvalidVisit`] for an unparseable time, or an error if the
    /// write fails.
    pub fn add_visit(&self, id: &str, visit: NewVisit) -> Result<Visit> {
        let id = id.trim();
        if !self.exists(id)? {
            return Err(Error::profile_not_found(id));
        }

        let visit = visit.resolve(Utc::now())?;
        self.conn.execute(
            "INSERT INTO visits (profile_id, visited_at, provider, summary) VALUES (?1, ?2, ?3, ?4)",
            params![id, visit.when, visit.provider, visit.summary],
        )?;
        debug!("Added visit for {id} at {}", visit.when);
        Ok(visit)
    }

    /// A profile's visits, newest first. Same-time visits list the latest
    /// entry first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn visits(&self, id: &str) -> Result<Vec<Visit>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT visited_at, provider, summary FROM visits
            WHERE profile_id = ?1
            ORDER BY visited_at DESC, id DESC
            ",
        )?;

        let visits = stmt
            .query_map([id.trim()], |row| {
                Ok(Visit {
                    when: row.get(0)?,
                    provider: row.get(1)?,
                    summary: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(visits)
    }

    /// Profile plus visits, ready for a card generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileNotFound`] for an unknown id, or an error if
    /// the database operation fails.
    pub fn card(&self, id: &str, url_prefix: Option<&str>) -> Result<ProfileCard> {
        let profile = self
            .profile(id)?
            .ok_or_else(|| Error::profile_not_found(id.trim()))?;
        let visits = self.visits(&profile.id)?;
        Ok(ProfileCard::new(profile, visits, url_prefix))
    }

    /// Counts of stored profiles and visits.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<RecordStats> {
        let profiles: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        let visits: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM visits", [], |row| row.get(0))?;
        Ok(RecordStats { profiles, visits })
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM profiles WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        let updated_at_str: String = row.get(8)?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str).map_or_else(
            |_| {
                warn!("Unparseable updated_at {updated_at_str:?}, using epoch");
                DateTime::<Utc>::UNIX_EPOCH
            },
            |dt| dt.with_timezone(&Utc),
        );

        Ok(Profile {
            id: row.get(0)?,
            alias: row.get(1)?,
            birth_year: row.get(2)?,
            conditions: row.get(3)?,
            meds: row.get(4)?,
            allergies: row.get(5)?,
            critical_flags: row.get(6)?,
            notes: row.get(7)?,
            updated_at,
        })
    }
}

/// Record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordStats {
    /// Number of profiles.
    pub profiles: i64,
    /// Number of visits across all profiles.
    pub visits: i64,
}
