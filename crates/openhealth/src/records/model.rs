//! Record types for profiles and visits.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Alias stored when the person gives none.
pub const DEFAULT_ALIAS: &str = "NA";

/// Length of generated profile ids.
pub const PROFILE_ID_LEN: usize = 8;

/// Accepted birth years.
pub const BIRTH_YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

/// Timestamp format for visits: ISO 8601 at minute precision.
pub const VISIT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A stored health profile.
///
/// Deliberately minimal: an alias instead of a real name and free-text
/// medical fields a provider can read at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Short opaque identifier, printed on the card.
    pub id: String,
    /// Nickname. Never a legal name.
    pub alias: String,
    /// Optional birth year.
    pub birth_year: Option<i32>,
    /// Chronic conditions.
    pub conditions: String,
    /// Current medications.
    pub meds: String,
    /// Known allergies.
    pub allergies: String,
    /// Critical flags such as anticoagulants or epilepsy.
    pub critical_flags: String,
    /// Notes for medical staff.
    pub notes: String,
    /// Last write time.
    pub updated_at: DateTime<Utc>,
}

/// Input for registering or updating a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewProfile {
    /// Nickname; blank becomes [`DEFAULT_ALIAS`].
    pub alias: String,
    /// Optional birth year within [`BIRTH_YEAR_RANGE`].
    pub birth_year: Option<i32>,
    /// Chronic conditions.
    pub conditions: String,
    /// Current medications.
    pub meds: String,
    /// Known allergies.
    pub allergies: String,
    /// Critical flags.
    pub critical_flags: String,
    /// Notes for medical staff.
    pub notes: String,
}

impl NewProfile {
    /// Trim every field, default the alias and check the birth year.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProfile`] if the birth year is out of range.
    pub fn normalized(self) -> Result<Self> {
        if let Some(year) = self.birth_year {
            if !BIRTH_YEAR_RANGE.contains(&year) {
                return Err(Error::invalid_profile(format!(
                    "birth year {year} outside {}..={}",
                    BIRTH_YEAR_RANGE.start(),
                    BIRTH_YEAR_RANGE.end()
                )));
            }
        }

        let alias = self.alias.trim();
        Ok(Self {
            alias: if alias.is_empty() {
                DEFAULT_ALIAS.to_string()
            } else {
                alias.to_string()
            },
            birth_year: self.birth_year,
            conditions: self.conditions.trim().to_string(),
            meds: self.meds.trim().to_string(),
            allergies: self.allergies.trim().to_string(),
            critical_flags: self.critical_flags.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }

    /// Attach an id and timestamp.
    #[must_use]
    pub fn into_profile(self, id: String, updated_at: DateTime<Utc>) -> Profile {
        Profile {
            id,
            alias: self.alias,
            birth_year: self.birth_year,
            conditions: self.conditions,
            meds: self.meds,
            allergies: self.allergies,
            critical_flags: self.critical_flags,
            notes: self.notes,
            updated_at,
        }
    }
}

/// Generate a short profile id from a random UUID.
#[must_use]
pub fn generate_profile_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(PROFILE_ID_LEN);
    id
}

/// A provider visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// When it happened, as entered.
    pub when: String,
    /// Clinic, paramedic team, outreach worker.
    pub provider: String,
    /// Clinical summary.
    pub summary: String,
}

/// Input for a new visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewVisit {
    /// Visit time; blank means now.
    pub when: Option<String>,
    /// Who saw the person.
    pub provider: String,
    /// What happened.
    pub summary: String,
}

impl NewVisit {
    /// Resolve the timestamp and trim text fields.
    ///
    /// A given time is normalised to [`VISIT_TIME_FORMAT`] so visits sort
    /// chronologically as text. Accepts `YYYY-MM-DDTHH:MM`, the same with a
    /// space separator or seconds, or a bare date (midnight).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVisit`] if the time cannot be parsed.
    pub fn resolve(self, now: DateTime<Utc>) -> Result<Visit> {
        let when = match self.when.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => parse_visit_time(text)?,
            _ => now.naive_utc(),
        };
        Ok(Visit {
            when: when.format(VISIT_TIME_FORMAT).to_string(),
            provider: self.provider.trim().to_string(),
            summary: self.summary.trim().to_string(),
        })
    }
}

fn parse_visit_time(text: &str) -> Result<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        VISIT_TIME_FORMAT,
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];

    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| Error::invalid_visit(format!("unrecognised visit time {text:?}")))
}

/// Everything a card or document generator needs for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileCard {
    /// Text the scannable code should encode.
    pub access_code: String,
    /// The profile.
    pub profile: Profile,
    /// Visits, newest first.
    pub visits: Vec<Visit>,
}

impl ProfileCard {
    /// Assemble a card. With a URL prefix the access code is `<prefix><id>`,
    /// otherwise just the id.
    #[must_use]
    pub fn new(profile: Profile, visits: Vec<Visit>, url_prefix: Option<&str>) -> Self {
        let access_code = match url_prefix {
            Some(prefix) => format!("{prefix}{}", profile.id),
            None => profile.id.clone(),
        };
        Self {
            access_code,
            profile,
            visits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalized_trims_and_defaults_alias() {
        let input = NewProfile {
            alias: "   ".into(),
            meds: "  metformin \n".into(),
            ..NewProfile::default()
        };
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.alias, DEFAULT_ALIAS);
        assert_eq!(normalized.meds, "metformin");
    }

    #[test]
    fn test_normalized_birth_year_bounds() {
        let ok = NewProfile {
            birth_year: Some(1900),
            ..NewProfile::default()
        };
        assert!(ok.normalized().is_ok());

        let bad = NewProfile {
            birth_year: Some(1899),
            ..NewProfile::default()
        };
        let err = bad.normalized().unwrap_err();
        assert!(matches!(err, Error::InvalidProfile { .. }));
    }

    #[test]
    fn test_generate_profile_id() {
        let id = generate_profile_id();
        assert_eq!(id.len(), PROFILE_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_profile_id(), generate_profile_id());
    }

    #[test]
    fn test_visit_resolve_defaults_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 10, 26, 10, 30, 59).unwrap();
        let visit = NewVisit {
            when: Some("  ".into()),
            provider: " Clinic ".into(),
            summary: "BP check".into(),
        }
        .resolve(now)
        .unwrap();
        assert_eq!(visit.when, "2025-10-26T10:30");
        assert_eq!(visit.provider, "Clinic");
    }

    #[test]
    fn test_visit_resolve_keeps_given_time() {
        let now = Utc::now();
        let visit = NewVisit {
            when: Some("2024-01-02T03:04".into()),
            ..NewVisit::default()
        }
        .resolve(now)
        .unwrap();
        assert_eq!(visit.when, "2024-01-02T03:04");
    }

    #[test]
    fn test_visit_resolve_normalises_time() {
        let now = Utc::now();
        for (input, expected) in [
            ("2024-01-02 03:04", "2024-01-02T03:04"),
            ("2024-01-02T03:04:59", "2024-01-02T03:04"),
            ("2024-01-02", "2024-01-02T00:00"),
        ] {
            let visit = NewVisit {
                when: Some(input.into()),
                ..NewVisit::default()
            }
            .resolve(now)
            .unwrap();
            assert_eq!(visit.when, expected, "input {input}");
        }
    }

    #[test]
    fn test_visit_resolve_rejects_garbage() {
        let err = NewVisit {
            when: Some("last tuesday".into()),
            ..NewVisit::default()
        }
        .resolve(Utc::now())
        .unwrap_err();
        assert!(matches!(err, Error::InvalidVisit { .. }));
    }

    #[test]
    fn test_card_access_code() {
        let profile = NewProfile::default()
            .normalized()
            .unwrap()
            .into_profile("abcd1234".into(), Utc::now());

        let card = ProfileCard::new(profile.clone(), Vec::new(), None);
        assert_eq!(card.access_code, "abcd1234");

        let card = ProfileCard::new(profile, Vec::new(), Some("https://oh.example/p/"));
        assert_eq!(card.access_code, "https://oh.example/p/abcd1234");
    }
}
