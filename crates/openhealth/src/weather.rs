//! Weather-triggered recommendations.
//!
//! Current conditions are sorted into a [`Band`]. Cold and heat bands come
//! with a short list of the nearest relevant resources; moderate weather
//! sends the user back to general browsing.
//!
//! Fetching the weather is someone else's job: anything implementing
//! [`WeatherProvider`] can feed [`advise`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{CategoryFilter, Query, RankedMatch, ResourceCatalog};
use crate::geo::Coordinate;

/// Categories recommended in cold weather.
pub const COLD_CATEGORIES: &[&str] = &["Shelter"];

/// Categories recommended in hot weather.
pub const HEAT_CATEGORIES: &[&str] = &["Hygiene", "Community"];

/// Default number of recommendations.
pub const DEFAULT_RECOMMEND_LIMIT: usize = 5;

/// Errors a weather provider can report.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// No provider credentials are configured.
    #[error("no weather provider configured: {0}")]
    Unavailable(String),

    /// The provider answered with something unusable.
    #[error("weather provider error: {0}")]
    Provider(String),
}

/// Conditions reported for a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Air temperature in degrees Celsius.
    pub temp_c: f64,
    /// Free-text description, e.g. "light rain".
    pub description: String,
}

/// Source of current weather for a named place.
pub trait WeatherProvider {
    /// Current conditions for `city`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not configured or fails.
    fn current(&self, city: &str) -> Result<WeatherReport, WeatherError>;
}

/// A provider that always returns the same report. Used for manual entry.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedWeather(pub WeatherReport);

impl WeatherProvider for FixedWeather {
    fn current(&self, _city: &str) -> Result<WeatherReport, WeatherError> {
        Ok(self.0.clone())
    }
}

/// Stand-in when no provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWeather;

impl WeatherProvider for NoWeather {
    fn current(&self, _city: &str) -> Result<WeatherReport, WeatherError> {
        Err(WeatherError::Unavailable(
            "pass --temp and --desc to enter conditions manually".to_string(),
        ))
    }
}

/// Classification of current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// Cold enough to seek shelter.
    Cold,
    /// Hot enough to seek water or cooling.
    Heat,
    /// Neither.
    Moderate,
}

impl Band {
    /// Categories to recommend for this band. Empty for moderate weather.
    #[must_use]
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Self::Cold => COLD_CATEGORIES,
            Self::Heat => HEAT_CATEGORIES,
            Self::Moderate => &[],
        }
    }

    /// Message shown alongside the recommendations.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Cold => "It is very cold. Find a nearby shelter.",
            Self::Heat => "High heat. Look for water points or air-conditioned centers.",
            Self::Moderate => "Moderate weather. Use the map to browse nearby resources.",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cold => write!(f, "cold"),
            Self::Heat => write!(f, "heat"),
            Self::Moderate => write!(f, "moderate"),
        }
    }
}

/// Band boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Cold at or below this temperature.
    pub cold_max_c: f64,
    /// Hot at or above this temperature.
    pub heat_min_c: f64,
    /// Description keyword that forces the cold band.
    pub cold_keyword: String,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cold_max_c: 8.0,
            heat_min_c: 35.0,
            cold_keyword: "cold".to_string(),
        }
    }
}

/// Classify a report.
///
/// Cold is checked first and the description keyword only ever feeds the
/// cold condition, so "cold" in the description wins over a hot reading.
#[must_use]
pub fn classify(report: &WeatherReport, thresholds: &Thresholds) -> Band {
    let keyword = thresholds.cold_keyword.to_lowercase();
    let described_cold =
        !keyword.is_empty() && report.description.to_lowercase().contains(&keyword);

    if report.temp_c <= thresholds.cold_max_c || described_cold {
        Band::Cold
    } else if report.temp_c >= thresholds.heat_min_c {
        Band::Heat
    } else {
        Band::Moderate
    }
}

/// A band plus what to do about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advisory<'a> {
    /// The report this advisory was built from.
    pub report: WeatherReport,
    /// Classification of the report.
    pub band: Band,
    /// Human-readable advice.
    pub message: &'static str,
    /// Nearest relevant resources, closest first. Empty for moderate weather.
    pub recommendations: Vec<RankedMatch<'a>>,
}

/// Classify `report` and pick the nearest relevant resources within
/// `radius_km` of `origin`, at most `limit` of them.
#[must_use]
pub fn advise<'a>(
    catalog: &'a ResourceCatalog,
    report: WeatherReport,
    origin: Coordinate,
    radius_km: f64,
    limit: usize,
    thresholds: &Thresholds,
) -> Advisory<'a> {
    let band = classify(&report, thresholds);
    let recommendations = match band {
        Band::Moderate => Vec::new(),
        Band::Cold | Band::Heat => {
            let query = Query::new(origin, radius_km)
                .with_categories(CategoryFilter::only(band.categories().iter().copied()))
                .with_limit(limit);
            catalog.query(&query)
        }
    };

    debug!(%band, temp_c = report.temp_c, found = recommendations.len(), "Built advisory");

    Advisory {
        report,
        band,
        message: band.message(),
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResourceRecord;

    fn report(temp_c: f64, description: &str) -> WeatherReport {
        WeatherReport {
            temp_c,
            description: description.to_string(),
        }
    }

    fn record(name: &str, category: &str, lat: f64) -> ResourceRecord {
        ResourceRecord {
            name: name.to_string(),
            category: category.to_string(),
            address: String::new(),
            lat,
            lon: 0.0,
            hours: None,
            phone: None,
            notes: None,
        }
    }

    fn catalog() -> ResourceCatalog {
        let mut records: Vec<_> = (0..7_u8)
            .map(|i| record(&format!("shelter{i}"), "Shelter", f64::from(i) * 0.01))
            .collect();
        records.push(record("pool", "Community", 0.005));
        records.push(record("showers", "Hygiene", 0.015));
        records.push(record("pantry", "Food", 0.0));
        records.push(record("far shelter", "Shelter", 5.0));
        records.into_iter().collect()
    }

    const ORIGIN: Coordinate = Coordinate { lat: 0.0, lon: 0.0 };

    #[test]
    fn test_classify_cold_by_temperature() {
        let t = Thresholds::default();
        assert_eq!(classify(&report(5.0, "clear sky"), &t), Band::Cold);
        assert_eq!(classify(&report(8.0, "clear sky"), &t), Band::Cold);
    }

    #[test]
    fn test_classify_cold_by_description() {
        let t = Thresholds::default();
        assert_eq!(
            classify(&report(20.0, "cold front approaching"), &t),
            Band::Cold
        );
        assert_eq!(classify(&report(20.0, "COLD wind"), &t), Band::Cold);
    }

    #[test]
    fn test_classify_description_cold_beats_heat() {
        let t = Thresholds::default();
        assert_eq!(classify(&report(38.0, "cold drinks advised"), &t), Band::Cold);
    }

    #[test]
    fn test_classify_heat_and_moderate() {
        let t = Thresholds::default();
        assert_eq!(classify(&report(35.0, "sunny"), &t), Band::Heat);
        assert_eq!(classify(&report(34.9, "sunny"), &t), Band::Moderate);
        assert_eq!(classify(&report(8.1, "overcast"), &t), Band::Moderate);
    }

    #[test]
    fn test_advise_cold_nearest_five_shelters() {
        let catalog = catalog();
        let advisory = advise(
            &catalog,
            report(5.0, "clear sky"),
            ORIGIN,
            10.0,
            DEFAULT_RECOMMEND_LIMIT,
            &Thresholds::default(),
        );
        assert_eq!(advisory.band, Band::Cold);
        let names: Vec<_> = advisory
            .recommendations
            .iter()
            .map(|m| m.record.name.as_str())
            .collect();
        assert_eq!(
            names,
            ["shelter0", "shelter1", "shelter2", "shelter3", "shelter4"]
        );
    }

    #[test]
    fn test_advise_heat_hygiene_and_community() {
        let catalog = catalog();
        let advisory = advise(
            &catalog,
            report(40.0, "sunny"),
            ORIGIN,
            10.0,
            DEFAULT_RECOMMEND_LIMIT,
            &Thresholds::default(),
        );
        assert_eq!(advisory.band, Band::Heat);
        let names: Vec<_> = advisory
            .recommendations
            .iter()
            .map(|m| m.record.name.as_str())
            .collect();
        assert_eq!(names, ["pool", "showers"]);
    }

    #[test]
    fn test_advise_respects_radius() {
        let catalog = catalog();
        let advisory = advise(
            &catalog,
            report(0.0, "snow"),
            Coordinate { lat: 5.0, lon: 0.0 },
            1.0,
            DEFAULT_RECOMMEND_LIMIT,
            &Thresholds::default(),
        );
        assert_eq!(advisory.recommendations.len(), 1);
        assert_eq!(advisory.recommendations[0].record.name, "far shelter");
    }

    #[test]
    fn test_advise_moderate_recommends_nothing() {
        let catalog = catalog();
        let advisory = advise(
            &catalog,
            report(20.0, "clear sky"),
            ORIGIN,
            10.0,
            DEFAULT_RECOMMEND_LIMIT,
            &Thresholds::default(),
        );
        assert_eq!(advisory.band, Band::Moderate);
        assert!(advisory.recommendations.is_empty());
        assert!(advisory.message.contains("map"));
    }

    #[test]
    fn test_fixed_and_missing_providers() {
        let fixed = FixedWeather(report(12.0, "fog"));
        assert_eq!(fixed.current("anywhere").unwrap().temp_c, 12.0);
        let err = NoWeather.current("anywhere").unwrap_err();
        assert!(err.to_string().contains("--temp"));
    }

    #[test]
    fn test_band_display() {
        assert_eq!(Band::Cold.to_string(), "cold");
        assert_eq!(Band::Heat.to_string(), "heat");
        assert_eq!(Band::Moderate.to_string(), "moderate");
    }
}
