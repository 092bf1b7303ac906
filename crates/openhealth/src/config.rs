//! Configuration management for openhealth.
//!
//! Configuration is loaded with figment from defaults, a TOML file and
//! `OPENHEALTH_` environment variables. The two deployments this tool grew
//! out of differed only in default radius and marker colours, so both are
//! plain settings here.

use std::collections::BTreeMap;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{Palette, KNOWN_CATEGORIES};
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::weather::Thresholds;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "openhealth";

/// Default record database file name.
const DATABASE_FILE_NAME: &str = "openhealth.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `OPENHEALTH_`, sections split on `__`)
/// 2. TOML config file at `~/.config/openhealth/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resource dataset and map defaults.
    pub catalog: CatalogConfig,
    /// Marker colours.
    pub palette: PaletteConfig,
    /// Weather advisory thresholds.
    pub weather: WeatherConfig,
    /// Health record store.
    pub records: RecordsConfig,
}

/// Resource dataset and query defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// CSV file with columns `name,type,address,lat,lon,hours,phone,notes`.
    pub data_path: PathBuf,
    /// Origin used when the caller gives no position.
    pub default_origin: Coordinate,
    /// Radius used when the caller gives none, in kilometers.
    pub default_radius_km: f64,
    /// Smallest radius a caller may ask for.
    pub min_radius_km: f64,
    /// Largest radius a caller may ask for.
    pub max_radius_km: f64,
}

/// Marker colour table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Category → RGB.
    pub colors: BTreeMap<String, [u8; 3]>,
    /// Colour for categories not in `colors`.
    pub fallback: [u8; 3],
}

/// Weather advisory settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// At or below this temperature (°C) conditions count as cold.
    pub cold_max_c: f64,
    /// At or above this temperature (°C) conditions count as hot.
    pub heat_min_c: f64,
    /// Description keyword that also means cold, matched case-insensitively.
    pub cold_keyword: String,
    /// How many nearby resources an advisory lists.
    pub recommend_limit: usize,
    /// City passed to the weather provider by default.
    pub default_city: String,
}

/// Health record store settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// Path to the `SQLite` database.
    /// Defaults to `~/.local/share/openhealth/openhealth.db`
    pub database_path: Option<PathBuf>,
    /// If set, printed cards encode `<prefix><id>` instead of the bare id.
    pub card_url_prefix: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data").join("resources_sample.csv"),
            default_origin: Coordinate {
                lat: 32.7157,
                lon: -117.1611,
            },
            default_radius_km: 10.0,
            min_radius_km: 1.0,
            max_radius_km: 30.0,
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        let palette = Palette::default();
        Self {
            colors: KNOWN_CATEGORIES
                .iter()
                .map(|name| ((*name).to_string(), palette.color_for(name).0))
                .collect(),
            fallback: palette.fallback().0,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            cold_max_c: 8.0,
            heat_min_c: 35.0,
            cold_keyword: "cold".to_string(),
            recommend_limit: 5,
            default_city: "San Diego, US".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("OPENHEALTH_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let catalog = &self.catalog;
        if catalog.min_radius_km.is_nan() || catalog.min_radius_km <= 0.0 {
            return Err(Error::config_validation(
                "catalog.min_radius_km must be greater than 0",
            ));
        }
        if catalog.min_radius_km > catalog.max_radius_km {
            return Err(Error::config_validation(format!(
                "catalog.min_radius_km ({}) cannot be greater than catalog.max_radius_km ({})",
                catalog.min_radius_km, catalog.max_radius_km
            )));
        }
        if !(catalog.min_radius_km..=catalog.max_radius_km).contains(&catalog.default_radius_km) {
            return Err(Error::config_validation(format!(
                "catalog.default_radius_km ({}) must lie within [{}, {}]",
                catalog.default_radius_km, catalog.min_radius_km, catalog.max_radius_km
            )));
        }
        if !catalog.default_origin.is_valid() {
            return Err(Error::config_validation(format!(
                "catalog.default_origin {} is not a valid coordinate",
                catalog.default_origin
            )));
        }

        let weather = &self.weather;
        if weather.cold_max_c >= weather.heat_min_c {
            return Err(Error::config_validation(format!(
                "weather.cold_max_c ({}) must be below weather.heat_min_c ({})",
                weather.cold_max_c, weather.heat_min_c
            )));
        }
        if weather.recommend_limit == 0 {
            return Err(Error::config_validation(
                "weather.recommend_limit must be greater than 0",
            ));
        }
        if weather.cold_keyword.trim().is_empty() {
            return Err(Error::config_validation(
                "weather.cold_keyword must not be empty",
            ));
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.records
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// The configured marker palette.
    #[must_use]
    pub fn palette(&self) -> Palette {
        Palette::from(&self.palette)
    }

    /// The configured weather thresholds.
    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cold_max_c: self.weather.cold_max_c,
            heat_min_c: self.weather.heat_min_c,
            cold_keyword: self.weather.cold_keyword.clone(),
        }
    }

    /// Clamp a requested radius into the configured bounds.
    ///
    /// Returns the radius to use and whether it had to be adjusted.
    #[must_use]
    pub fn clamp_radius(&self, requested_km: f64) -> (f64, bool) {
        let catalog = &self.catalog;
        if requested_km.is_nan() {
            return (catalog.default_radius_km, true);
        }
        let clamped = requested_km.clamp(catalog.min_radius_km, catalog.max_radius_km);
        (clamped, (clamped - requested_km).abs() > f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_catalog_config() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.default_radius_km, 10.0);
        assert_eq!(catalog.min_radius_km, 1.0);
        assert_eq!(catalog.max_radius_km, 30.0);
        assert_eq!(catalog.default_origin.lat, 32.7157);
        assert!(catalog.data_path.ends_with("resources_sample.csv"));
    }

    #[test]
    fn test_default_weather_config() {
        let weather = WeatherConfig::default();
        assert_eq!(weather.cold_max_c, 8.0);
        assert_eq!(weather.heat_min_c, 35.0);
        assert_eq!(weather.recommend_limit, 5);
        assert_eq!(weather.cold_keyword, "cold");
    }

    #[test]
    fn test_default_palette_config() {
        let palette = PaletteConfig::default();
        assert_eq!(palette.colors.len(), 5);
        assert_eq!(palette.colors["Shelter"], [200, 0, 0]);
        assert_eq!(palette.fallback, [80, 80, 80]);
    }

    #[test]
    fn test_validate_zero_min_radius() {
        let mut config = Config::default();
        config.catalog.min_radius_km = 0.0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_radius_km"));
    }

    #[test]
    fn test_validate_inverted_radius_bounds() {
        let mut config = Config::default();
        config.catalog.min_radius_km = 50.0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_radius_km"));
    }

    #[test]
    fn test_validate_default_radius_out_of_bounds() {
        let mut config = Config::default();
        config.catalog.default_radius_km = 45.0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_radius_km"));
    }

    #[test]
    fn test_validate_bad_origin() {
        let mut config = Config::default();
        config.catalog.default_origin = Coordinate {
            lat: 120.0,
            lon: 0.0,
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("default_origin"));
    }

    #[test]
    fn test_validate_overlapping_bands() {
        let mut config = Config::default();
        config.weather.cold_max_c = 40.0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("cold_max_c"));
    }

    #[test]
    fn test_validate_zero_recommend_limit() {
        let mut config = Config::default();
        config.weather.recommend_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_blank_keyword() {
        let mut config = Config::default();
        config.weather.cold_keyword = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamp_radius() {
        let config = Config::default();
        assert_eq!(config.clamp_radius(5.0), (5.0, false));
        assert_eq!(config.clamp_radius(0.2), (1.0, true));
        assert_eq!(config.clamp_radius(100.0), (30.0, true));
        assert_eq!(config.clamp_radius(f64::NAN), (10.0, true));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config
            .database_path()
            .to_string_lossy()
            .contains("openhealth.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.records.database_path = Some(PathBuf::from("/custom/records.db"));
        assert_eq!(config.database_path(), PathBuf::from("/custom/records.db"));
    }

    #[test]
    fn test_thresholds_from_config() {
        let thresholds = Config::default().thresholds();
        assert_eq!(thresholds, Thresholds::default());
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_toml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[catalog]
default_radius_km = 15.0
data_path = "/srv/resources.csv"

[catalog.default_origin]
lat = 40.0
lon = -74.0

[palette.colors]
Laundry = [1, 2, 3]

[weather]
recommend_limit = 3
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.catalog.default_radius_km, 15.0);
        assert_eq!(config.catalog.data_path, PathBuf::from("/srv/resources.csv"));
        assert_eq!(config.catalog.default_origin.lat, 40.0);
        assert_eq!(config.weather.recommend_limit, 3);
        assert_eq!(config.palette.colors["Laundry"], [1, 2, 3]);
        assert_eq!(config.palette.colors["Shelter"], [200, 0, 0]);
    }

    #[test]
    fn test_load_invalid_toml_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[catalog]\nmax_radius_km = 0.5\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_serialize_roundtrips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("default_radius_km"));
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
