//! `openhealth` - Street-level resource locator and minimal health records
//!
//! This library loads a catalog of aid resources (shelters, food, medical,
//! hygiene, community services), answers "what is near me" queries ranked
//! by great-circle distance, turns weather conditions into targeted
//! recommendations, and keeps a small anonymised health profile store that
//! providers can look up by a short id.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod geo;
pub mod logging;
pub mod map;
pub mod records;
pub mod weather;

pub use catalog::{
    CategoryFilter, Palette, Query, RankedMatch, ResourceCatalog, ResourceRecord, SharedCatalog,
    TextFilter,
};
pub use config::Config;
pub use error::{Error, Result};
pub use geo::{haversine_km, Coordinate};
pub use logging::init_logging;
pub use map::MapView;
pub use records::{RecordStats, RecordStore};
pub use weather::{advise, Advisory, Band, WeatherProvider, WeatherReport};
