//! The resource catalog.
//!
//! A [`ResourceCatalog`] is an immutable, ordered snapshot of aid resources
//! (shelters, food, medical, hygiene, community). It is built once from a
//! tabular source and then only read: [`ResourceCatalog::query`] ranks
//! records by distance from an origin and [`ResourceCatalog::browse`] lists
//! them for the directory view.
//!
//! Loading is deliberately forgiving. A missing file yields an empty
//! catalog, and rows whose coordinates do not parse are dropped.
//!
//! ```
//! use openhealth::catalog::{CategoryFilter, Query, RawRow, ResourceCatalog};
//! use openhealth::geo::Coordinate;
//!
//! let catalog = ResourceCatalog::from_rows(vec![RawRow {
//!     name: Some("Demo Shelter".into()),
//!     category: Some("Shelter".into()),
//!     lat: Some("32.7157".into()),
//!     lon: Some("-117.1611".into()),
//!     ..RawRow::default()
//! }]);
//!
//! let origin = Coordinate { lat: 32.7157, lon: -117.1611 };
//! let matches = catalog.query(&Query::new(origin, 1.0).with_categories(CategoryFilter::All));
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].distance_km, 0.0);
//! ```

mod palette;
mod query;
mod shared;

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::geo::Coordinate;

pub use palette::{Palette, Rgb, KNOWN_CATEGORIES};
pub use query::{
    attach_distances, filter_categories, filter_text, order_by_distance, within_radius,
    CategoryFilter, Query, RankedMatch, SearchField, TextFilter,
};
pub use shared::SharedCatalog;

/// Name shown for records whose name is empty.
pub const UNKNOWN_NAME: &str = "unknown";

/// One row of the source dataset before validation.
///
/// Every column is optional text; typing happens in
/// [`ResourceCatalog::from_rows`]. Column names follow the published CSV
/// layout `name,type,address,lat,lon,hours,phone,notes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRow {
    /// Display name.
    pub name: Option<String>,
    /// Category tag, stored in the `type` column.
    #[serde(rename = "type")]
    pub category: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Latitude as written in the source.
    pub lat: Option<String>,
    /// Longitude as written in the source.
    pub lon: Option<String>,
    /// Opening hours.
    pub hours: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// A validated aid resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Display name. May be empty; see [`ResourceRecord::display_name`].
    pub name: String,
    /// Category tag from an open set.
    #[serde(rename = "type")]
    pub category: String,
    /// Street address.
    pub address: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Opening hours.
    pub hours: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl ResourceRecord {
    /// Validate a raw row, returning `None` when the coordinates are unusable.
    #[must_use]
    pub fn from_raw(row: RawRow) -> Option<Self> {
        let lat = coerce_degrees(row.lat.as_deref())?;
        let lon = coerce_degrees(row.lon.as_deref())?;
        let location = Coordinate::new(lat, lon)?;

        Some(Self {
            name: row.name.unwrap_or_default(),
            category: row.category.unwrap_or_default(),
            address: row.address.unwrap_or_default(),
            lat: location.lat,
            lon: location.lon,
            hours: row.hours,
            phone: row.phone,
            notes: row.notes,
        })
    }

    /// The record's position.
    #[must_use]
    pub fn location(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }

    /// Name for display, falling back to [`UNKNOWN_NAME`].
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNKNOWN_NAME
        } else {
            &self.name
        }
    }
}

/// Parse a coordinate component, rejecting blanks and non-finite values.
fn coerce_degrees(value: Option<&str>) -> Option<f64> {
    let parsed: f64 = value?.trim().parse().ok()?;
    parsed.is_finite().then_some(parsed)
}

/// Immutable, ordered set of resource records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCatalog {
    records: Vec<ResourceRecord>,
}

impl ResourceCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from raw rows, keeping source order and dropping rows
    /// whose latitude or longitude does not coerce to a valid number.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = RawRow>) -> Self {
        let mut dropped = 0usize;
        let records: Vec<_> = rows
            .into_iter()
            .filter_map(|row| {
                let record = ResourceRecord::from_raw(row);
                if record.is_none() {
                    dropped += 1;
                }
                record
            })
            .collect();

        debug!(kept = records.len(), dropped, "Built resource catalog");
        Self { records }
    }

    /// Build a catalog from CSV data with a header row.
    ///
    /// Rows that fail to decode are treated like rows with bad coordinates:
    /// they are skipped.
    #[must_use]
    pub fn from_reader(reader: impl Read) -> Self {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let rows = csv_reader
            .deserialize::<RawRow>()
            .enumerate()
            .filter_map(|(index, result)| match result {
                Ok(row) => Some(row),
                Err(err) => {
                    debug!(line = index + 2, %err, "Skipping undecodable row");
                    None
                }
            });

        Self::from_rows(rows)
    }

    /// Load a catalog from a CSV file.
    ///
    /// An absent or unreadable file is a normal starting state and yields an
    /// empty catalog.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No resource data at {}, starting empty", path.display());
            return Self::empty();
        }

        match File::open(path) {
            Ok(file) => {
                let catalog = Self::from_reader(file);
                info!(
                    "Loaded {} resources from {}",
                    catalog.len(),
                    path.display()
                );
                catalog
            }
            Err(err) => {
                warn!("Could not read {}: {err}; starting empty", path.display());
                Self::empty()
            }
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in load order.
    #[must_use]
    pub fn records(&self) -> &[ResourceRecord] {
        &self.records
    }

    /// Record at a load-order position.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ResourceRecord> {
        self.records.get(index)
    }

    /// Distinct non-empty categories present, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let set: std::collections::BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.category.as_str())
            .filter(|c| !c.is_empty())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Rank records around an origin.
    ///
    /// Runs category filter, text filter, distance, radius threshold and a
    /// stable ascending sort, in that order, then applies the optional cap.
    #[must_use]
    pub fn query(&self, query: &Query) -> Vec<RankedMatch<'_>> {
        let candidates = filter_categories(self.records.iter(), &query.categories);
        let candidates = filter_text(candidates, &query.text);
        let matches = attach_distances(candidates, query.origin);
        let matches = within_radius(matches, query.radius_km);
        let mut matches = order_by_distance(matches);

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        matches
    }

    /// Directory listing: category and text filters only, in load order.
    #[must_use]
    pub fn browse(&self, categories: &CategoryFilter, text: &TextFilter) -> Vec<&ResourceRecord> {
        let candidates = filter_categories(self.records.iter(), categories);
        filter_text(candidates, text)
    }
}

impl FromIterator<ResourceRecord> for ResourceCatalog {
    fn from_iter<I: IntoIterator<Item = ResourceRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Write records as CSV in the source column layout, header first.
///
/// The output loads back with [`ResourceCatalog::from_reader`].
///
/// # Errors
///
/// Returns an error if a record cannot be encoded or the writer fails.
pub fn write_csv<'a, W: Write>(
    records: impl IntoIterator<Item = &'a ResourceRecord>,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
