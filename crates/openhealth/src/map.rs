//! Marker data for an external map renderer.
//!
//! Nothing here draws anything. [`MapView`] is the JSON-ready hand-off: a
//! centre, a zoom level and one marker per ranked match, each already
//! coloured and carrying its tooltip text.

use serde::Serialize;

use crate::catalog::{Palette, RankedMatch, Rgb};
use crate::geo::Coordinate;

/// Zoom level the renderer should open at.
pub const DEFAULT_ZOOM: u8 = 12;

/// Marker radius hint for the renderer, in meters.
pub const MARKER_RADIUS_M: u32 = 80;

/// One resource on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    /// `[lon, lat]`, the order most web map libraries expect.
    pub position: [f64; 2],
    /// Fill colour.
    pub color: Rgb,
    /// Multi-line tooltip.
    pub tooltip: String,
    /// Resource name (or "unknown").
    pub name: String,
    /// Category tag.
    #[serde(rename = "type")]
    pub category: String,
    /// Distance from the query origin.
    pub distance_km: f64,
}

impl MapMarker {
    /// Build a marker for a ranked match.
    #[must_use]
    pub fn from_match(ranked: &RankedMatch<'_>, palette: &Palette) -> Self {
        let record = ranked.record;
        Self {
            position: [record.lon, record.lat],
            color: palette.color_for(&record.category),
            tooltip: tooltip(ranked),
            name: record.display_name().to_string(),
            category: record.category.clone(),
            distance_km: ranked.distance_km,
        }
    }
}

/// Tooltip text: name, type, address, phone, hours, notes.
#[must_use]
pub fn tooltip(ranked: &RankedMatch<'_>) -> String {
    let record = ranked.record;
    [
        record.display_name().to_string(),
        record.category.clone(),
        record.address.clone(),
        format!("Tel: {}", record.phone.as_deref().unwrap_or_default()),
        format!("Hours: {}", record.hours.as_deref().unwrap_or_default()),
        record.notes.clone().unwrap_or_default(),
    ]
    .join("\n")
}

/// Everything a renderer needs for one map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// Where the view is centred; the query origin.
    pub center: Coordinate,
    /// Initial zoom.
    pub zoom: u8,
    /// Marker radius hint in meters.
    pub marker_radius_m: u32,
    /// Markers in ranking order.
    pub markers: Vec<MapMarker>,
}

impl MapView {
    /// Build a view centred on `center` from ranked matches.
    #[must_use]
    pub fn new(center: Coordinate, matches: &[RankedMatch<'_>], palette: &Palette) -> Self {
        Self {
            center,
            zoom: DEFAULT_ZOOM,
            marker_radius_m: MARKER_RADIUS_M,
            markers: matches
                .iter()
                .map(|m| MapMarker::from_match(m, palette))
                .collect(),
        }
    }
}
