//! Properties of distance ranking and catalog loading, exercised through
//! the public API with on-disk CSV fixtures.

use std::io::Write;

use openhealth::catalog::{CategoryFilter, Query, ResourceCatalog, TextFilter};
use openhealth::geo::{haversine_km, Coordinate};
use openhealth::weather::{advise, Band, Thresholds, WeatherReport};
use tempfile::NamedTempFile;

const HEADER: &str = "name,type,address,lat,lon,hours,phone,notes";

/// Kilometres per degree of latitude on the reference sphere.
const KM_PER_DEGREE: f64 = 6371.0 * std::f64::consts::PI / 180.0;

const ORIGIN: Coordinate = Coordinate {
    lat: 32.7157,
    lon: -117.1611,
};

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// A row `km` kilometres due north of [`ORIGIN`].
fn row_north(name: &str, category: &str, km: f64) -> String {
    format!(
        "{name},{category},{name} Ave,{},{},,,",
        ORIGIN.lat + km / KM_PER_DEGREE,
        ORIGIN.lon
    )
}

fn mixed_catalog() -> ResourceCatalog {
    let rows = [
        row_north("Harbor Shelter", "Shelter", 0.5),
        row_north("Food Bank", "Food", 2.0),
        row_north("Free Clinic", "Medical", 4.0),
        row_north("Showers", "Hygiene", 6.0),
        row_north("Drop-in Center", "Community", 8.0),
        row_north("Laundromat", "Laundry", 12.0),
        row_north("North Shelter", "Shelter", 25.0),
    ];
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = write_csv(&refs);
    ResourceCatalog::load(file.path())
}

fn at(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).expect("valid test coordinate")
}

fn sample_points() -> Vec<Coordinate> {
    vec![
        ORIGIN,
        at(34.0522, -118.2437),
        at(-33.8688, 151.2093),
        at(51.5074, -0.1278),
        at(0.0, 180.0),
        at(90.0, 0.0),
        at(-90.0, 45.0),
    ]
}

#[test]
fn distance_is_symmetric() {
    let points = sample_points();
    for a in &points {
        for b in &points {
            assert_eq!(a.distance_km(b), b.distance_km(a), "{a} vs {b}");
        }
    }
}

#[test]
fn distance_to_self_is_zero() {
    for a in sample_points() {
        assert_eq!(haversine_km(a.lat, a.lon, a.lat, a.lon), 0.0);
    }
}

#[test]
fn distance_satisfies_triangle_inequality() {
    let points = sample_points();
    for a in &points {
        for b in &points {
            for c in &points {
                let direct = a.distance_km(c);
                let detour = a.distance_km(b) + b.distance_km(c);
                assert!(direct <= detour + 1e-6, "{a} -> {b} -> {c}");
            }
        }
    }
}

#[test]
fn growing_radius_never_drops_results() {
    let catalog = mixed_catalog();
    let mut previous: Vec<String> = Vec::new();
    for radius in [0.1, 1.0, 3.0, 5.0, 10.0, 20.0, 30.0, 100.0] {
        let names: Vec<String> = catalog
            .query(&Query::new(ORIGIN, radius))
            .iter()
            .map(|m| m.record.name.clone())
            .collect();
        for name in &previous {
            assert!(names.contains(name), "{name} dropped at radius {radius}");
        }
        previous = names;
    }
    assert_eq!(previous.len(), catalog.len());
}

#[test]
fn full_category_set_equals_allow_all() {
    let catalog = mixed_catalog();
    let all = catalog.query(&Query::new(ORIGIN, 30.0));
    let explicit = catalog.query(
        &Query::new(ORIGIN, 30.0).with_categories(CategoryFilter::only(catalog.categories())),
    );
    assert_eq!(all, explicit);
}

#[test]
fn results_are_ordered_by_distance() {
    let catalog = mixed_catalog();
    let queries = [
        Query::new(ORIGIN, 30.0),
        Query::new(at(32.9, -117.1611), 30.0),
        Query::new(ORIGIN, 30.0).with_text(TextFilter::map_view("shelter")),
    ];
    for query in &queries {
        let matches = catalog.query(query);
        assert!(matches
            .windows(2)
            .all(|pair| pair[0].distance_km <= pair[1].distance_km));
    }
}

#[test]
fn ties_keep_load_order() {
    let file = write_csv(&[
        "First,Food,A,32.72,-117.16,,,",
        "Second,Shelter,B,32.72,-117.16,,,",
        "Third,Food,C,32.72,-117.16,,,",
    ]);
    let catalog = ResourceCatalog::load(file.path());
    let names: Vec<_> = catalog
        .query(&Query::new(ORIGIN, 5.0))
        .iter()
        .map(|m| m.record.name.clone())
        .collect();
    assert_eq!(names, ["First", "Second", "Third"]);
}

#[test]
fn load_missing_source_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = ResourceCatalog::load(dir.path().join("nope.csv"));
    assert!(catalog.is_empty());
    assert!(catalog.query(&Query::new(ORIGIN, 30.0)).is_empty());
}

#[test]
fn load_empty_source_is_empty() {
    let file = NamedTempFile::new().unwrap();
    assert!(ResourceCatalog::load(file.path()).is_empty());

    let header_only = write_csv(&[]);
    assert!(ResourceCatalog::load(header_only.path()).is_empty());
}

#[test]
fn load_skips_rows_without_coordinates() {
    let file = write_csv(&[
        "Good,Food,1 Main St,32.7,-117.1,9-17,555-0100,",
        "No lat,Food,2 Main St,,-117.1,,,",
        "No lon,Food,3 Main St,32.7,,,,",
        "Text lat,Food,4 Main St,abc,-117.1,,,",
        "Too far north,Food,5 Main St,95.0,-117.1,,,",
        "Short row,Food",
        "Also good,Shelter,6 Main St, 32.71 , -117.12 ,,,Beds at 7pm",
    ]);
    let catalog = ResourceCatalog::load(file.path());
    let names: Vec<_> = catalog.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Good", "Also good"]);
    assert_eq!(catalog.records()[1].notes.as_deref(), Some("Beds at 7pm"));
}

#[test]
fn single_record_at_origin() {
    let file = write_csv(&["Demo Shelter,Shelter,Downtown,32.7157,-117.1611,24h,,"]);
    let catalog = ResourceCatalog::load(file.path());
    let matches = catalog.query(&Query::new(ORIGIN, 1.0));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].record.name, "Demo Shelter");
    assert_eq!(matches[0].distance_km, 0.0);
}

#[test]
fn radius_excludes_farther_record() {
    let rows = [row_north("Near", "Food", 5.0), row_north("Far", "Food", 15.0)];
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = write_csv(&refs);
    let catalog = ResourceCatalog::load(file.path());

    let matches = catalog.query(&Query::new(ORIGIN, 10.0));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].record.name, "Near");
    assert!((matches[0].distance_km - 5.0).abs() < 1e-6);
}

#[test]
fn cold_temperature_recommends_nearest_five_shelters() {
    let mut rows: Vec<String> = (1..=7_u8)
        .map(|i| row_north(&format!("Shelter {i}"), "Shelter", f64::from(i)))
        .collect();
    rows.push(row_north("Soup Kitchen", "Food", 0.1));
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let file = write_csv(&refs);
    let catalog = ResourceCatalog::load(file.path());

    let report = WeatherReport {
        temp_c: 5.0,
        description: "clear sky".into(),
    };
    let advisory = advise(&catalog, report, ORIGIN, 10.0, 5, &Thresholds::default());

    assert_eq!(advisory.band, Band::Cold);
    let names: Vec<_> = advisory
        .recommendations
        .iter()
        .map(|m| m.record.name.as_str())
        .collect();
    assert_eq!(
        names,
        ["Shelter 1", "Shelter 2", "Shelter 3", "Shelter 4", "Shelter 5"]
    );
}

#[test]
fn cold_description_overrides_moderate_temperature() {
    let catalog = mixed_catalog();
    let report = WeatherReport {
        temp_c: 20.0,
        description: "Cold front approaching".into(),
    };
    let advisory = advise(&catalog, report, ORIGIN, 30.0, 5, &Thresholds::default());

    assert_eq!(advisory.band, Band::Cold);
    assert!(advisory
        .recommendations
        .iter()
        .all(|m| m.record.category == "Shelter"));
    assert_eq!(advisory.recommendations.len(), 2);
}
