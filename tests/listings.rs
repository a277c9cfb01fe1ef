//! Command line flows through the public API: load a station directory,
//! merge an update file, then run the quick listings.

use std::fs;
use std::path::Path;

use sat_predict::catalog::{auto_update, Catalog, CatalogPaths};
use sat_predict::predict::quick::{quick_doppler100, quick_find, quick_predict_json};
use sat_predict::predict::{PredictError, Visibility};
use tempfile::TempDir;

const ISS_LINE1: &str = "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
const ISS_LINE2: &str = "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";
const NEWER_LINE1: &str = "1 25544U 98067A   08265.51782528 -.00002182  00000-0 -11606-4 0  2928";
const NOW: i64 = 1_221_913_540;

fn station() -> (TempDir, CatalogPaths) {
    let dir = tempfile::tempdir().unwrap();
    let paths = CatalogPaths {
        tle: dir.path().join("predict.tle"),
        qth: dir.path().join("predict.qth"),
        db: Some(dir.path().join("predict.db")),
    };
    fs::write(&paths.qth, "TEST\n40.0\n74.0\n0\n").unwrap();
    fs::write(
        &paths.tle,
        format!("ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\n"),
    )
    .unwrap();
    fs::write(
        paths.db.as_ref().unwrap(),
        "ISS (ZARYA)\n25544\nNo\nFM voice\n145.2, 145.2\n437.8, 437.8\nNo\nNo\nend\nend\n",
    )
    .unwrap();
    (dir, paths)
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn position_listing_over_a_range() {
    let (_dir, paths) = station();
    let mut catalog = Catalog::load(paths).unwrap();

    let lines = quick_find(&mut catalog, &args(&["ISS", "(ZARYA)", "1221913540", "+2"]), NOW)
        .unwrap();
    assert_eq!(lines.len(), 3);
    for (i, line) in lines.iter().enumerate() {
        let unix: i64 = line.split_whitespace().next().unwrap().parse().unwrap();
        assert_eq!(unix, NOW + i as i64);
    }

    let by_number = quick_find(&mut catalog, &args(&["25544"]), NOW).unwrap();
    assert_eq!(by_number[0], lines[0]);
}

#[test]
fn pass_as_json_values() {
    let (_dir, paths) = station();
    let mut catalog = Catalog::load(paths).unwrap();
    assert_eq!(catalog.satellites()[0].db.transponders.len(), 1);

    let points = quick_predict_json(&mut catalog, &args(&["25544", "0"]), NOW).unwrap();
    assert!(points.len() > 3);
    assert!(points.windows(2).all(|w| w[1].daynum > w[0].daynum));
    assert!(points.iter().all(|p| p.elevation > -1.0));
    assert!(points.iter().all(|p| p.visibility() != Visibility::Visible || p.elevation >= 0.0));

    let json = serde_json::to_value(&points).unwrap();
    assert!(json[0]["azimuth"].is_number());
}

#[test]
fn doppler_listing_changes_sign() {
    let (_dir, paths) = station();
    let mut catalog = Catalog::load(paths).unwrap();

    let lines = quick_doppler100(&mut catalog, &args(&["ISS (ZARYA)"]), NOW).unwrap();
    let shifts: Vec<f64> = lines
        .iter()
        .map(|line| line.trim_end().rsplit(',').next().unwrap().parse().unwrap())
        .collect();
    assert!(shifts.first().unwrap() > &0.0);
    assert!(shifts.last().unwrap() < &0.0);
}

#[test]
fn unknown_satellite() {
    let (_dir, paths) = station();
    let mut catalog = Catalog::load(paths).unwrap();
    let err = quick_find(&mut catalog, &args(&["MIR"]), NOW).unwrap_err();
    assert!(matches!(err, PredictError::UnknownSatellite(name) if name == "MIR"));
}

#[test]
fn update_file_is_merged_and_saved() {
    let (dir, paths) = station();
    let tle_path = paths.tle.clone();
    let mut catalog = Catalog::load(paths.clone()).unwrap();

    let update = dir.path().join("nasa.txt");
    fs::write(&update, format!("{NEWER_LINE1}\n{ISS_LINE2}\n")).unwrap();
    let summary = auto_update(&mut catalog, &update).unwrap();
    assert_eq!((summary.read, summary.updated), (1, 1));

    let saved = fs::read_to_string(&tle_path).unwrap();
    assert!(saved.starts_with("ISS (ZARYA)\n"));
    assert!(saved.contains(NEWER_LINE1));

    let reloaded = Catalog::load(paths).unwrap();
    assert_eq!(reloaded.satellites()[0].tle.line1, NEWER_LINE1);
}

#[test]
fn missing_station_file() {
    let (_dir, mut paths) = station();
    paths.qth = Path::new("/nonexistent/predict.qth").to_path_buf();
    assert!(Catalog::load(paths).is_err());
}
