use serde::Serialize;

use super::error::PredictError;
use super::observation::{observe, Observation};
use crate::catalog::{Satellite, Tle};
use crate::kernel::{day_num, daynum_to_string, Geodetic, EARTH_RADIUS_KM};

/// Upper bound on propagations spent in one search.
pub const MAX_ITERATIONS: usize = 20_000;

/// Elevation (degrees) close enough to the horizon to call an event.
const HORIZON_TOLERANCE: f64 = 0.03;

/// Days skipped past LOS before looking for the next rise.
const NEXT_AOS_OFFSET: f64 = 0.014;

/// A rise and set of one satellite, as day numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassEvent {
    pub satellite: String,
    pub catalog_number: u32,
    pub aos: f64,
    pub los: f64,
    pub orbit_number: i64,
    pub aos_azimuth: f64,
    pub los_azimuth: f64,
    pub max_elevation: f64,
}

impl PassEvent {
    pub fn duration_minutes(&self) -> f64 {
        (self.los - self.aos) * 1440.0
    }
}

impl std::fmt::Display for PassEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} orbit {}: AOS {} az {:.0}, LOS {} az {:.0}, max el {:.0}",
            self.satellite,
            self.orbit_number,
            daynum_to_string(self.aos),
            self.aos_azimuth,
            daynum_to_string(self.los),
            self.los_azimuth,
            self.max_elevation
        )
    }
}

/// Whether the orbit ever reaches above the horizon of a station at
/// `station_lat` degrees.
pub fn aos_happens(tle: &Tle, station_lat: f64) -> bool {
    if tle.mean_motion == 0.0 {
        return false;
    }
    let mut inclination = tle.inclination;
    if inclination >= 90.0 {
        inclination = 180.0 - inclination;
    }
    let sma = 331.25 * ((1440.0 / tle.mean_motion).ln() * (2.0 / 3.0)).exp();
    let apogee = sma * (1.0 + tle.eccentricity) - EARTH_RADIUS_KM;

    (EARTH_RADIUS_KM / (apogee + EARTH_RADIUS_KM)).acos() + inclination.to_radians()
        > station_lat.to_radians().abs()
}

/// Rough decay estimate from the drag term: the element set is stale once
/// mean motion would have reached 16.666666 rev/day.
pub fn decayed(tle: &Tle, daynum: f64) -> bool {
    let epoch = day_num(1, 0, tle.epoch_year) as f64 + tle.epoch_day;
    epoch + (16.666666 - tle.mean_motion) / (10.0 * tle.drag.abs()) < daynum
}

pub fn geostationary(tle: &Tle) -> bool {
    (tle.mean_motion - 1.0027).abs() < 0.0002
}

/// Rejects satellites whose passes cannot be searched for.
pub fn check_predictable(
    sat: &Satellite,
    observer: &Geodetic,
    daynum: f64,
) -> Result<(), PredictError> {
    let tle = &sat.tle;
    if geostationary(tle) {
        return Err(PredictError::Geostationary(tle.name.clone()));
    }
    if !aos_happens(tle, observer.lat.to_degrees()) {
        return Err(PredictError::PassNeverOccurs(tle.name.clone()));
    }
    if decayed(tle, daynum) {
        return Err(PredictError::Decayed(tle.name.clone()));
    }
    Ok(())
}

/// Bounded sequence of observations of one satellite.
struct Search<'a> {
    sat: &'a mut Satellite,
    observer: &'a Geodetic,
    name: &'static str,
    iterations: usize,
}

impl<'a> Search<'a> {
    fn new(sat: &'a mut Satellite, observer: &'a Geodetic, name: &'static str) -> Self {
        Self {
            sat,
            observer,
            name,
            iterations: 0,
        }
    }

    fn at(&mut self, daynum: f64) -> Result<Observation, PredictError> {
        self.iterations += 1;
        if self.iterations > MAX_ITERATIONS {
            return Err(PredictError::Convergence {
                search: self.name,
                iterations: MAX_ITERATIONS,
            });
        }
        observe(self.sat, self.observer, daynum)
    }
}

/// Time of the next rise, or of the current pass's rise when the
/// satellite is already up.
pub fn find_aos(
    sat: &mut Satellite,
    observer: &Geodetic,
    start: f64,
) -> Result<f64, PredictError> {
    check_predictable(sat, observer, start)?;
    let mut search = Search::new(sat, observer, "AOS search");
    let mut daynum = start;
    let mut obs = search.at(daynum)?;

    // coarse steps until the satellite is nearly in range
    while obs.elevation < -1.0 {
        daynum -= 0.00035 * (obs.elevation * ((obs.altitude / 8400.0) + 0.46) - 2.0);
        obs = search.at(daynum)?;
    }

    while obs.elevation.abs() >= HORIZON_TOLERANCE {
        daynum -= obs.elevation * obs.altitude.sqrt() / 530000.0;
        obs = search.at(daynum)?;
    }
    Ok(daynum)
}

/// Refines the set time of a satellite that is near the horizon.
pub fn find_los(
    sat: &mut Satellite,
    observer: &Geodetic,
    start: f64,
) -> Result<f64, PredictError> {
    check_predictable(sat, observer, start)?;
    let mut search = Search::new(sat, observer, "LOS search");
    let mut daynum = start;
    let mut obs = search.at(daynum)?;

    loop {
        daynum += obs.elevation * obs.altitude.sqrt() / 502500.0;
        obs = search.at(daynum)?;
        if obs.elevation.abs() < HORIZON_TOLERANCE {
            return Ok(daynum);
        }
    }
}

/// Steps through the pass in progress until the satellite sets, then
/// refines the LOS time.
pub fn find_los2(
    sat: &mut Satellite,
    observer: &Geodetic,
    start: f64,
) -> Result<f64, PredictError> {
    let mut search = Search::new(sat, observer, "pass walk");
    let mut daynum = start;
    let mut obs = search.at(daynum)?;

    loop {
        daynum += pass_step(&obs, 25000.0);
        obs = search.at(daynum)?;
        if obs.elevation < 0.0 {
            break;
        }
    }
    find_los(sat, observer, daynum)
}

/// AOS of the pass after the one in progress.
pub fn next_aos(
    sat: &mut Satellite,
    observer: &Geodetic,
    start: f64,
) -> Result<f64, PredictError> {
    check_predictable(sat, observer, start)?;
    let los = find_los2(sat, observer, start)?;
    find_aos(sat, observer, los + NEXT_AOS_OFFSET)
}

/// Time step through a pass: shorter near the horizon and for low orbits.
pub(crate) fn pass_step(obs: &Observation, divisor: f64) -> f64 {
    (obs.elevation - 1.0).to_radians().cos() * obs.altitude.sqrt() / divisor
}

/// The pass that starts at or after `start`, or the one in progress.
pub fn predict_pass(
    sat: &mut Satellite,
    observer: &Geodetic,
    start: f64,
) -> Result<PassEvent, PredictError> {
    let aos = find_aos(sat, observer, start)?;
    let rise = observe(sat, observer, aos)?;

    let mut max_elevation = rise.elevation;
    let mut search = Search::new(sat, observer, "pass walk");
    let mut daynum = aos;
    let mut obs = rise;
    loop {
        daynum += pass_step(&obs, 25000.0);
        obs = search.at(daynum)?;
        if obs.elevation < 0.0 {
            break;
        }
        max_elevation = max_elevation.max(obs.elevation);
    }

    let los = find_los(sat, observer, daynum)?;
    let set = observe(sat, observer, los)?;

    Ok(PassEvent {
        satellite: sat.tle.name.clone(),
        catalog_number: sat.tle.catalog_number,
        aos,
        los,
        orbit_number: rise.orbit_number,
        aos_azimuth: rise.azimuth,
        los_azimuth: set.azimuth,
        max_elevation,
    })
}

/// Consecutive passes from `start` up to `end`.
pub fn predict_passes(
    sat: &mut Satellite,
    observer: &Geodetic,
    start: f64,
    end: f64,
) -> Result<Vec<PassEvent>, PredictError> {
    let mut passes = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let pass = predict_pass(sat, observer, cursor)?;
        if pass.aos > end {
            break;
        }
        cursor = pass.los + NEXT_AOS_OFFSET;
        passes.push(pass);
    }
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{iss, new_york, ISS_EPOCH};
    use approx::assert_abs_diff_eq;

    const AOS: f64 = 10491.950887;
    const LOS: f64 = 10491.956987;

    #[test]
    fn iss_heuristics() {
        let sat = iss();
        assert!(aos_happens(&sat.tle, 40.0));
        assert!(!aos_happens(&sat.tle, 85.0));
        assert!(!geostationary(&sat.tle));
        assert!(!decayed(&sat.tle, ISS_EPOCH + 30.0));
        // the drag term puts decay around 2020
        assert!(decayed(&sat.tle, ISS_EPOCH + 5000.0));
    }

    #[test]
    fn finds_the_first_rise_after_epoch() {
        let mut sat = iss();
        let observer = new_york();
        let aos = find_aos(&mut sat, &observer, ISS_EPOCH).unwrap();
        assert_abs_diff_eq!(aos, AOS, epsilon = 1e-4);

        let obs = observe(&mut sat, &observer, aos).unwrap();
        assert!(obs.elevation.abs() < HORIZON_TOLERANCE);
    }

    #[test]
    fn los_follows_aos() {
        let mut sat = iss();
        let observer = new_york();
        let aos = find_aos(&mut sat, &observer, ISS_EPOCH).unwrap();
        let los = find_los2(&mut sat, &observer, aos + 0.0001).unwrap();
        assert!(los > aos);
        assert_abs_diff_eq!(los, LOS, epsilon = 1e-4);

        let obs = observe(&mut sat, &observer, los).unwrap();
        assert!(obs.elevation.abs() < 0.05);
    }

    #[test]
    fn pass_event() {
        let mut sat = iss();
        let pass = predict_pass(&mut sat, &new_york(), ISS_EPOCH).unwrap();
        assert_abs_diff_eq!(pass.aos, AOS, epsilon = 1e-4);
        assert_abs_diff_eq!(pass.los, LOS, epsilon = 1e-4);
        assert!(pass.duration_minutes() > 5.0 && pass.duration_minutes() < 12.0);
        assert!(pass.max_elevation > 0.0);
        assert_eq!(pass.satellite, "ISS");
    }

    #[test]
    fn next_aos_skips_the_current_pass() {
        let mut sat = iss();
        let observer = new_york();
        let mid_pass = (AOS + LOS) / 2.0;
        assert!(observe(&mut sat, &observer, mid_pass).unwrap().is_above_horizon());

        let next = next_aos(&mut sat, &observer, mid_pass).unwrap();
        assert!(next > LOS + NEXT_AOS_OFFSET - 1e-3);
        assert!(next - LOS < 1.0);
    }

    #[test]
    fn passes_are_ordered() {
        let mut sat = iss();
        let passes = predict_passes(&mut sat, &new_york(), ISS_EPOCH, ISS_EPOCH + 1.0).unwrap();
        assert!(passes.len() >= 3);
        for pair in passes.windows(2) {
            assert!(pair[0].los < pair[1].aos);
        }
    }

    #[test]
    fn geostationary_satellites_never_pass() {
        let mut sat = iss();
        sat.tle.mean_motion = 1.0027;
        sat.tle.eccentricity = 0.0002;
        let err = find_aos(&mut sat, &new_york(), ISS_EPOCH).unwrap_err();
        assert!(matches!(err, PredictError::Geostationary(_)));
    }

    #[test]
    fn decayed_satellites_are_excluded() {
        let mut sat = iss();
        let err = predict_pass(&mut sat, &new_york(), ISS_EPOCH + 5000.0).unwrap_err();
        assert!(matches!(err, PredictError::Decayed(_)));
    }
}
