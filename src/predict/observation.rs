use serde::Serialize;

use super::doppler;
use super::error::PredictError;
use crate::catalog::Satellite;
use crate::kernel::{
    day_num_to_julian, julian_date_of_epoch, lat_lon_alt, magnitude, sat_eclipsed,
    solar_position, topocentric_obs, Geodetic, EARTH_RADIUS_KM, MINUTES_PER_DAY, TWO_PI,
};

/// Diameter-scaled footprint: `FOOTPRINT_SCALE * acos(Re / (Re + alt))`
/// is the width in km of the area that can see the satellite.
const FOOTPRINT_SCALE: f64 = 12756.33;

/// Sun elevation (degrees) below which a sunlit satellite is visible to
/// the naked eye.
const TWILIGHT_ELEVATION: f64 = -12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    /// Sunlit, above the horizon, with a dark sky at the station.
    Visible,
    /// Sunlit otherwise.
    Day,
    /// In the earth's shadow.
    Night,
}

impl Visibility {
    pub fn as_char(self) -> char {
        match self {
            Visibility::Visible => 'V',
            Visibility::Day => 'D',
            Visibility::Night => 'N',
        }
    }
}

/// Everything the trackers and quick routines report about one satellite
/// at one instant. Angles in degrees, distances in km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub daynum: f64,
    pub azimuth: f64,
    pub elevation: f64,
    pub range: f64,
    /// km/s, positive when receding.
    pub range_rate: f64,
    pub latitude: f64,
    /// East longitude, 0..360.
    pub longitude: f64,
    pub altitude: f64,
    /// km/s.
    pub velocity: f64,
    pub sunlit: bool,
    pub eclipse_depth: f64,
    /// Mean anomaly style phase from perigee, 0..360.
    pub phase: f64,
    pub squint: Option<f64>,
    pub footprint: f64,
    pub orbit_number: i64,
    pub sun_azimuth: f64,
    pub sun_elevation: f64,
}

impl Observation {
    pub fn visibility(&self) -> Visibility {
        if !self.sunlit {
            Visibility::Night
        } else if self.sun_elevation <= TWILIGHT_ELEVATION && self.elevation >= 0.0 {
            Visibility::Visible
        } else {
            Visibility::Day
        }
    }

    /// Single character sunlight flag of the quick listings: `+` when the
    /// pass is visible, `*` when merely sunlit, blank in eclipse. Uses the
    /// rounded elevation.
    pub fn sun_flag(&self) -> char {
        if !self.sunlit {
            ' '
        } else if self.sun_elevation <= TWILIGHT_ELEVATION
            && self.elevation.round_ties_even() >= 0.0
        {
            '+'
        } else {
            '*'
        }
    }

    /// Phase in 1/256 orbit units.
    pub fn phase256(&self) -> i32 {
        (256.0 * self.phase / 360.0).round_ties_even() as i32
    }

    /// Doppler shift in Hz at 100 MHz.
    pub fn doppler100(&self) -> f64 {
        doppler::doppler100(self.range_rate)
    }

    pub fn is_above_horizon(&self) -> bool {
        self.elevation >= 0.0
    }
}

/// Computes position, look angles and illumination of `sat` at `daynum`
/// for an observer.
pub fn observe(
    sat: &mut Satellite,
    observer: &Geodetic,
    daynum: f64,
) -> Result<Observation, PredictError> {
    let jd = day_num_to_julian(daynum);
    let age = jd - julian_date_of_epoch(sat.tle.epoch());
    let state = sat.propagate(age * MINUTES_PER_DAY)?;

    let look = topocentric_obs(&state.position, &state.velocity, observer, jd);
    let geodetic = lat_lon_alt(&state.position, jd);

    let solar = solar_position(jd);
    let sun = topocentric_obs(&solar, &[0.0; 3], observer, jd);
    let (eclipsed, depth) = sat_eclipsed(&state.position, &solar);

    let squint = sat
        .db
        .squint
        .map(|(alat, alon)| state.orientation.squint(alat, alon, &look.range_vector));

    let tle = &sat.tle;
    let revolutions = (tle.mean_motion + age * tle.bstar) * age + tle.mean_anomaly / 360.0;
    let orbit_number = revolutions.floor() as i64 + tle.orbit_number as i64;

    let altitude = geodetic.alt;
    Ok(Observation {
        daynum,
        azimuth: look.azimuth.to_degrees(),
        elevation: look.elevation.to_degrees(),
        range: look.range,
        range_rate: look.range_rate,
        latitude: geodetic.lat.to_degrees(),
        longitude: geodetic.lon.to_degrees(),
        altitude,
        velocity: magnitude(&state.velocity),
        sunlit: !eclipsed,
        eclipse_depth: depth.to_degrees(),
        phase: 360.0 * state.phase / TWO_PI,
        squint,
        footprint: FOOTPRINT_SCALE * (EARTH_RADIUS_KM / (EARTH_RADIUS_KM + altitude)).acos(),
        orbit_number,
        sun_azimuth: sun.azimuth.to_degrees(),
        sun_elevation: sun.elevation.to_degrees(),
    })
}
