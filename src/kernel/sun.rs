use serde::Serialize;

use super::{
    angle, arcsin, day_num_to_julian, lat_lon_alt, magnitude, modulus, radec, sub,
    topocentric_obs, Geodetic, Vector3, AU_KM, EARTH_RADIUS_KM, SECONDS_PER_DAY, SUN_RADIUS_KM,
    TWO_PI,
};

/// Difference between ephemeris time and UT in seconds, least squares fit
/// over 1950-1991.
fn delta_et(year: f64) -> f64 {
    26.465 + 0.747622 * (year - 1950.0) + 1.886913 * (TWO_PI * (year - 1975.0) / 33.0).sin()
}

/// ECI position of the sun (km) at Julian date `jd`.
pub fn solar_position(jd: f64) -> Vector3 {
    let mjd = jd - 2415020.0;
    let year = 1900.0 + mjd / 365.25;
    let t = (mjd + delta_et(year) / SECONDS_PER_DAY) / 36525.0;

    let m = modulus(
        358.47583 + modulus(35999.04975 * t, 360.0) - (0.000150 + 0.0000033 * t) * t * t,
        360.0,
    )
    .to_radians();
    let l = modulus(279.69668 + modulus(36000.76892 * t, 360.0) + 0.0003025 * t * t, 360.0)
        .to_radians();
    let e = 0.01675104 - (0.0000418 + 0.000000126 * t) * t;
    let c = ((1.919460 - (0.004789 + 0.000014 * t) * t) * m.sin()
        + (0.020094 - 0.000100 * t) * (2.0 * m).sin()
        + 0.000293 * (3.0 * m).sin())
    .to_radians();
    let o = modulus(259.18 - 1934.142 * t, 360.0).to_radians();
    let lsa = modulus(l + c - (0.00569 - 0.00479 * o.sin()).to_radians(), TWO_PI);
    let nu = modulus(m + c, TWO_PI);
    let r = AU_KM * 1.0000002 * (1.0 - e * e) / (1.0 + e * nu.cos());
    let eps = (23.452294 - (0.0130125 + (0.00000164 - 0.000000503 * t) * t) * t
        + 0.00256 * o.cos())
    .to_radians();

    [
        r * lsa.cos(),
        r * lsa.sin() * eps.cos(),
        r * lsa.sin() * eps.sin(),
    ]
}

/// Whether a satellite at `pos` is in the earth's shadow, and the eclipse
/// depth in radians (positive inside the umbra).
pub fn sat_eclipsed(pos: &Vector3, sun: &Vector3) -> (bool, f64) {
    let sd_earth = arcsin(EARTH_RADIUS_KM / magnitude(pos));
    let rho = sub(sun, pos);
    let sd_sun = arcsin(SUN_RADIUS_KM / magnitude(&rho));
    let earth = [-pos[0], -pos[1], -pos[2]];
    let delta = angle(sun, &earth);
    let depth = sd_earth - sd_sun - delta;

    (sd_earth >= sd_sun && depth >= 0.0, depth)
}

/// Sun as seen from a ground station. Angles in degrees, longitude west.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SunPosition {
    pub azimuth: f64,
    pub elevation: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub right_ascension: f64,
    pub declination: f64,
    /// Distance in AU.
    pub range: f64,
}

impl SunPosition {
    pub fn find(daynum: f64, observer: &Geodetic) -> Self {
        let jd = day_num_to_julian(daynum);
        let solar = solar_position(jd);
        let zero = [0.0; 3];

        let obs = topocentric_obs(&solar, &zero, observer, jd);
        let sub_solar = lat_lon_alt(&solar, jd);
        let (ra, dec) = radec(&solar, &zero, observer, jd);

        Self {
            azimuth: obs.azimuth.to_degrees(),
            elevation: obs.elevation.to_degrees(),
            latitude: sub_solar.lat.to_degrees(),
            longitude: 360.0 - sub_solar.lon.to_degrees(),
            right_ascension: ra.to_degrees(),
            declination: dec.to_degrees(),
            range: 1.0 + (obs.range - AU_KM) / AU_KM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::julian_date;
    use approx::assert_abs_diff_eq;
    use chrono::{TimeZone, Utc};

    #[test]
    fn sun_is_near_the_equinox_point_in_march() {
        let jd = julian_date(&Utc.with_ymd_and_hms(2024, 3, 20, 3, 6, 0).unwrap());
        let sun = solar_position(jd);
        let r = magnitude(&sun);

        assert_abs_diff_eq!(r / AU_KM, 0.996, epsilon = 0.002);
        // right ascension and declination near zero at the vernal equinox
        assert!(sun[0] > 0.0);
        assert_abs_diff_eq!((sun[2] / r).asin().to_degrees(), 0.0, epsilon = 0.05);
    }

    #[test]
    fn solstice_declination() {
        let jd = julian_date(&Utc.with_ymd_and_hms(2024, 6, 20, 20, 51, 0).unwrap());
        let sun = solar_position(jd);
        let dec = (sun[2] / magnitude(&sun)).asin().to_degrees();
        assert_abs_diff_eq!(dec, 23.44, epsilon = 0.02);
    }

    #[test]
    fn satellite_behind_earth_is_eclipsed() {
        let sun = [AU_KM, 0.0, 0.0];
        let (shadow, depth) = sat_eclipsed(&[-7000.0, 0.0, 0.0], &sun);
        assert!(shadow);
        assert!(depth > 0.0);

        let (lit, depth) = sat_eclipsed(&[7000.0, 0.0, 0.0], &sun);
        assert!(!lit);
        assert!(depth < 0.0);

        let (beside, _) = sat_eclipsed(&[0.0, 7000.0, 0.0], &sun);
        assert!(!beside);
    }

    #[test]
    fn midday_sun_is_high_at_the_equator() {
        // 2024-03-20 12:00 UTC, observer on the equator at Greenwich
        let daynum = crate::kernel::datetime_to_day_num(
            &Utc.with_ymd_and_hms(2024, 3, 20, 12, 7, 0).unwrap(),
        );
        let sun = SunPosition::find(daynum, &Geodetic::default());
        assert!(sun.elevation > 85.0, "elevation {}", sun.elevation);
        assert_abs_diff_eq!(sun.latitude, 0.0, epsilon = 0.2);
        assert!(sun.longitude < 1.0 || sun.longitude > 359.0, "lon {}", sun.longitude);
    }
}
