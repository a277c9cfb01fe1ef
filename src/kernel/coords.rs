use serde::Serialize;

use super::{
    actan, arcsin, dot, fmod2p, magnitude, sub, theta_g_jd, Vector3, EARTH_FLATTENING,
    EARTH_RADIUS_KM, EARTH_ROTATION_RAD_S, HALF_PI, TWO_PI,
};

const LATITUDE_TOLERANCE: f64 = 1e-10;
const MAX_LATITUDE_ITERATIONS: usize = 50;

/// Geodetic position. Latitude and longitude (east positive) in radians,
/// altitude in kilometres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Geodetic {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl Geodetic {
    pub fn from_degrees(lat_deg: f64, lon_deg: f64, alt_km: f64) -> Self {
        Self {
            lat: lat_deg.to_radians(),
            lon: lon_deg.to_radians(),
            alt: alt_km,
        }
    }

    /// Local mean sidereal time at `jd`.
    pub fn local_sidereal(&self, jd: f64) -> f64 {
        fmod2p(theta_g_jd(jd) + self.lon)
    }
}

/// Azimuth, elevation (radians), range (km) and range rate (km/s) of a target
/// as seen by an observer, plus the ECI range vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Topocentric {
    pub azimuth: f64,
    pub elevation: f64,
    pub range: f64,
    pub range_rate: f64,
    pub range_vector: Vector3,
}

/// ECI position and velocity of an earth-fixed observer.
pub fn user_pos_vel(observer: &Geodetic, jd: f64) -> (Vector3, Vector3) {
    let theta = observer.local_sidereal(jd);
    let f = EARTH_FLATTENING;
    let sin_lat = observer.lat.sin();
    let c = 1.0 / (1.0 + f * (f - 2.0) * sin_lat * sin_lat).sqrt();
    let sq = (1.0 - f) * (1.0 - f) * c;
    let achcp = (EARTH_RADIUS_KM * c + observer.alt) * observer.lat.cos();

    let pos = [
        achcp * theta.cos(),
        achcp * theta.sin(),
        (EARTH_RADIUS_KM * sq + observer.alt) * sin_lat,
    ];
    let vel = [
        -EARTH_ROTATION_RAD_S * pos[1],
        EARTH_ROTATION_RAD_S * pos[0],
        0.0,
    ];
    (pos, vel)
}

/// Geodetic position of an ECI point over the oblate earth.
pub fn lat_lon_alt(pos: &Vector3, jd: f64) -> Geodetic {
    let theta = actan(pos[1], pos[0]);
    let lon = fmod2p(theta - theta_g_jd(jd));
    let r = (pos[0] * pos[0] + pos[1] * pos[1]).sqrt();
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);

    let mut lat = actan(pos[2], r);
    let mut c = 1.0;
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let phi = lat;
        c = 1.0 / (1.0 - e2 * phi.sin() * phi.sin()).sqrt();
        lat = actan(pos[2] + EARTH_RADIUS_KM * c * e2 * phi.sin(), r);
        if (lat - phi).abs() < LATITUDE_TOLERANCE {
            break;
        }
    }

    let alt = r / lat.cos() - EARTH_RADIUS_KM * c;
    if lat > HALF_PI {
        lat -= TWO_PI;
    }

    Geodetic { lat, lon, alt }
}

/// Topocentric observation in the south-east-zenith frame. Elevations are
/// geometric; no refraction correction is applied.
pub fn topocentric_obs(
    pos: &Vector3,
    vel: &Vector3,
    observer: &Geodetic,
    jd: f64,
) -> Topocentric {
    let (obs_pos, obs_vel) = user_pos_vel(observer, jd);
    let theta = observer.local_sidereal(jd);

    let range = sub(pos, &obs_pos);
    let rgvel = sub(vel, &obs_vel);
    let range_w = magnitude(&range);

    let (sin_lat, cos_lat) = observer.lat.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    let top_s =
        sin_lat * cos_theta * range[0] + sin_lat * sin_theta * range[1] - cos_lat * range[2];
    let top_e = -sin_theta * range[0] + cos_theta * range[1];
    let top_z =
        cos_lat * cos_theta * range[0] + cos_lat * sin_theta * range[1] + sin_lat * range[2];

    Topocentric {
        azimuth: top_e.atan2(-top_s).rem_euclid(TWO_PI),
        elevation: arcsin(top_z / range_w),
        range: range_w,
        range_rate: dot(&range, &rgvel) / range_w,
        range_vector: range,
    }
}

/// Topocentric right ascension and declination (radians).
pub fn radec(pos: &Vector3, vel: &Vector3, observer: &Geodetic, jd: f64) -> (f64, f64) {
    let obs = topocentric_obs(pos, vel, observer, jd);
    let (az, el) = (obs.azimuth, obs.elevation);
    let theta = observer.local_sidereal(jd);
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = observer.lat.sin_cos();

    let lxh = -az.cos() * el.cos();
    let lyh = az.sin() * el.cos();
    let lzh = el.sin();

    let lx = sin_phi * cos_theta * lxh - sin_theta * lyh + cos_theta * cos_phi * lzh;
    let ly = sin_phi * sin_theta * lxh + cos_theta * lyh + sin_theta * cos_phi * lzh;
    let lz = -cos_phi * lxh + sin_phi * lzh;

    let dec = arcsin(lz);
    let cos_delta = (1.0 - lz * lz).sqrt();
    let ra = fmod2p(actan(ly / cos_delta, lx / cos_delta));
    (ra, dec)
}
