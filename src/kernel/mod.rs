//! Time and coordinate kernel: Julian dates, sidereal time, frame conversions
//! and the solar and lunar ephemerides. Everything here is a pure function.

mod coords;
mod moon;
mod sun;
mod time;

pub use coords::{lat_lon_alt, radec, topocentric_obs, user_pos_vel, Geodetic, Topocentric};
pub use moon::MoonPosition;
pub use sun::{sat_eclipsed, solar_position, SunPosition};
pub use time::{
    asctime_utc, current_day_num, datetime_to_day_num, day_num, day_num_to_datetime,
    day_num_to_julian, day_num_to_unix, daynum_to_string, julian_date, julian_date_of_epoch,
    julian_date_of_year, minutes_since_epoch, split_epoch, theta_g, theta_g_jd,
    unix_to_day_num, DAYNUM_EPOCH_JD,
};

pub type Vector3 = [f64; 3];

pub const TWO_PI: f64 = std::f64::consts::TAU;
pub const HALF_PI: f64 = std::f64::consts::FRAC_PI_2;

/// WGS-72 equatorial radius.
pub const EARTH_RADIUS_KM: f64 = 6378.135;
/// WGS-72 flattening.
pub const EARTH_FLATTENING: f64 = 1.0 / 298.26;
pub const EARTH_ROTATION_RAD_S: f64 = 7.292115e-5;
/// Sidereal days per solar day.
pub const OMEGA_E: f64 = 1.00273790934;

pub const SECONDS_PER_DAY: f64 = 86400.0;
pub const MINUTES_PER_DAY: f64 = 1440.0;

pub const AU_KM: f64 = 1.49597870691e8;
pub const SUN_RADIUS_KM: f64 = 6.96e5;
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Reduces an angle to [0, 2pi).
pub fn fmod2p(x: f64) -> f64 {
    modulus(x, TWO_PI)
}

/// Remainder with truncated quotient, shifted positive.
pub fn modulus(x: f64, y: f64) -> f64 {
    let r = x - (x / y).trunc() * y;
    if r < 0.0 {
        r + y
    } else {
        r
    }
}

/// Four-quadrant arctangent returning [0, 2pi).
pub fn actan(sinx: f64, cosx: f64) -> f64 {
    if cosx == 0.0 {
        if sinx > 0.0 {
            HALF_PI
        } else {
            3.0 * HALF_PI
        }
    } else if cosx > 0.0 {
        if sinx > 0.0 {
            (sinx / cosx).atan()
        } else {
            TWO_PI + (sinx / cosx).atan()
        }
    } else {
        std::f64::consts::PI + (sinx / cosx).atan()
    }
}

/// Arcsine clamped to +-pi/2 outside the domain.
pub fn arcsin(x: f64) -> f64 {
    if x.abs() >= 1.0 {
        x.signum() * HALF_PI
    } else {
        (x / (1.0 - x * x).sqrt()).atan()
    }
}

pub fn arccos(x: f64) -> f64 {
    HALF_PI - arcsin(x)
}

pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn magnitude(v: &Vector3) -> f64 {
    dot(v, v).sqrt()
}

pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn angle(a: &Vector3, b: &Vector3) -> f64 {
    arccos(dot(a, b) / (magnitude(a) * magnitude(b)))
}
