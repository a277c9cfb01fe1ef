//! Reply bodies of the single datagram commands, laid out the way
//! PREDICT clients parse them.

use chrono::{DateTime, Utc};

use crate::catalog::{Qth, Tle};
use crate::kernel::{asctime_utc, MoonPosition, SunPosition};
use crate::tracker::SatSnapshot;

pub const HUH: &str = "Huh?\n";

/// Terminates a streamed listing.
pub const LISTING_END: &str = "\x1a\n";

pub fn sat(s: &SatSnapshot) -> String {
    format!(
        "{}\n{:<7.2}\n{:<+6.2}\n{:<7.2}\n{:<+6.2}\n{}\n{:<7.2}\n{:<7.2}\n{:<7.2}\n{:<7.2}\n{}\n{}\n{:<7.2}\n{:<7.2}\n{:<7.2}\n",
        s.name,
        s.longitude,
        s.latitude,
        s.azimuth,
        s.elevation,
        s.next_event_unix(),
        s.footprint,
        s.range,
        s.altitude,
        s.velocity,
        s.orbit_number,
        s.visibility,
        s.phase,
        s.eclipse_depth,
        s.squint
    )
}

pub fn tle(tle: &Tle) -> String {
    format!("{}\n{}\n{}\n", tle.name, tle.line1, tle.line2)
}

pub fn doppler(doppler100: f64) -> String {
    format!("{doppler100:.6}\n")
}

pub fn list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().map(|name| format!("{name}\n")).collect()
}

pub fn sun(sun: &SunPosition) -> String {
    format!(
        "{:<7.2}\n{:<+6.2}\n{:<7.2}\n{:<7.2}\n{:<7.2}\n",
        sun.azimuth, sun.elevation, sun.latitude, sun.longitude, sun.right_ascension
    )
}

pub fn moon(moon: &MoonPosition) -> String {
    format!(
        "{:<7.2}\n{:<+6.2}\n{:<7.2}\n{:<7.2}\n{:<7.2}\n",
        moon.azimuth, moon.elevation, moon.declination, moon.gha, moon.right_ascension
    )
}

pub fn qth(qth: &Qth) -> String {
    format!(
        "{}\n{}\n{}\n{}\n",
        qth.callsign,
        format_g(qth.latitude),
        format_g(qth.longitude),
        qth.altitude
    )
}

pub fn time(now: &DateTime<Utc>) -> String {
    format!("{}\n", now.timestamp())
}

pub fn time_string(now: &DateTime<Utc>) -> String {
    asctime_utc(now)
}

/// `printf("%g")`: six significant digits, trailing zeros dropped,
/// exponent form for very small or large magnitudes.
pub fn format_g(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{value}");
    }

    let scientific = format!("{value:.5e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (5 - exponent) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
