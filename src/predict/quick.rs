//! Non-interactive listings: positions over a time range, one pass with
//! look angles, and one pass of Doppler figures. Each routine returns its
//! output lines, newline terminated.

use super::error::PredictError;
use super::observation::{observe, Observation};
use super::pass_finder::{
    check_predictable, decayed, find_aos, find_los, pass_step, MAX_ITERATIONS,
};
use crate::catalog::Catalog;
use crate::kernel::{day_num_to_unix, daynum_to_string, unix_to_day_num};

const ONE_YEAR_SECONDS: i64 = 31_557_600;
const ONE_DAY_SECONDS: i64 = 86_400;

/// Splits `args` into the satellite (the longest leading run of arguments
/// that names one, or a catalog number) and the remaining arguments.
pub fn resolve<'a>(
    catalog: &Catalog,
    args: &'a [String],
) -> Result<(usize, &'a [String]), PredictError> {
    for taken in (1..=args.len()).rev() {
        if let Some(index) = catalog.find(&args[..taken].join(" ")) {
            return Ok((index, &args[taken..]));
        }
    }
    Err(PredictError::UnknownSatellite(
        args.first().cloned().unwrap_or_default(),
    ))
}

/// Leading integer of `s`, ignoring anything after it; 0 when there is
/// none.
fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add((d - b'0') as i64));
    if negative {
        -value
    } else {
        value
    }
}

/// Time range of a position listing, in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindRange {
    Single(i64),
    List { start: i64, end: i64, step: i64 },
}

/// Interprets `[start] [end]`:
///
/// * a start of 0 (or none) means now;
/// * a start of `+N` lists N seconds from now (`+Nm`: N minutes at one
///   minute steps), refusing lists longer than a day;
/// * an end of `+N` (or `+Nm`) is relative to the start;
/// * any other list is cut short after a day;
/// * a start within a year of now with no end gives a single position.
pub fn find_range(start: Option<&str>, end: Option<&str>, now: i64) -> FindRange {
    let start_arg = start.unwrap_or_default();
    let mut end_arg = end.unwrap_or_default();

    let mut step: i64 = 1;
    if let Some(stripped) = end_arg.strip_suffix('m') {
        step = 60;
        end_arg = stripped;
    }

    let mut start = leading_integer(start_arg);
    if start == 0 {
        start = now;
    }
    let mut end = if end_arg.starts_with('+') {
        start.saturating_add(step.saturating_mul(leading_integer(end_arg)))
    } else {
        leading_integer(end_arg)
    };
    if end.saturating_sub(start) > ONE_DAY_SECONDS {
        end = start.saturating_add(ONE_DAY_SECONDS);
    }

    if let Some(relative) = start_arg.strip_prefix('+') {
        start = now;
        let count = match relative.strip_suffix('m') {
            Some(minutes) => {
                step = 60;
                minutes
            }
            None => relative,
        };
        end = start.saturating_add(step.saturating_mul(leading_integer(count)));
        if end.saturating_sub(start) > ONE_DAY_SECONDS {
            end = now - 1;
        }
    }

    if (now - ONE_YEAR_SECONDS..=now + ONE_YEAR_SECONDS).contains(&start) && end == 0 {
        FindRange::Single(start)
    } else {
        FindRange::List { start, end, step }
    }
}

fn listing_line(time: i64, obs: &Observation) -> String {
    format!(
        "{} {} {:4} {:4} {:4} {:4} {:4} {:6} {:6} {}",
        time,
        daynum_to_string(obs.daynum),
        obs.elevation.round_ties_even() as i32,
        obs.azimuth.round_ties_even() as i32,
        obs.phase256(),
        obs.latitude.round_ties_even() as i32,
        (360.0 - obs.longitude).round_ties_even() as i32,
        obs.range.round_ties_even() as i64,
        obs.orbit_number,
        obs.sun_flag()
    )
}

fn event_time(daynum: f64) -> i64 {
    day_num_to_unix(daynum).floor() as i64
}

/// Positions over a time range; points at which the satellite has
/// decayed are left out.
pub fn quick_find(
    catalog: &mut Catalog,
    args: &[String],
    now: i64,
) -> Result<Vec<String>, PredictError> {
    let (index, rest) = resolve(catalog, args)?;
    let observer = catalog.observer();
    let range = find_range(
        rest.first().map(String::as_str),
        rest.get(1).map(String::as_str),
        now,
    );
    let Some(sat) = catalog.get_mut(index) else {
        return Err(PredictError::UnknownSatellite(args.join(" ")));
    };

    let (start, end, step) = match range {
        FindRange::Single(time) => (time, time, 1),
        FindRange::List { start, end, step } => (start, end, step),
    };

    let mut lines = Vec::new();
    let mut time = start;
    while time <= end {
        let daynum = unix_to_day_num(time as f64);
        let obs = observe(sat, &observer, daynum)?;
        if !decayed(&sat.tle, daynum) {
            lines.push(format!("{}\n", listing_line(time, &obs)));
        }
        let Some(next) = time.checked_add(step) else {
            break;
        };
        time = next;
    }
    Ok(lines)
}

/// Start time argument of the pass listings: 0 or none for now, otherwise
/// Unix seconds within a year of now.
fn pass_start(arg: Option<&String>, now: i64) -> Option<i64> {
    let start = match arg.map(|s| leading_integer(s)).unwrap_or(0) {
        0 => now,
        start => start,
    };
    (now - ONE_YEAR_SECONDS..=now + ONE_YEAR_SECONDS)
        .contains(&start)
        .then_some(start)
}

/// Observations through one pass, stepped by `pass_step(divisor)`, plus
/// the refined LOS observation when the pass was walked past the horizon.
fn walk_pass(
    catalog: &mut Catalog,
    args: &[String],
    now: i64,
    divisor: f64,
) -> Result<Vec<Observation>, PredictError> {
    let (index, rest) = resolve(catalog, args)?;
    let observer = catalog.observer();
    let Some(sat) = catalog.get_mut(index) else {
        return Err(PredictError::UnknownSatellite(args.join(" ")));
    };
    let Some(start) = pass_start(rest.first(), now) else {
        log::debug!("{}: start time out of range", sat.tle.name);
        return Ok(Vec::new());
    };

    let daynum = unix_to_day_num(start as f64);
    check_predictable(sat, &observer, daynum)?;

    let mut daynum = find_aos(sat, &observer, daynum)?;
    let mut obs = observe(sat, &observer, daynum)?;
    let mut points = Vec::new();
    let mut last_elevation = 0;
    while obs.elevation.round_ties_even() >= 0.0 {
        if points.len() >= MAX_ITERATIONS {
            return Err(PredictError::Convergence {
                search: "pass listing",
                iterations: MAX_ITERATIONS,
            });
        }
        points.push(obs);
        last_elevation = obs.elevation.round_ties_even() as i32;
        daynum += pass_step(&obs, divisor);
        obs = observe(sat, &observer, daynum)?;
    }

    if last_elevation != 0 {
        let los = find_los(sat, &observer, daynum)?;
        points.push(observe(sat, &observer, los)?);
    }
    Ok(points)
}

/// One pass from `[start]`: a line per step plus the LOS line, each with
/// the Doppler shift at 100 MHz appended.
pub fn quick_predict(
    catalog: &mut Catalog,
    args: &[String],
    now: i64,
) -> Result<Vec<String>, PredictError> {
    Ok(walk_pass(catalog, args, now, 25000.0)?
        .iter()
        .map(|obs| {
            format!(
                "{} {:.6}\n",
                listing_line(event_time(obs.daynum), obs),
                obs.doppler100()
            )
        })
        .collect())
}

/// One pass of Doppler figures at 100 MHz as CSV: Unix time, date string
/// and shift in Hz.
pub fn quick_doppler100(
    catalog: &mut Catalog,
    args: &[String],
    now: i64,
) -> Result<Vec<String>, PredictError> {
    Ok(walk_pass(catalog, args, now, 500000.0)?
        .iter()
        .map(|obs| {
            format!(
                "{},{},{:.6}\n",
                event_time(obs.daynum),
                daynum_to_string(obs.daynum),
                obs.doppler100()
            )
        })
        .collect())
}

/// The pass listing of `quick_predict` in machine readable form.
pub fn quick_predict_json(
    catalog: &mut Catalog,
    args: &[String],
    now: i64,
) -> Result<Vec<Observation>, PredictError> {
    walk_pass(catalog, args, now, 25000.0)
}
