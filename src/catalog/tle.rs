use serde::Serialize;

use super::error::TleError;
use crate::kernel::{day_num, split_epoch};
use crate::propagator::Elements;

pub const TLE_LINE_LEN: usize = 69;
const MAX_NAME_LEN: usize = 24;

/// Fixed characters of a well formed element set, as (line, column, char).
const STRUCTURE: [(u8, usize, u8); 26] = [
    (1, 0, b'1'),
    (1, 1, b' '),
    (1, 7, b'U'),
    (1, 8, b' '),
    (1, 17, b' '),
    (1, 23, b'.'),
    (1, 32, b' '),
    (1, 34, b'.'),
    (1, 43, b' '),
    (1, 52, b' '),
    (1, 61, b' '),
    (1, 62, b'0'),
    (1, 63, b' '),
    (2, 0, b'2'),
    (2, 1, b' '),
    (2, 7, b' '),
    (2, 11, b'.'),
    (2, 16, b' '),
    (2, 20, b'.'),
    (2, 25, b' '),
    (2, 33, b' '),
    (2, 37, b'.'),
    (2, 42, b' '),
    (2, 46, b'.'),
    (2, 51, b' '),
    (2, 54, b'.'),
];
const DIGITS: [(u8, usize); 6] = [(1, 68), (2, 68), (1, 18), (1, 19), (2, 31), (2, 32)];

/// One satellite's NORAD two-line element set, parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tle {
    pub name: String,
    pub catalog_number: u32,
    pub designator: String,
    /// Two digit year; values below 57 are in the 21st century.
    pub epoch_year: i32,
    /// Day of year with fraction.
    pub epoch_day: f64,
    /// First derivative of mean motion over two, rev/day^2.
    pub drag: f64,
    /// Second derivative of mean motion over six, rev/day^3.
    pub nddot6: f64,
    pub bstar: f64,
    pub element_set: u32,
    pub inclination: f64,
    pub raan: f64,
    pub eccentricity: f64,
    pub arg_perigee: f64,
    pub mean_anomaly: f64,
    /// Revolutions per day.
    pub mean_motion: f64,
    pub orbit_number: u64,
    pub line1: String,
    pub line2: String,
}

/// Mod 10 sum of the first 68 columns: digits count their value, minus
/// signs count one.
pub fn checksum(line: &str) -> u32 {
    line.bytes()
        .take(TLE_LINE_LEN - 1)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

/// Structural check of a candidate element set: line lengths, checksums,
/// fixed separator columns, matching catalog numbers and digit columns.
/// Random text that happens to satisfy a checksum does not survive this.
pub fn kep_check(line1: &str, line2: &str) -> Result<(), TleError> {
    let lines = [line1.as_bytes(), line2.as_bytes()];
    for (i, line) in lines.iter().enumerate() {
        if line.len() < TLE_LINE_LEN || !line.is_ascii() {
            return Err(TleError::Length {
                line: i as u8 + 1,
                len: line.len(),
            });
        }
    }

    for (line, column) in DIGITS {
        let found = lines[line as usize - 1][column];
        if !found.is_ascii_digit() {
            return Err(TleError::Field {
                field: "digit column",
                value: (found as char).to_string(),
            });
        }
    }

    for (i, text) in [line1, line2].iter().enumerate() {
        let computed = checksum(text);
        let found = lines[i][TLE_LINE_LEN - 1];
        if (found - b'0') as u32 != computed {
            return Err(TleError::Checksum {
                line: i as u8 + 1,
                found: found as char,
                computed,
            });
        }
    }

    for (line, column, expected) in STRUCTURE {
        let found = lines[line as usize - 1][column];
        if found != expected {
            return Err(TleError::Structure {
                line,
                column,
                expected: expected as char,
                found: found as char,
            });
        }
    }

    if lines[0][2..7] != lines[1][2..7] {
        return Err(TleError::CatalogMismatch);
    }
    Ok(())
}

/// Columns `start..=end` with blanks removed.
fn columns(line: &str, start: usize, end: usize) -> String {
    line[start..=end].chars().filter(|c| *c != ' ').collect()
}

fn number(line: &str, start: usize, end: usize, field: &'static str) -> Result<f64, TleError> {
    let text = columns(line, start, end);
    if text.is_empty() {
        return Ok(0.0);
    }
    text.parse().map_err(|_| TleError::Field { field, value: text })
}

fn integer<T: std::str::FromStr + Default>(
    line: &str,
    start: usize,
    end: usize,
    field: &'static str,
) -> Result<T, TleError> {
    let text = columns(line, start, end);
    if text.is_empty() {
        return Ok(T::default());
    }
    text.parse().map_err(|_| TleError::Field { field, value: text })
}

/// Decodes the `±nnnnn±e` assumed-decimal notation starting at `start`.
fn exponential(line: &str, start: usize, field: &'static str) -> Result<f64, TleError> {
    let mantissa = number(line, start, start + 5, field)? * 1e-5;
    let bytes = line.as_bytes();
    let digit = bytes[start + 7];
    if !digit.is_ascii_digit() {
        return Err(TleError::Field {
            field,
            value: line[start..start + 8].to_string(),
        });
    }
    let exponent = (digit - b'0') as i32;
    let exponent = if bytes[start + 6] == b'-' { -exponent } else { exponent };
    Ok(mantissa * 10f64.powi(exponent))
}

/// Inverse of [`exponential`]: eight columns, sign, five mantissa digits,
/// exponent sign and digit.
fn format_exponential(value: f64) -> String {
    const ZERO: &str = " 00000-0";
    if value == 0.0 || !value.is_finite() {
        return ZERO.to_string();
    }
    let formatted = format!("{:.4e}", value.abs() * 10.0);
    let Some((mantissa, exponent)) = formatted.split_once('e') else {
        return ZERO.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return ZERO.to_string();
    };
    if exponent < -9 {
        return ZERO.to_string();
    }
    let exponent = exponent.min(9);
    format!(
        "{}{}{}{}",
        if value < 0.0 { '-' } else { ' ' },
        mantissa.replace('.', ""),
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    )
}

fn clean_name(name: &str) -> String {
    name.trim_end().chars().take(MAX_NAME_LEN).collect::<String>().trim_end().to_string()
}

impl Tle {
    /// Validates and decodes an element set. Trailing whitespace on every
    /// line is ignored; the name is truncated to 24 characters.
    pub fn parse(name: &str, line1: &str, line2: &str) -> Result<Self, TleError> {
        let line1 = line1.trim_end();
        let line2 = line2.trim_end();
        kep_check(line1, line2)?;
        let line1 = &line1[..TLE_LINE_LEN];
        let line2 = &line2[..TLE_LINE_LEN];

        Ok(Self {
            name: clean_name(name),
            catalog_number: integer(line1, 2, 6, "catalog number")?,
            designator: columns(line1, 9, 16),
            epoch_year: integer(line1, 18, 19, "epoch year")?,
            epoch_day: number(line1, 20, 31, "epoch day")?,
            drag: number(line1, 33, 42, "drag")?,
            nddot6: exponential(line1, 44, "second derivative")?,
            bstar: exponential(line1, 53, "bstar")?,
            element_set: integer(line1, 64, 67, "element set")?,
            inclination: number(line2, 8, 15, "inclination")?,
            raan: number(line2, 17, 24, "right ascension")?,
            eccentricity: 1e-7 * number(line2, 26, 32, "eccentricity")?,
            arg_perigee: number(line2, 34, 41, "argument of perigee")?,
            mean_anomaly: number(line2, 43, 50, "mean anomaly")?,
            mean_motion: number(line2, 52, 62, "mean motion")?,
            orbit_number: integer(line2, 63, 67, "orbit number")?,
            line1: line1.to_string(),
            line2: line2.to_string(),
        })
    }

    /// Epoch in `yyddd.dddddddd` form.
    pub fn epoch(&self) -> f64 {
        self.epoch_year as f64 * 1000.0 + self.epoch_day
    }

    /// Epoch as a day number.
    pub fn epoch_day_num(&self) -> f64 {
        day_num(1, 0, self.epoch_year) as f64 + self.epoch_day
    }

    /// Epoch as days counted from 1900, for ordering element sets.
    pub fn epoch_ordinal(&self) -> f64 {
        let (year, _) = split_epoch(self.epoch());
        (year - 1900.0) * 365.25 + self.epoch_day
    }

    pub fn elements(&self) -> Elements {
        Elements {
            epoch: self.epoch(),
            bstar: self.bstar,
            inclination: self.inclination,
            raan: self.raan,
            eccentricity: self.eccentricity,
            arg_perigee: self.arg_perigee,
            mean_anomaly: self.mean_anomaly,
            mean_motion: self.mean_motion,
        }
    }

    /// Formats the numeric fields back into two checksummed lines.
    pub fn to_lines(&self) -> (String, String) {
        let mut line1 = [b' '; TLE_LINE_LEN];
        let mut line2 = [b' '; TLE_LINE_LEN];
        line1[0] = b'1';
        line1[7] = b'U';
        line1[62] = b'0';
        line2[0] = b'2';

        let catnum = format!("{:05}", self.catalog_number);
        place(&mut line1, 2, 6, &catnum);
        place(&mut line2, 2, 6, &catnum);
        place(&mut line1, 9, 16, &self.designator);
        place(&mut line1, 18, 19, &format!("{:02}", self.epoch_year));
        place(&mut line1, 20, 31, &format!("{:012.8}", self.epoch_day));
        // "0.000021820" loses its leading zero to the sign column
        let drag = format!("{:.9}", self.drag.abs());
        place(&mut line1, 33, 42, &drag);
        line1[33] = if self.drag < 0.0 { b'-' } else { b' ' };
        place(&mut line1, 44, 51, &format_exponential(self.nddot6));
        place(&mut line1, 53, 60, &format_exponential(self.bstar));
        place(&mut line1, 64, 67, &format!("{:4}", self.element_set % 10_000));

        place(&mut line2, 7, 15, &format!("{:9.4}", self.inclination));
        place(&mut line2, 16, 24, &format!("{:9.4}", self.raan));
        let eccentricity = format!("{:.12}", self.eccentricity);
        place(&mut line2, 26, 32, eccentricity.get(2..).unwrap_or("0000000"));
        place(&mut line2, 33, 41, &format!("{:9.4}", self.arg_perigee));
        place(&mut line2, 43, 50, &format!("{:9.5}", self.mean_anomaly));
        place(&mut line2, 52, 62, &format!("{:12.9}", self.mean_motion));
        place(&mut line2, 63, 67, &format!("{:5}", self.orbit_number % 100_000));

        (with_checksum(line1), with_checksum(line2))
    }

    /// Replaces the raw lines with a reformatting of the numeric fields.
    pub fn refresh_lines(&mut self) {
        let (line1, line2) = self.to_lines();
        self.line1 = line1;
        self.line2 = line2;
    }
}

fn with_checksum(mut line: [u8; TLE_LINE_LEN]) -> String {
    let sum = checksum(&String::from_utf8_lossy(&line));
    line[TLE_LINE_LEN - 1] = b'0' + sum as u8;
    String::from_utf8_lossy(&line).into_owned()
}

/// Copies `text` into columns `start..=end`, stopping at whichever runs out
/// first.
fn place(line: &mut [u8; TLE_LINE_LEN], start: usize, end: usize, text: &str) {
    for (slot, byte) in line[start..=end].iter_mut().zip(text.bytes()) {
        *slot = byte;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ISS_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    const ISS_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    #[test]
    fn parses_iss() {
        let tle = Tle::parse("ISS (ZARYA)             \r\n", ISS_LINE1, ISS_LINE2).unwrap();
        assert_eq!(tle.name, "ISS (ZARYA)");
        assert_eq!(tle.catalog_number, 25544);
        assert_eq!(tle.designator, "98067A");
        assert_eq!(tle.epoch_year, 8);
        assert_relative_eq!(tle.epoch_day, 264.51782528);
        assert_relative_eq!(tle.drag, -0.00002182);
        assert_eq!(tle.nddot6, 0.0);
        assert_relative_eq!(tle.bstar, -0.11606e-4, max_relative = 1e-12);
        assert_eq!(tle.element_set, 292);
        assert_relative_eq!(tle.inclination, 51.6416);
        assert_relative_eq!(tle.eccentricity, 0.0006703, max_relative = 1e-12);
        assert_relative_eq!(tle.mean_motion, 15.72125391);
        assert_eq!(tle.orbit_number, 56353);
        assert_relative_eq!(tle.epoch(), 8264.51782528);
        assert_relative_eq!(tle.epoch_day_num(), 10491.51782528, max_relative = 1e-12);
    }

    #[test]
    fn rejects_bad_checksum() {
        let corrupted = ISS_LINE1.replace("2927", "2928");
        let err = Tle::parse("ISS", &corrupted, ISS_LINE2).unwrap_err();
        assert!(matches!(err, TleError::Checksum { line: 1, .. }));
    }

    #[test]
    fn rejects_misplaced_columns() {
        // epoch shifted one column left, checksum still valid
        let shifted = "1 25544U 98067A   8264.517825280 -.00002182  00000-0 -11606-4 0  2927";
        assert_eq!(checksum(shifted), 7);
        let err = Tle::parse("ISS", shifted, ISS_LINE2).unwrap_err();
        assert!(matches!(
            err,
            TleError::Structure {
                line: 1,
                column: 23,
                ..
            }
        ));
    }

    #[test]
    fn rejects_short_lines() {
        let err = Tle::parse("ISS", &ISS_LINE1[..60], ISS_LINE2).unwrap_err();
        assert_eq!(err, TleError::Length { line: 1, len: 60 });
    }

    #[test]
    fn rejects_mismatched_catalog_numbers() {
        let other = ISS_LINE2.replacen("25544", "25545", 1);
        let fixed = format!("{}{}", &other[..68], checksum(&other));
        let err = Tle::parse("ISS", ISS_LINE1, &fixed).unwrap_err();
        assert_eq!(err, TleError::CatalogMismatch);
    }

    #[test]
    fn checksum_counts_minus_signs() {
        assert_eq!(checksum(ISS_LINE1), 7);
        assert_eq!(checksum(ISS_LINE2), 7);
        assert_eq!(checksum("1-"), 2);
    }

    #[test]
    fn reformats_to_identical_lines() {
        let tle = Tle::parse("ISS", ISS_LINE1, ISS_LINE2).unwrap();
        let (line1, line2) = tle.to_lines();
        assert_eq!(line1, ISS_LINE1);
        assert_eq!(line2, ISS_LINE2);
    }

    #[test]
    fn modified_fields_survive_a_round_trip() {
        let mut tle = Tle::parse("ISS", ISS_LINE1, ISS_LINE2).unwrap();
        tle.mean_motion = 15.5;
        tle.drag = 0.00012345;
        tle.nddot6 = 1.2345e-6;
        tle.bstar = 3.2e-3;
        tle.epoch_day = 5.25;
        tle.refresh_lines();

        let back = Tle::parse("ISS", &tle.line1, &tle.line2).unwrap();
        assert_relative_eq!(back.mean_motion, 15.5, max_relative = 1e-6);
        assert_relative_eq!(back.drag, 0.00012345, max_relative = 1e-6);
        assert_relative_eq!(back.nddot6, 1.2345e-6, max_relative = 1e-6);
        assert_relative_eq!(back.bstar, 3.2e-3, max_relative = 1e-6);
        assert_relative_eq!(back.epoch_day, 5.25, max_relative = 1e-6);
        assert_eq!(back.catalog_number, 25544);
    }

    #[test]
    fn exponential_notation() {
        assert_eq!(format_exponential(-0.11606e-4), "-11606-4");
        assert_eq!(format_exponential(0.0), " 00000-0");
        assert_eq!(format_exponential(0.5), " 50000+0");
        assert_eq!(format_exponential(5.0), " 50000+1");
    }
}
