use chrono::{DateTime, Datelike, Timelike, Utc};

use super::{fmod2p, modulus, MINUTES_PER_DAY, OMEGA_E, SECONDS_PER_DAY, TWO_PI};

/// Julian date of day number 0 (31 Dec 1979 00:00 UTC).
pub const DAYNUM_EPOCH_JD: f64 = 2444238.5;

/// Days between the Unix epoch and day number 0.
const DAYNUM_UNIX_OFFSET: f64 = 3651.0;

/// Julian date of 0.0 January of `year` (Meeus).
pub fn julian_date_of_year(year: f64) -> f64 {
    let year = year - 1.0;
    let a = (year / 100.0) as i64;
    let b = 2 - a + a / 4;
    let days = (365.25 * year) as i64 + (30.6001 * 14.0) as i64;
    days as f64 + 1720994.5 + b as f64
}

/// Splits a TLE epoch `yyddd.dddddddd` into a four digit year and day of year.
/// Two digit years below 57 belong to the 21st century.
pub fn split_epoch(epoch: f64) -> (f64, f64) {
    let scaled = epoch * 1e-3;
    let year = scaled.trunc();
    let day = (scaled - year) * 1e3;
    let year = if year < 57.0 { year + 2000.0 } else { year + 1900.0 };
    (year, day)
}

pub fn julian_date_of_epoch(epoch: f64) -> f64 {
    let (year, day) = split_epoch(epoch);
    julian_date_of_year(year) + day
}

/// Julian date of a calendar instant.
pub fn julian_date(instant: &DateTime<Utc>) -> f64 {
    let seconds = instant.second() as f64 + instant.nanosecond() as f64 * 1e-9;
    let fraction =
        (instant.hour() as f64 + (instant.minute() as f64 + seconds / 60.0) / 60.0) / 24.0;
    julian_date_of_year(instant.year() as f64) + instant.ordinal() as f64 + fraction
}

/// Day number of a calendar date. `year` is a two digit year (or years since
/// 1900); years below 57 roll over into the 21st century.
pub fn day_num(mut month: i32, day: i32, mut year: i32) -> i64 {
    if month < 3 {
        year -= 1;
        month += 12;
    }
    if year < 57 {
        year += 100;
    }

    let yy = year as f64;
    let mm = month as f64;
    let dn = (365.25 * (yy - 80.0)).floor() - (19.0 + yy / 100.0).floor()
        + (4.75 + yy / 400.0).floor()
        - 16.0;
    dn as i64 + day as i64 + 30 * month as i64 + (0.6 * mm - 0.3).floor() as i64
}

pub fn unix_to_day_num(unix_seconds: f64) -> f64 {
    unix_seconds / SECONDS_PER_DAY - DAYNUM_UNIX_OFFSET
}

pub fn day_num_to_unix(daynum: f64) -> f64 {
    SECONDS_PER_DAY * (daynum + DAYNUM_UNIX_OFFSET)
}

pub fn day_num_to_julian(daynum: f64) -> f64 {
    daynum + DAYNUM_EPOCH_JD
}

pub fn datetime_to_day_num(instant: &DateTime<Utc>) -> f64 {
    unix_to_day_num(instant.timestamp_micros() as f64 * 1e-6)
}

pub fn current_day_num() -> f64 {
    datetime_to_day_num(&Utc::now())
}

/// Whole-second instant of a day number, truncated like a `time_t` cast.
pub fn day_num_to_datetime(daynum: f64) -> DateTime<Utc> {
    let seconds = day_num_to_unix(daynum) as i64;
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}

/// Formats a day number as `Tue 12Oct99 17:22:37`.
pub fn daynum_to_string(daynum: f64) -> String {
    day_num_to_datetime(daynum)
        .format("%a %d%b%y %H:%M:%S")
        .to_string()
}

/// `asctime` layout with the day of month zero padded, newline terminated.
pub fn asctime_utc(instant: &DateTime<Utc>) -> String {
    format!("{}\n", instant.format("%a %b %d %H:%M:%S %Y"))
}

/// Greenwich sidereal angle at a TLE epoch, and days since 1950 Jan 0.0.
pub fn theta_g(epoch: f64) -> (f64, f64) {
    let (year, day) = split_epoch(epoch);
    let ut = day.fract();
    let jd = julian_date_of_year(year) + day.trunc();
    let ds50 = jd - 2433281.5 + ut;
    (fmod2p(6.3003880987 * ds50 + 1.72944494), ds50)
}

/// Greenwich mean sidereal time (radians) at a Julian date.
pub fn theta_g_jd(jd: f64) -> f64 {
    let ut = (jd + 0.5).rem_euclid(1.0);
    let jd = jd - ut;
    let tu = (jd - 2451545.0) / 36525.0;
    let gmst = 24110.54841 + tu * (8640184.812866 + tu * (0.093104 - tu * 6.2e-6));
    let gmst = modulus(gmst + SECONDS_PER_DAY * OMEGA_E * ut, SECONDS_PER_DAY);
    TWO_PI * gmst / SECONDS_PER_DAY
}

/// Minutes elapsed between a TLE epoch and a Julian date.
pub fn minutes_since_epoch(epoch: f64, jd: f64) -> f64 {
    (jd - julian_date_of_epoch(epoch)) * MINUTES_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn julian_date_of_j2000() {
        let instant = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_abs_diff_eq!(julian_date(&instant), 2451545.0, epsilon = 1e-9);
    }

    #[test]
    fn epoch_rollover_at_57() {
        assert_eq!(split_epoch(56001.0).0, 2056.0);
        assert_eq!(split_epoch(57001.0).0, 1957.0);
        assert_abs_diff_eq!(julian_date_of_epoch(80275.0), 2444513.5, epsilon = 1e-9);
    }

    #[test]
    fn day_number_origin() {
        assert_eq!(day_num(12, 31, 79), 0);
        assert_eq!(day_num(1, 1, 80), 1);
        // 2008 day 0 is 31 Dec 2007
        assert_eq!(day_num(1, 0, 8), 10227);
    }

    #[test]
    fn day_number_and_julian_agree() {
        let instant = Utc.with_ymd_and_hms(2008, 9, 20, 12, 25, 40).unwrap();
        let daynum = datetime_to_day_num(&instant);
        assert_abs_diff_eq!(day_num_to_julian(daynum), julian_date(&instant), epsilon = 1e-8);
        assert_abs_diff_eq!(day_num_to_unix(daynum), instant.timestamp() as f64, epsilon = 1e-3);
    }

    #[test]
    fn formats_day_numbers() {
        let instant = Utc.with_ymd_and_hms(1999, 10, 12, 17, 22, 37).unwrap();
        let daynum = datetime_to_day_num(&instant);
        assert_eq!(daynum_to_string(daynum + 1e-7), "Tue 12Oct99 17:22:37");

        let early = Utc.with_ymd_and_hms(2024, 3, 5, 1, 2, 3).unwrap();
        assert_eq!(asctime_utc(&early), "Tue Mar 05 01:02:03 2024\n");
    }

    #[test]
    fn sidereal_time_at_j2000() {
        // GMST at 2000-01-01 12:00 UT1 is 280.46 degrees
        let gmst = theta_g_jd(2451545.0).to_degrees();
        assert_abs_diff_eq!(gmst, 280.46, epsilon = 0.01);
    }
}
