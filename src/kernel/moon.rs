use serde::Serialize;
use std::f64::consts::PI;

use super::{day_num_to_julian, Geodetic, TWO_PI};

/// Moon as seen from a ground station. Angles in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MoonPosition {
    pub azimuth: f64,
    pub elevation: f64,
    pub right_ascension: f64,
    pub declination: f64,
    /// Greenwich hour angle.
    pub gha: f64,
    /// Approximate radial velocity, m/s.
    pub radial_velocity: f64,
}

fn prime_angle(x: f64) -> f64 {
    x - 360.0 * (x / 360.0).floor()
}

fn fix_angle(mut x: f64) -> f64 {
    while x > TWO_PI {
        x -= TWO_PI;
    }
    x
}

impl MoonPosition {
    /// Lunar position by the abridged Meeus series.
    pub fn find(daynum: f64, observer: &Geodetic) -> Self {
        let sin = f64::sin;
        let cos = f64::cos;
        let rad = PI / 180.0;

        let jd = day_num_to_julian(daynum);
        let t = (jd - 2415020.0) / 36525.0;
        let t2 = t * t;
        let t3 = t2 * t;

        let mut l1 = 270.434164 + 481267.8831 * t - 0.001133 * t2 + 0.0000019 * t3;
        let mut m = 358.475833 + 35999.0498 * t - 0.00015 * t2 - 0.0000033 * t3;
        let mut m1 = 296.104608 + 477198.8491 * t + 0.009192 * t2 + 0.0000144 * t3;
        let mut d = 350.737486 + 445267.1142 * t - 0.001436 * t2 + 0.0000019 * t3;
        let mut ff = 11.250889 + 483202.0251 * t - 0.003211 * t2 - 0.0000003 * t3;
        let mut om = (259.183275 - 1934.142 * t + 0.002078 * t2 + 0.0000022 * t3) * rad;

        // additive terms
        let a = sin((51.2 + 20.2 * t) * rad);
        let ss = 0.003964 * sin((346.56 + 132.87 * t - 0.0091731 * t2) * rad);
        l1 += 0.000233 * a + ss + 0.001964 * sin(om);
        m -= 0.001778 * a;
        m1 += 0.000817 * a + ss + 0.002541 * sin(om);
        d += 0.002011 * a + ss + 0.001964 * sin(om);
        ff += ss - 0.024691 * sin(om) - 0.004328 * sin(om + (275.05 - 2.3 * t) * rad);
        let ex = 1.0 - 0.002495 * t - 0.00000752 * t2;
        om *= rad;

        let l1 = prime_angle(l1);
        let m = prime_angle(m) * rad;
        let m1 = prime_angle(m1) * rad;
        let d = prime_angle(d) * rad;
        let ff = prime_angle(ff) * rad;
        let om = prime_angle(om);

        // ecliptic longitude
        let mut l = l1 + 6.28875 * sin(m1) + 1.274018 * sin(2.0 * d - m1) + 0.658309 * sin(2.0 * d);
        l += 0.213616 * sin(2.0 * m1) - ex * 0.185596 * sin(m) - 0.114336 * sin(2.0 * ff);
        l += 0.058793 * sin(2.0 * d - 2.0 * m1)
            + ex * 0.057212 * sin(2.0 * d - m - m1)
            + 0.05332 * sin(2.0 * d + m1);
        l += ex * 0.045874 * sin(2.0 * d - m) + ex * 0.041024 * sin(m1 - m)
            - 0.034718 * sin(d);
        l += -ex * 0.030465 * sin(m + m1) + 0.015326 * sin(2.0 * d - 2.0 * ff)
            - 0.012528 * sin(2.0 * ff + m1);
        l += -0.01098 * sin(2.0 * ff - m1)
            + 0.010674 * sin(4.0 * d - m1)
            + 0.010034 * sin(3.0 * m1);
        l += 0.008548 * sin(4.0 * d - 2.0 * m1)
            - ex * 0.00791 * sin(m - m1 + 2.0 * d)
            - ex * 0.006783 * sin(2.0 * d + m);
        l += 0.005162 * sin(m1 - d)
            + ex * 0.005 * sin(m + d)
            + ex * 0.004049 * sin(m1 - m + 2.0 * d);
        l += 0.003996 * sin(2.0 * m1 + 2.0 * d)
            + 0.003862 * sin(4.0 * d)
            + 0.003665 * sin(2.0 * d - 3.0 * m1);
        l += ex * 0.002695 * sin(2.0 * m1 - m)
            + 0.002602 * sin(m1 - 2.0 * ff - 2.0 * d)
            + ex * 0.002396 * sin(2.0 * d - m - 2.0 * m1);
        l += -0.002349 * sin(m1 + d) + ex * ex * 0.002249 * sin(2.0 * d - 2.0 * m)
            - ex * 0.002125 * sin(2.0 * m1 + m);
        l += -ex * ex * 0.002079 * sin(2.0 * m)
            + ex * ex * 0.002059 * sin(2.0 * d - m1 - 2.0 * m)
            - 0.001773 * sin(m1 + 2.0 * d - 2.0 * ff);
        l += ex * 0.00122 * sin(4.0 * d - m - m1) - 0.00111 * sin(2.0 * m1 + 2.0 * ff)
            + 0.000892 * sin(m1 - 3.0 * d);
        l += -ex * 0.000811 * sin(m + m1 + 2.0 * d)
            + ex * 0.000761 * sin(4.0 * d - m - 2.0 * m1)
            + ex * ex * 0.000717 * sin(m1 - 2.0 * m);
        l += ex * ex * 0.000704 * sin(m1 - 2.0 * m - 2.0 * d)
            + ex * 0.000693 * sin(m - 2.0 * m1 + 2.0 * d)
            + ex * 0.000598 * sin(2.0 * d - m - 2.0 * ff)
            + 0.00055 * sin(m1 + 4.0 * d);
        l += 0.000538 * sin(4.0 * m1)
            + ex * 0.000521 * sin(4.0 * d - m)
            + 0.000486 * sin(2.0 * m1 - d);
        l -= 0.001595 * sin(2.0 * ff + 2.0 * d);

        // ecliptic latitude
        let mut b = 5.128189 * sin(ff)
            + 0.280606 * sin(m1 + ff)
            + 0.277693 * sin(m1 - ff)
            + 0.173238 * sin(2.0 * d - ff);
        b += 0.055413 * sin(2.0 * d + ff - m1)
            + 0.046272 * sin(2.0 * d - ff - m1)
            + 0.032573 * sin(2.0 * d + ff);
        b += 0.017198 * sin(2.0 * m1 + ff)
            + 9.266999e-03 * sin(2.0 * d + m1 - ff)
            + 0.008823 * sin(2.0 * m1 - ff);
        b += ex * 0.008247 * sin(2.0 * d - m - ff)
            + 0.004323 * sin(2.0 * d - ff - 2.0 * m1)
            + 0.0042 * sin(2.0 * d + ff + m1);
        b += ex * 0.003372 * sin(ff - m - 2.0 * d)
            + ex * 0.002472 * sin(2.0 * d + ff - m - m1)
            + ex * 0.002222 * sin(2.0 * d + ff - m);
        b += 0.002072 * sin(2.0 * d - ff - m - m1)
            + ex * 0.001877 * sin(ff - m + m1)
            + 0.001828 * sin(4.0 * d - ff - m1);
        b += -ex * 0.001803 * sin(ff + m) - 0.00175 * sin(3.0 * ff)
            + ex * 0.00157 * sin(m1 - m - ff)
            - 0.001487 * sin(ff + d)
            - ex * 0.001481 * sin(ff + m + m1)
            + ex * 0.001417 * sin(ff - m - m1)
            + ex * 0.00135 * sin(ff - m)
            + 0.00133 * sin(ff - d);
        b += 0.001106 * sin(ff + 3.0 * m1)
            + 0.00102 * sin(4.0 * d - ff)
            + 0.000833 * sin(ff + 4.0 * d - m1);
        b += 0.000781 * sin(m1 - 3.0 * ff)
            + 0.00067 * sin(ff + 4.0 * d - 2.0 * m1)
            + 0.000606 * sin(2.0 * d - 3.0 * ff);
        b += 0.000597 * sin(2.0 * d + 2.0 * m1 - ff)
            + ex * 0.000492 * sin(2.0 * d + m1 - m - ff)
            + 0.00045 * sin(2.0 * m1 - ff - 2.0 * d);
        b += 0.000439 * sin(3.0 * m1 - ff)
            + 0.000423 * sin(ff + 2.0 * d + 2.0 * m1)
            + 0.000422 * sin(2.0 * d - ff - 3.0 * m1);
        b += -ex * 0.000367 * sin(m + ff + 2.0 * d - m1) - ex * 0.000353 * sin(m + ff + 2.0 * d)
            + 0.000331 * sin(ff + 4.0 * d);
        b += ex * 0.000317 * sin(2.0 * d + ff - m + m1)
            + ex * ex * 0.000306 * sin(2.0 * d - 2.0 * m - ff)
            - 0.000283 * sin(m1 + 3.0 * ff);

        let w1 = 0.0004664 * cos(om * rad);
        let w2 = 0.0000754 * cos((om + 275.05 - 2.3 * t) * rad);
        let bt = b * (1.0 - w1 - w2);

        // horizontal parallax
        let mut p = 0.950724
            + 0.051818 * cos(m1)
            + 0.009531 * cos(2.0 * d - m1)
            + 0.007843 * cos(2.0 * d)
            + 0.002824 * cos(2.0 * m1)
            + 0.000857 * cos(2.0 * d + m1)
            + ex * 0.000533 * cos(2.0 * d - m)
            + ex * 0.000401 * cos(2.0 * d - m - m1);
        p += 0.000173 * cos(3.0 * m1) + 0.000167 * cos(4.0 * d - m1)
            - ex * 0.000111 * cos(m)
            + 0.000103 * cos(4.0 * d - 2.0 * m1)
            - 0.000084 * cos(2.0 * m1 - 2.0 * d)
            - ex * 0.000083 * cos(2.0 * d + m)
            + 0.000079 * cos(2.0 * d + 2.0 * m1);
        p += 0.000072 * cos(4.0 * d) + ex * 0.000064 * cos(2.0 * d - m + m1)
            - ex * 0.000063 * cos(2.0 * d + m - m1);
        p += ex * 0.000041 * cos(m + d) + ex * 0.000035 * cos(2.0 * m1 - m)
            - 0.000033 * cos(3.0 * m1 - 2.0 * d);
        p += -0.00003 * cos(m1 + d) - 0.000029 * cos(2.0 * ff - 2.0 * d)
            - ex * 0.000029 * cos(2.0 * m1 + m);
        p += ex * ex * 0.000026 * cos(2.0 * d - 2.0 * m) - 0.000023 * cos(2.0 * ff - 2.0 * d + m1)
            + ex * 0.000019 * cos(4.0 * d - m - m1);

        let b = bt * rad;
        let lm = l * rad;
        let moon_dx = 3.0 / (PI * p);

        // ecliptic to equatorial
        let z = (jd - 2415020.5) / 365.2422;
        let ob = (23.452294 - (0.46845 * z + 5.9e-07 * z * z) / 3600.0) * rad;
        let dec = (sin(b) * cos(ob) + cos(b) * sin(ob) * sin(lm)).asin();
        let mut ra = (cos(b) * cos(lm) / cos(dec)).clamp(-1.0, 1.0).acos();
        if lm > PI {
            ra = TWO_PI - ra;
        }

        let n = observer.lat;
        let stnlong = -observer.lon.to_degrees();

        // sidereal time
        let t = (jd - 2451545.0) / 36525.0;
        let mut teg = 280.46061837
            + 360.98564736629 * (jd - 2451545.0)
            + (0.000387933 * t - t * t / 38710000.0) * t;
        teg = teg.rem_euclid(360.0);

        let th = fix_angle((teg - stnlong) * rad);
        let h = th - ra;

        let az = sin(h).atan2(cos(h) * sin(n) - dec.tan() * cos(n)) + PI;
        let el = (sin(n) * sin(dec) + cos(n) * cos(dec) * cos(h)).asin();

        // radial velocity after GM4ANB
        let mm = fix_angle(1.319238 + daynum * 0.228027135);
        let e = 0.10976;
        let t1 = mm + e * sin(mm);
        let dv = 0.01255 * moon_dx * moon_dx * sin(t1) * (1.0 + e * cos(mm)) * 4449.0;
        let (re, rm) = (6378.0, 384401.0);
        let t3 = re * rm * (cos(dec) * cos(n) * sin(h)) / (rm * rm - rm * re * sin(el)).sqrt();

        let right_ascension = ra / rad;
        let mut gha = teg - right_ascension;
        if gha < 0.0 {
            gha += 360.0;
        }

        Self {
            azimuth: az / rad,
            elevation: el / rad,
            right_ascension,
            declination: dec / rad,
            gha,
            radial_velocity: dv + t3 * 0.0753125,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::datetime_to_day_num;
    use approx::assert_abs_diff_eq;
    use chrono::{TimeZone, Utc};

    #[test]
    fn lunar_coordinates_match_almanac() {
        // Meeus example 47.a: 1992 April 12 0h TD, RA 134.69, Dec 13.77
        let daynum = datetime_to_day_num(&Utc.with_ymd_and_hms(1992, 4, 12, 0, 0, 0).unwrap());
        let moon = MoonPosition::find(daynum, &Geodetic::default());

        assert_abs_diff_eq!(moon.right_ascension, 134.69, epsilon = 0.3);
        assert_abs_diff_eq!(moon.declination, 13.77, epsilon = 0.3);
        assert!((0.0..360.0).contains(&moon.gha));
        assert!((0.0..=360.0).contains(&moon.azimuth));
        assert!((-90.0..=90.0).contains(&moon.elevation));
    }
}
