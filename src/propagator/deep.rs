//! Lunar and solar perturbations for orbits with periods of 225 minutes or
//! more, including the 12 hour and 24 hour resonance integrator.

use std::f64::consts::PI;

use serde::Serialize;

use super::common::{Common, Mean};
use crate::kernel::{actan, fmod2p, theta_g, TWO_PI};

const ZNS: f64 = 1.19459e-5;
const C1SS: f64 = 2.9864797e-6;
const ZES: f64 = 1.675e-2;
const ZNL: f64 = 1.5835218e-4;
const C1L: f64 = 4.7968065e-7;
const ZEL: f64 = 5.490e-2;
const ZCOSIS: f64 = 9.1744867e-1;
const ZSINIS: f64 = 3.9785416e-1;
const ZSINGS: f64 = -9.8088458e-1;
const ZCOSGS: f64 = 1.945905e-1;

const Q22: f64 = 1.7891679e-6;
const Q31: f64 = 2.1460748e-6;
const Q33: f64 = 2.2123015e-7;
const G22: f64 = 5.7686396;
const G32: f64 = 9.5240898e-1;
const G44: f64 = 1.8014998;
const G52: f64 = 1.0508330;
const G54: f64 = 4.4108898;
const ROOT22: f64 = 1.7891679e-6;
const ROOT32: f64 = 3.7393792e-7;
const ROOT44: f64 = 7.3636953e-9;
const ROOT52: f64 = 1.1428639e-7;
const ROOT54: f64 = 2.1765803e-9;
const THDT: f64 = 4.3752691e-3;

const FASX2: f64 = 0.13130908;
const FASX4: f64 = 2.8843198;
const FASX6: f64 = 0.37448087;

const STEPP: f64 = 720.0;
const STEPN: f64 = -720.0;
const STEP2: f64 = 259200.0;

/// Position of the resonance integrator, in minutes from epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Checkpoint {
    pub atime: f64,
    pub xli: f64,
    pub xni: f64,
}

/// Secular and periodic coefficients of one perturbing body.
#[derive(Debug, Clone, Copy, Default)]
struct ThirdBody {
    se: f64,
    si: f64,
    sl: f64,
    sgh: f64,
    sh: f64,
    e2: f64,
    e3: f64,
    i2: f64,
    i3: f64,
    l2: f64,
    l3: f64,
    l4: f64,
    gh2: f64,
    gh3: f64,
    gh4: f64,
    h2: f64,
    h3: f64,
}

/// Direction of a perturbing body's orbit and its mean motion.
struct Attractor {
    zcosg: f64,
    zsing: f64,
    zcosi: f64,
    zsini: f64,
    zcosh: f64,
    zsinh: f64,
    cc: f64,
    zn: f64,
    ze: f64,
}

/// Long periodic contributions of one body at a given time.
struct Periodics {
    e: f64,
    i: f64,
    l: f64,
    gh: f64,
    h: f64,
}

impl ThirdBody {
    fn new(body: &Attractor, mean: &Mean, common: &Common, xqncl: f64) -> Self {
        let Attractor {
            zcosg,
            zsing,
            zcosi,
            zsini,
            zcosh,
            zsinh,
            cc,
            zn,
            ze,
        } = *body;
        let (cosio, sinio) = (common.cosio, common.sinio);
        let eosq = common.eosq;
        let (sing, cosg) = mean.omegao.sin_cos();

        let a1 = zcosg * zcosh + zsing * zcosi * zsinh;
        let a3 = -zsing * zcosh + zcosg * zcosi * zsinh;
        let a7 = -zcosg * zsinh + zsing * zcosi * zcosh;
        let a8 = zsing * zsini;
        let a9 = zsing * zsinh + zcosg * zcosi * zcosh;
        let a10 = zcosg * zsini;
        let a2 = cosio * a7 + sinio * a8;
        let a4 = cosio * a9 + sinio * a10;
        let a5 = -sinio * a7 + cosio * a8;
        let a6 = -sinio * a9 + cosio * a10;
        let x1 = a1 * cosg + a2 * sing;
        let x2 = a3 * cosg + a4 * sing;
        let x3 = -a1 * sing + a2 * cosg;
        let x4 = -a3 * sing + a4 * cosg;
        let x5 = a5 * sing;
        let x6 = a6 * sing;
        let x7 = a5 * cosg;
        let x8 = a6 * cosg;

        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let mut z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * eosq;
        let mut z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * eosq;
        let mut z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * eosq;
        let z11 = -6.0 * a1 * a5 + eosq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + eosq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + eosq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + eosq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + eosq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + eosq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
        z1 = z1 + z1 + common.betao2 * z31;
        z2 = z2 + z2 + common.betao2 * z32;
        z3 = z3 + z3 + common.betao2 * z33;

        let s3 = cc / common.xnodp;
        let s2 = -0.5 * s3 / common.betao;
        let s4 = s3 * common.betao;
        let s1 = -15.0 * mean.eo * s4;
        let s5 = x1 * x3 + x2 * x4;
        let s6 = x2 * x3 + x1 * x4;
        let s7 = x2 * x4 - x1 * x3;

        // Node terms vanish for nearly equatorial orbits.
        let sh = if xqncl < 5.2359877e-2 {
            0.0
        } else {
            -zn * s2 * (z21 + z23)
        };

        Self {
            se: s1 * zn * s5,
            si: s2 * zn * (z11 + z13),
            sl: -zn * s3 * (z1 + z3 - 14.0 - 6.0 * eosq),
            sgh: s4 * zn * (z31 + z33 - 6.0),
            sh,
            e2: 2.0 * s1 * s6,
            e3: 2.0 * s1 * s7,
            i2: 2.0 * s2 * z12,
            i3: 2.0 * s2 * (z13 - z11),
            l2: -2.0 * s3 * z2,
            l3: -2.0 * s3 * (z3 - z1),
            l4: -2.0 * s3 * (-21.0 - 9.0 * eosq) * ze,
            gh2: 2.0 * s4 * z32,
            gh3: 2.0 * s4 * (z33 - z31),
            gh4: -18.0 * s4 * ze,
            h2: -2.0 * s2 * z22,
            h3: -2.0 * s2 * (z23 - z21),
        }
    }

    fn periodics(&self, zmo: f64, zn: f64, ze: f64, t: f64) -> Periodics {
        let zm = zmo + zn * t;
        let zf = zm + 2.0 * ze * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        Periodics {
            e: self.e2 * f2 + self.e3 * f3,
            i: self.i2 * f2 + self.i3 * f3,
            l: self.l2 * f2 + self.l3 * f3 + self.l4 * sinzf,
            gh: self.gh2 * f2 + self.gh3 * f3 + self.gh4 * sinzf,
            h: self.h2 * f2 + self.h3 * f3,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HalfDayTerms {
    d2201: f64,
    d2211: f64,
    d3210: f64,
    d3222: f64,
    d4410: f64,
    d4422: f64,
    d5220: f64,
    d5232: f64,
    d5421: f64,
    d5433: f64,
}

#[derive(Debug, Clone, Copy)]
enum Resonance {
    None,
    /// One revolution per day.
    Synchronous { del1: f64, del2: f64, del3: f64 },
    /// Two revolutions per day with eccentricity of at least 0.5.
    HalfDay(HalfDayTerms),
}

/// Mean elements flowing through the deep space corrections.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DeepElements {
    pub xll: f64,
    pub omgadf: f64,
    pub xnode: f64,
    pub em: f64,
    pub xinc: f64,
    pub xn: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct DeepSpace {
    thgr: f64,
    xnq: f64,
    xqncl: f64,
    omegaq: f64,
    zmol: f64,
    zmos: f64,
    solar: ThirdBody,
    lunar: ThirdBody,
    sse: f64,
    ssi: f64,
    ssl: f64,
    ssh: f64,
    ssg: f64,
    resonance: Resonance,
    xlamo: f64,
    xfact: f64,
    checkpoint: Checkpoint,
}

impl DeepSpace {
    pub fn new(mean: &Mean, common: &Common) -> Self {
        let (thgr, ds50) = theta_g(mean.epoch);
        let xnq = common.xnodp;
        let aqnv = 1.0 / common.aodp;
        let xqncl = mean.xincl;
        let (sinq, cosq) = mean.xnodeo.sin_cos();

        // Lunar orbit orientation for the epoch.
        let day = ds50 + 18261.5;
        let xnodce = 4.5236020 - 9.2422029e-4 * day;
        let (stem, ctem) = xnodce.sin_cos();
        let zcosil = 0.91375164 - 0.03568096 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089683511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let c = 4.7199672 + 0.22997150 * day;
        let gam = 5.8351514 + 0.0019443680 * day;
        let zmol = fmod2p(c - gam);
        let zx = 0.39785416 * stem / zsinil;
        let zy = zcoshl * ctem + 0.91744867 * zsinhl * stem;
        let zx = gam + actan(zx, zy) - xnodce;
        let (zsingl, zcosgl) = zx.sin_cos();
        let zmos = fmod2p(6.2565837 + 0.017201977 * day);

        let sun = Attractor {
            zcosg: ZCOSGS,
            zsing: ZSINGS,
            zcosi: ZCOSIS,
            zsini: ZSINIS,
            zcosh: cosq,
            zsinh: sinq,
            cc: C1SS,
            zn: ZNS,
            ze: ZES,
        };
        let moon = Attractor {
            zcosg: zcosgl,
            zsing: zsingl,
            zcosi: zcosil,
            zsini: zsinil,
            zcosh: zcoshl * cosq + zsinhl * sinq,
            zsinh: sinq * zcoshl - cosq * zsinhl,
            cc: C1L,
            zn: ZNL,
            ze: ZEL,
        };
        let solar = ThirdBody::new(&sun, mean, common, xqncl);
        let lunar = ThirdBody::new(&moon, mean, common, xqncl);

        let (cosio, sinio) = (common.cosio, common.sinio);
        let sse = solar.se + lunar.se;
        let ssi = solar.si + lunar.si;
        let ssl = solar.sl + lunar.sl;
        // node terms are already zero for equatorial orbits
        let per_sinio = |sh: f64| if sinio.abs() < 1e-12 { 0.0 } else { sh / sinio };
        let ssh = per_sinio(solar.sh) + per_sinio(lunar.sh);
        let ssg = solar.sgh - cosio * per_sinio(solar.sh) + lunar.sgh - cosio * per_sinio(lunar.sh);

        let mut deep = Self {
            thgr,
            xnq,
            xqncl,
            omegaq: mean.omegao,
            zmol,
            zmos,
            solar,
            lunar,
            sse,
            ssi,
            ssl,
            ssh,
            ssg,
            resonance: Resonance::None,
            xlamo: 0.0,
            xfact: 0.0,
            checkpoint: Checkpoint {
                atime: 0.0,
                xli: 0.0,
                xni: xnq,
            },
        };

        let synchronous = xnq > 0.0034906585 && xnq < 0.0052359877;
        let half_day = (0.00826..=0.00924).contains(&xnq) && mean.eo >= 0.5;
        let (resonance, xlamo, bfact) = if synchronous {
            deep.synchronous_terms(mean, common, aqnv)
        } else if half_day {
            deep.half_day_terms(mean, common, aqnv)
        } else {
            return deep;
        };

        deep.resonance = resonance;
        deep.xlamo = xlamo;
        deep.xfact = bfact - xnq;
        deep.checkpoint = Checkpoint {
            atime: 0.0,
            xli: xlamo,
            xni: xnq,
        };
        deep
    }

    fn synchronous_terms(&self, mean: &Mean, common: &Common, aqnv: f64) -> (Resonance, f64, f64) {
        let (cosio, sinio, eosq) = (common.cosio, common.sinio, common.eosq);
        let g200 = 1.0 + eosq * (-2.5 + 0.8125 * eosq);
        let g310 = 1.0 + 2.0 * eosq;
        let g300 = 1.0 + eosq * (-6.0 + 6.60937 * eosq);
        let f220 = 0.75 * (1.0 + cosio) * (1.0 + cosio);
        let f311 = 0.9375 * sinio * sinio * (1.0 + 3.0 * cosio) - 0.75 * (1.0 + cosio);
        let f330 = 1.875 * (1.0 + cosio).powi(3);
        let del1 = 3.0 * self.xnq * self.xnq * aqnv * aqnv;

        let resonance = Resonance::Synchronous {
            del1: del1 * f311 * g310 * Q31 * aqnv,
            del2: 2.0 * del1 * f220 * g200 * Q22,
            del3: 3.0 * del1 * f330 * g300 * Q33 * aqnv,
        };
        let xlamo = mean.xmo + mean.xnodeo + mean.omegao - self.thgr;
        let xpidot = common.omgdot + common.xnodot;
        let bfact = common.xmdot + xpidot - THDT + self.ssl + self.ssg + self.ssh;
        (resonance, xlamo, bfact)
    }

    fn half_day_terms(&self, mean: &Mean, common: &Common, aqnv: f64) -> (Resonance, f64, f64) {
        let eq = mean.eo;
        let eosq = common.eosq;
        let eoc = eq * eosq;
        let g201 = -0.306 - (eq - 0.64) * 0.440;

        let (g211, g310, g322, g410, g422, g520);
        if eq <= 0.65 {
            g211 = 3.616 - 13.247 * eq + 16.290 * eosq;
            g310 = -19.302 + 117.390 * eq - 228.419 * eosq + 156.591 * eoc;
            g322 = -18.9068 + 109.7927 * eq - 214.6334 * eosq + 146.5816 * eoc;
            g410 = -41.122 + 242.694 * eq - 471.094 * eosq + 313.953 * eoc;
            g422 = -146.407 + 841.880 * eq - 1629.014 * eosq + 1083.435 * eoc;
            g520 = -532.114 + 3017.977 * eq - 5740.0 * eosq + 3708.276 * eoc;
        } else {
            g211 = -72.099 + 331.819 * eq - 508.738 * eosq + 266.724 * eoc;
            g310 = -346.844 + 1582.851 * eq - 2415.925 * eosq + 1246.113 * eoc;
            g322 = -342.585 + 1554.908 * eq - 2366.899 * eosq + 1215.972 * eoc;
            g410 = -1052.797 + 4758.686 * eq - 7193.992 * eosq + 3651.957 * eoc;
            g422 = -3581.69 + 16178.11 * eq - 24462.77 * eosq + 12422.52 * eoc;
            g520 = if eq <= 0.715 {
                1464.74 - 4664.75 * eq + 3763.64 * eosq
            } else {
                -5149.66 + 29936.92 * eq - 54087.36 * eosq + 31324.56 * eoc
            };
        }

        let (g533, g521, g532);
        if eq < 0.7 {
            g533 = -919.2277 + 4988.61 * eq - 9064.77 * eosq + 5542.21 * eoc;
            g521 = -822.71072 + 4568.6173 * eq - 8491.4146 * eosq + 5337.524 * eoc;
            g532 = -853.666 + 4690.25 * eq - 8624.77 * eosq + 5341.4 * eoc;
        } else {
            g533 = -37995.78 + 161616.52 * eq - 229838.2 * eosq + 109377.94 * eoc;
            g521 = -51752.104 + 218913.95 * eq - 309468.16 * eosq + 146349.42 * eoc;
            g532 = -40023.88 + 170470.89 * eq - 242699.48 * eosq + 115605.82 * eoc;
        }

        let (cosio, sinio, theta2) = (common.cosio, common.sinio, common.theta2);
        let sini2 = sinio * sinio;
        let f220 = 0.75 * (1.0 + 2.0 * cosio + theta2);
        let f221 = 1.5 * sini2;
        let f321 = 1.875 * sinio * (1.0 - 2.0 * cosio - 3.0 * theta2);
        let f322 = -1.875 * sinio * (1.0 + 2.0 * cosio - 3.0 * theta2);
        let f441 = 35.0 * sini2 * f220;
        let f442 = 39.3750 * sini2 * sini2;
        let f522 = 9.84375
            * sinio
            * (sini2 * (1.0 - 2.0 * cosio - 5.0 * theta2)
                + 0.33333333 * (-2.0 + 4.0 * cosio + 6.0 * theta2));
        let f523 = sinio
            * (4.92187512 * sini2 * (-2.0 - 4.0 * cosio + 10.0 * theta2)
                + 6.56250012 * (1.0 + 2.0 * cosio - 3.0 * theta2));
        let f542 = 29.53125
            * sinio
            * (2.0 - 8.0 * cosio + theta2 * (-12.0 + 8.0 * cosio + 10.0 * theta2));
        let f543 = 29.53125
            * sinio
            * (-2.0 - 8.0 * cosio + theta2 * (12.0 + 8.0 * cosio - 10.0 * theta2));

        let xno2 = self.xnq * self.xnq;
        let ainv2 = aqnv * aqnv;
        let mut temp1 = 3.0 * xno2 * ainv2;
        let temp = temp1 * ROOT22;
        let d2201 = temp * f220 * g201;
        let d2211 = temp * f221 * g211;
        temp1 *= aqnv;
        let temp = temp1 * ROOT32;
        let d3210 = temp * f321 * g310;
        let d3222 = temp * f322 * g322;
        temp1 *= aqnv;
        let temp = 2.0 * temp1 * ROOT44;
        let d4410 = temp * f441 * g410;
        let d4422 = temp * f442 * g422;
        temp1 *= aqnv;
        let temp = temp1 * ROOT52;
        let d5220 = temp * f522 * g520;
        let d5232 = temp * f523 * g532;
        let temp = 2.0 * temp1 * ROOT54;
        let d5421 = temp * f542 * g521;
        let d5433 = temp * f543 * g533;

        let resonance = Resonance::HalfDay(HalfDayTerms {
            d2201,
            d2211,
            d3210,
            d3222,
            d4410,
            d4422,
            d5220,
            d5232,
            d5421,
            d5433,
        });
        let xlamo = mean.xmo + mean.xnodeo + mean.xnodeo - self.thgr - self.thgr;
        let bfact = common.xmdot + common.xnodot + common.xnodot - THDT - THDT
            + self.ssl
            + self.ssh
            + self.ssh;
        (resonance, xlamo, bfact)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// Time derivatives of the resonance longitude and mean motion at the
    /// current checkpoint.
    fn dots(&self, common: &Common) -> (f64, f64, f64) {
        let Checkpoint { atime, xli, xni } = self.checkpoint;
        let (xndot, xnddt) = match self.resonance {
            Resonance::None => (0.0, 0.0),
            Resonance::Synchronous { del1, del2, del3 } => (
                del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin(),
                del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos(),
            ),
            Resonance::HalfDay(d) => {
                let xomi = self.omegaq + common.omgdot * atime;
                let x2omi = xomi + xomi;
                let x2li = xli + xli;
                let xndot = d.d2201 * (x2omi + xli - G22).sin()
                    + d.d2211 * (xli - G22).sin()
                    + d.d3210 * (xomi + xli - G32).sin()
                    + d.d3222 * (-xomi + xli - G32).sin()
                    + d.d4410 * (x2omi + x2li - G44).sin()
                    + d.d4422 * (x2li - G44).sin()
                    + d.d5220 * (xomi + xli - G52).sin()
                    + d.d5232 * (-xomi + xli - G52).sin()
                    + d.d5421 * (xomi + x2li - G54).sin()
                    + d.d5433 * (-xomi + x2li - G54).sin();
                let xnddt = d.d2201 * (x2omi + xli - G22).cos()
                    + d.d2211 * (xli - G22).cos()
                    + d.d3210 * (xomi + xli - G32).cos()
                    + d.d3222 * (-xomi + xli - G32).cos()
                    + d.d5220 * (xomi + xli - G52).cos()
                    + d.d5232 * (-xomi + xli - G52).cos()
                    + 2.0
                        * (d.d4410 * (x2omi + x2li - G44).cos()
                            + d.d4422 * (x2li - G44).cos()
                            + d.d5421 * (xomi + x2li - G54).cos()
                            + d.d5433 * (-xomi + x2li - G54).cos());
                (xndot, xnddt)
            }
        };
        let xldot = xni + self.xfact;
        (xldot, xndot, xnddt * xldot)
    }

    /// Secular lunar-solar effects and, for resonant orbits, numerical
    /// integration of the resonance terms up to `t`.
    pub fn secular(&mut self, mean: &Mean, common: &Common, t: f64, el: &mut DeepElements) {
        el.xll += self.ssl * t;
        el.omgadf += self.ssg * t;
        el.xnode += self.ssh * t;
        el.em = mean.eo + self.sse * t;
        el.xinc = mean.xincl + self.ssi * t;
        if el.xinc < 0.0 {
            el.xinc = -el.xinc;
            el.xnode += PI;
            el.omgadf -= PI;
        }

        if matches!(self.resonance, Resonance::None) {
            return;
        }

        // Restart from epoch when the request changes side or moves back
        // toward epoch.
        let atime = self.checkpoint.atime;
        if atime == 0.0
            || (t >= 0.0 && atime < 0.0)
            || (t < 0.0 && atime >= 0.0)
            || t.abs() < atime.abs()
        {
            self.checkpoint = Checkpoint {
                atime: 0.0,
                xli: self.xlamo,
                xni: self.xnq,
            };
        }

        let delt = if t >= 0.0 { STEPP } else { STEPN };
        let (xldot, xndot, xnddt, ft) = loop {
            let (xldot, xndot, xnddt) = self.dots(common);
            let cp = &mut self.checkpoint;
            if (t - cp.atime).abs() < STEPP {
                break (xldot, xndot, xnddt, t - cp.atime);
            }
            cp.xli += xldot * delt + xndot * STEP2;
            cp.xni += xndot * delt + xnddt * STEP2;
            cp.atime += delt;
        };

        let Checkpoint { xli, xni, .. } = self.checkpoint;
        el.xn = xni + xndot * ft + xnddt * ft * ft * 0.5;
        let xl = xli + xldot * ft + xndot * ft * ft * 0.5;
        let temp = -el.xnode + self.thgr + t * THDT;
        el.xll = match self.resonance {
            Resonance::Synchronous { .. } => xl - el.omgadf + temp,
            _ => xl + temp + temp,
        };
    }

    /// Lunar-solar periodics, with the Lyddane modification for
    /// inclinations below 0.2 rad.
    pub fn periodic(&self, common: &Common, t: f64, el: &mut DeepElements) {
        let (sinis, cosis) = el.xinc.sin_cos();
        let sol = self.solar.periodics(self.zmos, ZNS, ZES, t);
        let lun = self.lunar.periodics(self.zmol, ZNL, ZEL, t);
        let pe = sol.e + lun.e;
        let pinc = sol.i + lun.i;
        let pl = sol.l + lun.l;
        let mut pgh = sol.gh + lun.gh;
        let mut ph = sol.h + lun.h;

        el.xinc += pinc;
        el.em += pe;

        if self.xqncl >= 0.2 {
            ph /= common.sinio;
            pgh -= common.cosio * ph;
            el.omgadf += pgh;
            el.xnode += ph;
            el.xll += pl;
            return;
        }

        let (sinok, cosok) = el.xnode.sin_cos();
        let alfdp = sinis * sinok + ph * cosok + pinc * cosis * sinok;
        let betdp = sinis * cosok - ph * sinok + pinc * cosis * cosok;
        el.xnode = fmod2p(el.xnode);
        let xls = el.xll + el.omgadf + cosis * el.xnode + pl + pgh - pinc * el.xnode * sinis;
        let xnoh = el.xnode;
        el.xnode = actan(alfdp, betdp);
        if (xnoh - el.xnode).abs() > PI {
            if el.xnode < xnoh {
                el.xnode += TWO_PI;
            } else {
                el.xnode -= TWO_PI;
            }
        }
        el.xll += pl;
        el.omgadf = xls - el.xll - el.xinc.cos() * el.xnode;
    }
}
