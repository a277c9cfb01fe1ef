use super::{Elements, Orientation, PropagatorError, StateVector};
use crate::kernel::{actan, fmod2p, MINUTES_PER_DAY, SECONDS_PER_DAY, TWO_PI};

// WGS-72 gravity model in earth radii and minutes.
pub(crate) const XKE: f64 = 7.43669161e-2;
pub(crate) const CK2: f64 = 5.413080e-4;
pub(crate) const CK4: f64 = 0.62098875e-6;
pub(crate) const XJ3: f64 = -2.53881e-6;
pub(crate) const QOMS2T: f64 = 1.88027916e-9;
pub(crate) const S: f64 = 1.01222928;
pub(crate) const XKMPER: f64 = 6378.135;
pub(crate) const AE: f64 = 1.0;
pub(crate) const E6A: f64 = 1e-6;
pub(crate) const TOTHRD: f64 = 2.0 / 3.0;

const KEPLER_ITERATIONS: usize = 10;
const MIN_ECCENTRICITY: f64 = 1e-6;

/// Elements in radians and radians per minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Mean {
    pub epoch: f64,
    pub bstar: f64,
    pub xincl: f64,
    pub xnodeo: f64,
    pub eo: f64,
    pub omegao: f64,
    pub xmo: f64,
    pub xno: f64,
}

impl Mean {
    pub fn from_elements(elements: &Elements) -> Result<Self, PropagatorError> {
        if elements.mean_motion.is_nan() || elements.mean_motion <= 0.0 {
            return Err(PropagatorError::MeanMotion(elements.mean_motion));
        }
        if !(0.0..1.0).contains(&elements.eccentricity) {
            return Err(PropagatorError::Eccentricity(elements.eccentricity));
        }

        Ok(Self {
            epoch: elements.epoch,
            bstar: elements.bstar / AE,
            xincl: elements.inclination.to_radians(),
            xnodeo: elements.raan.to_radians(),
            eo: elements.eccentricity,
            omegao: elements.arg_perigee.to_radians(),
            xmo: elements.mean_anomaly.to_radians(),
            xno: elements.mean_motion * TWO_PI / MINUTES_PER_DAY,
        })
    }

    /// Un-Kozai'd mean motion and semi-major axis.
    pub fn recover(&self) -> (f64, f64) {
        let a1 = (XKE / self.xno).powf(TOTHRD);
        let cosio = self.xincl.cos();
        let x3thm1 = 3.0 * cosio * cosio - 1.0;
        let betao2 = 1.0 - self.eo * self.eo;
        let betao = betao2.sqrt();
        let del1 = 1.5 * CK2 * x3thm1 / (a1 * a1 * betao * betao2);
        let ao = a1 * (1.0 - del1 * (0.5 * TOTHRD + del1 * (1.0 + 134.0 / 81.0 * del1)));
        let delo = 1.5 * CK2 * x3thm1 / (ao * ao * betao * betao2);
        (self.xno / (1.0 + delo), ao / (1.0 - delo))
    }

    /// Orbits with a period of 225 minutes or more need the deep space terms.
    pub fn is_deep_space(&self) -> bool {
        let (xnodp, _) = self.recover();
        TWO_PI / xnodp / MINUTES_PER_DAY >= 0.15625
    }
}

/// Coefficients shared by the near earth and deep space models.
#[derive(Debug, Clone)]
pub(crate) struct Common {
    pub cosio: f64,
    pub sinio: f64,
    pub theta2: f64,
    pub eosq: f64,
    pub betao: f64,
    pub betao2: f64,
    pub x3thm1: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
    pub xnodp: f64,
    pub aodp: f64,
    pub s4: f64,
    pub tsi: f64,
    pub eta: f64,
    pub etasq: f64,
    pub eeta: f64,
    pub coef: f64,
    pub coef1: f64,
    pub a3ovk2: f64,
    pub c1: f64,
    pub c4: f64,
    pub xmdot: f64,
    pub omgdot: f64,
    pub xnodot: f64,
    pub xnodcf: f64,
    pub t2cof: f64,
    pub xlcof: f64,
    pub aycof: f64,
}

impl Common {
    pub fn new(mean: &Mean) -> Result<Self, PropagatorError> {
        let cosio = mean.xincl.cos();
        if (1.0 + cosio).abs() < 1.5e-12 {
            return Err(PropagatorError::SingularInclination);
        }
        let sinio = mean.xincl.sin();
        let theta2 = cosio * cosio;
        let x3thm1 = 3.0 * theta2 - 1.0;
        let eo = mean.eo;
        let eosq = eo * eo;
        let betao2 = 1.0 - eosq;
        let betao = betao2.sqrt();
        let (xnodp, aodp) = mean.recover();
        if aodp.is_nan() || aodp <= 0.0 {
            return Err(PropagatorError::SemiMajorAxis(aodp * XKMPER));
        }

        // Low perigees alter the atmospheric density parameters.
        let mut s4 = S;
        let mut qoms24 = QOMS2T;
        let perigee = (aodp * (1.0 - eo) - AE) * XKMPER;
        if perigee < 156.0 {
            s4 = if perigee <= 98.0 { 20.0 } else { perigee - 78.0 };
            qoms24 = ((120.0 - s4) * AE / XKMPER).powi(4);
            s4 = s4 / XKMPER + AE;
        }

        let pinvsq = 1.0 / (aodp * aodp * betao2 * betao2);
        let tsi = 1.0 / (aodp - s4);
        let eta = aodp * eo * tsi;
        let etasq = eta * eta;
        let eeta = eo * eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qoms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);
        let c2 = coef1
            * xnodp
            * (aodp * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.75 * CK2 * tsi / psisq * x3thm1 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        let c1 = mean.bstar * c2;
        let a3ovk2 = -XJ3 / CK2 * AE.powi(3);
        let x1mth2 = 1.0 - theta2;
        let c4 = 2.0
            * xnodp
            * coef1
            * aodp
            * betao2
            * (eta * (2.0 + 0.5 * etasq) + eo * (0.5 + 2.0 * etasq)
                - 2.0 * CK2 * tsi / (aodp * psisq)
                    * (-3.0 * x3thm1 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75
                            * x1mth2
                            * (2.0 * etasq - eeta * (1.0 + etasq))
                            * (2.0 * mean.omegao).cos()));

        let theta4 = theta2 * theta2;
        let temp1 = 3.0 * CK2 * pinvsq * xnodp;
        let temp2 = temp1 * CK2 * pinvsq;
        let temp3 = 1.25 * CK4 * pinvsq * pinvsq * xnodp;
        let xmdot = xnodp
            + 0.5 * temp1 * betao * x3thm1
            + 0.0625 * temp2 * betao * (13.0 - 78.0 * theta2 + 137.0 * theta4);
        let x1m5th = 1.0 - 5.0 * theta2;
        let omgdot = -0.5 * temp1 * x1m5th
            + 0.0625 * temp2 * (7.0 - 114.0 * theta2 + 395.0 * theta4)
            + temp3 * (3.0 - 36.0 * theta2 + 49.0 * theta4);
        let xhdot1 = -temp1 * cosio;
        let xnodot = xhdot1
            + (0.5 * temp2 * (4.0 - 19.0 * theta2) + 2.0 * temp3 * (3.0 - 7.0 * theta2)) * cosio;

        Ok(Self {
            cosio,
            sinio,
            theta2,
            eosq,
            betao,
            betao2,
            x3thm1,
            x1mth2,
            x7thm1: 7.0 * theta2 - 1.0,
            xnodp,
            aodp,
            s4,
            tsi,
            eta,
            etasq,
            eeta,
            coef,
            coef1,
            a3ovk2,
            c1,
            c4,
            xmdot,
            omgdot,
            xnodot,
            xnodcf: 3.5 * betao2 * xhdot1 * c1,
            t2cof: 1.5 * c1,
            xlcof: 0.125 * a3ovk2 * sinio * (3.0 + 5.0 * cosio) / (1.0 + cosio),
            aycof: 0.25 * a3ovk2 * sinio,
        })
    }
}

/// Mean elements after the secular (and for deep space, periodic) updates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Secular {
    pub a: f64,
    pub e: f64,
    pub omega: f64,
    pub xnode: f64,
    pub xl: f64,
    pub xinc: f64,
}

/// Long period periodics, Kepler's equation and the short period
/// corrections common to both models. Returns kilometres and km/s.
pub(crate) fn short_period(
    common: &Common,
    secular: &Secular,
    tsince: f64,
) -> Result<StateVector, PropagatorError> {
    let Secular {
        a,
        e,
        omega,
        xnode,
        xl,
        xinc,
    } = *secular;

    if a.is_nan() || a <= 0.0 {
        return Err(PropagatorError::SemiMajorAxis(a * XKMPER));
    }
    if !(-0.001..1.0).contains(&e) {
        return Err(PropagatorError::Eccentricity(e));
    }
    let e = e.max(MIN_ECCENTRICITY);

    let xn = XKE / a.powf(1.5);
    let beta = (1.0 - e * e).sqrt();
    let axn = e * omega.cos();
    let temp = 1.0 / (a * beta * beta);
    let xll = temp * common.xlcof * axn;
    let aynl = temp * common.aycof;
    let xlt = xl + xll;
    let ayn = e * omega.sin() + aynl;

    let capu = fmod2p(xlt - xnode);
    let mut epw = capu;
    let (mut sinepw, mut cosepw) = (0.0, 1.0);
    let (mut temp3, mut temp4, mut temp5, mut temp6) = (0.0, 0.0, 0.0, 0.0);
    for _ in 0..KEPLER_ITERATIONS {
        sinepw = epw.sin();
        cosepw = epw.cos();
        temp3 = axn * sinepw;
        temp4 = ayn * cosepw;
        temp5 = axn * cosepw;
        temp6 = ayn * sinepw;
        let next = (capu - temp4 + temp3 - epw) / (1.0 - temp5 - temp6) + epw;
        if (next - epw).abs() <= E6A {
            break;
        }
        epw = next;
    }

    let ecose = temp5 + temp6;
    let esine = temp3 - temp4;
    let elsq = axn * axn + ayn * ayn;
    let temp = 1.0 - elsq;
    let pl = a * temp;
    if pl < 0.0 {
        return Err(PropagatorError::SemiLatusRectum(pl * XKMPER));
    }

    let r = a * (1.0 - ecose);
    let temp1 = 1.0 / r;
    let rdot = XKE * a.sqrt() * esine * temp1;
    let rfdot = XKE * pl.sqrt() * temp1;
    let temp2 = a * temp1;
    let betal = temp.sqrt();
    let temp3 = 1.0 / (1.0 + betal);
    let cosu = temp2 * (cosepw - axn + ayn * esine * temp3);
    let sinu = temp2 * (sinepw - ayn - axn * esine * temp3);
    let u = actan(sinu, cosu);
    let sin2u = 2.0 * sinu * cosu;
    let cos2u = 2.0 * cosu * cosu - 1.0;

    let temp = 1.0 / pl;
    let temp1 = CK2 * temp;
    let temp2 = temp1 * temp;
    let rk = r * (1.0 - 1.5 * temp2 * betal * common.x3thm1)
        + 0.5 * temp1 * common.x1mth2 * cos2u;
    let uk = u - 0.25 * temp2 * common.x7thm1 * sin2u;
    let xnodek = xnode + 1.5 * temp2 * common.cosio * sin2u;
    let xinck = xinc + 1.5 * temp2 * common.cosio * common.sinio * cos2u;
    let rdotk = rdot - xn * temp1 * common.x1mth2 * sin2u;
    let rfdotk = rfdot + xn * temp1 * (common.x1mth2 * cos2u + 1.5 * common.x3thm1);

    let (sinuk, cosuk) = uk.sin_cos();
    let (sinik, cosik) = xinck.sin_cos();
    let (sinnok, cosnok) = xnodek.sin_cos();
    let xmx = -sinnok * cosik;
    let xmy = cosnok * cosik;
    let ux = xmx * sinuk + cosnok * cosuk;
    let uy = xmy * sinuk + sinnok * cosuk;
    let uz = sinik * sinuk;
    let vx = xmx * cosuk - cosnok * sinuk;
    let vy = xmy * cosuk - sinnok * sinuk;
    let vz = sinik * cosuk;

    let vscale = XKMPER * MINUTES_PER_DAY / SECONDS_PER_DAY;
    let state = StateVector {
        position: [rk * ux * XKMPER, rk * uy * XKMPER, rk * uz * XKMPER],
        velocity: [
            (rdotk * ux + rfdotk * vx) * vscale,
            (rdotk * uy + rfdotk * vy) * vscale,
            (rdotk * uz + rfdotk * vz) * vscale,
        ],
        phase: fmod2p(xlt - xnode - omega + TWO_PI),
        orientation: Orientation {
            arg_perigee: omega,
            inclination: xinck,
            node: xnodek,
        },
    };

    if state.position.iter().chain(&state.velocity).any(|v| !v.is_finite()) {
        return Err(PropagatorError::NonFinite("state vector", tsince));
    }
    Ok(state)
}
