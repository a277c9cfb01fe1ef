use super::common::{short_period, Common, Mean, Secular, AE, TOTHRD, XKMPER};
use super::{Elements, PropagatorError, StateVector};

/// Near earth model for orbits with periods under 225 minutes.
#[derive(Debug, Clone)]
pub struct Sgp4 {
    mean: Mean,
    common: Common,
    /// Perigee below 220 km: drop the higher order drag terms.
    simple: bool,
    omgcof: f64,
    xmcof: f64,
    c5: f64,
    delmo: f64,
    sinmo: f64,
    d2: f64,
    d3: f64,
    d4: f64,
    t3cof: f64,
    t4cof: f64,
    t5cof: f64,
}

impl Sgp4 {
    pub fn new(elements: &Elements) -> Result<Self, PropagatorError> {
        let mean = Mean::from_elements(elements)?;
        let common = Common::new(&mean)?;
        Ok(Self::with_common(mean, common))
    }

    pub(crate) fn with_common(mean: Mean, common: Common) -> Self {
        let Common {
            aodp,
            tsi,
            s4,
            c1,
            coef,
            coef1,
            eta,
            etasq,
            eeta,
            betao2,
            ..
        } = common;
        let eo = mean.eo;
        let simple = aodp * (1.0 - eo) / AE < 220.0 / XKMPER + AE;

        let (omgcof, xmcof) = if eo > 1e-4 {
            let c3 = coef * tsi * common.a3ovk2 * common.xnodp * AE * common.sinio / eo;
            (
                mean.bstar * c3 * mean.omegao.cos(),
                -TOTHRD * coef * mean.bstar * AE / eeta,
            )
        } else {
            (0.0, 0.0)
        };
        let c5 = 2.0 * coef1 * aodp * betao2 * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        let mut model = Self {
            mean,
            simple,
            omgcof,
            xmcof,
            c5,
            delmo: (1.0 + eta * mean.xmo.cos()).powi(3),
            sinmo: mean.xmo.sin(),
            d2: 0.0,
            d3: 0.0,
            d4: 0.0,
            t3cof: 0.0,
            t4cof: 0.0,
            t5cof: 0.0,
            common,
        };

        if !simple {
            let c1sq = c1 * c1;
            let d2 = 4.0 * aodp * tsi * c1sq;
            let temp = d2 * tsi * c1 / 3.0;
            let d3 = (17.0 * aodp + s4) * temp;
            let d4 = 0.5 * temp * aodp * tsi * (221.0 * aodp + 31.0 * s4) * c1;
            model.d2 = d2;
            model.d3 = d3;
            model.d4 = d4;
            model.t3cof = d2 + 2.0 * c1sq;
            model.t4cof = 0.25 * (3.0 * d3 + c1 * (12.0 * d2 + 10.0 * c1sq));
            model.t5cof =
                0.2 * (3.0 * d4 + 12.0 * c1 * d3 + 6.0 * d2 * d2 + 15.0 * c1sq * (2.0 * d2 + c1sq));
        }
        model
    }

    /// Position and velocity `tsince` minutes after epoch.
    pub fn propagate(&self, tsince: f64) -> Result<StateVector, PropagatorError> {
        let m = &self.mean;
        let c = &self.common;

        // Secular gravity and atmospheric drag.
        let xmdf = m.xmo + c.xmdot * tsince;
        let omgadf = m.omegao + c.omgdot * tsince;
        let xnoddf = m.xnodeo + c.xnodot * tsince;
        let tsq = tsince * tsince;
        let xnode = xnoddf + c.xnodcf * tsq;
        let mut omega = omgadf;
        let mut xmp = xmdf;
        let mut tempa = 1.0 - c.c1 * tsince;
        let mut tempe = m.bstar * c.c4 * tsince;
        let mut templ = c.t2cof * tsq;

        if !self.simple {
            let delomg = self.omgcof * tsince;
            let delm = self.xmcof * ((1.0 + c.eta * xmdf.cos()).powi(3) - self.delmo);
            let temp = delomg + delm;
            xmp = xmdf + temp;
            omega = omgadf - temp;
            let tcube = tsq * tsince;
            let tfour = tsince * tcube;
            tempa = tempa - self.d2 * tsq - self.d3 * tcube - self.d4 * tfour;
            tempe += m.bstar * self.c5 * (xmp.sin() - self.sinmo);
            templ += self.t3cof * tcube + tfour * (self.t4cof + tsince * self.t5cof);
        }

        let a = c.aodp * tempa * tempa;
        let secular = Secular {
            a,
            e: m.eo - tempe,
            omega,
            xnode,
            xl: xmp + omega + xnode + c.xnodp * templ,
            xinc: m.xincl,
        };
        short_period(c, &secular, tsince)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{magnitude, sub};
    use approx::assert_abs_diff_eq;

    /// Spacetrack report #3 near earth test case, catalog number 88888.
    fn str3_88888() -> Elements {
        Elements {
            epoch: 80275.98708465,
            bstar: 0.66816e-4,
            inclination: 72.8435,
            raan: 115.9689,
            eccentricity: 0.0086731,
            arg_perigee: 52.6988,
            mean_anomaly: 110.5714,
            mean_motion: 16.05824518,
        }
    }

    /// Published report #3 positions. The tables were printed from a
    /// single precision run, so the double precision model lands up to
    /// about 11 m away by day one.
    const PUBLISHED: [(f64, [f64; 3]); 5] = [
        (0.0, [2328.97048951, -5995.22076416, 1719.97067261]),
        (360.0, [2456.10705566, -6071.93853760, 1222.89727783]),
        (720.0, [2567.56195068, -6112.50384522, 713.96397400]),
        (1080.0, [2663.09078980, -6115.48229980, 196.39640427]),
        (1440.0, [2742.55133057, -6079.67144775, -326.38095856]),
    ];

    #[test]
    fn reproduces_published_positions() {
        let model = Sgp4::new(&str3_88888()).unwrap();
        for (tsince, expected) in PUBLISHED {
            let state = model.propagate(tsince).unwrap();
            let error = magnitude(&sub(&state.position, &expected));
            assert!(error < 1.5e-2, "{error} km off at {tsince} min");
        }
        let epoch = model.propagate(0.0).unwrap();
        let error = magnitude(&sub(&epoch.position, &PUBLISHED[0].1));
        assert!(error < 1e-3, "{error} km off at epoch");
    }

    #[test]
    fn reproduces_published_velocity_at_epoch() {
        let state = Sgp4::new(&str3_88888()).unwrap().propagate(0.0).unwrap();
        let expected = [2.91207230, -0.98341546, -7.09081703];
        for axis in 0..3 {
            assert_abs_diff_eq!(state.velocity[axis], expected[axis], epsilon = 1e-5);
        }
    }

    #[test]
    fn rejects_hyperbolic_elements() {
        let elements = Elements {
            eccentricity: 1.2,
            ..str3_88888()
        };
        assert!(matches!(
            Sgp4::new(&elements),
            Err(PropagatorError::Eccentricity(_))
        ));
    }
}
