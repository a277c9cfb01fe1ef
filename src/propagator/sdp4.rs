use super::common::{short_period, Common, Mean, Secular, TOTHRD, XKE};
use super::deep::{Checkpoint, DeepElements, DeepSpace};
use super::{Elements, PropagatorError, StateVector};

/// Deep space model for orbits with periods of 225 minutes or more.
///
/// Propagation advances the resonance integrator, so it needs `&mut self`;
/// successive calls close together in time are cheapest.
#[derive(Debug, Clone)]
pub struct Sdp4 {
    mean: Mean,
    common: Common,
    deep: DeepSpace,
}

impl Sdp4 {
    pub fn new(elements: &Elements) -> Result<Self, PropagatorError> {
        let mean = Mean::from_elements(elements)?;
        let common = Common::new(&mean)?;
        Ok(Self::with_common(mean, common))
    }

    pub(crate) fn with_common(mean: Mean, common: Common) -> Self {
        let deep = DeepSpace::new(&mean, &common);
        Self { mean, common, deep }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.deep.checkpoint()
    }

    pub fn propagate(&mut self, tsince: f64) -> Result<StateVector, PropagatorError> {
        let m = &self.mean;
        let c = &self.common;

        let tsq = tsince * tsince;
        let tempa = 1.0 - c.c1 * tsince;
        let tempe = m.bstar * c.c4 * tsince;
        let templ = c.t2cof * tsq;

        let mut el = DeepElements {
            xll: m.xmo + c.xmdot * tsince,
            omgadf: m.omegao + c.omgdot * tsince,
            xnode: m.xnodeo + c.xnodot * tsince + c.xnodcf * tsq,
            em: m.eo,
            xinc: m.xincl,
            xn: c.xnodp,
        };
        self.deep.secular(m, c, tsince, &mut el);

        if el.xn.is_nan() || el.xn <= 0.0 {
            return Err(PropagatorError::NonFinite("mean motion", tsince));
        }
        let a = (XKE / el.xn).powf(TOTHRD) * tempa * tempa;
        el.em -= tempe;
        el.xll += c.xnodp * templ;
        self.deep.periodic(c, tsince, &mut el);

        let secular = Secular {
            a,
            e: el.em,
            omega: el.omgadf,
            xnode: el.xnode,
            xl: el.xll + el.omgadf + el.xnode,
            xinc: el.xinc,
        };
        short_period(c, &secular, tsince)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{magnitude, sub};
    use approx::assert_abs_diff_eq;

    /// Spacetrack report #3 deep space test case, catalog number 11801.
    fn str3_11801() -> Elements {
        Elements {
            epoch: 80230.29629788,
            bstar: 0.14311e-1,
            inclination: 46.7916,
            raan: 230.4354,
            eccentricity: 0.7318036,
            arg_perigee: 47.4722,
            mean_anomaly: 10.4117,
            mean_motion: 2.28537848,
        }
    }

    /// Published report #3 positions, single precision like the 88888
    /// table; the model stays within 7 m of them over the first day.
    const PUBLISHED: [(f64, [f64; 3]); 5] = [
        (0.0, [7473.37066650, 428.95261765, 5828.74786377]),
        (360.0, [-3305.22537232, 32410.86328125, -24697.17675781]),
        (720.0, [14271.28759766, 24110.46411133, -4725.76837158]),
        (1080.0, [-9990.05883789, 22717.35522461, -23616.89062500]),
        (1440.0, [9787.86975097, 33753.34667969, -15030.81176758]),
    ];

    #[test]
    fn reproduces_published_positions() {
        let mut model = Sdp4::new(&str3_11801()).unwrap();
        for (tsince, expected) in PUBLISHED {
            let state = model.propagate(tsince).unwrap();
            let error = magnitude(&sub(&state.position, &expected));
            assert!(error < 1e-2, "{error} km off at {tsince} min");
        }
    }

    fn molniya() -> Elements {
        Elements {
            epoch: 6000.5,
            bstar: 1e-4,
            inclination: 63.4,
            raan: 100.0,
            eccentricity: 0.72,
            arg_perigee: 270.0,
            mean_anomaly: 10.0,
            mean_motion: 2.0061,
        }
    }

    #[test]
    fn out_of_order_requests_restart_the_integrator() {
        let mut fresh = Sdp4::new(&molniya()).unwrap();
        let expected = fresh.propagate(360.0).unwrap();

        let mut model = Sdp4::new(&molniya()).unwrap();
        model.propagate(1440.0).unwrap();
        assert_eq!(model.checkpoint().atime, 1440.0);

        let state = model.propagate(360.0).unwrap();
        assert_eq!(model.checkpoint().atime, 0.0);
        for axis in 0..3 {
            assert_abs_diff_eq!(state.position[axis], expected.position[axis], epsilon = 1e-6);
        }
    }

    #[test]
    fn geosynchronous_radius_is_stable() {
        let elements = Elements {
            epoch: 6000.5,
            bstar: 0.0,
            inclination: 0.05,
            raan: 100.0,
            eccentricity: 0.0002,
            arg_perigee: 270.0,
            mean_anomaly: 10.0,
            mean_motion: 1.00271,
        };
        let mut model = Sdp4::new(&elements).unwrap();
        for tsince in [0.0, 1440.0] {
            let state = model.propagate(tsince).unwrap();
            let r = magnitude(&state.position);
            assert_abs_diff_eq!(r, 42156.2, epsilon = 1.0);
        }
    }

    #[test]
    fn equatorial_orbit_propagates() {
        let elements = Elements {
            epoch: 6000.5,
            bstar: 0.0,
            inclination: 0.0,
            raan: 0.0,
            eccentricity: 0.0002,
            arg_perigee: 270.0,
            mean_anomaly: 10.0,
            mean_motion: 1.00271,
        };
        let mut model = Sdp4::new(&elements).unwrap();
        for tsince in [0.0, 1440.0] {
            let state = model.propagate(tsince).unwrap();
            assert!(state.position.iter().all(|x| x.is_finite()));
            assert_abs_diff_eq!(magnitude(&state.position), 42156.2, epsilon = 1.0);
            assert_abs_diff_eq!(state.position[2], 0.0, epsilon = 50.0);
        }
    }

    #[test]
    fn velocity_at_epoch() {
        let state = Sdp4::new(&str3_11801()).unwrap().propagate(0.0).unwrap();
        let expected = [5.10715413, 6.44468284, -0.18613096];
        for axis in 0..3 {
            assert_abs_diff_eq!(state.velocity[axis], expected[axis], epsilon = 1e-5);
        }
    }
}
