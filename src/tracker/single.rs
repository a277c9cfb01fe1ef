use std::io;

use crate::catalog::{Catalog, Satellite};
use crate::predict::{
    aos_happens, decayed, doppler, find_aos, find_los2, geostationary, observe, Observation,
    PredictError,
};

use super::plugin::RigControl;
use super::snapshot::{SatSnapshot, NO_EVENT};

/// Look-ahead before searching for the next rise, in days.
const AOS_LOOKAHEAD: f64 = 0.003;

const HZ_PER_MHZ: f64 = 1.0e6;

/// Follows one satellite by name and drives the attached rigs while it is
/// above the horizon.
pub struct SingleTrack {
    name: String,
    los: f64,
    next_event: f64,
    rigs: Vec<Box<dyn RigControl>>,
}

impl SingleTrack {
    pub fn new(name: impl Into<String>, rigs: Vec<Box<dyn RigControl>>) -> Self {
        Self {
            name: name.into(),
            los: 0.0,
            next_event: 0.0,
            rigs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reset(&mut self) {
        self.los = 0.0;
        self.next_event = 0.0;
    }

    pub fn into_rigs(self) -> Vec<Box<dyn RigControl>> {
        self.rigs
    }

    pub fn tick(
        &mut self,
        catalog: &mut Catalog,
        daynum: f64,
    ) -> Result<SatSnapshot, PredictError> {
        let observer = catalog.observer();
        let sat = catalog
            .find(&self.name)
            .and_then(|index| catalog.get_mut(index))
            .ok_or_else(|| PredictError::UnknownSatellite(self.name.clone()))?;

        if sat.tle.mean_motion == 0.0 || decayed(&sat.tle, daynum) {
            return Ok(SatSnapshot::idle(sat));
        }

        let obs = observe(sat, &observer, daynum)?;
        let up = obs.is_above_horizon();

        if geostationary(&sat.tle) || !aos_happens(&sat.tle, observer.lat.to_degrees()) {
            self.next_event = NO_EVENT;
        } else if up && daynum > self.los {
            self.los = find_los2(sat, &observer, daynum)?;
            self.next_event = self.los;
        } else if !up && daynum > self.next_event {
            self.next_event = find_aos(sat, &observer, daynum + AOS_LOOKAHEAD)?;
        }

        if up {
            self.drive_rigs(sat, &obs);
        } else {
            self.los = 0.0;
        }

        Ok(SatSnapshot::observed(sat, &obs, self.next_event))
    }

    /// Points every rig at the satellite and tunes it to the first
    /// transponder, Doppler corrected. A rig that fails is dropped.
    fn drive_rigs(&mut self, sat: &Satellite, obs: &Observation) {
        let doppler100 = obs.doppler100();
        let transponder = sat.db.active().next();
        let downlink = transponder
            .map(|t| (t.downlink_start + t.downlink_end) / 2.0)
            .filter(|f| *f != 0.0)
            .map(|f| doppler::downlink_mhz(f, doppler100) * HZ_PER_MHZ);
        let uplink = transponder
            .map(|t| (t.uplink_start + t.uplink_end) / 2.0)
            .filter(|f| *f != 0.0)
            .map(|f| doppler::uplink_mhz(f, doppler100) * HZ_PER_MHZ);

        self.rigs.retain_mut(|rig| {
            match command(rig.as_mut(), obs, downlink, uplink) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("{} disabled: {}", rig.name(), e);
                    false
                }
            }
        });
    }
}

fn command(
    rig: &mut dyn RigControl,
    obs: &Observation,
    downlink: Option<f64>,
    uplink: Option<f64>,
) -> io::Result<()> {
    rig.set_rotor(obs.azimuth, obs.elevation)?;
    if let Some(hz) = downlink {
        rig.set_downlink_frequency(hz)?;
    }
    if let Some(hz) = uplink {
        rig.set_uplink_frequency(hz)?;
    }
    Ok(())
}
