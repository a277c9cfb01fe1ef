use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::catalog::{Catalog, Satellite, Tle};
use crate::kernel::{day_num_to_unix, MoonPosition, SunPosition};
use crate::predict::Observation;

/// Next event day number published when none can be predicted; Unix time 0.
pub const NO_EVENT: f64 = -3651.0;

/// Squint published when the antenna attitude is unknown.
pub const NO_SQUINT: f64 = 360.0;

/// Longest satellite name matched by clients.
pub const CLIENT_NAME_LEN: usize = 25;

/// Latest tracking data for one satellite, replaced whole each tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatSnapshot {
    pub name: String,
    pub catalog_number: u32,
    /// Sub-satellite longitude, degrees west.
    pub longitude: f64,
    pub latitude: f64,
    pub azimuth: f64,
    pub elevation: f64,
    /// Day number of the next AOS, or of LOS while in range.
    pub next_event: f64,
    pub footprint: f64,
    pub range: f64,
    pub altitude: f64,
    pub velocity: f64,
    pub orbit_number: i64,
    pub visibility: char,
    pub phase: f64,
    pub eclipse_depth: f64,
    pub squint: f64,
    pub doppler100: f64,
    /// Elements the record was computed from, for `GET_TLE`.
    #[serde(skip)]
    pub tle: Tle,
}

impl SatSnapshot {
    /// Record for a satellite with no data: not yet tracked, or decayed.
    pub fn idle(sat: &Satellite) -> Self {
        Self {
            name: sat.tle.name.clone(),
            catalog_number: sat.tle.catalog_number,
            longitude: 0.0,
            latitude: 0.0,
            azimuth: 0.0,
            elevation: 0.0,
            next_event: NO_EVENT,
            footprint: 0.0,
            range: 0.0,
            altitude: 0.0,
            velocity: 0.0,
            orbit_number: 0,
            visibility: 'N',
            phase: 0.0,
            eclipse_depth: 0.0,
            squint: 0.0,
            doppler100: 0.0,
            tle: sat.tle.clone(),
        }
    }

    pub fn observed(sat: &Satellite, obs: &Observation, next_event: f64) -> Self {
        Self {
            name: sat.tle.name.clone(),
            catalog_number: sat.tle.catalog_number,
            longitude: 360.0 - obs.longitude,
            latitude: obs.latitude,
            azimuth: obs.azimuth,
            elevation: obs.elevation,
            next_event,
            footprint: obs.footprint,
            range: obs.range,
            altitude: obs.altitude,
            velocity: obs.velocity,
            orbit_number: obs.orbit_number,
            visibility: obs.visibility().as_char(),
            phase: obs.phase,
            eclipse_depth: obs.eclipse_depth,
            squint: obs.squint.unwrap_or(NO_SQUINT),
            doppler100: obs.doppler100(),
            tle: sat.tle.clone(),
        }
    }

    pub fn next_event_unix(&self) -> i64 {
        day_num_to_unix(self.next_event).round_ties_even() as i64
    }
}

/// What the tracking loop is doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TrackerMode {
    Multi,
    Single(String),
}

impl fmt::Display for TrackerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerMode::Multi => write!(f, "MULTI"),
            TrackerMode::Single(name) => write!(f, "{name}"),
        }
    }
}

/// State published by the tracker and read by the protocol server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Shared {
    /// One record per catalog satellite, in load order.
    pub snapshots: Vec<SatSnapshot>,
    pub sun: SunPosition,
    pub moon: MoonPosition,
    pub mode: Option<TrackerMode>,
    /// Set by clients; the tracker reloads the TLE file on its next tick.
    #[serde(skip)]
    pub reload_requested: bool,
}

pub type SharedState = Arc<Mutex<Shared>>;

impl Shared {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            snapshots: catalog.satellites().iter().map(SatSnapshot::idle).collect(),
            ..Self::default()
        }
    }

    /// Snapshot by name, compared on the first 25 characters, or by
    /// catalog number.
    pub fn find(&self, key: &str) -> Option<&SatSnapshot> {
        let key: String = key.chars().take(CLIENT_NAME_LEN).collect();
        self.snapshots
            .iter()
            .find(|s| s.name.chars().take(CLIENT_NAME_LEN).eq(key.chars()))
            .or_else(|| {
                let catnum: u32 = key.trim().parse().ok()?;
                self.snapshots.iter().find(|s| s.catalog_number == catnum)
            })
    }

    /// `NONE`, `MULTI` or the name of the satellite tracked.
    pub fn mode_name(&self) -> String {
        self.mode
            .as_ref()
            .map_or_else(|| "NONE".to_string(), TrackerMode::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{catalog_with, new_york, ISS_EPOCH, ISS_LINE1, ISS_LINE2};
    use crate::predict::observe;

    #[test]
    fn idle_records_before_the_first_tick() {
        let (_dir, catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let shared = Shared::new(&catalog);
        assert_eq!(shared.snapshots.len(), 1);

        let iss = &shared.snapshots[0];
        assert_eq!(iss.visibility, 'N');
        assert_eq!(iss.next_event_unix(), 0);
        assert_eq!(shared.mode_name(), "NONE");
    }

    #[test]
    fn lookup_by_name_or_number() {
        let (_dir, catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let shared = Shared::new(&catalog);
        assert!(shared.find("ISS").is_some());
        assert!(shared.find("25544").is_some());
        assert!(shared.find("IS").is_none());
        assert!(shared.find("").is_none());
    }

    #[test]
    fn observed_record_uses_west_longitude() {
        let (_dir, mut catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let sat = catalog.get_mut(0).unwrap();
        let obs = observe(sat, &new_york(), ISS_EPOCH).unwrap();
        let snapshot = SatSnapshot::observed(sat, &obs, ISS_EPOCH + 0.5);

        assert_eq!(snapshot.longitude, 360.0 - obs.longitude);
        assert_eq!(snapshot.squint, NO_SQUINT);
        assert_eq!(snapshot.doppler100, obs.doppler100());
        assert!(snapshot.doppler100 > 0.0);
    }

    #[test]
    fn mode_names() {
        let mut shared = Shared::default();
        shared.mode = Some(TrackerMode::Multi);
        assert_eq!(shared.mode_name(), "MULTI");
        shared.mode = Some(TrackerMode::Single("ISS".into()));
        assert_eq!(shared.mode_name(), "ISS");
    }
}
