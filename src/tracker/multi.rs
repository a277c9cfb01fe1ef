use crate::catalog::{Catalog, Satellite};
use crate::kernel::Geodetic;
use crate::predict::{
    aos_happens, decayed, find_aos, find_los2, geostationary, next_aos, observe, PredictError,
};

use super::snapshot::{SatSnapshot, NO_EVENT};

/// Cached AOS/LOS of one satellite. Zero means not yet searched.
#[derive(Debug, Clone, Copy, Default)]
struct Events {
    aos: f64,
    los: f64,
    failed: bool,
}

/// Follows every catalog satellite, searching for a new event only once
/// the cached one has passed.
#[derive(Debug, Default)]
pub struct MultiTrack {
    events: Vec<Events>,
}

impl MultiTrack {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            events: vec![Events::default(); catalog.satellites().len()],
        }
    }

    /// Forgets cached events, after the element sets changed.
    pub fn reset(&mut self, catalog: &Catalog) {
        *self = Self::new(catalog);
    }

    pub fn tick(&mut self, catalog: &mut Catalog, daynum: f64) -> Vec<SatSnapshot> {
        if self.events.len() != catalog.satellites().len() {
            self.reset(catalog);
        }
        let observer = catalog.observer();

        catalog
            .satellites_mut()
            .iter_mut()
            .zip(self.events.iter_mut())
            .map(|(sat, events)| track(sat, events, &observer, daynum))
            .collect()
    }
}

fn track(
    sat: &mut Satellite,
    events: &mut Events,
    observer: &Geodetic,
    daynum: f64,
) -> SatSnapshot {
    if sat.tle.mean_motion == 0.0 || decayed(&sat.tle, daynum) {
        return SatSnapshot::idle(sat);
    }

    let obs = match observe(sat, observer, daynum) {
        Ok(obs) => obs,
        Err(e) => {
            log::warn!("{}: {}", sat.name(), e);
            return SatSnapshot::idle(sat);
        }
    };

    let predictable =
        !geostationary(&sat.tle) && aos_happens(&sat.tle, observer.lat.to_degrees());
    if !predictable {
        return SatSnapshot::observed(sat, &obs, NO_EVENT);
    }

    let in_range = obs.is_above_horizon();
    match update_events(sat, events, observer, daynum, in_range) {
        Ok(()) => events.failed = false,
        Err(e) => {
            if !events.failed {
                log::warn!("{}: event search failed: {}", sat.name(), e);
            }
            events.failed = true;
            return SatSnapshot::observed(sat, &obs, NO_EVENT);
        }
    }

    let next_event = if in_range { events.los } else { events.aos };
    SatSnapshot::observed(sat, &obs, next_event)
}

fn update_events(
    sat: &mut Satellite,
    events: &mut Events,
    observer: &Geodetic,
    daynum: f64,
    in_range: bool,
) -> Result<(), PredictError> {
    if in_range && daynum > events.los {
        events.los = find_los2(sat, observer, daynum)?;
    }
    if daynum > events.aos {
        events.aos = if in_range {
            next_aos(sat, observer, daynum)?
        } else {
            find_aos(sat, observer, daynum)?
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{catalog_with, ISS_EPOCH, ISS_LINE1, ISS_LINE2};
    use approx::assert_abs_diff_eq;

    const AOS: f64 = 10491.950887;
    const LOS: f64 = 10491.956987;

    #[test]
    fn next_event_is_aos_while_out_of_range() {
        let (_dir, mut catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let mut multi = MultiTrack::new(&catalog);

        let snapshots = multi.tick(&mut catalog, ISS_EPOCH);
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].elevation < 0.0);
        assert_abs_diff_eq!(snapshots[0].next_event, AOS, epsilon = 1e-4);
    }

    #[test]
    fn next_event_is_los_while_in_range() {
        let (_dir, mut catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let mut multi = MultiTrack::new(&catalog);

        let snapshots = multi.tick(&mut catalog, (AOS + LOS) / 2.0);
        assert!(snapshots[0].elevation > 0.0);
        assert_abs_diff_eq!(snapshots[0].next_event, LOS, epsilon = 1e-4);

        // after the pass the cached AOS is already the next one
        let after = multi.tick(&mut catalog, LOS + 0.001);
        assert!(after[0].next_event > LOS);
        assert!(after[0].next_event - LOS < 1.0);
    }

    #[test]
    fn cached_events_are_reused() {
        let (_dir, mut catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let mut multi = MultiTrack::new(&catalog);

        let first = multi.tick(&mut catalog, ISS_EPOCH);
        let second = multi.tick(&mut catalog, ISS_EPOCH + 0.01);
        assert_eq!(first[0].next_event, second[0].next_event);
    }

    #[test]
    fn decayed_satellites_publish_idle_records() {
        let (_dir, mut catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let mut multi = MultiTrack::new(&catalog);

        let snapshots = multi.tick(&mut catalog, ISS_EPOCH + 5000.0);
        assert_eq!(snapshots[0], SatSnapshot::idle(&catalog.satellites()[0]));
        assert_eq!(snapshots[0].visibility, 'N');
    }
}
