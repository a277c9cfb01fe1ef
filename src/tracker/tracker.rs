use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::error::TrackerError;
use super::multi::MultiTrack;
use super::plugin::RigControl;
use super::single::SingleTrack;
use super::snapshot::{SatSnapshot, Shared, SharedState, TrackerMode};
use crate::catalog::Catalog;
use crate::kernel::{current_day_num, MoonPosition, SunPosition};
use crate::lock;
use crate::predict::PredictError;

enum Engine {
    Multi(MultiTrack),
    Single(SingleTrack),
}

impl Engine {
    fn reset(&mut self, catalog: &Catalog) {
        match self {
            Engine::Multi(multi) => multi.reset(catalog),
            Engine::Single(single) => single.reset(),
        }
    }
}

#[derive(Debug)]
struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Runs the tracking loop on a tokio task, refreshing the shared snapshot
/// table once per interval.
pub struct Tracker {
    catalog: Arc<Mutex<Catalog>>,
    shared: SharedState,
    interval: Duration,
    rigs: Vec<Box<dyn RigControl>>,
    worker: Option<WorkerHandle>,
}

impl Tracker {
    pub fn new(catalog: Arc<Mutex<Catalog>>, shared: SharedState, interval: Duration) -> Self {
        Self {
            catalog,
            shared,
            interval,
            rigs: Vec::new(),
            worker: None,
        }
    }

    /// Attaches a rig, driven in single satellite mode.
    pub fn add_rig(&mut self, rig: Box<dyn RigControl>) {
        log::info!("rig control: {}", rig.name());
        self.rigs.push(rig);
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn shared(&self) -> SharedState {
        self.shared.clone()
    }

    pub async fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
        lock(&self.shared).mode = None;
    }

    /// Starts tracking. A single satellite is looked up by name or catalog
    /// number before the loop starts; attached rigs move to that loop.
    pub fn start(&mut self, mode: TrackerMode) -> Result<(), TrackerError> {
        if self.worker.is_some() {
            return Err(TrackerError::AlreadyRunning);
        }

        let (engine, mode) = {
            let catalog = lock(&self.catalog);
            match mode {
                TrackerMode::Multi => (
                    Engine::Multi(MultiTrack::new(&catalog)),
                    TrackerMode::Multi,
                ),
                TrackerMode::Single(key) => {
                    let name = catalog
                        .find(&key)
                        .and_then(|index| catalog.get(index))
                        .map(|sat| sat.name().to_string())
                        .ok_or(PredictError::UnknownSatellite(key))?;
                    let rigs = std::mem::take(&mut self.rigs);
                    (
                        Engine::Single(SingleTrack::new(name.clone(), rigs)),
                        TrackerMode::Single(name),
                    )
                }
            }
        };

        log::info!("tracking {} every {:?}", mode, self.interval);
        lock(&self.shared).mode = Some(mode);

        let catalog = self.catalog.clone();
        let shared = self.shared.clone();
        let interval = self.interval;
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_tracker_loop(catalog, shared, engine, interval, stop_rx));

        self.worker = Some(WorkerHandle { stop_tx, join });
        Ok(())
    }
}

async fn run_tracker_loop(
    catalog: Arc<Mutex<Catalog>>,
    shared: SharedState,
    mut engine: Engine,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut deadline = Instant::now();
    loop {
        tick_once(&catalog, &shared, &mut engine, current_day_num());

        deadline += interval;
        let now = Instant::now();
        if deadline < now {
            deadline = now;
        }

        let should_stop = tokio::select! {
            _ = sleep_until(deadline) => false,
            _ = &mut stop_rx => true,
        };
        if should_stop {
            log::info!("tracking stopped");
            return;
        }
    }
}

fn tick_once(
    catalog: &Mutex<Catalog>,
    shared: &Mutex<Shared>,
    engine: &mut Engine,
    daynum: f64,
) {
    let reload = std::mem::take(&mut lock(shared).reload_requested);
    let mut catalog = lock(catalog);

    if reload {
        match catalog.reload_tles() {
            Ok(_) => {
                engine.reset(&catalog);
                let mut shared = lock(shared);
                let mode = shared.mode.take();
                *shared = Shared {
                    mode,
                    ..Shared::new(&catalog)
                };
            }
            Err(e) => log::warn!("TLE reload failed, keeping current elements: {}", e),
        }
    }

    let observer = catalog.observer();
    let sun = SunPosition::find(daynum, &observer);
    let moon = MoonPosition::find(daynum, &observer);

    let update = match engine {
        Engine::Multi(multi) => Update::All(multi.tick(&mut catalog, daynum)),
        Engine::Single(single) => match single.tick(&mut catalog, daynum) {
            Ok(snapshot) => Update::One(snapshot),
            Err(e) => {
                log::warn!("tracking {}: {}", single.name(), e);
                Update::None
            }
        },
    };
    drop(catalog);

    let mut shared = lock(shared);
    shared.sun = sun;
    shared.moon = moon;
    match update {
        Update::All(snapshots) => shared.snapshots = snapshots,
        Update::One(snapshot) => {
            match shared.snapshots.iter_mut().find(|s| s.name == snapshot.name) {
                Some(slot) => *slot = snapshot,
                None => shared.snapshots.push(snapshot),
            }
        }
        Update::None => {}
    }
}

enum Update {
    All(Vec<SatSnapshot>),
    One(SatSnapshot),
    None,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{catalog_with, ISS_EPOCH, ISS_LINE1, ISS_LINE2};
    use crate::tracker::snapshot::NO_EVENT;
    use std::fs;

    const AOS: f64 = 10491.950887;

    fn tracker_for(catalog: Catalog) -> Tracker {
        let shared = Arc::new(Mutex::new(Shared::new(&catalog)));
        Tracker::new(
            Arc::new(Mutex::new(catalog)),
            shared,
            Duration::from_millis(10),
        )
    }

    #[test]
    fn single_tick_replaces_only_its_record() {
        let (_dir, catalog) = catalog_with(&[
            ("ISS", ISS_LINE1, ISS_LINE2),
            ("ALSO ISS", ISS_LINE1, ISS_LINE2),
        ]);
        let shared = Mutex::new(Shared::new(&catalog));
        let catalog = Mutex::new(catalog);
        let mut engine = Engine::Single(SingleTrack::new("ISS", Vec::new()));

        tick_once(&catalog, &shared, &mut engine, AOS + 0.002);

        let shared = shared.into_inner().unwrap();
        assert!(shared.snapshots[0].elevation > 0.0);
        assert_eq!(shared.snapshots[1].next_event, NO_EVENT);
        assert!(shared.sun.range > 0.0);
    }

    #[test]
    fn multi_tick_publishes_every_satellite() {
        let (_dir, catalog) = catalog_with(&[
            ("ISS", ISS_LINE1, ISS_LINE2),
            ("ALSO ISS", ISS_LINE1, ISS_LINE2),
        ]);
        let shared = Mutex::new(Shared::new(&catalog));
        let catalog = Mutex::new(catalog);
        let mut engine = Engine::Multi(MultiTrack::new(&lock(&catalog)));

        tick_once(&catalog, &shared, &mut engine, ISS_EPOCH);

        let shared = shared.into_inner().unwrap();
        assert_eq!(shared.snapshots.len(), 2);
        assert_eq!(shared.snapshots[0].next_event, shared.snapshots[1].next_event);
        assert!(shared.snapshots[0].next_event > ISS_EPOCH);
    }

    #[test]
    fn reload_request_rereads_elements() {
        let (dir, catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let shared = Mutex::new(Shared::new(&catalog));
        let catalog = Mutex::new(catalog);
        let mut engine = Engine::Multi(MultiTrack::new(&lock(&catalog)));

        fs::write(
            dir.path().join("predict.tle"),
            format!("ISS\n{ISS_LINE1}\n{ISS_LINE2}\nZARYA\n{ISS_LINE1}\n{ISS_LINE2}\n"),
        )
        .unwrap();
        lock(&shared).reload_requested = true;
        tick_once(&catalog, &shared, &mut engine, ISS_EPOCH);

        let shared = shared.into_inner().unwrap();
        assert!(!shared.reload_requested);
        let names: Vec<_> = shared.snapshots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["ISS", "ZARYA"]);
    }

    #[tokio::test]
    async fn start_and_stop() {
        let (_dir, catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let mut tracker = tracker_for(catalog);
        let shared = tracker.shared();

        tracker.start(TrackerMode::Multi).unwrap();
        assert!(tracker.is_running());
        assert!(matches!(
            tracker.start(TrackerMode::Multi),
            Err(TrackerError::AlreadyRunning)
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(lock(&shared).mode_name(), "MULTI");
        assert!(lock(&shared).sun.range > 0.0);

        tracker.stop().await;
        assert!(!tracker.is_running());
        assert_eq!(lock(&shared).mode_name(), "NONE");
    }

    #[tokio::test]
    async fn single_mode_resolves_catalog_number() {
        let (_dir, catalog) = catalog_with(&[("ISS", ISS_LINE1, ISS_LINE2)]);
        let mut tracker = tracker_for(catalog);

        tracker.start(TrackerMode::Single("25544".into())).unwrap();
        assert_eq!(lock(&tracker.shared()).mode_name(), "ISS");
        tracker.stop().await;

        let err = tracker.start(TrackerMode::Single("MIR".into())).unwrap_err();
        assert!(matches!(
            err,
            TrackerError::Predict(PredictError::UnknownSatellite(_))
        ));
        assert!(!tracker.is_running());
    }
}
