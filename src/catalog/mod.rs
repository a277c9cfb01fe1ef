//! Satellite element sets, ground station and transponder database, as
//! loaded from the PREDICT data files.

mod error;
mod qth;
mod tle;
mod transponder;
mod update;

use std::fs;
use std::path::{Path, PathBuf};

use crate::kernel::Geodetic;
use crate::propagator::{PropagatorError, PropagatorState, StateVector};

pub use error::{CatalogError, TleError};
pub use qth::Qth;
pub use tle::{checksum, kep_check, Tle};
pub use transponder::{parse_db, SatelliteDb, Transponder, MAX_TRANSPONDERS};
pub use update::{auto_update, UpdateSummary};

/// Locations of the data files.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPaths {
    pub tle: PathBuf,
    pub qth: PathBuf,
    pub db: Option<PathBuf>,
}

/// A tracked satellite: its elements, transponder data and propagator
/// state.
#[derive(Debug, Clone)]
pub struct Satellite {
    pub tle: Tle,
    pub db: SatelliteDb,
    pub state: PropagatorState,
}

impl Satellite {
    pub fn new(tle: Tle) -> Self {
        let db = SatelliteDb {
            catalog_number: tle.catalog_number,
            ..SatelliteDb::default()
        };
        Self {
            tle,
            db,
            state: PropagatorState::default(),
        }
    }

    pub fn propagate(&mut self, tsince: f64) -> Result<StateVector, PropagatorError> {
        self.state.propagate(&self.tle.elements(), tsince)
    }

    pub fn name(&self) -> &str {
        &self.tle.name
    }
}

/// Splits TLE file content into element sets. Accepts three line entries
/// with a name and bare two line entries, which are named after their
/// catalog number. Invalid entries are skipped with a warning.
pub fn parse_tle_file(content: &str) -> Vec<Tle> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let (name, line1, line2, consumed) = if lines[i].starts_with("1 ")
            && i + 1 < lines.len()
            && lines[i + 1].starts_with("2 ")
        {
            (None, lines[i], lines[i + 1], 2)
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            (Some(lines[i]), lines[i + 1], lines[i + 2], 3)
        } else {
            log::warn!("skipping unexpected TLE line {:?}", lines[i]);
            i += 1;
            continue;
        };
        i += consumed;

        match Tle::parse(name.unwrap_or_default(), line1, line2) {
            Ok(mut tle) => {
                if tle.name.is_empty() {
                    tle.name = format!("NORAD {}", tle.catalog_number);
                }
                result.push(tle);
            }
            Err(e) => log::warn!("skipping element set {:?}: {}", name.unwrap_or(line1), e),
        }
    }
    result
}

#[derive(Debug, Clone)]
pub struct Catalog {
    satellites: Vec<Satellite>,
    qth: Qth,
    db: Vec<SatelliteDb>,
    paths: CatalogPaths,
}

impl Catalog {
    /// Loads the station, element and optional transponder files. A
    /// missing or unreadable transponder file only disables that data.
    pub fn load(paths: CatalogPaths) -> Result<Self, CatalogError> {
        let qth = Qth::from_file(&paths.qth)?;
        Self::load_with_qth(paths, qth)
    }

    /// Loads element sets only, for maintenance tasks that do not need a
    /// ground station.
    pub fn load_with_qth(paths: CatalogPaths, qth: Qth) -> Result<Self, CatalogError> {
        let db = match &paths.db {
            Some(path) => match fs::read_to_string(path) {
                Ok(content) => parse_db(&content),
                Err(e) => {
                    log::warn!("transponder database {} not loaded: {}", path.display(), e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let mut catalog = Self {
            satellites: Vec::new(),
            qth,
            db,
            paths,
        };
        catalog.reload_tles()?;
        Ok(catalog)
    }

    /// Re-reads the TLE file, replacing every satellite and discarding
    /// propagator state.
    pub fn reload_tles(&mut self) -> Result<usize, CatalogError> {
        let path = &self.paths.tle;
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let tles = parse_tle_file(&content);
        if tles.is_empty() {
            return Err(CatalogError::Empty(path.clone()));
        }

        self.satellites = tles.into_iter().map(Satellite::new).collect();
        for sat in &mut self.satellites {
            if let Some(db) = self
                .db
                .iter()
                .find(|db| db.catalog_number == sat.tle.catalog_number)
            {
                sat.db = db.clone();
            }
        }
        log::info!(
            "loaded {} satellites from {}",
            self.satellites.len(),
            path.display()
        );
        Ok(self.satellites.len())
    }

    /// Writes all element sets back to the TLE file, reformatted from
    /// their numeric fields.
    pub fn save_tles(&self) -> Result<(), CatalogError> {
        let mut content = String::new();
        for sat in &self.satellites {
            let (line1, line2) = sat.tle.to_lines();
            content.push_str(&format!("{}\n{}\n{}\n", sat.tle.name, line1, line2));
        }
        let path = &self.paths.tle;
        fs::write(path, content).map_err(|e| CatalogError::io(path, e))
    }

    /// Replaces the satellite with the same catalog number when `fresh` is
    /// at least as recent, keeping the stored name.
    pub(crate) fn replace_if_newer(&mut self, mut fresh: Tle) -> bool {
        let Some(sat) = self
            .satellites
            .iter_mut()
            .find(|s| s.tle.catalog_number == fresh.catalog_number)
        else {
            return false;
        };
        if fresh.epoch_ordinal() < sat.tle.epoch_ordinal() {
            return false;
        }
        fresh.name = std::mem::take(&mut sat.tle.name);
        sat.tle = fresh;
        sat.state.reset();
        true
    }

    /// Index of the satellite with the given name, or failing that the
    /// given catalog number.
    pub fn find(&self, key: &str) -> Option<usize> {
        let key = key.trim();
        self.satellites
            .iter()
            .position(|s| s.tle.name == key)
            .or_else(|| {
                let catnum: u32 = key.parse().ok()?;
                self.satellites
                    .iter()
                    .position(|s| s.tle.catalog_number == catnum)
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.satellites.iter().map(Satellite::name)
    }

    pub fn satellites(&self) -> &[Satellite] {
        &self.satellites
    }

    pub fn satellites_mut(&mut self) -> &mut [Satellite] {
        &mut self.satellites
    }

    pub fn get(&self, index: usize) -> Option<&Satellite> {
        self.satellites.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Satellite> {
        self.satellites.get_mut(index)
    }

    pub fn qth(&self) -> &Qth {
        &self.qth
    }

    pub fn observer(&self) -> Geodetic {
        self.qth.to_geodetic()
    }

    pub fn paths(&self) -> &CatalogPaths {
        &self.paths
    }

    pub fn tle_path(&self) -> &Path {
        &self.paths.tle
    }
}
