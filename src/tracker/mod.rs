//! Live tracking: the loop that keeps the snapshot table current and
//! drives rig control in single satellite mode.

mod error;
mod multi;
mod plugin;
mod single;
mod snapshot;
mod tracker;

pub use error::TrackerError;
pub use multi::MultiTrack;
pub use plugin::{RigControl, SerialAntenna};
pub use single::SingleTrack;
pub use snapshot::{
    SatSnapshot, Shared, SharedState, TrackerMode, CLIENT_NAME_LEN, NO_EVENT, NO_SQUINT,
};
pub use tracker::Tracker;
