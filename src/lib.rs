//! Satellite tracking after PREDICT: SGP4/SDP4 propagation, pass
//! prediction, a live tracking loop and the UDP client protocol.

pub mod catalog;
pub mod config;
pub mod kernel;
pub mod predict;
pub mod propagator;
pub mod server;
pub mod tracker;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks shared state, carrying on with the data of a panicked holder.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
