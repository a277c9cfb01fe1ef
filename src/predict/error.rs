use thiserror::Error;

use crate::propagator::PropagatorError;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("{search} did not converge after {iterations} iterations")]
    Convergence {
        search: &'static str,
        iterations: usize,
    },
    #[error("{0}: pass never occurs (geostationary)")]
    Geostationary(String),
    #[error("{0}: appears to have decayed")]
    Decayed(String),
    #[error("{0}: pass never occurs from this location")]
    PassNeverOccurs(String),
    #[error("unknown satellite {0:?}")]
    UnknownSatellite(String),
    #[error("propagation error: {0}")]
    Propagator(#[from] PropagatorError),
}
