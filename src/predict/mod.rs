//! Observations, pass events and Doppler figures for catalogued
//! satellites.

pub mod doppler;
mod error;
mod observation;
mod pass_finder;
pub mod quick;

pub use error::PredictError;
pub use observation::{observe, Observation, Visibility};
pub use pass_finder::{
    aos_happens, check_predictable, decayed, find_aos, find_los, find_los2, geostationary,
    next_aos, predict_pass, predict_passes, PassEvent, MAX_ITERATIONS,
};
