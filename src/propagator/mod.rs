//! SGP4/SDP4 orbit propagation from NORAD mean elements.

mod common;
mod deep;
mod error;
mod sdp4;
mod sgp4;
mod state;

use serde::Serialize;

use crate::kernel::{dot, magnitude, Vector3};

pub use deep::Checkpoint;
pub use error::PropagatorError;
pub use sdp4::Sdp4;
pub use sgp4::Sgp4;
pub use state::PropagatorState;

/// Mean elements as published in a two-line element set: angles in
/// degrees, mean motion in revolutions per day, epoch as `yyddd.dddddddd`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Elements {
    pub epoch: f64,
    pub bstar: f64,
    pub inclination: f64,
    pub raan: f64,
    pub eccentricity: f64,
    pub arg_perigee: f64,
    pub mean_anomaly: f64,
    pub mean_motion: f64,
}

/// Osculating angles needed to point a body-fixed axis. Radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Orientation {
    pub arg_perigee: f64,
    pub inclination: f64,
    pub node: f64,
}

impl Orientation {
    /// Squint angle in degrees between a spacecraft antenna axis, given by
    /// attitude latitude and longitude in degrees, and the line of sight
    /// `range` from the ground station.
    pub fn squint(&self, alat: f64, alon: f64, range: &Vector3) -> f64 {
        let (alat, alon) = (alat.to_radians(), alon.to_radians());
        let bx = alat.cos() * (alon + self.arg_perigee).cos();
        let by = alat.cos() * (alon + self.arg_perigee).sin();
        let bz = alat.sin();

        let (sini, cosi) = self.inclination.sin_cos();
        let cx = bx;
        let cy = by * cosi - bz * sini;
        let cz = by * sini + bz * cosi;

        let (sinn, cosn) = self.node.sin_cos();
        let axis = [cx * cosn - cy * sinn, cx * sinn + cy * cosn, cz];

        let cos_squint = (-dot(&axis, range) / magnitude(range)).clamp(-1.0, 1.0);
        cos_squint.acos().to_degrees()
    }
}

/// ECI position (km) and velocity (km/s), orbital phase (radians from
/// perigee) and orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateVector {
    pub position: Vector3,
    pub velocity: Vector3,
    pub phase: f64,
    pub orientation: Orientation,
}

/// Whether elements need the deep space model.
pub fn is_deep_space(elements: &Elements) -> Result<bool, PropagatorError> {
    Ok(common::Mean::from_elements(elements)?.is_deep_space())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn squint_is_zero_when_antenna_faces_the_station() {
        let orientation = Orientation::default();
        // body axis with alat = alon = 0 lies along +x in an equatorial frame
        let range = [-1000.0, 0.0, 0.0];
        assert_abs_diff_eq!(orientation.squint(0.0, 0.0, &range), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(orientation.squint(0.0, 180.0, &range), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(orientation.squint(90.0, 0.0, &range), 90.0, epsilon = 1e-9);
    }
}
