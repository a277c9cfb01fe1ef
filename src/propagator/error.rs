use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropagatorError {
    #[error("mean motion must be positive, got {0}")]
    MeanMotion(f64),
    #[error("eccentricity {0} outside [0, 1)")]
    Eccentricity(f64),
    #[error("semi-major axis {0} is not positive")]
    SemiMajorAxis(f64),
    #[error("semi-latus rectum {0} is negative")]
    SemiLatusRectum(f64),
    #[error("inclination too close to 180 degrees")]
    SingularInclination,
    #[error("non-finite {0} at {1} minutes from epoch")]
    NonFinite(&'static str, f64),
}
