use thiserror::Error;

/// Request failures. Every one of them is answered with `Huh?`.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("unknown satellite {0:?}")]
    UnknownSatellite(String),
}
