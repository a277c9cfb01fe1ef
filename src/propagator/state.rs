use super::common::{Common, Mean};
use super::{Elements, PropagatorError, Sdp4, Sgp4, StateVector};

/// Per-satellite propagator state, initialised on first use and selected
/// once per element set.
#[derive(Debug, Clone, Default)]
pub enum PropagatorState {
    #[default]
    Uninitialized,
    NearEarth(Box<Sgp4>),
    DeepSpace(Box<Sdp4>),
}

impl PropagatorState {
    /// Drops the cached model; the next propagation reinitialises from the
    /// elements it is given.
    pub fn reset(&mut self) {
        *self = PropagatorState::Uninitialized;
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self, PropagatorState::Uninitialized)
    }

    pub fn is_deep_space(&self) -> bool {
        matches!(self, PropagatorState::DeepSpace(_))
    }

    fn initialize(elements: &Elements) -> Result<Self, PropagatorError> {
        let mean = Mean::from_elements(elements)?;
        let common = Common::new(&mean)?;
        let state = if mean.is_deep_space() {
            PropagatorState::DeepSpace(Box::new(Sdp4::with_common(mean, common)))
        } else {
            PropagatorState::NearEarth(Box::new(Sgp4::with_common(mean, common)))
        };
        log::debug!(
            "initialised {} model for epoch {:.8}",
            if state.is_deep_space() { "SDP4" } else { "SGP4" },
            elements.epoch
        );
        Ok(state)
    }

    /// Propagates `elements` to `tsince` minutes from epoch.
    pub fn propagate(
        &mut self,
        elements: &Elements,
        tsince: f64,
    ) -> Result<StateVector, PropagatorError> {
        if !tsince.is_finite() {
            return Err(PropagatorError::NonFinite("time", tsince));
        }
        if !self.is_initialized() {
            *self = Self::initialize(elements)?;
        }
        match self {
            PropagatorState::NearEarth(model) => model.propagate(tsince),
            PropagatorState::DeepSpace(model) => model.propagate(tsince),
            PropagatorState::Uninitialized => unreachable!("initialised above"),
        }
    }
}
