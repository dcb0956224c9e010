use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::{
    electric_charge::ampere_hour,
    electric_current::ampere,
    f64::{ElectricCharge, ElectricCurrent},
};

/// A single constant-current discharge measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub current: ElectricCurrent,
    pub capacity: ElectricCharge,
}

/// Observed `(current, capacity)` pairs backing a parameter fit.
///
/// Construction enforces the fit's preconditions: at least
/// [`ObservationSet::MIN_LEN`] points, strictly positive finite currents
/// (they appear in a denominator inside the capacity kernel), and finite
/// capacities. Sets are only built through the validating constructors,
/// so a value of this type always satisfies them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationSet {
    observations: Vec<Observation>,
}

impl ObservationSet {
    /// Minimum number of observations needed to identify the three model
    /// parameters.
    pub const MIN_LEN: usize = 3;

    /// Validates and wraps a list of observations.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than [`Self::MIN_LEN`] observations are
    /// given, any current is non-positive or non-finite, or any capacity
    /// is non-finite.
    pub fn new(observations: Vec<Observation>) -> Result<Self, ObservationError> {
        if observations.len() < Self::MIN_LEN {
            return Err(ObservationError::TooFew {
                minimum: Self::MIN_LEN,
                actual: observations.len(),
            });
        }

        for observation in &observations {
            let current = observation.current.get::<ampere>();
            if !current.is_finite() || current <= 0.0 {
                return Err(ObservationError::InvalidCurrent { value: current });
            }

            let capacity = observation.capacity.get::<ampere_hour>();
            if !capacity.is_finite() {
                return Err(ObservationError::InvalidCapacity { value: capacity });
            }
        }

        Ok(Self { observations })
    }

    /// Builds a set from parallel slices in amperes and amp-hours.
    ///
    /// # Errors
    ///
    /// Returns an error if the slices differ in length, in addition to
    /// the invariants checked by [`Self::new`].
    pub fn from_raw(
        currents_amperes: &[f64],
        capacities_amp_hours: &[f64],
    ) -> Result<Self, ObservationError> {
        if currents_amperes.len() != capacities_amp_hours.len() {
            return Err(ObservationError::ShapeMismatch {
                currents: currents_amperes.len(),
                capacities: capacities_amp_hours.len(),
            });
        }

        Self::new(
            currents_amperes
                .iter()
                .zip(capacities_amp_hours)
                .map(|(&current, &capacity)| Observation {
                    current: ElectricCurrent::new::<ampere>(current),
                    capacity: ElectricCharge::new::<ampere_hour>(capacity),
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Errors rejecting an invalid observation set.
#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("observation arrays differ in length: {currents} currents, {capacities} capacities")]
    ShapeMismatch { currents: usize, capacities: usize },

    #[error("at least {minimum} observations are needed to identify the model, got {actual}")]
    TooFew { minimum: usize, actual: usize },

    #[error("observed current must be positive and finite, got {value} A")]
    InvalidCurrent { value: f64 },

    #[error("observed capacity must be finite, got {value} Ah")]
    InvalidCapacity { value: f64 },
}
