use std::convert::Infallible;

use libm::erfc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::{
    electric_charge::ampere_hour,
    electric_current::ampere,
    f64::{ElectricCharge, ElectricCurrent},
};

use peukert_solve::Model;

/// Parameters of the generalized Peukert capacity model.
///
/// From Yazvinskaya et al., "Analysis of Peukert Generalized Equations
/// Use for Estimation of Remaining Capacity of Automotive-Grade
/// Lithium-Ion Batteries".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeukertParameters {
    /// Reference capacity scale.
    pub cm: ElectricCharge,
    /// Dimensionless exponent governing how fast capacity fades with
    /// current.
    pub n: f64,
    /// Characteristic current at which the available capacity equals
    /// `cm / erfc(-n)`.
    pub ik: ElectricCurrent,
}

impl PeukertParameters {
    #[must_use]
    pub fn new(cm: ElectricCharge, n: f64, ik: ElectricCurrent) -> Self {
        Self { cm, n, ik }
    }

    /// Creates parameters from raw values in amp-hours and amperes.
    #[must_use]
    pub fn from_raw(cm_amp_hours: f64, n: f64, ik_amperes: f64) -> Self {
        Self {
            cm: ElectricCharge::new::<ampere_hour>(cm_amp_hours),
            n,
            ik: ElectricCurrent::new::<ampere>(ik_amperes),
        }
    }

    /// Returns `[Cm (Ah), n, ik (A)]`, the layout the solver iterates on.
    #[must_use]
    pub fn to_vector(&self) -> [f64; 3] {
        [self.cm.get::<ampere_hour>(), self.n, self.ik.get::<ampere>()]
    }

    /// Rebuilds parameters from a solver vector.
    ///
    /// The result is not validated; solver iterates may pass through
    /// non-physical values.
    #[must_use]
    pub fn from_vector(x: [f64; 3]) -> Self {
        Self::from_raw(x[0], x[1], x[2])
    }

    /// Checks that all three parameters are strictly positive and finite.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending parameter.
    pub fn validate(&self) -> Result<(), CapacityError> {
        let [cm, n, ik] = self.to_vector();
        for (name, value) in [("Cm", cm), ("n", n), ("ik", ik)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CapacityError::NonPositiveParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Domain errors for the generalized Peukert capacity model.
#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveParameter { name: &'static str, value: f64 },

    #[error("discharge current must be non-negative and finite, got {value} A")]
    InvalidCurrent { value: f64 },
}

/// Generalized Peukert kernel in raw units (amp-hours, amperes).
///
/// The erfc argument is `(i/ik - 1) * n`; no `1/n` division appears
/// anywhere, so small exponents pose no overflow hazard.
fn kernel(cm: f64, n: f64, ik: f64, current: f64) -> f64 {
    (cm / erfc(-n)) * erfc((current / ik - 1.0) * n)
}

/// Capacity model used by the parameter estimator.
///
/// Evaluates the raw kernel without domain validation so solver iterates
/// can roam freely, like an unconstrained least-squares fit. An iterate
/// that produces a non-finite capacity aborts the solve with a
/// numerical-domain error; use [`capacity`] for validated evaluation.
pub struct CapacityModel;

/// Input to the capacity model: parameters plus the currents to evaluate.
#[derive(Debug, Clone)]
pub struct CapacityInput {
    pub parameters: PeukertParameters,
    pub currents: Vec<ElectricCurrent>,
}

impl Model for CapacityModel {
    type Input = CapacityInput;
    type Output = Vec<ElectricCharge>;
    type Error = Infallible;

    /// Evaluates the kernel at every input current.
    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let [cm, n, ik] = input.parameters.to_vector();
        Ok(input
            .currents
            .iter()
            .map(|current| {
                ElectricCharge::new::<ampere_hour>(kernel(cm, n, ik, current.get::<ampere>()))
            })
            .collect())
    }
}

/// Expected capacity at a discharge current.
///
/// # Errors
///
/// Returns an error if a parameter is not strictly positive and finite,
/// or the current is negative or non-finite.
pub fn capacity(
    parameters: &PeukertParameters,
    current: ElectricCurrent,
) -> Result<ElectricCharge, CapacityError> {
    parameters.validate()?;
    validate_current(current)?;

    let [cm, n, ik] = parameters.to_vector();
    Ok(ElectricCharge::new::<ampere_hour>(kernel(
        cm,
        n,
        ik,
        current.get::<ampere>(),
    )))
}

/// Expected capacity at each of the given discharge currents.
///
/// # Errors
///
/// Returns an error if a parameter is not strictly positive and finite,
/// or any current is negative or non-finite.
pub fn capacities(
    parameters: &PeukertParameters,
    currents: &[ElectricCurrent],
) -> Result<Vec<ElectricCharge>, CapacityError> {
    parameters.validate()?;
    for &current in currents {
        validate_current(current)?;
    }

    let [cm, n, ik] = parameters.to_vector();
    Ok(currents
        .iter()
        .map(|current| {
            ElectricCharge::new::<ampere_hour>(kernel(cm, n, ik, current.get::<ampere>()))
        })
        .collect())
}

/// Samples the capacity curve as `[amperes, amp-hours]` points for a
/// plotting consumer.
///
/// # Errors
///
/// Returns an error if a parameter is not strictly positive and finite,
/// or any current is negative or non-finite.
pub fn capacity_curve(
    parameters: &PeukertParameters,
    currents: &[ElectricCurrent],
) -> Result<Vec<[f64; 2]>, CapacityError> {
    let capacities = capacities(parameters, currents)?;
    Ok(currents
        .iter()
        .zip(&capacities)
        .map(|(current, capacity)| [current.get::<ampere>(), capacity.get::<ampere_hour>()])
        .collect())
}

fn validate_current(current: ElectricCurrent) -> Result<(), CapacityError> {
    let value = current.get::<ampere>();
    if !value.is_finite() || value < 0.0 {
        return Err(CapacityError::InvalidCurrent { value });
    }
    Ok(())
}
