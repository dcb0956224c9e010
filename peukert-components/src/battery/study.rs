use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::f64::{ElectricCharge, ElectricCurrent, Time};

use peukert_solve::least_squares::levenberg_marquardt::{self, Config};

use super::{
    capacity::{self, CapacityError, PeukertParameters},
    fit::{self, ParameterFit},
    observations::ObservationSet,
    runtime::{self, RuntimeError, RuntimeQuery},
};

/// Operating conditions for a study's runtime estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConditions {
    /// Dimensionless C-rate reference of the cell.
    pub c_rating: f64,
    /// Operating discharge current.
    pub current: ElectricCurrent,
    /// Nominal battery capacity.
    pub capacity: ElectricCharge,
    /// Peukert exponent override; `None` uses the fitted exponent.
    pub exponent: Option<f64>,
}

/// Configuration for one discharge study.
///
/// A study owns all of its inputs explicitly, so the same value can be
/// run repeatedly or rebuilt with different data between runs.
#[derive(Debug, Clone)]
pub struct DischargeStudy {
    /// Observed discharge data to fit.
    pub observations: ObservationSet,
    /// Starting point for the parameter fit.
    pub initial_guess: PeukertParameters,
    /// Current at which the fitted capacity model is evaluated.
    pub evaluation_current: ElectricCurrent,
    /// Conditions for the runtime estimate.
    pub runtime_conditions: RuntimeConditions,
    /// Solver configuration for the fit.
    pub fit_config: Config,
}

/// Structured results of a discharge study.
#[derive(Debug, Clone)]
pub struct StudyReport {
    /// Parameter estimation outcome, including solver status.
    pub fit: ParameterFit,
    /// Expected capacity at the study's evaluation current.
    pub expected_capacity: ElectricCharge,
    /// Estimated operating duration under the runtime conditions.
    pub runtime: Time,
}

/// Errors from running a discharge study.
#[derive(Debug, Error)]
pub enum StudyError {
    #[error("parameter estimation failed")]
    Fit(#[from] levenberg_marquardt::Error),

    #[error("capacity evaluation failed")]
    Capacity(#[from] CapacityError),

    #[error("runtime estimation failed")]
    Runtime(#[from] RuntimeError),
}

impl DischargeStudy {
    /// Runs parameter estimation, capacity evaluation, and runtime
    /// estimation in sequence and returns the combined report.
    ///
    /// A fit that stops at its iteration budget is not an error; the
    /// status travels in the report and the downstream evaluations use
    /// the best-found parameters, leaving acceptance to the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage reports a domain or numerical
    /// error.
    pub fn run(&self) -> Result<StudyReport, StudyError> {
        let fit =
            fit::estimate_parameters(&self.observations, &self.initial_guess, &self.fit_config)?;

        let expected_capacity = capacity::capacity(&fit.parameters, self.evaluation_current)?;

        let query = RuntimeQuery {
            exponent: self
                .runtime_conditions
                .exponent
                .unwrap_or(fit.parameters.n),
            c_rating: self.runtime_conditions.c_rating,
            current: self.runtime_conditions.current,
            capacity: self.runtime_conditions.capacity,
        };
        let runtime = runtime::runtime(&query)?;

        Ok(StudyReport {
            fit,
            expected_capacity,
            runtime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{electric_charge::ampere_hour, electric_current::ampere, time::hour};

    fn reference_study() -> DischargeStudy {
        let observations = ObservationSet::from_raw(
            &[612.85, 459.6375, 306.425],
            &[15.054_043_042_538_622, 25.819_895_382_435_98, 38.592_302_882_406_48],
        )
        .expect("reference data is valid");

        DischargeStudy {
            observations,
            initial_guess: PeukertParameters::from_raw(100.0, 0.5, 300.0),
            evaluation_current: ElectricCurrent::new::<ampere>(306.425),
            runtime_conditions: RuntimeConditions {
                c_rating: 100.0,
                current: ElectricCurrent::new::<ampere>(80.0),
                capacity: ElectricCharge::new::<ampere_hour>(6.0),
                exponent: None,
            },
            fit_config: Config::default(),
        }
    }

    #[test]
    fn runs_the_reference_study() {
        let report = reference_study().run().expect("study should complete");

        assert!(report.fit.converged());
        assert_relative_eq!(
            report.expected_capacity.get::<ampere_hour>(),
            38.5923,
            epsilon = 1e-3
        );
        // The fitted exponent lands at 0.653, matching the standalone
        // runtime reference value.
        assert_relative_eq!(
            report.runtime.get::<hour>(),
            0.0372748,
            epsilon = 1e-5
        );
    }

    #[test]
    fn exponent_override_feeds_the_runtime_estimate() {
        let mut study = reference_study();
        study.runtime_conditions.exponent = Some(1.0);

        let report = study.run().expect("study should complete");

        // With n = 1 the relation collapses to t = C / i.
        assert_relative_eq!(report.runtime.get::<hour>(), 6.0 / 80.0, epsilon = 1e-12);
    }

    #[test]
    fn propagates_runtime_domain_errors() {
        let mut study = reference_study();
        study.runtime_conditions.current = ElectricCurrent::new::<ampere>(0.0);

        let result = study.run();

        assert!(matches!(result, Err(StudyError::Runtime(_))));
    }
}
