use std::convert::Infallible;

use uom::si::{
    electric_charge::ampere_hour,
    f64::{ElectricCharge, ElectricCurrent},
};

use peukert_solve::least_squares::{
    LeastSquaresProblem,
    levenberg_marquardt::{self, Config, Error, Status},
};

use super::{
    capacity::{CapacityInput, CapacityModel, PeukertParameters},
    observations::ObservationSet,
};

/// Least-squares problem binding the capacity model to observed data.
///
/// Residuals are predicted minus observed capacity, elementwise in
/// observation order, in amp-hours. No aggregation happens here; the
/// solver owns the cost.
pub struct CapacityFitProblem {
    currents: Vec<ElectricCurrent>,
    observed_amp_hours: Vec<f64>,
}

impl CapacityFitProblem {
    #[must_use]
    pub fn new(observations: &ObservationSet) -> Self {
        let currents = observations
            .observations()
            .iter()
            .map(|observation| observation.current)
            .collect();
        let observed_amp_hours = observations
            .observations()
            .iter()
            .map(|observation| observation.capacity.get::<ampere_hour>())
            .collect();

        Self {
            currents,
            observed_amp_hours,
        }
    }
}

impl LeastSquaresProblem<3> for CapacityFitProblem {
    type Input = CapacityInput;
    type Output = Vec<ElectricCharge>;
    type InputError = Infallible;
    type ResidualError = Infallible;

    fn input(&self, x: &[f64; 3]) -> Result<Self::Input, Self::InputError> {
        Ok(CapacityInput {
            parameters: PeukertParameters::from_vector(*x),
            currents: self.currents.clone(),
        })
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<Vec<f64>, Self::ResidualError> {
        Ok(output
            .iter()
            .zip(&self.observed_amp_hours)
            .map(|(predicted, observed)| predicted.get::<ampere_hour>() - observed)
            .collect())
    }
}

/// The outcome of a parameter estimation run.
#[derive(Debug, Clone)]
pub struct ParameterFit {
    /// Fitted model parameters (the best-found iterate when the solver
    /// did not converge).
    pub parameters: PeukertParameters,
    /// Sum of squared residuals at the reported parameters, in amp-hours
    /// squared.
    pub cost: f64,
    /// Residual vector in observation order, in amp-hours.
    pub residuals: Vec<f64>,
    /// Final solver status.
    pub status: Status,
    /// Accepted solver iterations.
    pub iters: usize,
}

impl ParameterFit {
    /// Whether the solver met its convergence tolerances.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }
}

/// Fits the generalized Peukert parameters to observed discharge data.
///
/// The initial guess steers which optimum the solver finds and how fast
/// it gets there; it is supplied by the caller, never inferred from the
/// data. With the minimum of three observations the system is exactly
/// determined and the fit interpolates rather than regresses, so the
/// result is a point estimate with a residual magnitude, not a
/// statistical fit with confidence intervals.
///
/// # Errors
///
/// Returns an error if the solver config is invalid, the guess contains
/// a non-finite value, or any iterate produces a non-finite residual.
pub fn estimate_parameters(
    observations: &ObservationSet,
    initial_guess: &PeukertParameters,
    config: &Config,
) -> Result<ParameterFit, Error> {
    let problem = CapacityFitProblem::new(observations);

    let solution = levenberg_marquardt::solve_unobserved(
        &CapacityModel,
        &problem,
        initial_guess.to_vector(),
        config,
    )?;

    Ok(ParameterFit {
        parameters: PeukertParameters::from_vector(solution.x),
        cost: solution.cost,
        residuals: solution.residuals,
        status: solution.status,
        iters: solution.iters,
    })
}
