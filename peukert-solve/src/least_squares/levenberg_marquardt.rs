//! Levenberg–Marquardt nonlinear least squares.
//!
//! # Algorithm
//!
//! Levenberg–Marquardt minimizes the sum of squared residuals by blending
//! gradient descent and Gauss–Newton steps. Each iteration builds a
//! forward-difference Jacobian, forms the damped normal equations
//! `(JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr`, and subtracts the step `δ` from the
//! current iterate. The damping parameter `λ` grows when a step fails to
//! reduce the cost and decays when a step is accepted; its management is
//! internal and never surfaced.
//!
//! # When to Use
//!
//! Levenberg–Marquardt is appropriate when:
//! - The parameter vector is small and the model is smooth
//! - Residuals are cheap enough to evaluate for finite differencing
//! - The initial guess is imperfect but within the basin of the optimum
//!
//! # Limitations
//!
//! - **Local method**: converges to the optimum nearest the initial guess
//! - **Point estimates only**: reports parameters and final cost, not
//!   statistical confidence intervals
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per accepted step. Observers can return
//! [`Action::StopEarly`] to halt with the current best iterate.

mod config;
mod error;
mod solution;

pub use config::Config;
pub use error::Error;
pub use solution::{Solution, Status};

use nalgebra::{DMatrix, DVector};

use crate::{
    least_squares::{Evaluation, LeastSquaresProblem, Observer, evaluate},
    model::Model,
};

/// Control actions supported by the Levenberg–Marquardt solver.
pub enum Action {
    /// Stop the solver early and return the current iterate.
    StopEarly,
}

/// Iteration event emitted by the solver after each accepted step.
pub struct Event<'a, I, O, const P: usize> {
    /// Accepted iteration counter (1-based).
    pub iter: usize,
    /// Damping parameter after the accepted step.
    pub damping: f64,
    /// Evaluation at the accepted iterate.
    pub eval: &'a Evaluation<I, O, P>,
}

const INITIAL_DAMPING: f64 = 1e-3;
const DAMPING_INCREASE: f64 = 10.0;
const DAMPING_DECREASE: f64 = 0.1;
const MIN_DAMPING: f64 = 1e-12;
const MAX_DAMPING: f64 = 1e12;

/// Minimizes the sum of squared residuals starting from `initial_guess`.
/// Observers see each accepted iterate.
///
/// # Errors
///
/// Returns an error if the config or initial guess is invalid, the system
/// is underdetermined, any residual evaluates to a non-finite value, or
/// the model or problem fails during evaluation.
pub fn solve<M, P, Obs, const N: usize>(
    model: &M,
    problem: &P,
    initial_guess: [f64; N],
    config: &Config,
    mut observer: Obs,
) -> Result<Solution<M::Input, M::Output, N>, Error>
where
    M: Model,
    P: LeastSquaresProblem<N, Input = M::Input, Output = M::Output>,
    Obs: for<'a> Observer<Event<'a, M::Input, M::Output, N>, Action>,
{
    config
        .validate()
        .map_err(|reason| Error::InvalidConfig { reason })?;

    for value in initial_guess {
        if !value.is_finite() {
            return Err(Error::NonFiniteGuess { value });
        }
    }

    let mut eval = evaluate(model, problem, initial_guess)?;
    ensure_finite(&eval)?;

    if eval.residuals.is_empty() {
        return Err(Error::NoResiduals);
    }
    if eval.residuals.len() < N {
        return Err(Error::Underdetermined {
            residuals: eval.residuals.len(),
            parameters: N,
        });
    }

    let mut damping = INITIAL_DAMPING;

    for iter in 1..=config.max_iters {
        let (normal, gradient) = normal_equations(model, problem, &eval)?;

        if gradient.amax() <= config.gradient_tol {
            return Ok(Solution::from_eval(eval, Status::Converged, iter - 1));
        }

        // Grow the damping until a trial step reduces the cost.
        let accepted = loop {
            let mut damped = normal.clone();
            for j in 0..N {
                // A zero diagonal entry would leave the damped system singular.
                damped[(j, j)] += damping * normal[(j, j)].max(f64::EPSILON);
            }

            if let Some(factor) = damped.cholesky() {
                let step = factor.solve(&gradient);
                let mut x = eval.x;
                for j in 0..N {
                    x[j] -= step[j];
                }

                let trial = evaluate(model, problem, x)?;
                ensure_finite(&trial)?;

                if trial.cost < eval.cost {
                    break Some((step, trial));
                }
            }

            damping *= DAMPING_INCREASE;
            if damping > MAX_DAMPING {
                break None;
            }
        };

        let Some((step, trial)) = accepted else {
            return Ok(Solution::from_eval(eval, Status::Stalled, iter - 1));
        };

        damping = (damping * DAMPING_DECREASE).max(MIN_DAMPING);

        let step_norm = step.norm();
        let x_norm = dot(&eval.x, &eval.x).sqrt();
        let prev_cost = eval.cost;
        let cost_drop = prev_cost - trial.cost;

        eval = trial;

        let event = Event {
            iter,
            damping,
            eval: &eval,
        };
        if let Some(action) = observer.observe(&event) {
            match action {
                Action::StopEarly => {
                    return Ok(Solution::from_eval(eval, Status::StoppedByObserver, iter));
                }
            }
        }

        let step_converged = step_norm <= config.step_tol * (x_norm + config.step_tol);
        let cost_converged = cost_drop <= config.cost_tol * prev_cost;

        if step_converged || cost_converged {
            return Ok(Solution::from_eval(eval, Status::Converged, iter));
        }
    }

    Ok(Solution::from_eval(eval, Status::MaxIters, config.max_iters))
}

/// Runs the solver without observation.
///
/// # Errors
///
/// Returns an error if the config or initial guess is invalid, the system
/// is underdetermined, any residual evaluates to a non-finite value, or
/// the model or problem fails during evaluation.
pub fn solve_unobserved<M, P, const N: usize>(
    model: &M,
    problem: &P,
    initial_guess: [f64; N],
    config: &Config,
) -> Result<Solution<M::Input, M::Output, N>, Error>
where
    M: Model,
    P: LeastSquaresProblem<N, Input = M::Input, Output = M::Output>,
{
    solve(model, problem, initial_guess, config, ())
}

/// Rejects evaluations whose residual vector contains a non-finite entry.
fn ensure_finite<I, O, const N: usize>(eval: &Evaluation<I, O, N>) -> Result<(), Error> {
    for (index, &value) in eval.residuals.iter().enumerate() {
        if !value.is_finite() {
            return Err(Error::NonFiniteResidual { index, value });
        }
    }
    Ok(())
}

/// Builds `JᵀJ` and `Jᵀr` from forward-difference Jacobian columns.
fn normal_equations<M, P, const N: usize>(
    model: &M,
    problem: &P,
    eval: &Evaluation<M::Input, M::Output, N>,
) -> Result<(DMatrix<f64>, DVector<f64>), Error>
where
    M: Model,
    P: LeastSquaresProblem<N, Input = M::Input, Output = M::Output>,
{
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(N);

    for j in 0..N {
        let step = f64::EPSILON.sqrt() * eval.x[j].abs().max(1.0);
        let mut x = eval.x;
        x[j] += step;

        let perturbed = evaluate(model, problem, x)?;
        ensure_finite(&perturbed)?;

        columns.push(
            perturbed
                .residuals
                .iter()
                .zip(&eval.residuals)
                .map(|(p, r)| (p - r) / step)
                .collect(),
        );
    }

    let normal = DMatrix::from_fn(N, N, |j, k| dot(&columns[j], &columns[k]));
    let gradient = DVector::from_fn(N, |j, _| dot(&columns[j], &eval.residuals));

    Ok((normal, gradient))
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    /// Model evaluating `scale * exp(rate * t)` at fixed sample times.
    struct ExponentialModel;

    #[derive(Debug, Clone)]
    struct ExponentialInput {
        scale: f64,
        rate: f64,
        times: Vec<f64>,
    }

    impl Model for ExponentialModel {
        type Input = ExponentialInput;
        type Output = Vec<f64>;
        type Error = Infallible;

        fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
            Ok(input
                .times
                .iter()
                .map(|t| input.scale * (input.rate * t).exp())
                .collect())
        }
    }

    /// Problem fitting the exponential to observed samples.
    struct ExponentialFit {
        times: Vec<f64>,
        observed: Vec<f64>,
    }

    impl ExponentialFit {
        fn from_true_parameters(scale: f64, rate: f64) -> Self {
            let times: Vec<f64> = (0..5).map(|k| 0.5 * f64::from(k)).collect();
            let observed = times.iter().map(|t| scale * (rate * t).exp()).collect();
            Self { times, observed }
        }
    }

    impl LeastSquaresProblem<2> for ExponentialFit {
        type Input = ExponentialInput;
        type Output = Vec<f64>;
        type InputError = Infallible;
        type ResidualError = Infallible;

        fn input(&self, x: &[f64; 2]) -> Result<Self::Input, Self::InputError> {
            Ok(ExponentialInput {
                scale: x[0],
                rate: x[1],
                times: self.times.clone(),
            })
        }

        fn residuals(
            &self,
            _input: &Self::Input,
            output: &Self::Output,
        ) -> Result<Vec<f64>, Self::ResidualError> {
            Ok(output
                .iter()
                .zip(&self.observed)
                .map(|(p, o)| p - o)
                .collect())
        }
    }

    #[test]
    fn recovers_exponential_parameters() {
        let problem = ExponentialFit::from_true_parameters(2.5, -1.3);

        let solution = solve_unobserved(
            &ExponentialModel,
            &problem,
            [1.0, -0.5],
            &Config::default(),
        )
        .expect("should solve");

        assert_eq!(solution.status, Status::Converged);
        assert_relative_eq!(solution.x[0], 2.5, epsilon = 1e-6);
        assert_relative_eq!(solution.x[1], -1.3, epsilon = 1e-6);
        assert!(solution.cost < 1e-10);
    }

    #[test]
    fn converged_guess_returns_immediately() {
        let problem = ExponentialFit::from_true_parameters(2.5, -1.3);

        let solution = solve_unobserved(
            &ExponentialModel,
            &problem,
            [2.5, -1.3],
            &Config::default(),
        )
        .expect("should solve");

        assert_eq!(solution.status, Status::Converged);
        assert_eq!(solution.iters, 0);
        assert!(solution.cost < 1e-20);
    }

    #[test]
    fn reports_max_iters_with_best_iterate() {
        let problem = ExponentialFit::from_true_parameters(2.5, -1.3);
        let guess = [1.0, -0.5];
        let initial = evaluate(&ExponentialModel, &problem, guess).expect("should evaluate");

        let config = Config {
            max_iters: 1,
            ..Config::default()
        };
        let solution = solve_unobserved(&ExponentialModel, &problem, guess, &config)
            .expect("should return best iterate");

        assert_eq!(solution.status, Status::MaxIters);
        assert_eq!(solution.iters, 1);
        assert!(solution.cost < initial.cost);
    }

    #[test]
    fn zero_iters_returns_initial_evaluation() {
        let problem = ExponentialFit::from_true_parameters(2.5, -1.3);

        let config = Config {
            max_iters: 0,
            ..Config::default()
        };
        let solution = solve_unobserved(&ExponentialModel, &problem, [1.0, -0.5], &config)
            .expect("should return initial evaluation");

        assert_eq!(solution.status, Status::MaxIters);
        assert_eq!(solution.iters, 0);
        assert_eq!(solution.x, [1.0, -0.5]);
    }

    #[test]
    fn observer_can_stop_iteration() {
        let problem = ExponentialFit::from_true_parameters(2.5, -1.3);

        let mut calls = 0usize;
        let observer = |event: &Event<'_, ExponentialInput, Vec<f64>, 2>| {
            calls += 1;
            if event.iter >= 2 {
                Some(Action::StopEarly)
            } else {
                None
            }
        };

        let solution = solve(
            &ExponentialModel,
            &problem,
            [1.0, -0.5],
            &Config::default(),
            observer,
        )
        .expect("should stop cleanly");

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.iters, 2);
        assert_eq!(calls, 2);
    }

    #[test]
    fn errors_on_invalid_config() {
        let problem = ExponentialFit::from_true_parameters(2.5, -1.3);

        let config = Config {
            step_tol: -1.0,
            ..Config::default()
        };
        let result = solve_unobserved(&ExponentialModel, &problem, [1.0, -0.5], &config);

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn errors_on_non_finite_guess() {
        let problem = ExponentialFit::from_true_parameters(2.5, -1.3);

        let result =
            solve_unobserved(&ExponentialModel, &problem, [f64::NAN, -0.5], &Config::default());

        assert!(matches!(result, Err(Error::NonFiniteGuess { .. })));
    }

    #[test]
    fn errors_on_underdetermined_system() {
        let problem = ExponentialFit {
            times: vec![1.0],
            observed: vec![2.0],
        };

        let result = solve_unobserved(&ExponentialModel, &problem, [1.0, -0.5], &Config::default());

        assert!(matches!(
            result,
            Err(Error::Underdetermined {
                residuals: 1,
                parameters: 2,
            })
        ));
    }

    #[test]
    fn errors_on_non_finite_residual() {
        let problem = ExponentialFit {
            times: vec![0.0, 1.0],
            observed: vec![1.0, f64::NAN],
        };

        let result = solve_unobserved(&ExponentialModel, &problem, [1.0, -0.5], &Config::default());

        assert!(matches!(
            result,
            Err(Error::NonFiniteResidual { index: 1, .. })
        ));
    }
}
