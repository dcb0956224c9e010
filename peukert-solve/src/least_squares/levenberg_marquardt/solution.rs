use crate::{least_squares::Evaluation, model::Snapshot};

/// Indicates how the solver finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged according to the configured tolerances.
    Converged,
    /// Reached the iteration limit without converging.
    MaxIters,
    /// No damping value up to the internal limit produced a
    /// cost-reducing step.
    Stalled,
    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of a Levenberg–Marquardt solve.
///
/// On [`Status::MaxIters`] and [`Status::Stalled`] the solution carries
/// the best-found iterate; the caller decides whether to accept it or
/// retry from a different initial guess.
#[derive(Debug, Clone)]
pub struct Solution<I, O, const P: usize> {
    /// Final solver status.
    pub status: Status,
    /// Best estimate of the parameter vector.
    pub x: [f64; P],
    /// Sum of squared residuals at the reported estimate.
    pub cost: f64,
    /// Residual vector at the reported estimate.
    pub residuals: Vec<f64>,
    /// Snapshot at the reported estimate.
    pub snapshot: Snapshot<I, O>,
    /// Accepted iteration count when the solver finished.
    pub iters: usize,
}

impl<I, O, const P: usize> Solution<I, O, P> {
    /// Constructs a solution from an evaluation result.
    pub(super) fn from_eval(eval: Evaluation<I, O, P>, status: Status, iters: usize) -> Self {
        Self {
            status,
            x: eval.x,
            cost: eval.cost,
            residuals: eval.residuals,
            snapshot: eval.snapshot,
            iters,
        }
    }
}
