use thiserror::Error;

use crate::model::{Model, Snapshot};

use super::LeastSquaresProblem;

/// The result of evaluating a least-squares problem at a given `x`.
#[derive(Debug, Clone)]
pub struct Evaluation<I, O, const P: usize> {
    pub x: [f64; P],
    pub residuals: Vec<f64>,
    /// Sum of squared residuals at `x`.
    pub cost: f64,
    pub snapshot: Snapshot<I, O>,
}

/// Errors that can occur when evaluating a least-squares problem.
#[derive(Debug, Error)]
pub enum EvalError<IE, ME, RE> {
    /// Failed to construct the model input from solver parameters.
    #[error("failed to compute input")]
    Input(#[source] IE),
    /// The model call failed.
    #[error("model call failed")]
    Model(#[source] ME),
    /// Failed to compute residuals.
    #[error("failed to compute residuals")]
    Residual(#[source] RE),
}

/// Type alias for the result of [`evaluate`].
pub type EvaluateResult<M, P, const N: usize> = Result<
    Evaluation<<M as Model>::Input, <M as Model>::Output, N>,
    EvalError<
        <P as LeastSquaresProblem<N>>::InputError,
        <M as Model>::Error,
        <P as LeastSquaresProblem<N>>::ResidualError,
    >,
>;

/// Evaluates the model in the context of a least-squares problem.
///
/// This function maps `x` to model input, calls the model, computes the
/// residual vector, and accumulates the sum-of-squares cost.
///
/// # Errors
///
/// Returns an error if input mapping, model call, or residual computation
/// fails.
pub fn evaluate<M, P, const N: usize>(model: &M, problem: &P, x: [f64; N]) -> EvaluateResult<M, P, N>
where
    M: Model,
    P: LeastSquaresProblem<N, Input = M::Input, Output = M::Output>,
{
    let input = problem.input(&x).map_err(EvalError::Input)?;
    let output = model.call(&input).map_err(EvalError::Model)?;
    let residuals = problem
        .residuals(&input, &output)
        .map_err(EvalError::Residual)?;

    let cost = residuals.iter().map(|r| r * r).sum();

    Ok(Evaluation {
        x,
        residuals,
        cost,
        snapshot: Snapshot::new(input, output),
    })
}
