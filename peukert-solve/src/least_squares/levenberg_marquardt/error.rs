use std::error::Error as StdError;

use thiserror::Error;

use crate::least_squares::EvalError;

/// Errors that can occur during a Levenberg–Marquardt solve.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },

    #[error("initial guess contains non-finite value: {value}")]
    NonFiniteGuess { value: f64 },

    #[error("problem produced an empty residual vector")]
    NoResiduals,

    #[error("underdetermined system: {residuals} residuals for {parameters} parameters")]
    Underdetermined {
        residuals: usize,
        parameters: usize,
    },

    #[error("non-finite residual {value} at index {index}")]
    NonFiniteResidual { index: usize, value: f64 },

    #[error("failed to compute input")]
    Input(#[source] Box<dyn StdError + Send + Sync>),

    #[error("model call failed")]
    Model(#[source] Box<dyn StdError + Send + Sync>),

    #[error("failed to compute residuals")]
    Residual(#[source] Box<dyn StdError + Send + Sync>),
}

impl<IE, ME, RE> From<EvalError<IE, ME, RE>> for Error
where
    IE: StdError + Send + Sync + 'static,
    ME: StdError + Send + Sync + 'static,
    RE: StdError + Send + Sync + 'static,
{
    fn from(err: EvalError<IE, ME, RE>) -> Self {
        match err {
            EvalError::Input(e) => Self::Input(Box::new(e)),
            EvalError::Model(e) => Self::Model(Box::new(e)),
            EvalError::Residual(e) => Self::Residual(Box::new(e)),
        }
    }
}
