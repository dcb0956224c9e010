//! Nonlinear least-squares machinery for fitting discharge models to
//! observed data.
//!
//! The crate separates *what* is being fitted from *how*: a [`Model`] maps
//! an input to an output, a [`least_squares::LeastSquaresProblem`] maps a
//! parameter vector into a model input and turns the model's output into a
//! residual vector, and the solver in
//! [`least_squares::levenberg_marquardt`] drives the parameter vector
//! toward the least-squares optimum.

pub mod least_squares;

mod model;

pub use model::{Model, Snapshot};
