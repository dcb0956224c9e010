/// Configuration for the Levenberg–Marquardt solver.
///
/// The defaults match the relative tolerances commonly used by mature
/// least-squares libraries. Damping-parameter management is internal to
/// the solver and is not configurable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Maximum number of accepted iterations.
    pub max_iters: usize,
    /// Relative tolerance on the cost reduction of an accepted step.
    pub cost_tol: f64,
    /// Relative tolerance on the parameter update of an accepted step.
    pub step_tol: f64,
    /// Absolute tolerance on the infinity norm of the cost gradient.
    pub gradient_tol: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 100,
            cost_tol: 1e-8,
            step_tol: 1e-8,
            gradient_tol: 1e-8,
        }
    }
}

impl Config {
    /// Validates that all tolerances are finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns an error if any tolerance is negative or non-finite.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.cost_tol.is_finite() || self.cost_tol < 0.0 {
            return Err("cost_tol must be finite and non-negative");
        }
        if !self.step_tol.is_finite() || self.step_tol < 0.0 {
            return Err("step_tol must be finite and non-negative");
        }
        if !self.gradient_tol.is_finite() || self.gradient_tol < 0.0 {
            return Err("gradient_tol must be finite and non-negative");
        }
        Ok(())
    }
}
