/// Defines a least-squares fitting problem over `P` parameters.
///
/// The problem owns the observed data. The residual vector may be any
/// length, but fitting is only meaningful when it has at least `P`
/// entries; the solver rejects underdetermined systems.
pub trait LeastSquaresProblem<const P: usize> {
    type Input;
    type Output;
    type InputError: std::error::Error + Send + Sync + 'static;
    type ResidualError: std::error::Error + Send + Sync + 'static;

    /// Maps solver parameters (`x`) into a model input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be constructed from `x`.
    fn input(&self, x: &[f64; P]) -> Result<Self::Input, Self::InputError>;

    /// Computes the residual vector (predicted minus observed) from model
    /// input/output.
    ///
    /// No aggregation happens here; the solver owns the cost.
    ///
    /// # Errors
    ///
    /// Returns an error if the residuals cannot be computed.
    fn residuals(
        &self,
        input: &Self::Input,
        output: &Self::Output,
    ) -> Result<Vec<f64>, Self::ResidualError>;
}
