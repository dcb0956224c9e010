//! Battery discharge models.
//!
//! Two empirical laws live here, and they stay distinct because they
//! answer different questions:
//!
//! - The **generalized Peukert equation** models available capacity as a
//!   function of discharge current through a complementary-error-function
//!   kernel, parameterized by [`PeukertParameters`]. Its parameters are
//!   recovered from observed `(current, capacity)` pairs by
//!   [`estimate_parameters`].
//! - The **classical Peukert relation** converts a discharge current,
//!   C-rate, and nominal capacity into an operating duration
//!   ([`runtime`]).
//!
//! [`DischargeStudy`] sequences the two over one observed dataset.

mod capacity;
mod fit;
mod observations;
mod runtime;
mod study;

pub use capacity::{
    CapacityError, CapacityInput, CapacityModel, PeukertParameters, capacities, capacity,
    capacity_curve,
};
pub use fit::{CapacityFitProblem, ParameterFit, estimate_parameters};
pub use observations::{Observation, ObservationError, ObservationSet};
pub use runtime::{RuntimeError, RuntimeQuery, runtime, runtime_curve};
pub use study::{DischargeStudy, RuntimeConditions, StudyError, StudyReport};
