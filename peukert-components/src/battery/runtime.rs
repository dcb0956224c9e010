use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::{
    electric_charge::ampere_hour,
    electric_current::ampere,
    f64::{ElectricCharge, ElectricCurrent, Time},
    time::hour,
};

/// Inputs for the classical Peukert runtime estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuntimeQuery {
    /// Peukert exponent, typically taken from a capacity fit.
    pub exponent: f64,
    /// Dimensionless C-rate reference of the cell.
    pub c_rating: f64,
    /// Operating discharge current.
    pub current: ElectricCurrent,
    /// Nominal battery capacity.
    pub capacity: ElectricCharge,
}

/// Domain errors for the classical Peukert runtime estimate.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("peukert exponent must be finite, got {value}")]
    NonFiniteExponent { value: f64 },
}

/// Estimated operating duration at the queried discharge current.
///
/// Classical Peukert relation: with `R = 1 / c_rating`, the duration is
/// `t = R * (C / R)^n / i^n` hours. This is a separate empirical law
/// from the generalized capacity model and is never derived from it.
///
/// # Errors
///
/// Returns an error if the C-rate, current, or capacity is not strictly
/// positive and finite, or the exponent is not finite. A current of zero
/// is rejected rather than yielding an unbounded duration.
pub fn runtime(query: &RuntimeQuery) -> Result<Time, RuntimeError> {
    if !query.exponent.is_finite() {
        return Err(RuntimeError::NonFiniteExponent {
            value: query.exponent,
        });
    }

    let current = query.current.get::<ampere>();
    let capacity = query.capacity.get::<ampere_hour>();
    for (name, value) in [
        ("C-rate", query.c_rating),
        ("current", current),
        ("capacity", capacity),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(RuntimeError::NonPositive { name, value });
        }
    }

    let reference = 1.0 / query.c_rating;
    let hours = reference * (capacity / reference).powf(query.exponent)
        / current.powf(query.exponent);

    Ok(Time::new::<hour>(hours))
}

/// Samples the duration curve as `[amperes, hours]` points for a
/// plotting consumer.
///
/// # Errors
///
/// Returns the first domain error among the sampled currents.
pub fn runtime_curve(
    query: &RuntimeQuery,
    currents: &[ElectricCurrent],
) -> Result<Vec<[f64; 2]>, RuntimeError> {
    currents
        .iter()
        .map(|&current| {
            let sampled = RuntimeQuery { current, ..*query };
            runtime(&sampled).map(|duration| [current.get::<ampere>(), duration.get::<hour>()])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::time::minute;

    fn reference_query() -> RuntimeQuery {
        RuntimeQuery {
            exponent: 0.6530,
            c_rating: 100.0,
            current: ElectricCurrent::new::<ampere>(80.0),
            capacity: ElectricCharge::new::<ampere_hour>(6.0),
        }
    }

    #[test]
    fn matches_reference_duration() {
        let duration = runtime(&reference_query()).expect("query is valid");

        assert_relative_eq!(duration.get::<hour>(), 0.037_274_772_800_522_37, epsilon = 1e-9);
        // Roughly two and a quarter minutes of operation at 80 A.
        assert_relative_eq!(duration.get::<minute>(), 2.24, epsilon = 1e-2);
    }

    #[test]
    fn longer_runtimes_at_lower_currents() {
        let query = reference_query();
        let low = RuntimeQuery {
            current: ElectricCurrent::new::<ampere>(10.0),
            ..query
        };

        let at_low = runtime(&low).expect("query is valid");
        let at_high = runtime(&query).expect("query is valid");

        assert!(at_low > at_high);
    }

    #[test]
    fn errors_on_zero_current() {
        let query = RuntimeQuery {
            current: ElectricCurrent::new::<ampere>(0.0),
            ..reference_query()
        };

        let result = runtime(&query);

        assert!(matches!(
            result,
            Err(RuntimeError::NonPositive { name: "current", .. })
        ));
    }

    #[test]
    fn errors_on_non_positive_rating_and_capacity() {
        let zero_rating = RuntimeQuery {
            c_rating: 0.0,
            ..reference_query()
        };
        assert!(matches!(
            runtime(&zero_rating),
            Err(RuntimeError::NonPositive { name: "C-rate", .. })
        ));

        let negative_capacity = RuntimeQuery {
            capacity: ElectricCharge::new::<ampere_hour>(-6.0),
            ..reference_query()
        };
        assert!(matches!(
            runtime(&negative_capacity),
            Err(RuntimeError::NonPositive { name: "capacity", .. })
        ));
    }

    #[test]
    fn errors_on_non_finite_exponent() {
        let query = RuntimeQuery {
            exponent: f64::NAN,
            ..reference_query()
        };

        assert!(matches!(
            runtime(&query),
            Err(RuntimeError::NonFiniteExponent { .. })
        ));
    }

    #[test]
    fn curve_points_pair_amperes_with_hours() {
        let query = reference_query();
        let currents = [
            ElectricCurrent::new::<ampere>(40.0),
            ElectricCurrent::new::<ampere>(80.0),
        ];

        let points = runtime_curve(&query, &currents).expect("currents are positive");

        assert_eq!(points.len(), 2);
        assert_eq!(points[0][0], 40.0);
        let at_80 = runtime(&query).expect("query is valid");
        assert_relative_eq!(points[1][1], at_80.get::<hour>());
    }

    #[test]
    fn curve_rejects_a_zero_current_sample() {
        let query = reference_query();
        let currents = [
            ElectricCurrent::new::<ampere>(40.0),
            ElectricCurrent::new::<ampere>(0.0),
        ];

        let result = runtime_curve(&query, &currents);

        assert!(matches!(result, Err(RuntimeError::NonPositive { .. })));
    }
}
