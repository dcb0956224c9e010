//! Runs the reference discharge study: fits the generalized Peukert
//! parameters to three observed points, evaluates the fitted capacity at
//! the lowest observed current, and estimates the runtime of a 6 Ah cell
//! under an 80 A load.
//!
//! Run with `cargo run --example discharge_study`.

use peukert_components::battery::{
    DischargeStudy, ObservationSet, PeukertParameters, RuntimeConditions, RuntimeQuery,
    runtime_curve,
};
use peukert_solve::least_squares::levenberg_marquardt::Config;
use uom::si::{
    electric_charge::ampere_hour,
    electric_current::ampere,
    f64::{ElectricCharge, ElectricCurrent},
    time::minute,
};

fn main() {
    let observations = ObservationSet::from_raw(
        &[612.85, 459.6375, 306.425],
        &[15.054043042538622, 25.81989538243598, 38.59230288240648],
    )
    .expect("reference observations are valid");

    let study = DischargeStudy {
        observations,
        initial_guess: PeukertParameters::from_raw(100.0, 0.5, 300.0),
        evaluation_current: ElectricCurrent::new::<ampere>(306.425),
        runtime_conditions: RuntimeConditions {
            c_rating: 100.0,
            current: ElectricCurrent::new::<ampere>(80.0),
            capacity: ElectricCharge::new::<ampere_hour>(6.0),
            exponent: None,
        },
        fit_config: Config::default(),
    };

    let report = study.run().expect("study should complete");

    let parameters = &report.fit.parameters;
    println!(
        "Fit finished as {:?} after {} iterations:",
        report.fit.status, report.fit.iters
    );
    println!("  Cm = {:.4} Ah", parameters.cm.get::<ampere_hour>());
    println!("  n  = {:.4}", parameters.n);
    println!("  ik = {:.4} A", parameters.ik.get::<ampere>());
    println!("  residual cost = {:.4e}", report.fit.cost);
    println!();
    println!(
        "Expected capacity at 306.425 A: {:.2} Ah",
        report.expected_capacity.get::<ampere_hour>()
    );
    println!("Runtime at 80 A: {:.2} min", report.runtime.get::<minute>());

    // Duration curve over 0.1..=100 A, as the point series a plotting
    // frontend consumes.
    let sweep: Vec<ElectricCurrent> = (0..100)
        .map(|step| ElectricCurrent::new::<ampere>(0.1 + f64::from(step) * (100.0 - 0.1) / 99.0))
        .collect();
    let query = RuntimeQuery {
        exponent: parameters.n,
        c_rating: 100.0,
        current: ElectricCurrent::new::<ampere>(80.0),
        capacity: ElectricCharge::new::<ampere_hour>(6.0),
    };
    let curve = runtime_curve(&query, &sweep).expect("sweep currents are positive");

    println!();
    println!("Duration curve samples:");
    for [amperes, hours] in [curve[0], curve[49], curve[99]] {
        println!("  {amperes:7.2} A -> {:8.2} min", hours * 60.0);
    }
}
