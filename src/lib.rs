// src/lib.rs

pub mod errors;
pub mod models;
pub mod particles;
pub mod utils;

pub use errors::SimulationError;
pub use models::{Bounds, Vec2};
pub use particles::{Integrator, Particle, QuadTree, Simulation, SimulationConfig};
pub use utils::{SimulationConstants, DEFAULT_SIMULATION_CONSTANTS};

/// Asserts that `a` and `b` differ by less than `epsilon`.
///
/// The scenario tests compare simulated state against analytic
/// expectations; `context` names the quantity under test so a failure
/// reads as more than a pair of bare floats.
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64, context: Option<&str>) {
    let delta = (a - b).abs();
    assert!(
        delta < epsilon,
        "{}: |{} - {}| = {} exceeds epsilon {}",
        context.unwrap_or("values differ"),
        a,
        b,
        delta,
        epsilon
    );
}
