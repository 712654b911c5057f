use crate::errors::SimulationError;
use crate::models::Vec2;

/// A single gravitating body.
///
/// Kinematic state (`position`, `velocity`, `acceleration`, `jerk`) is in
/// simulation units. `predicted_position` / `predicted_velocity` are scratch
/// fields written by the Hermite predictor and only meaningful inside one
/// integration step. `mark_for_deletion` is set transiently during the
/// collision pass; outside that pass it is always `false` for a live body.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Stable identifier, unique across the run and assigned once.
    pub id: u64,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Time derivative of acceleration, maintained for the Hermite scheme.
    pub jerk: Vec2,
    pub predicted_position: Vec2,
    pub predicted_velocity: Vec2,
    /// Mass, non-negative.
    pub mass: f64,
    /// Softening/contact radius, strictly positive.
    pub radius: f64,
    /// Rendering hint carried for the host; the core never branches on it.
    pub is_primary: bool,
    pub mark_for_deletion: bool,
}

impl Particle {
    /// Creates a new particle.
    ///
    /// # Errors
    ///
    /// Returns an error if `mass` is negative or not finite, or if `radius`
    /// is not strictly positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use accretion::{Particle, Vec2};
    ///
    /// let particle = Particle::new(0, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0), 1.0, 0.005)
    ///     .expect("Failed to create particle");
    /// assert_eq!(particle.mass, 1.0);
    /// assert!(!particle.mark_for_deletion);
    /// ```
    pub fn new(
        id: u64,
        position: Vec2,
        velocity: Vec2,
        mass: f64,
        radius: f64,
    ) -> Result<Self, SimulationError> {
        if mass < 0.0 || !mass.is_finite() {
            return Err(SimulationError::InvalidMass);
        }
        if radius <= 0.0 || !radius.is_finite() {
            return Err(SimulationError::InvalidRadius);
        }
        Ok(Particle {
            id,
            position,
            velocity,
            acceleration: Vec2::zeros(),
            jerk: Vec2::zeros(),
            predicted_position: Vec2::zeros(),
            predicted_velocity: Vec2::zeros(),
            mass,
            radius,
            is_primary: false,
            mark_for_deletion: false,
        })
    }

    /// Same as [`Particle::new`] but flags the body as a primary for rendering.
    pub fn new_primary(
        id: u64,
        position: Vec2,
        velocity: Vec2,
        mass: f64,
        radius: f64,
    ) -> Result<Self, SimulationError> {
        let mut particle = Particle::new(id, position, velocity, mass, radius)?;
        particle.is_primary = true;
        Ok(particle)
    }

    /// Linear momentum `m * v`.
    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }
}
