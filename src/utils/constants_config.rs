// src/utils/constants_config.rs
use crate::errors::SimulationError;
use crate::utils::DEFAULT_SIMULATION_CONSTANTS;

/// Physical constants of the simulation, in simulation units.
///
/// `g` is the gravitational constant, `theta` the Barnes-Hut opening
/// parameter, and `mass_ref`/`alpha` shape the per-node opening scale
/// `(mass_ref / total_mass)^alpha` that lets light cells open more
/// aggressively than heavy ones.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConstants {
    pub g: f64,
    pub theta: f64,
    pub mass_ref: f64,
    pub alpha: f64,
}

impl Default for SimulationConstants {
    fn default() -> Self {
        DEFAULT_SIMULATION_CONSTANTS
    }
}

impl SimulationConstants {
    pub fn new(
        g: Option<f64>,
        theta: Option<f64>,
        mass_ref: Option<f64>,
        alpha: Option<f64>,
    ) -> Self {
        let default = DEFAULT_SIMULATION_CONSTANTS;
        Self {
            g: g.unwrap_or(default.g),
            theta: theta.unwrap_or(default.theta),
            mass_ref: mass_ref.unwrap_or(default.mass_ref),
            alpha: alpha.unwrap_or(default.alpha),
        }
    }

    /// Checks that the constants describe a usable configuration.
    ///
    /// Invalid values are configuration errors and fatal at construction.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.theta > 0.0) || !self.theta.is_finite() {
            return Err(SimulationError::InvalidOpeningAngle);
        }
        if !(self.g > 0.0) || !self.g.is_finite() {
            return Err(SimulationError::CalculationError(
                "Gravitational constant must be positive".to_string(),
            ));
        }
        if !(self.mass_ref > 0.0) || !self.mass_ref.is_finite() {
            return Err(SimulationError::CalculationError(
                "Reference mass must be positive".to_string(),
            ));
        }
        if !self.alpha.is_finite() {
            return Err(SimulationError::CalculationError(
                "Opening-scale exponent must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-node opening scale `(mass_ref / total_mass)^alpha`.
    ///
    /// Callers must not consult this for a node with zero total mass.
    pub fn theta_scale(&self, total_mass: f64) -> f64 {
        (self.mass_ref / total_mass).powf(self.alpha)
    }
}
