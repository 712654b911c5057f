use std::fmt;
use std::error::Error;

/// Represents errors that can occur while configuring or advancing a simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Indicates an invalid mass value (negative mass at construction).
    InvalidMass,
    /// Indicates an invalid radius value (non-positive radius).
    InvalidRadius,
    /// Indicates an invalid time step (`dt` must be finite and positive).
    InvalidTimeStep,
    /// Indicates an invalid Barnes-Hut opening angle (`theta` must be positive).
    InvalidOpeningAngle,
    /// Indicates degenerate root bounds (non-positive width or height).
    InvalidTreeGeometry,
    /// A general error for calculations that produce invalid results.
    CalculationError(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimulationError::InvalidMass => write!(f, "Invalid mass value"),
            SimulationError::InvalidRadius => write!(f, "Invalid radius value"),
            SimulationError::InvalidTimeStep => write!(f, "Invalid time step"),
            SimulationError::InvalidOpeningAngle => write!(f, "Invalid opening angle"),
            SimulationError::InvalidTreeGeometry => write!(f, "Invalid tree geometry"),
            SimulationError::CalculationError(msg) => write!(f, "Calculation error: {}", msg),
        }
    }
}

impl Error for SimulationError {}
