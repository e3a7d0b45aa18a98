//! Controller errors

use std::fmt;

use quadsim_physics::PhysicsError;

/// Error type for the periodic controller
#[derive(Debug)]
pub enum ControlError {
    /// A periodic timer was configured with period zero
    ZeroPeriod,
    /// Gaussian noise standard deviation is negative or not finite
    InvalidNoise(f64),
    /// A pose or state vector does not match the robot
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The robot rejected a command
    Robot(PhysicsError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::ZeroPeriod => write!(f, "timer period must be at least one step"),
            ControlError::InvalidNoise(std) => {
                write!(f, "invalid noise standard deviation: {}", std)
            }
            ControlError::DimensionMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{} has dimension {}, robot expects {}", what, actual, expected),
            ControlError::Robot(e) => write!(f, "robot error: {}", e),
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControlError::Robot(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PhysicsError> for ControlError {
    fn from(e: PhysicsError) -> Self {
        ControlError::Robot(e)
    }
}
