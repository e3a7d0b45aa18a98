//! Error type for the simulator

use std::fmt;

use crate::urdf::UrdfError;

#[derive(Debug)]
pub enum PhysicsError {
    /// The robot description could not be read or is not a tree
    Urdf(UrdfError),
    /// A state vector has the wrong length
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The key does not refer to a system in this world
    UnknownSystem,
    /// A time step that is zero, negative or not finite
    InvalidTimeStep(f64),
}

impl PhysicsError {
    /// Return `Err(DimensionMismatch)` unless `actual == expected`
    pub fn check_dim(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::DimensionMismatch {
                what,
                expected,
                actual,
            })
        }
    }
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::Urdf(e) => write!(f, "robot description error: {}", e),
            PhysicsError::DimensionMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{} has dimension {}, expected {}", what, actual, expected),
            PhysicsError::UnknownSystem => write!(f, "no such articulated system"),
            PhysicsError::InvalidTimeStep(dt) => write!(f, "invalid time step: {}", dt),
        }
    }
}

impl std::error::Error for PhysicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PhysicsError::Urdf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<UrdfError> for PhysicsError {
    fn from(e: UrdfError) -> Self {
        PhysicsError::Urdf(e)
    }
}
