//! Ground contact materials

use serde::{Deserialize, Serialize};

/// Surface properties used by the contact model
///
/// Friction bounds the tangential contact force (Coulomb cone). Restitution
/// scales the normal damping down: a bouncy surface dissipates less energy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Friction coefficient (0.0 = ice, 1.0 = rubber)
    pub friction: f64,
    /// Restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub restitution: f64,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.8,
            restitution: 0.0,
        }
    }
}

impl PhysicsMaterial {
    /// Robot feet: grippy, no bounce
    pub const RUBBER: Self = Self {
        friction: 0.9,
        restitution: 0.0,
    };

    /// Concrete-like ground
    pub const CONCRETE: Self = Self {
        friction: 0.7,
        restitution: 0.1,
    };

    pub const ICE: Self = Self {
        friction: 0.05,
        restitution: 0.1,
    };

    /// Create a new material; values are clamped to [0.0, 1.0]
    pub fn new(friction: f64, restitution: f64) -> Self {
        Self {
            friction: friction.clamp(0.0, 1.0),
            restitution: restitution.clamp(0.0, 1.0),
        }
    }

    /// Look up a material by the names used in scene files
    pub fn named(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "default" | "steel" => Some(Self::default()),
            "rubber" => Some(Self::RUBBER),
            "concrete" => Some(Self::CONCRETE),
            "ice" => Some(Self::ICE),
            _ => None,
        }
    }

    /// Combine two materials for a contact pair
    ///
    /// Geometric mean for friction, maximum for restitution.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            friction: (self.friction * other.friction).sqrt(),
            restitution: self.restitution.max(other.restitution),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_values() {
        let material = PhysicsMaterial::new(1.5, -0.5);
        assert_eq!(material.friction, 1.0);
        assert_eq!(material.restitution, 0.0);
    }

    #[test]
    fn test_combine() {
        let combined = PhysicsMaterial::ICE.combine(&PhysicsMaterial::RUBBER);
        assert!((combined.friction - (0.05_f64 * 0.9).sqrt()).abs() < 1e-12);
        assert_eq!(combined.restitution, 0.1);

        let reversed = PhysicsMaterial::RUBBER.combine(&PhysicsMaterial::ICE);
        assert_eq!(combined, reversed);
    }

    #[test]
    fn test_named_lookup() {
        assert_eq!(PhysicsMaterial::named("Steel"), Some(PhysicsMaterial::default()));
        assert_eq!(PhysicsMaterial::named("ice"), Some(PhysicsMaterial::ICE));
        assert!(PhysicsMaterial::named("marshmallow").is_none());
    }
}
