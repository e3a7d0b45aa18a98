//! Robot and contact geometry from the simulator state

use bitflags::bitflags;

use quadsim_core::ContactVisSettings;
use quadsim_physics::{ArticulatedSystem, CollisionLayer, ContactInfo};

use super::Placement;
use crate::renderable::RenderableGeometry;

/// Body corner markers have no radius of their own
const CORNER_MARKER_RADIUS: f32 = 0.01;
const COLLISION_COLOR: [f32; 4] = [0.2, 0.8, 0.3, 0.45];
const CONTACT_POINT_COLOR: [f32; 4] = [0.9, 0.1, 0.1, 1.0];
const CONTACT_FORCE_COLOR: [f32; 4] = [0.95, 0.75, 0.1, 1.0];

bitflags! {
    /// Layers drawn for the robot
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct VisualFlags: u32 {
        /// Visual meshes from the robot description
        const VISUALS = 1 << 0;
        /// Collision spheres and body corners
        const COLLISION_BODIES = 1 << 1;
        const CONTACT_POINTS = 1 << 2;
        const CONTACT_FORCES = 1 << 3;
    }
}

impl Default for VisualFlags {
    fn default() -> Self {
        VisualFlags::VISUALS
    }
}

/// Size of contact markers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactStyle {
    /// Radius of a contact point marker, metres
    pub point_size: f32,
    /// Length of the arrow for the largest contact force, metres
    pub force_scale: f32,
}

impl From<&ContactVisSettings> for ContactStyle {
    fn from(settings: &ContactVisSettings) -> Self {
        Self {
            point_size: settings.point_size,
            force_scale: settings.force_scale,
        }
    }
}

/// Geometry for the robot's links in their current poses
///
/// Visual shapes that cannot be drawn are skipped with a debug message.
pub fn robot_geometry(system: &ArticulatedSystem, flags: VisualFlags) -> RenderableGeometry {
    let mut geometry = RenderableGeometry::new();
    let poses = system.link_poses();

    for (link, pose) in system.tree().links().iter().zip(&poses) {
        if flags.contains(VisualFlags::VISUALS) {
            for visual in &link.visuals {
                let placement = Placement::from_pose(&pose.compose(&visual.origin));
                if !geometry.add_shape(&visual.shape, &placement, visual.color) {
                    log::debug!("Skipping mesh visual on link '{}'", link.name);
                }
            }
        }

        if flags.contains(VisualFlags::COLLISION_BODIES) {
            for point in &link.contact_points {
                let center = pose.transform_point(point.offset).to_f32_array();
                let radius = if point.layer.contains(CollisionLayer::FEET) {
                    point.radius as f32
                } else {
                    CORNER_MARKER_RADIUS
                };
                geometry.add_sphere(center, radius.max(CORNER_MARKER_RADIUS), COLLISION_COLOR);
            }
        }
    }
    geometry
}

/// Markers for the contacts of the last step
///
/// Force arrows are scaled so the largest force is `force_scale` long.
pub fn contact_geometry(
    contacts: &[ContactInfo],
    style: &ContactStyle,
    flags: VisualFlags,
) -> RenderableGeometry {
    let mut geometry = RenderableGeometry::new();

    if flags.contains(VisualFlags::CONTACT_POINTS) {
        for contact in contacts {
            let position = contact.position.to_f32_array();
            geometry.add_sphere(position, style.point_size, CONTACT_POINT_COLOR);
        }
    }

    if flags.contains(VisualFlags::CONTACT_FORCES) {
        let max_force = contacts
            .iter()
            .map(|c| c.force.length())
            .fold(0.0f64, f64::max);
        if max_force > 0.0 {
            let scale = style.force_scale as f64 / max_force;
            for contact in contacts {
                geometry.add_arrow(
                    contact.position,
                    contact.force * scale,
                    0.25 * style.point_size,
                    CONTACT_FORCE_COLOR,
                );
            }
        }
    }
    geometry
}
