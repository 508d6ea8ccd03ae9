//! The camera rig: a follow camera for roaming the room, fixed framings for wall view, and the
//! animated hand-off between them.

pub mod orbit;
pub mod rig;
pub mod transition;

use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;

pub use orbit::{CameraView, OrbitControls, OrbitLimits, OrbitPlacement};
pub use rig::{CameraMode, CameraRig, FollowSettings};
pub use transition::{ease_in_out, PoseTransition, TransitionSettings};

/// Where a camera is and what it looks at.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct CameraPose {
    /// Eye position.
    pub position: Vec3,
    /// Look-at point.
    pub target: Vec3,
}

impl CameraPose {
    /// A pose at `position` looking at `target`.
    pub const fn new(position: Vec3, target: Vec3) -> Self {
        Self { position, target }
    }

    /// Componentwise linear interpolation of position and target.
    pub fn lerp(&self, other: &Self, s: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, s),
            target: self.target.lerp(other.target, s),
        }
    }

    /// A Y-up camera transform for this pose.
    pub fn to_transform(&self) -> Transform {
        Transform::from_translation(self.position).looking_at(self.target, Vec3::Y)
    }
}
