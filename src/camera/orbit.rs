//! Provides [`OrbitControls`], the user-driven orbit around the rig's target, and the
//! [`OrbitLimits`] that bound it.

use std::f32::consts::FRAC_PI_2;

use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

/// Bounds on the orbit, and which user motions are allowed.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct OrbitLimits {
    /// Can the user rotate the camera about the target?
    pub rotate: bool,
    /// Can the user zoom?
    pub zoom: bool,
    /// Closest the camera may get to the target.
    pub min_distance: f32,
    /// Farthest the camera may get from the target.
    pub max_distance: f32,
    /// Lowest elevation angle above the target's horizon, in radians.
    pub min_pitch: f32,
    /// Highest elevation angle above the target's horizon, in radians.
    pub max_pitch: f32,
}

impl OrbitLimits {
    /// Free third-person orbit around the avatar.
    pub fn follow() -> Self {
        Self {
            rotate: true,
            zoom: true,
            min_distance: 2.0,
            max_distance: 20.0,
            min_pitch: 0.05,
            max_pitch: FRAC_PI_2 - 0.05,
        }
    }

    /// Locked bird's-eye framing of the whole room.
    pub fn overview() -> Self {
        Self {
            rotate: false,
            zoom: false,
            min_distance: 14.0,
            max_distance: 14.0,
            min_pitch: 1.2,
            max_pitch: 1.2,
        }
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance.max(self.min_distance))
    }

    fn clamp_pitch(&self, pitch: f32) -> f32 {
        pitch.clamp(self.min_pitch, self.max_pitch.max(self.min_pitch))
    }
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self::follow()
    }
}

/// The two follow-mode camera presets toggled with the view key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum CameraView {
    /// Third-person orbit around the avatar.
    #[default]
    Follow,
    /// High fixed framing over the room.
    Overview,
}

impl CameraView {
    /// The other view.
    pub fn toggled(self) -> Self {
        match self {
            CameraView::Follow => CameraView::Overview,
            CameraView::Overview => CameraView::Follow,
        }
    }

    /// Orbit limits applied while this view is active.
    pub fn limits(self) -> OrbitLimits {
        match self {
            CameraView::Follow => OrbitLimits::follow(),
            CameraView::Overview => OrbitLimits::overview(),
        }
    }
}

/// Spherical camera placement around a target, driven by pointer input.
///
/// Yaw is measured about +Y, with zero placing the camera on the +Z side of the target. Pitch is
/// the elevation above the target's horizontal plane.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct OrbitControls {
    /// Current bounds.
    pub limits: OrbitLimits,
    /// Radians of rotation per pixel of pointer motion.
    pub sensitivity: f32,
    /// Fraction of distance covered per unit of scroll.
    pub zoom_sensitivity: f32,
    /// Orbit placement restored when returning to the room.
    pub home: OrbitPlacement,
    placement: OrbitPlacement,
}

/// A camera placement on the orbit sphere.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct OrbitPlacement {
    /// Rotation about +Y.
    pub yaw: f32,
    /// Elevation above the horizon.
    pub pitch: f32,
    /// Distance from the target.
    pub distance: f32,
}

impl Default for OrbitPlacement {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.6,
            distance: 6.0,
        }
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        let home = OrbitPlacement::default();
        Self {
            limits: OrbitLimits::default(),
            sensitivity: 0.005,
            zoom_sensitivity: 0.1,
            home,
            placement: home,
        }
    }
}

impl OrbitControls {
    /// Current placement on the orbit sphere.
    pub fn placement(&self) -> OrbitPlacement {
        self.placement
    }

    /// Replace the limits and pull the current placement inside them.
    pub fn set_limits(&mut self, limits: OrbitLimits) {
        self.limits = limits;
        self.placement.distance = self.limits.clamp_distance(self.placement.distance);
        self.placement.pitch = self.limits.clamp_pitch(self.placement.pitch);
    }

    /// Return to the home placement, respecting the current limits.
    pub fn reset(&mut self) {
        self.placement = self.home;
        let limits = self.limits.clone();
        self.set_limits(limits);
    }

    /// Apply one frame of user input: pointer motion in pixels (only when `rotating`) and scroll
    /// lines. Motions disabled by the limits are ignored.
    pub fn apply_input(&mut self, motion: Vec2, rotating: bool, scroll: f32) {
        if rotating && self.limits.rotate && motion.is_finite() {
            self.placement.yaw -= motion.x * self.sensitivity;
            self.placement.pitch += motion.y * self.sensitivity;
        }
        if self.limits.zoom && scroll.is_finite() && scroll != 0.0 {
            self.placement.distance *= (1.0 - scroll * self.zoom_sensitivity).max(0.1);
        }
        self.placement.distance = self.limits.clamp_distance(self.placement.distance);
        self.placement.pitch = self.limits.clamp_pitch(self.placement.pitch);
    }

    /// Camera position when orbiting `target`.
    pub fn position_around(&self, target: Vec3) -> Vec3 {
        let OrbitPlacement {
            yaw,
            pitch,
            distance,
        } = self.placement;
        let offset = Vec3::new(
            pitch.cos() * yaw.sin(),
            pitch.sin(),
            pitch.cos() * yaw.cos(),
        );
        target + offset * distance
    }
}
