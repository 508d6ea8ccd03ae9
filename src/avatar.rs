//! Provides the [`Avatar`], the body the user walks around the room, and the [`MovementInput`]
//! flags that drive it.

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_input::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_render::prelude::*;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;

use crate::interaction::InteractionController;

/// Movement flags latched from the keyboard. Cleared whenever free roam is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Resource, Reflect)]
pub struct MovementInput {
    /// Walk along the current heading.
    pub forward: bool,
    /// Turn counterclockwise (seen from above).
    pub rotate_left: bool,
    /// Turn clockwise (seen from above).
    pub rotate_right: bool,
}

impl MovementInput {
    /// Latch the flags from the keyboard: arrows or WASD.
    pub fn from_keys(keys: &ButtonInput<KeyCode>) -> Self {
        Self {
            forward: keys.any_pressed([KeyCode::ArrowUp, KeyCode::KeyW]),
            rotate_left: keys.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]),
            rotate_right: keys.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]),
        }
    }

    /// Update the latched flags. Input only moves the avatar while the user is roaming the room.
    pub fn read_keys(
        keys: Res<ButtonInput<KeyCode>>,
        controller: Res<InteractionController>,
        mut input: ResMut<MovementInput>,
    ) {
        let next = if controller.free_roam_enabled() {
            MovementInput::from_keys(&keys)
        } else {
            MovementInput::default()
        };
        input.set_if_neq(next);
    }
}

/// The user's body in the room.
#[derive(Debug, Clone, Reflect, Component)]
pub struct Avatar {
    /// Feet position.
    pub position: Vec3,
    /// Rotation about +Y in radians. Zero faces +Z.
    pub heading: f32,
    /// Walking speed in units per second.
    pub speed: f32,
    /// Turning speed in radians per second.
    pub rotation_speed: f32,
    /// Largest absolute x or z the avatar may reach.
    pub half_extent: f32,
    /// How long after startup the avatar stays hidden.
    pub entry_delay: Duration,
}

impl Default for Avatar {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.25, 0.0),
            heading: std::f32::consts::PI,
            speed: 6.0,
            rotation_speed: 6.0,
            half_extent: 4.5,
            entry_delay: Duration::from_millis(500),
        }
    }
}

impl Avatar {
    /// An avatar confined to `[-half_extent, half_extent]` on x and z.
    pub fn new(half_extent: f32) -> Self {
        Self {
            half_extent: half_extent.max(0.0),
            ..Default::default()
        }
    }

    /// Unit vector the avatar walks along.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.heading.sin(), 0.0, self.heading.cos())
    }

    /// Advance the avatar by `delta_seconds` under `input`, then clamp it to the room.
    ///
    /// Negative or non-finite deltas are treated as zero. A step that overflows leaves the
    /// affected value where it was.
    pub fn tick(&mut self, delta_seconds: f32, input: MovementInput) {
        let dt = if delta_seconds.is_finite() {
            delta_seconds.max(0.0)
        } else {
            0.0
        };
        let mut heading = self.heading;
        if input.rotate_left {
            heading += self.rotation_speed * dt;
        }
        if input.rotate_right {
            heading -= self.rotation_speed * dt;
        }
        self.heading = finite_or(heading, self.heading);

        if input.forward {
            let step = self.speed * dt;
            let (sin, cos) = self.heading.sin_cos();
            self.position.x = finite_or(self.position.x + step * sin, self.position.x);
            self.position.z = finite_or(self.position.z + step * cos, self.position.z);
        }
        let limit = self.half_extent;
        self.position.x = finite_or(self.position.x, 0.0).clamp(-limit, limit);
        self.position.z = finite_or(self.position.z, 0.0).clamp(-limit, limit);
    }

    /// Move every avatar from the latched input and mirror it into its [`Transform`].
    pub fn update_movement(
        time: Res<Time>,
        input: Res<MovementInput>,
        mut avatars: Query<(&mut Avatar, &mut Transform, Option<&mut Visibility>)>,
    ) {
        for (mut avatar, mut transform, visibility) in avatars.iter_mut() {
            avatar.tick(time.delta_secs(), *input);
            transform.translation = avatar.position;
            transform.rotation = Quat::from_rotation_y(avatar.heading);

            if let Some(mut visibility) = visibility {
                let entered = time.elapsed() >= avatar.entry_delay;
                let next = if entered {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
                visibility.set_if_neq(next);
            }
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}
