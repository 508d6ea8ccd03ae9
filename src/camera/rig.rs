//! The primary camera [`Component`], [`CameraRig`].

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_input::{
    mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit},
    prelude::*,
};
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_time::{prelude::*, Real};
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

use super::{
    orbit::{CameraView, OrbitControls},
    transition::{PoseTransition, TransitionSettings},
    CameraPose,
};
use crate::{avatar::Avatar, room::WallId};

/// Which behavior currently drives the camera. Exactly one is active at a time.
#[derive(Debug, Clone, PartialEq, Default, Reflect)]
pub enum CameraMode {
    /// The target chases the avatar and the orbit controls place the camera around it.
    #[default]
    Follow,
    /// The camera is pinned to a wall's framing.
    Fixed(WallId),
    /// The camera is animating toward a new pose.
    Transitioning(PoseTransition),
}

/// How the follow target chases the avatar.
#[derive(Debug, Clone, Reflect)]
pub struct FollowSettings {
    /// Height of the look-at point above the avatar's feet.
    pub height_offset: f32,
    /// Fraction of the remaining distance covered each tick, in `(0, 1]`.
    pub smoothness: f32,
}

impl Default for FollowSettings {
    fn default() -> Self {
        Self {
            height_offset: 1.5,
            smoothness: 0.1,
        }
    }
}

/// Tracks all state of a room camera: its current mode and pose, the follow target, and the
/// orbit controls used while roaming.
///
/// Add this next to a `Camera3d`. [`CameraRig::update_camera`] writes the camera's [`Transform`]
/// from the rig every frame; the [`InteractionController`](crate::interaction::InteractionController)
/// switches modes as walls are selected and released.
#[derive(Debug, Clone, Reflect, Component)]
pub struct CameraRig {
    /// Follow target smoothing.
    pub follow: FollowSettings,
    /// Cinematic hand-off into wall view.
    pub transition: TransitionSettings,
    /// User orbit around the follow target.
    pub orbit: OrbitControls,
    view: CameraView,
    mode: CameraMode,
    pose: CameraPose,
    follow_target: Vec3,
    controls_enabled: bool,
}

impl Default for CameraRig {
    fn default() -> Self {
        let follow = FollowSettings::default();
        let follow_target = Vec3::Y * follow.height_offset;
        let orbit = OrbitControls::default();
        let pose = CameraPose::new(orbit.position_around(follow_target), follow_target);
        Self {
            follow,
            transition: Default::default(),
            orbit,
            view: Default::default(),
            mode: Default::default(),
            pose,
            follow_target,
            controls_enabled: true,
        }
    }
}

impl CameraRig {
    /// Set the transition settings of the rig.
    pub fn with_transition(self, transition: TransitionSettings) -> Self {
        Self { transition, ..self }
    }

    /// The active mode.
    pub fn mode(&self) -> &CameraMode {
        &self.mode
    }

    /// The pose written to the camera on the last tick.
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// The smoothed point the follow camera looks at.
    pub fn follow_target(&self) -> Vec3 {
        self.follow_target
    }

    /// The active follow view preset.
    pub fn view(&self) -> CameraView {
        self.view
    }

    /// Are the user orbit controls accepting input?
    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    /// Enable or disable the user orbit controls.
    pub fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    /// Switch between the follow and overview presets. This only reconfigures the orbit limits, the
    /// pose is not animated.
    pub fn toggle_view(&mut self) -> CameraView {
        self.view = self.view.toggled();
        self.orbit.set_limits(self.view.limits());
        debug!("Camera view is now {:?}", self.view);
        self.view
    }

    /// Move the follow target one smoothing step toward the avatar.
    pub fn update_follow_target(&mut self, avatar_position: Vec3) {
        let goal = avatar_position + Vec3::Y * self.follow.height_offset;
        self.follow_target = self.follow_target.lerp(goal, self.follow.smoothness);
    }

    /// Frame `wall`. From the follow camera this animates when transitions are enabled, otherwise
    /// it snaps.
    pub fn focus_wall(&mut self, wall: WallId, now: Duration) {
        let end = wall.camera_pose();
        match self.mode {
            CameraMode::Follow if self.transition.enabled => {
                self.mode = CameraMode::Transitioning(PoseTransition::new(
                    self.pose,
                    end,
                    now,
                    self.transition.duration,
                    wall,
                ));
            }
            _ => {
                self.mode = CameraMode::Fixed(wall);
                self.pose = end;
            }
        }
    }

    /// Instantly return to the follow camera with its default placement behind the avatar.
    pub fn return_to_follow(&mut self, avatar_position: Vec3) {
        self.mode = CameraMode::Follow;
        self.follow_target = avatar_position + Vec3::Y * self.follow.height_offset;
        self.orbit.reset();
        self.pose = CameraPose::new(
            self.orbit.position_around(self.follow_target),
            self.follow_target,
        );
    }

    /// Advance the rig to time `now`. Returns the framed wall when a transition completes on this
    /// tick; this happens exactly once per transition.
    pub fn tick(&mut self, now: Duration, avatar_position: Vec3) -> Option<WallId> {
        match self.mode.clone() {
            CameraMode::Follow => {
                self.update_follow_target(avatar_position);
                self.pose = CameraPose::new(
                    self.orbit.position_around(self.follow_target),
                    self.follow_target,
                );
                None
            }
            CameraMode::Fixed(wall) => {
                self.pose = wall.camera_pose();
                None
            }
            CameraMode::Transitioning(transition) => {
                let (pose, done) = transition.sample(now);
                self.pose = pose;
                if !done {
                    return None;
                }
                let wall = transition.destination();
                self.mode = CameraMode::Fixed(wall);
                Some(wall)
            }
        }
    }

    /// Read orbit input, advance every rig, and write camera transforms. Called once per frame.
    pub fn update_camera(
        mut cameras: Query<(&mut CameraRig, &mut Transform)>,
        avatars: Query<&Avatar>,
        mouse_buttons: Res<ButtonInput<MouseButton>>,
        motion: Res<AccumulatedMouseMotion>,
        scroll: Res<AccumulatedMouseScroll>,
        time: Res<Time<Real>>,
        mut redraw: EventWriter<RequestRedraw>,
    ) {
        let avatar_position = avatars
            .iter()
            .next()
            .map(|avatar| avatar.position)
            .unwrap_or_default();
        let scroll_lines = match scroll.unit {
            MouseScrollUnit::Line => scroll.delta.y,
            MouseScrollUnit::Pixel => scroll.delta.y / 100.0,
        };
        let now = time.elapsed();

        for (mut rig, mut transform) in cameras.iter_mut() {
            if rig.controls_enabled && rig.mode == CameraMode::Follow {
                let rotating = mouse_buttons.pressed(MouseButton::Right);
                rig.orbit.apply_input(motion.delta, rotating, scroll_lines);
            }

            let transitioning = matches!(rig.mode, CameraMode::Transitioning(_));
            if let Some(wall) = rig.tick(now, avatar_position) {
                info!("Camera transition finished, now framing the {wall} wall");
            }
            if transitioning {
                redraw.write(RequestRedraw);
            }

            let next = rig.pose.to_transform();
            if *transform != next {
                *transform = next;
            }
        }
    }
}
