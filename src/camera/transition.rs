//! Smoothly animates the camera from one pose to another over a fixed duration.
//!
//! Progress is always recomputed from the elapsed time, never accumulated from frame deltas, so a
//! transition lands exactly on its end pose no matter how irregular the frame rate is.

use std::time::Duration;

use bevy_reflect::prelude::*;

use super::CameraPose;
use crate::room::WallId;

/// Symmetric quadratic ease-in-out on `[0, 1]`.
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Settings for the cinematic hand-off into wall view.
#[derive(Debug, Clone, Reflect)]
pub struct TransitionSettings {
    /// When false, selecting a wall snaps the camera instead of animating it.
    pub enabled: bool,
    /// The duration of the transition animation.
    pub duration: Duration,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: Duration::from_millis(1000),
        }
    }
}

/// An in-flight transition between two camera poses.
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct PoseTransition {
    from: CameraPose,
    to: CameraPose,
    start: Duration,
    duration: Duration,
    destination: WallId,
}

impl PoseTransition {
    /// Start animating from `from` to `to` at time `start`. Once finished, the rig holds the
    /// fixed framing of `destination`.
    pub fn new(
        from: CameraPose,
        to: CameraPose,
        start: Duration,
        duration: Duration,
        destination: WallId,
    ) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            destination,
        }
    }

    /// The wall the rig frames when the transition completes.
    pub fn destination(&self) -> WallId {
        self.destination
    }

    /// Linear progress through the transition at time `now`, not clamped.
    pub fn progress(&self, now: Duration) -> f32 {
        let elapsed = now.saturating_sub(self.start).as_secs_f32();
        let duration = self.duration.as_secs_f32();
        if duration <= 0.0 {
            return 1.0;
        }
        elapsed / duration
    }

    /// The pose at time `now`, and whether the transition has finished. A finished transition
    /// returns its end pose exactly.
    pub fn sample(&self, now: Duration) -> (CameraPose, bool) {
        let t = self.progress(now);
        if t >= 1.0 {
            return (self.to, true);
        }
        if t <= 0.0 {
            return (self.from, false);
        }
        let eased = ease_in_out(t);
        (self.from.lerp(&self.to, eased), false)
    }
}
