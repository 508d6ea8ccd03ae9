//! Provides [`Poster`], a textured rectangle hanging on a wall.

use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use super::WallId;
use crate::error::RoomError;

/// Registry-assigned handle to a poster. Drag sessions and UI commands hold this instead of a
/// reference, so a removed poster simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct PosterId(pub u64);

/// A positioned, sized, optionally textured rectangle on a wall.
///
/// The position is in the owning wall's local frame: `x` along the wall measured from its center,
/// `y` up from the floor, and `z` the standoff in front of the wall's center plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Poster {
    id: PosterId,
    wall: WallId,
    width: f32,
    height: f32,
    position: Vec3,
    texture: Option<String>,
}

impl Poster {
    /// Width and height of the poster created by the "add poster" command.
    pub const DEFAULT_SIZE: Vec2 = Vec2::new(1.0, 1.5);
    /// Height of the center of the poster created by the "add poster" command.
    pub const DEFAULT_HEIGHT: f32 = 2.0;

    /// Validate and build a poster destined for `wall`. The position must be finite; it is clamped
    /// onto the wall face when the poster is attached.
    pub fn create_placement(
        width: f32,
        height: f32,
        initial_position: Vec3,
        wall: WallId,
    ) -> Result<Self, RoomError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(RoomError::InvalidDimension { width, height });
        }
        if !initial_position.is_finite() {
            return Err(RoomError::InvalidPosition(initial_position));
        }
        Ok(Self {
            id: PosterId(0),
            wall,
            width,
            height,
            position: initial_position,
            texture: None,
        })
    }

    /// Attach a texture asset path to this poster.
    #[must_use = "with_texture returns a modified Poster"]
    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture = Some(path.into());
        self
    }

    /// The poster's handle. Only meaningful once attached to a room.
    pub fn id(&self) -> PosterId {
        self.id
    }

    /// The wall this poster belongs to.
    pub fn wall(&self) -> WallId {
        self.wall
    }

    /// Width along the wall.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Height up the wall.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// `(width, height)`.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Position in the owning wall's local frame.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Texture asset path, if any.
    pub fn texture(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    pub(crate) fn assign_id(&mut self, id: PosterId) {
        self.id = id;
    }

    pub(crate) fn attach(&mut self, wall: WallId, position: Vec3) {
        self.wall = wall;
        self.position = position;
    }

    /// Callers must have clamped `position` with [`Wall::clamp_to_face`](super::Wall::clamp_to_face).
    pub(crate) fn set_position_unchecked(&mut self, position: Vec3) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_dimensions() {
        for (w, h) in [(0.0, 1.0), (1.0, -1.0), (f32::NAN, 1.0), (1.0, f32::INFINITY)] {
            let result = Poster::create_placement(w, h, Vec3::ZERO, WallId::Back);
            assert!(
                matches!(result, Err(RoomError::InvalidDimension { .. })),
                "{w} x {h} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_finite_position() {
        for position in [
            Vec3::new(f32::NAN, 3.0, 0.0),
            Vec3::new(0.0, f32::INFINITY, 0.0),
            Vec3::new(0.0, 3.0, f32::NEG_INFINITY),
        ] {
            let result = Poster::create_placement(1.0, 1.5, position, WallId::Back);
            assert!(
                matches!(result, Err(RoomError::InvalidPosition(_))),
                "{position} should be rejected"
            );
        }
    }

    #[test]
    fn keeps_requested_values() {
        let poster = Poster::create_placement(1.0, 1.5, Vec3::new(0.0, 3.0, 0.25), WallId::Right)
            .unwrap()
            .with_texture("posters/sunset.png");
        assert_eq!(poster.size(), Vec2::new(1.0, 1.5));
        assert_eq!(poster.position(), Vec3::new(0.0, 3.0, 0.25));
        assert_eq!(poster.wall(), WallId::Right);
        assert_eq!(poster.texture(), Some("posters/sunset.png"));
    }
}
