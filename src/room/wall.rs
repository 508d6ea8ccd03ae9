//! Provides [`WallId`] and [`Wall`].

use std::{
    f32::consts::FRAC_PI_2,
    fmt,
    str::FromStr,
};

use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_transform::prelude::*;

use super::poster::{Poster, PosterId};
use crate::{camera::CameraPose, error::RoomError, geometry, room::RoomSettings};

/// Identifies one of the walls a room can be built with.
///
/// The variant carries everything that differs between walls as data: where the wall sits on the
/// room footprint, which way it faces, and where the camera frames it from. The drag plane and
/// bounds logic is written once, in the wall's local frame, and never branches on identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub enum WallId {
    /// The wall on the room's -Z edge, facing +Z.
    Back,
    /// The wall on the room's -X edge, facing +X.
    Left,
    /// The wall on the room's +X edge, facing -X.
    Right,
}

impl WallId {
    /// Every wall a room can contain.
    pub const ALL: [WallId; 3] = [WallId::Back, WallId::Left, WallId::Right];

    /// Stable lowercase name, also used to derive persistence keys.
    pub fn as_str(self) -> &'static str {
        match self {
            WallId::Back => "back",
            WallId::Left => "left",
            WallId::Right => "right",
        }
    }

    /// Rotation taking the wall's local frame (+X along the wall, +Z facing into the room) to world
    /// space.
    pub fn rotation(self) -> Quat {
        match self {
            WallId::Back => Quat::IDENTITY,
            WallId::Left => Quat::from_rotation_y(FRAC_PI_2),
            WallId::Right => Quat::from_rotation_y(-FRAC_PI_2),
        }
    }

    /// World space normal of the wall face that looks into the room.
    pub fn facing(self) -> Dir3 {
        match self {
            WallId::Back => Dir3::Z,
            WallId::Left => Dir3::X,
            WallId::Right => Dir3::NEG_X,
        }
    }

    /// World space direction of the wall's in-plane horizontal axis.
    pub fn horizontal(self) -> Dir3 {
        match self {
            WallId::Back => Dir3::X,
            WallId::Left => Dir3::NEG_Z,
            WallId::Right => Dir3::Z,
        }
    }

    /// Bottom center of the wall on the floor, for a square room of side `room_size`.
    pub fn anchor(self, room_size: f32) -> Vec3 {
        let half = room_size * 0.5;
        match self {
            WallId::Back => Vec3::new(0.0, 0.0, -half),
            WallId::Left => Vec3::new(-half, 0.0, 0.0),
            WallId::Right => Vec3::new(half, 0.0, 0.0),
        }
    }

    /// The fixed camera pose used to frame this wall in wall view.
    pub fn camera_pose(self) -> CameraPose {
        match self {
            WallId::Back => CameraPose::new(Vec3::new(0.0, 3.0, 1.0), Vec3::new(0.0, 3.0, -5.0)),
            WallId::Left => CameraPose::new(Vec3::new(1.0, 3.0, 0.0), Vec3::new(-5.0, 3.0, 0.0)),
            WallId::Right => CameraPose::new(Vec3::new(-1.0, 3.0, 0.0), Vec3::new(5.0, 3.0, 0.0)),
        }
    }
}

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WallId {
    type Err = RoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WallId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RoomError::WallNotFound(s.to_owned()))
    }
}

/// A wall of the room and the posters hanging on it.
#[derive(Debug, Clone)]
pub struct Wall {
    id: WallId,
    /// Extent along the wall.
    pub width: f32,
    /// Extent from the floor up.
    pub height: f32,
    /// Thickness along the facing normal.
    pub depth: f32,
    /// How far in front of the wall's center plane posters are placed.
    pub poster_standoff: f32,
    transform: Transform,
    posters: Vec<Poster>,
    edit_mode: bool,
    loaded: bool,
}

impl Wall {
    /// Build the wall `id` for a room described by `settings`.
    pub fn new(id: WallId, settings: &RoomSettings) -> Self {
        Self {
            id,
            width: settings.wall_width,
            height: settings.wall_height,
            depth: settings.wall_depth,
            poster_standoff: settings.poster_standoff,
            transform: Transform::from_translation(id.anchor(settings.size))
                .with_rotation(id.rotation()),
            posters: Vec::new(),
            edit_mode: false,
            loaded: false,
        }
    }

    /// This wall's identifier.
    pub fn id(&self) -> WallId {
        self.id
    }

    /// The wall's local frame: origin at the bottom center, +Z along the facing normal.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// The box the wall occupies, in its local frame, as `(center, size)`.
    pub fn local_box(&self) -> (Vec3, Vec3) {
        (
            Vec3::new(0.0, self.height * 0.5, 0.0),
            Vec3::new(self.width, self.height, self.depth),
        )
    }

    /// Posters in attachment order.
    pub fn posters(&self) -> &[Poster] {
        &self.posters
    }

    /// Look up an attached poster.
    pub fn poster(&self, poster: PosterId) -> Option<&Poster> {
        self.posters.iter().find(|p| p.id() == poster)
    }

    /// Is the wall being edited?
    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub(crate) fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
    }

    /// Has the persisted layout already been restored onto this wall?
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Clamp a local position so a poster of `size` lies fully on the wall face, in front of it.
    pub fn clamp_to_face(&self, size: Vec2, local: Vec3) -> Vec3 {
        let half_width = self.width * 0.5;
        let in_plane = geometry::clamp_rect_center(
            local.truncate(),
            size,
            Vec2::new(-half_width, 0.0),
            Vec2::new(half_width, self.height),
        );
        in_plane.extend(self.poster_standoff)
    }

    /// Intersect a world space ray with the drag plane: the infinite plane through the wall's local
    /// origin, perpendicular to its facing normal. The result is in the wall's local frame.
    pub fn drag_plane_hit(&self, ray: Ray3d) -> Option<Vec3> {
        let local_ray = geometry::ray_to_local(&self.transform, ray);
        geometry::intersect_plane(local_ray, Vec3::ZERO, Dir3::Z)
    }

    /// World space transform of an attached poster.
    pub fn poster_world_transform(&self, poster: &Poster) -> Transform {
        Transform::from_translation(geometry::local_to_world(&self.transform, poster.position()))
            .with_rotation(self.transform.rotation)
    }

    pub(crate) fn push_poster(&mut self, mut poster: Poster) -> PosterId {
        let clamped = self.clamp_to_face(poster.size(), poster.position());
        poster.attach(self.id, clamped);
        let id = poster.id();
        self.posters.push(poster);
        id
    }

    pub(crate) fn remove_poster(&mut self, poster: PosterId) -> Result<Poster, RoomError> {
        let index = self
            .posters
            .iter()
            .position(|p| p.id() == poster)
            .ok_or(RoomError::NotFound {
                wall: self.id,
                poster,
            })?;
        Ok(self.posters.remove(index))
    }

    pub(crate) fn clear_posters(&mut self) -> usize {
        let count = self.posters.len();
        self.posters.clear();
        count
    }

    pub(crate) fn move_poster(&mut self, poster: PosterId, local: Vec3) -> Result<Vec3, RoomError> {
        let id = self.id;
        let clamped = {
            let target = self
                .posters
                .iter()
                .find(|p| p.id() == poster)
                .ok_or(RoomError::NotFound { wall: id, poster })?;
            self.clamp_to_face(target.size(), local)
        };
        if let Some(target) = self.posters.iter_mut().find(|p| p.id() == poster) {
            target.set_position_unchecked(clamped);
        }
        Ok(clamped)
    }

    /// Nearest poster on this wall hit by a world space ray, with the hit distance.
    pub fn pick_poster(&self, ray: Ray3d) -> Option<(PosterId, f32)> {
        // Posters are picked as thin boxes straddling their plane.
        const PICK_THICKNESS: f32 = 0.02;
        self.posters
            .iter()
            .filter_map(|poster| {
                let size = poster.size().extend(PICK_THICKNESS);
                geometry::ray_hits_box(ray, &self.transform, poster.position(), size)
                    .map(|t| (poster.id(), t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
