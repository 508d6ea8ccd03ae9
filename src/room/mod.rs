//! The room: a registry of [`Wall`]s and the [`Poster`]s attached to them.

mod poster;
mod wall;

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

pub use poster::{Poster, PosterId};
pub use wall::{Wall, WallId};

use crate::error::RoomError;

/// Dimensions and layout of the room. Read once, when the [`Room`] is built.
#[derive(Debug, Clone, Reflect)]
pub struct RoomSettings {
    /// Side length of the square floor.
    pub size: f32,
    /// How far the avatar must stay from the floor's edge.
    pub walk_margin: f32,
    /// Width of each wall.
    pub wall_width: f32,
    /// Height of each wall.
    pub wall_height: f32,
    /// Thickness of each wall.
    pub wall_depth: f32,
    /// Offset of posters in front of the wall's center plane. Larger than half the wall depth so
    /// posters never share a plane with the wall face.
    pub poster_standoff: f32,
    /// Which walls the room is built with.
    pub walls: Vec<WallId>,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            size: 10.0,
            walk_margin: 0.5,
            wall_width: 8.0,
            wall_height: 6.0,
            wall_depth: 0.4,
            poster_standoff: 0.25,
            walls: vec![WallId::Back, WallId::Right],
        }
    }
}

impl RoomSettings {
    /// Largest absolute x or z the avatar may reach.
    pub fn walk_half_extent(&self) -> f32 {
        (self.size * 0.5 - self.walk_margin).max(0.0)
    }
}

/// Owns every wall of the room, created once when the room is built.
#[derive(Debug, Clone, Resource)]
pub struct Room {
    settings: RoomSettings,
    walls: BTreeMap<WallId, Wall>,
    next_poster: u64,
}

impl Default for Room {
    fn default() -> Self {
        Self::new(RoomSettings::default())
    }
}

impl Room {
    /// Build the room and all of its walls.
    pub fn new(settings: RoomSettings) -> Self {
        let walls = settings
            .walls
            .iter()
            .map(|&id| (id, Wall::new(id, &settings)))
            .collect();
        Self {
            settings,
            walls,
            next_poster: 1,
        }
    }

    /// The settings the room was built with.
    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    /// Look up a wall.
    pub fn wall(&self, id: WallId) -> Option<&Wall> {
        self.walls.get(&id)
    }

    /// Look up a wall, failing with [`RoomError::WallNotFound`].
    pub fn try_wall(&self, id: WallId) -> Result<&Wall, RoomError> {
        self.walls
            .get(&id)
            .ok_or_else(|| RoomError::WallNotFound(id.to_string()))
    }

    fn try_wall_mut(&mut self, id: WallId) -> Result<&mut Wall, RoomError> {
        self.walls
            .get_mut(&id)
            .ok_or_else(|| RoomError::WallNotFound(id.to_string()))
    }

    /// All walls, in a stable order.
    pub fn walls(&self) -> impl Iterator<Item = &Wall> {
        self.walls.values()
    }

    /// Find a poster anywhere in the room.
    pub fn poster(&self, poster: PosterId) -> Option<&Poster> {
        self.walls.values().find_map(|wall| wall.poster(poster))
    }

    /// Attach a poster to a wall. The poster receives a fresh [`PosterId`] and its position is
    /// clamped onto the wall face.
    pub fn add_poster(&mut self, wall: WallId, mut poster: Poster) -> Result<PosterId, RoomError> {
        let id = PosterId(self.next_poster);
        let target = self.try_wall_mut(wall)?;
        poster.assign_id(id);
        target.push_poster(poster);
        self.next_poster += 1;
        debug!("Attached poster {id:?} to the {wall} wall");
        Ok(id)
    }

    /// Detach a poster from a wall.
    pub fn remove_poster(&mut self, wall: WallId, poster: PosterId) -> Result<Poster, RoomError> {
        self.try_wall_mut(wall)?.remove_poster(poster)
    }

    /// Detach every poster from a wall, returning how many were removed.
    pub fn clear_posters(&mut self, wall: WallId) -> Result<usize, RoomError> {
        Ok(self.try_wall_mut(wall)?.clear_posters())
    }

    /// Move a poster to `local` (in its wall's frame), clamped so it stays fully on the wall face
    /// and in front of it. Returns the position actually applied.
    pub fn move_poster(
        &mut self,
        wall: WallId,
        poster: PosterId,
        local: Vec3,
    ) -> Result<Vec3, RoomError> {
        self.try_wall_mut(wall)?.move_poster(poster, local)
    }

    /// Toggle a wall's edit mode. Unknown walls are logged and ignored.
    pub fn set_edit_mode(&mut self, wall: WallId, enabled: bool) {
        match self.try_wall_mut(wall) {
            Ok(target) => target.set_edit_mode(enabled),
            Err(e) => warn!("Cannot change edit mode: {e}"),
        }
    }

    pub(crate) fn mark_loaded(&mut self, wall: WallId) -> Result<(), RoomError> {
        self.try_wall_mut(wall)?.mark_loaded();
        Ok(())
    }

    /// The nearest wall hit by a world space ray.
    pub fn pick_wall(&self, ray: Ray3d) -> Option<WallId> {
        self.walls
            .values()
            .filter_map(|wall| {
                let (center, size) = wall.local_box();
                crate::geometry::ray_hits_box(ray, wall.transform(), center, size)
                    .map(|t| (wall.id(), t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// The nearest poster on `wall` hit by a world space ray.
    pub fn pick_poster(&self, wall: WallId, ray: Ray3d) -> Option<PosterId> {
        self.wall(wall)?.pick_poster(ray).map(|(id, _)| id)
    }
}
