//! A `bevy_poster_room` extension that outlines the face of every wall in edit mode, and the poster
//! being dragged, so users can see where posters are allowed to go.

use bevy_app::prelude::*;
use bevy_color::prelude::*;
use bevy_ecs::prelude::*;
use bevy_gizmos::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use crate::{
    geometry,
    interaction::{InteractionController, InteractionState},
    room::{Room, Wall},
};

/// See the [module](self) docs.
pub struct EditBoundsPlugin;

impl Plugin for EditBoundsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EditBounds>()
            .add_systems(PostUpdate, draw_edit_bounds)
            .register_type::<EditBounds>();
    }
}

/// Optional. Configures the edit bounds outlines.
#[derive(Debug, Resource, Reflect)]
pub struct EditBounds {
    /// Should the outlines be drawn?
    pub enabled: bool,
    /// Outline of the usable wall face.
    pub face_color: Color,
    /// Outline of the poster being dragged.
    pub drag_color: Color,
}

impl Default for EditBounds {
    fn default() -> Self {
        Self {
            enabled: true,
            face_color: Color::srgb(1.0, 0.85, 0.2),
            drag_color: Color::WHITE,
        }
    }
}

/// Corners of the local rectangle centered on `center` with `size`, lifted onto the poster plane
/// and moved into world space.
fn outline(wall: &Wall, center: Vec2, size: Vec2) -> [Vec3; 4] {
    let half = size * 0.5;
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|corner| {
        let local = (center + corner).extend(wall.poster_standoff);
        geometry::local_to_world(wall.transform(), local)
    })
}

fn draw_rect(gizmos: &mut Gizmos, corners: [Vec3; 4], color: Color) {
    for i in 0..4 {
        gizmos.line(corners[i], corners[(i + 1) % 4], color);
    }
}

/// Use gizmos to draw the editable face of each wall in edit mode.
pub fn draw_edit_bounds(
    settings: Res<EditBounds>,
    room: Res<Room>,
    controller: Res<InteractionController>,
    mut gizmos: Gizmos,
) {
    if !settings.enabled {
        return;
    }
    for wall in room.walls().filter(|wall| wall.edit_mode()) {
        let face = Vec2::new(wall.width, wall.height);
        draw_rect(
            &mut gizmos,
            outline(wall, Vec2::new(0.0, wall.height * 0.5), face),
            settings.face_color,
        );
    }

    let InteractionState::Dragging { wall, session } = controller.state() else {
        return;
    };
    let Some(wall) = room.wall(wall) else {
        return;
    };
    if let Some(poster) = wall.poster(session.poster) {
        // Slightly larger than the poster so the outline is not hidden by it.
        let size = poster.size() + Vec2::splat(0.05);
        draw_rect(
            &mut gizmos,
            outline(wall, poster.position().truncate(), size),
            settings.drag_color,
        );
    }
}
