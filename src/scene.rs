//! [`RoomPlugin`]: builds the room's entities and keeps them in sync with the [`Room`],
//! [`Avatar`], and [`CameraRig`] state.

use std::path::PathBuf;

use bevy_app::prelude::*;
use bevy_asset::{prelude::*, AssetLoadFailedEvent};
use bevy_color::prelude::*;
use bevy_derive::Deref;
use bevy_ecs::prelude::*;
use bevy_image::Image;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_pbr::{MeshMaterial3d, StandardMaterial};
use bevy_platform::collections::{HashMap, HashSet};
use bevy_reflect::prelude::*;
use bevy_render::{
    mesh::{Mesh, Mesh3d},
    prelude::*,
};
use bevy_transform::prelude::*;

use crate::{
    avatar::{Avatar, MovementInput},
    camera::{CameraMode, CameraPose, CameraRig, CameraView, OrbitControls, OrbitLimits},
    error::RoomError,
    interaction::{input, InteractionController, InteractionState, PointerSample, WallCommand},
    persistence::{FileStore, LayoutPersistence, MemoryStore},
    room::{PosterId, Room, RoomSettings, WallId},
};

/// Where the [`RoomPlugin`] persists poster layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LayoutStorage {
    /// Layouts live as long as the app.
    #[default]
    Memory,
    /// Layouts are JSON files in this directory.
    Directory(PathBuf),
}

/// Adds the room, the avatar, and the interaction systems to an app.
///
/// The app must also provide a window, input, and rendering (e.g. `DefaultPlugins`), and spawn a
/// `Camera3d` with a [`CameraRig`].
#[derive(Debug, Default)]
pub struct RoomPlugin {
    /// Room dimensions and which walls to build.
    pub settings: RoomSettings,
    /// Layout persistence backend.
    pub storage: LayoutStorage,
}

impl Plugin for RoomPlugin {
    fn build(&self, app: &mut App) {
        let persistence = match &self.storage {
            LayoutStorage::Memory => LayoutPersistence::new(MemoryStore::default()),
            LayoutStorage::Directory(dir) => LayoutPersistence::new(FileStore::new(dir.clone())),
        };

        app.insert_resource(Room::new(self.settings.clone()))
            .insert_resource(persistence)
            .init_resource::<InteractionController>()
            .init_resource::<MovementInput>()
            .init_resource::<PointerSample>()
            .add_event::<WallCommand>()
            .add_systems(Startup, spawn_room)
            .add_systems(
                Update,
                (
                    MovementInput::read_keys,
                    input::toggle_camera_view,
                    input::read_pointer,
                    input::handle_pointer,
                    input::apply_wall_commands,
                    Avatar::update_movement,
                    CameraRig::update_camera,
                    (sync_walls, sync_posters),
                )
                    .chain(),
            )
            .add_systems(PostUpdate, log_asset_failures)
            .register_type::<RoomSettings>()
            .register_type::<WallId>()
            .register_type::<PosterId>()
            .register_type::<Avatar>()
            .register_type::<MovementInput>()
            .register_type::<CameraRig>()
            .register_type::<CameraMode>()
            .register_type::<CameraPose>()
            .register_type::<CameraView>()
            .register_type::<OrbitControls>()
            .register_type::<OrbitLimits>()
            .register_type::<InteractionController>()
            .register_type::<InteractionState>()
            .register_type::<WallCommand>()
            .register_type::<WallMarker>()
            .register_type::<PosterMarker>();
    }
}

/// Marks the mesh entity of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deref, Component, Reflect)]
pub struct WallMarker(pub WallId);

/// Marks the mesh entity of a poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Component, Reflect)]
pub struct PosterMarker {
    /// The wall the poster hangs on.
    pub wall: WallId,
    /// The poster drawn by this entity.
    pub poster: PosterId,
}

/// Shared meshes and materials for the room's entities.
#[derive(Debug, Resource)]
pub struct SceneAssets {
    poster_mesh: Handle<Mesh>,
    wall: Handle<StandardMaterial>,
    wall_editing: Handle<StandardMaterial>,
    poster: Handle<StandardMaterial>,
    poster_editing: Handle<StandardMaterial>,
    textured: HashMap<String, Handle<StandardMaterial>>,
}

impl SceneAssets {
    fn new(meshes: &mut Assets<Mesh>, materials: &mut Assets<StandardMaterial>) -> Self {
        Self {
            poster_mesh: meshes.add(Rectangle::new(1.0, 1.0)),
            wall: materials.add(Color::srgb(0.82, 0.80, 0.76)),
            wall_editing: materials.add(Color::srgb(0.92, 0.88, 0.70)),
            poster: materials.add(Color::srgb(0.30, 0.45, 0.80)),
            poster_editing: materials.add(Color::srgb(0.35, 0.60, 0.95)),
            textured: HashMap::default(),
        }
    }

    fn wall_material(&self, editing: bool) -> &Handle<StandardMaterial> {
        if editing {
            &self.wall_editing
        } else {
            &self.wall
        }
    }

    fn poster_material(
        &mut self,
        texture: Option<&str>,
        editing: bool,
        asset_server: &AssetServer,
        materials: &mut Assets<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        let Some(path) = texture else {
            return if editing {
                self.poster_editing.clone()
            } else {
                self.poster.clone()
            };
        };
        self.textured
            .entry(path.to_owned())
            .or_insert_with(|| {
                let image: Handle<Image> = asset_server.load(path.to_owned());
                materials.add(StandardMaterial {
                    base_color_texture: Some(image),
                    unlit: true,
                    ..Default::default()
                })
            })
            .clone()
    }
}

fn spawn_room(
    mut commands: Commands,
    room: Res<Room>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let settings = room.settings();
    let scene = SceneAssets::new(&mut meshes, &mut materials);

    commands.spawn((
        Name::new("Floor"),
        Mesh3d(meshes.add(Cuboid::new(settings.size, 0.2, settings.size))),
        MeshMaterial3d(materials.add(Color::srgb(0.45, 0.42, 0.38))),
        Transform::from_xyz(0.0, -0.1, 0.0),
    ));

    for wall in room.walls() {
        let (center, size) = wall.local_box();
        let transform = wall
            .transform()
            .mul_transform(Transform::from_translation(center));
        commands.spawn((
            Name::new(format!("{} wall", wall.id())),
            WallMarker(wall.id()),
            Mesh3d(meshes.add(Cuboid::from_size(size))),
            MeshMaterial3d(scene.wall_material(wall.edit_mode()).clone()),
            transform,
        ));
    }

    let avatar = Avatar::new(settings.walk_half_extent());
    let body = meshes.add(Capsule3d::new(0.25, 0.8));
    let nose = meshes.add(Cuboid::new(0.12, 0.12, 0.2));
    let avatar_material = materials.add(Color::srgb(0.85, 0.35, 0.25));
    commands
        .spawn((
            Name::new("Avatar"),
            Transform::from_translation(avatar.position)
                .with_rotation(Quat::from_rotation_y(avatar.heading)),
            Visibility::Hidden,
            avatar,
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(body),
                MeshMaterial3d(avatar_material.clone()),
                Transform::from_xyz(0.0, 0.65, 0.0),
            ));
            parent.spawn((
                Mesh3d(nose),
                MeshMaterial3d(avatar_material),
                Transform::from_xyz(0.0, 1.0, 0.3),
            ));
        });

    debug!("Spawned a room with {} walls", room.walls().count());
    commands.insert_resource(scene);
}

fn sync_walls(
    room: Res<Room>,
    scene: Res<SceneAssets>,
    mut walls: Query<(&WallMarker, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    for (marker, mut material) in walls.iter_mut() {
        let Some(wall) = room.wall(**marker) else {
            continue;
        };
        let wanted = scene.wall_material(wall.edit_mode());
        if material.0 != *wanted {
            material.0 = wanted.clone();
        }
    }
}

fn sync_posters(
    mut commands: Commands,
    room: Res<Room>,
    asset_server: Res<AssetServer>,
    mut scene: ResMut<SceneAssets>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut posters: Query<(
        Entity,
        &PosterMarker,
        &mut Transform,
        &mut MeshMaterial3d<StandardMaterial>,
    )>,
) {
    let mut drawn: HashSet<PosterId> = HashSet::default();
    for (entity, marker, mut transform, mut material) in posters.iter_mut() {
        let found = room
            .wall(marker.wall)
            .and_then(|wall| wall.poster(marker.poster).map(|poster| (wall, poster)));
        let Some((wall, poster)) = found else {
            commands.entity(entity).despawn();
            continue;
        };
        drawn.insert(marker.poster);

        let next = wall
            .poster_world_transform(poster)
            .with_scale(poster.size().extend(1.0));
        if *transform != next {
            *transform = next;
        }
        let wanted = scene.poster_material(
            poster.texture(),
            wall.edit_mode(),
            &asset_server,
            &mut materials,
        );
        if material.0 != wanted {
            material.0 = wanted;
        }
    }

    for wall in room.walls() {
        for poster in wall.posters().iter().filter(|p| !drawn.contains(&p.id())) {
            let material = scene.poster_material(
                poster.texture(),
                wall.edit_mode(),
                &asset_server,
                &mut materials,
            );
            commands.spawn((
                Name::new(format!("Poster {}", poster.id().0)),
                PosterMarker {
                    wall: wall.id(),
                    poster: poster.id(),
                },
                Mesh3d(scene.poster_mesh.clone()),
                MeshMaterial3d(material),
                wall.poster_world_transform(poster)
                    .with_scale(poster.size().extend(1.0)),
            ));
        }
    }
}

fn asset_failure(failure: &AssetLoadFailedEvent<Image>) -> RoomError {
    RoomError::AssetLoadFailure {
        path: failure.path.to_string(),
        reason: failure.error.to_string(),
    }
}

fn log_asset_failures(mut failures: EventReader<AssetLoadFailedEvent<Image>>) {
    for failure in failures.read() {
        warn!("{}, the poster is drawn untextured", asset_failure(failure));
    }
}
