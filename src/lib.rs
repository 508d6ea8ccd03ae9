//! A walkable 3D room whose walls can be decorated with posters.
//!
//! The user steers an avatar around the room with the keyboard while a third-person camera
//! follows. Clicking a wall animates the camera to a fixed framing of that wall; from there the
//! wall can be edited: posters are added, removed, and dragged across the wall face, always
//! staying fully on the wall. Each wall's layout is saved to, and restored from, a pluggable
//! [`LayoutStore`](persistence::LayoutStore).
//!
//! ## Getting started
//!
//! Add the [`DefaultRoomPlugins`] to your app next to `DefaultPlugins`, and spawn a camera with a
//! [`CameraRig`](camera::CameraRig):
//!
//! ```no_run
//! use bevy::prelude::*;
//! use bevy_poster_room::prelude::*;
//!
//! App::new()
//!     .add_plugins((DefaultPlugins, DefaultRoomPlugins))
//!     .add_systems(Startup, |mut commands: Commands| {
//!         commands.spawn((Camera3d::default(), CameraRig::default()));
//!     })
//!     .run();
//! ```
//!
//! UI elements drive editing by sending [`WallCommand`](interaction::WallCommand) events.
//!
//! ## Structure
//!
//! The state lives in plain structs that do not need an `App`: [`room::Room`],
//! [`avatar::Avatar`], [`camera::CameraRig`], [`interaction::InteractionController`], and
//! [`persistence::LayoutPersistence`]. The systems added by [`scene::RoomPlugin`] feed input into
//! them and mirror the result onto entities once per frame.

#![warn(missing_docs)]

pub mod avatar;
pub mod camera;
pub mod error;
pub mod extensions;
pub mod geometry;
pub mod interaction;
pub mod persistence;
pub mod room;
pub mod scene;

use bevy_app::{PluginGroup, PluginGroupBuilder};

/// Common imports.
pub mod prelude {
    pub use crate::{
        avatar::{Avatar, MovementInput},
        camera::{CameraMode, CameraPose, CameraRig, CameraView, TransitionSettings},
        error::RoomError,
        interaction::{InteractionController, InteractionState, WallCommand},
        persistence::{FileStore, LayoutPersistence, LayoutStore, MemoryStore},
        room::{Poster, PosterId, Room, RoomSettings, Wall, WallId},
        scene::{LayoutStorage, RoomPlugin},
        DefaultRoomPlugins,
    };
}

/// Adds the [`scene::RoomPlugin`] with default settings, and any enabled extensions.
pub struct DefaultRoomPlugins;

impl PluginGroup for DefaultRoomPlugins {
    fn build(self) -> PluginGroupBuilder {
        let group = PluginGroupBuilder::start::<Self>().add(scene::RoomPlugin::default());

        #[cfg(feature = "extension_edit_bounds")]
        let group = group.add(extensions::edit_bounds::EditBoundsPlugin);

        group
    }
}
