//! Bevy systems that read the keyboard, the pointer, and [`WallCommand`]s, and forward them to
//! the [`InteractionController`].

use bevy_ecs::prelude::*;
use bevy_input::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;
use bevy_render::camera::Camera;
use bevy_time::{prelude::*, Real};
use bevy_transform::prelude::*;
use bevy_window::{PrimaryWindow, Window};

use super::{InteractionContext, InteractionController};
use crate::{
    avatar::Avatar,
    camera::CameraRig,
    persistence::LayoutPersistence,
    room::{PosterId, Room, WallId},
};

/// Commands issued by the UI around the room. Each is only honored in the states where the
/// matching [`InteractionController`] method is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Event, Reflect)]
pub enum WallCommand {
    /// Select a wall without pointing at it.
    Select(WallId),
    /// Enter edit mode on the selected wall.
    StartEdit,
    /// Hang a default poster on the wall being edited.
    AddPoster,
    /// Take a poster off the wall being edited.
    RemovePoster(PosterId),
    /// Persist the layout and leave edit mode.
    Save,
    /// Revert to the persisted layout and leave edit mode.
    Cancel,
    /// Remove every poster from the focused wall and forget its layout.
    Clear,
    /// Return to free roam.
    BackToRoom,
}

/// What a camera saw at one instant: enough to turn a cursor position into a world space ray
/// without the camera itself.
///
/// [`handle_pointer`] keeps the snapshot taken when a drag starts and builds rays from it until
/// the drag ends, so a resize or camera update mid-drag cannot shift the drag plane mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSnapshot {
    world_from_ndc: Mat4,
    viewport: Rect,
    window_size: Vec2,
}

impl ViewSnapshot {
    /// A view through a camera with projection `clip_from_view`, placed at `camera_transform`,
    /// drawing into `viewport` (logical pixels) of a window `window_size` large.
    pub fn new(
        clip_from_view: Mat4,
        camera_transform: &GlobalTransform,
        viewport: Rect,
        window_size: Vec2,
    ) -> Self {
        Self {
            world_from_ndc: camera_transform.compute_matrix() * clip_from_view.inverse(),
            viewport,
            window_size,
        }
    }

    /// Snapshot a camera. `None` until the renderer has sized its viewport.
    pub fn from_camera(
        camera: &Camera,
        camera_transform: &GlobalTransform,
        window_size: Vec2,
    ) -> Option<Self> {
        let viewport = camera.logical_viewport_rect()?;
        Some(Self::new(
            camera.clip_from_view(),
            camera_transform,
            viewport,
            window_size,
        ))
    }

    /// The ray under `cursor`, given in logical pixels of a window that is now `window_size`
    /// large. The cursor is rescaled to the window size at snapshot time first.
    pub fn ray(&self, cursor: Vec2, window_size: Vec2) -> Option<Ray3d> {
        let scale = if window_size.cmpgt(Vec2::ZERO).all() {
            self.window_size / window_size
        } else {
            Vec2::ONE
        };
        let size = self.viewport.size();
        if !size.cmpgt(Vec2::ZERO).all() {
            return None;
        }
        let mut ndc = (cursor * scale - self.viewport.min) / size * 2.0 - Vec2::ONE;
        ndc.y = -ndc.y;
        // Reversed z: the near plane is at depth 1.
        let near = self.world_from_ndc.project_point3(ndc.extend(1.0));
        let far = self.world_from_ndc.project_point3(ndc.extend(f32::EPSILON));
        if !near.is_finite() {
            return None;
        }
        Dir3::new(far - near)
            .ok()
            .map(|direction| Ray3d::new(near, direction))
    }
}

/// The primary mouse button and the cursor as seen through the rig's camera this frame.
///
/// Written by [`read_pointer`] and consumed by [`handle_pointer`].
#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct PointerSample {
    /// The primary button went down this frame.
    pub just_pressed: bool,
    /// The primary button is held.
    pub pressed: bool,
    /// Cursor position in logical pixels, if it is over the window.
    pub cursor: Option<Vec2>,
    /// Logical size of the primary window.
    pub window_size: Vec2,
    /// The camera's current view, if it has one.
    pub view: Option<ViewSnapshot>,
}

impl PointerSample {
    fn ray(&self) -> Option<Ray3d> {
        let view = self.view.as_ref()?;
        view.ray(self.cursor?, self.window_size)
    }
}

fn avatar_position(avatars: &Query<&Avatar>) -> Vec3 {
    avatars
        .iter()
        .next()
        .map(|avatar| avatar.position)
        .unwrap_or_default()
}

/// Toggle the follow camera between its presets with `V`. Only while roaming.
pub fn toggle_camera_view(
    keys: Res<ButtonInput<KeyCode>>,
    controller: Res<InteractionController>,
    mut rigs: Query<&mut CameraRig>,
) {
    if !keys.just_pressed(KeyCode::KeyV) || !controller.free_roam_enabled() {
        return;
    }
    for mut rig in rigs.iter_mut() {
        rig.toggle_view();
    }
}

/// Sample the primary mouse button, the primary window's cursor, and the rig's camera.
pub fn read_pointer(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<CameraRig>>,
    mut sample: ResMut<PointerSample>,
) {
    let window = windows.single().ok();
    let window_size = window.map(Window::size).unwrap_or_default();
    let view = cameras
        .single()
        .ok()
        .and_then(|(camera, transform)| ViewSnapshot::from_camera(camera, transform, window_size));
    sample.set_if_neq(PointerSample {
        just_pressed: mouse_buttons.just_pressed(MouseButton::Left),
        pressed: mouse_buttons.pressed(MouseButton::Left),
        cursor: window.and_then(Window::cursor_position),
        window_size,
        view,
    });
}

/// Route the primary mouse button to wall selection and poster dragging.
pub fn handle_pointer(
    pointer: Res<PointerSample>,
    mut rigs: Query<&mut CameraRig>,
    avatars: Query<&Avatar>,
    time: Res<Time<Real>>,
    persistence: Res<LayoutPersistence>,
    mut room: ResMut<Room>,
    mut controller: ResMut<InteractionController>,
    mut frozen: Local<Option<ViewSnapshot>>,
) {
    if !pointer.pressed && !controller.is_dragging() {
        return;
    }
    let Ok(mut rig) = rigs.single_mut() else {
        return;
    };
    let mut ctx = InteractionContext {
        room: &mut room,
        rig: &mut rig,
        persistence: &persistence,
        now: time.elapsed(),
        avatar_position: avatar_position(&avatars),
    };

    if pointer.just_pressed {
        if let Some(ray) = pointer.ray() {
            controller.pointer_pressed(&mut ctx, ray);
            if controller.is_dragging() {
                *frozen = pointer.view;
            }
        }
    }

    if controller.is_dragging() {
        if pointer.pressed {
            let ray = frozen
                .as_ref()
                .zip(pointer.cursor)
                .and_then(|(view, cursor)| view.ray(cursor, pointer.window_size));
            if let Some(ray) = ray {
                controller.pointer_move(&mut ctx, ray);
            }
        } else {
            controller.pointer_up(&mut ctx);
        }
    }

    if !controller.is_dragging() {
        *frozen = None;
    }
}

/// Apply queued [`WallCommand`]s in order.
pub fn apply_wall_commands(
    mut wall_commands: EventReader<WallCommand>,
    mut cameras: Query<&mut CameraRig>,
    avatars: Query<&Avatar>,
    time: Res<Time<Real>>,
    persistence: Res<LayoutPersistence>,
    mut room: ResMut<Room>,
    mut controller: ResMut<InteractionController>,
) {
    if wall_commands.is_empty() {
        return;
    }
    let Ok(mut rig) = cameras.single_mut() else {
        warn!("Dropping wall commands: there is no camera rig");
        wall_commands.clear();
        return;
    };
    let mut ctx = InteractionContext {
        room: &mut room,
        rig: &mut rig,
        persistence: &persistence,
        now: time.elapsed(),
        avatar_position: avatar_position(&avatars),
    };

    for command in wall_commands.read() {
        trace!("Applying {command:?}");
        match *command {
            WallCommand::Select(wall) => {
                controller.select_wall(&mut ctx, wall);
            }
            WallCommand::StartEdit => {
                controller.start_edit(&mut ctx);
            }
            WallCommand::AddPoster => {
                controller.add_poster(&mut ctx);
            }
            WallCommand::RemovePoster(poster) => {
                controller.remove_poster(&mut ctx, poster);
            }
            WallCommand::Save => {
                controller.stop_edit(&mut ctx, true);
            }
            WallCommand::Cancel => {
                controller.stop_edit(&mut ctx, false);
            }
            WallCommand::Clear => {
                controller.clear(&mut ctx);
            }
            WallCommand::BackToRoom => {
                controller.back_to_room(&mut ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy_app::prelude::*;
    use bevy_render::camera::{CameraProjection, PerspectiveProjection};

    use super::*;
    use crate::interaction::InteractionState;

    const WINDOW: Vec2 = Vec2::new(800.0, 600.0);

    /// A default perspective camera at `eye`, looking down -Z, filling a window of `window_size`.
    fn view_from(eye: Vec3, window_size: Vec2) -> ViewSnapshot {
        let projection = PerspectiveProjection {
            aspect_ratio: window_size.x / window_size.y,
            ..Default::default()
        };
        let transform = GlobalTransform::from(
            Transform::from_translation(eye).looking_at(eye + Vec3::NEG_Z, Vec3::Y),
        );
        ViewSnapshot::new(
            projection.get_clip_from_view(),
            &transform,
            Rect::from_corners(Vec2::ZERO, window_size),
            window_size,
        )
    }

    /// Where a ray through the cursor at 3/4 of the window's width lands on the back wall's drag
    /// plane, for a camera 5 units in front of it.
    fn three_quarters_across() -> f32 {
        let half_fov = PerspectiveProjection::default().fov / 2.0;
        5.0 * 0.5 * half_fov.tan() * (WINDOW.x / WINDOW.y)
    }

    #[test]
    fn center_of_the_window_looks_straight_ahead() {
        let view = view_from(Vec3::new(0.0, 2.0, 0.0), WINDOW);
        let ray = view.ray(WINDOW / 2.0, WINDOW).unwrap();
        assert!(ray.direction.abs_diff_eq(Vec3::NEG_Z, 1e-4), "{:?}", ray.direction);
        assert!(ray.origin.xy().abs_diff_eq(Vec2::new(0.0, 2.0), 1e-4));
        assert!(ray.origin.z < 0.0 && ray.origin.z > -1.0);
    }

    #[test]
    fn cursor_is_rescaled_to_the_snapshot_window() {
        let view = view_from(Vec3::new(0.0, 2.0, 0.0), WINDOW);
        let before = view.ray(Vec2::new(600.0, 300.0), WINDOW).unwrap();
        let after = view
            .ray(Vec2::new(300.0, 150.0), Vec2::new(400.0, 300.0))
            .unwrap();
        assert!(before.origin.abs_diff_eq(after.origin, 1e-5));
        assert!(before.direction.abs_diff_eq(*after.direction, 1e-5));
        assert!(before.direction.x > 0.0);
    }

    #[test]
    fn unsized_viewport_casts_no_ray() {
        let view = ViewSnapshot::new(
            Mat4::IDENTITY,
            &GlobalTransform::IDENTITY,
            Rect::default(),
            WINDOW,
        );
        assert_eq!(view.ray(Vec2::ZERO, WINDOW), None);
    }

    fn room_app() -> App {
        let mut app = App::new();
        app.init_resource::<Room>()
            .init_resource::<InteractionController>()
            .init_resource::<LayoutPersistence>()
            .init_resource::<PointerSample>()
            .init_resource::<Time<Real>>()
            .add_event::<WallCommand>()
            .add_systems(Update, (handle_pointer, apply_wall_commands).chain());
        app.world_mut().spawn(CameraRig::default());
        app
    }

    fn state(app: &App) -> InteractionState {
        app.world().resource::<InteractionController>().state()
    }

    fn press(app: &mut App, pointer: PointerSample) {
        *app.world_mut().resource_mut::<PointerSample>() = pointer;
        app.update();
    }

    fn first_poster(app: &App) -> Vec3 {
        app.world().resource::<Room>().wall(WallId::Back).unwrap().posters()[0].position()
    }

    #[test]
    fn clicking_a_wall_selects_it() {
        let mut app = room_app();
        press(
            &mut app,
            PointerSample {
                just_pressed: true,
                pressed: true,
                cursor: Some(WINDOW / 2.0),
                window_size: WINDOW,
                view: Some(view_from(Vec3::new(0.0, 2.0, 0.0), WINDOW)),
            },
        );
        assert_eq!(state(&app), InteractionState::WallSelected(WallId::Back));

        let mut rigs = app.world_mut().query::<&CameraRig>();
        let rig = rigs.iter(app.world()).next().unwrap();
        assert!(!rig.controls_enabled());
    }

    #[test]
    fn commands_drive_the_controller_in_order() {
        let mut app = room_app();
        app.world_mut().send_event(WallCommand::AddPoster);
        app.world_mut().send_event(WallCommand::Select(WallId::Back));
        app.world_mut().send_event(WallCommand::StartEdit);
        app.world_mut().send_event(WallCommand::AddPoster);
        app.update();

        assert_eq!(state(&app), InteractionState::Editing(WallId::Back));
        let room = app.world().resource::<Room>();
        assert_eq!(room.wall(WallId::Back).unwrap().posters().len(), 1);
        assert_eq!(first_poster(&app), Vec3::new(0.0, 2.0, 0.25));

        app.world_mut().send_event(WallCommand::Save);
        app.world_mut().send_event(WallCommand::BackToRoom);
        app.update();
        assert_eq!(state(&app), InteractionState::Idle);
    }

    #[test]
    fn commands_without_a_rig_are_dropped() {
        let mut app = room_app();
        let rigs: Vec<Entity> = app
            .world_mut()
            .query_filtered::<Entity, With<CameraRig>>()
            .iter(app.world())
            .collect();
        for rig in rigs {
            app.world_mut().despawn(rig);
        }
        app.world_mut().send_event(WallCommand::Select(WallId::Back));
        app.update();
        assert_eq!(state(&app), InteractionState::Idle);

        // The dropped command is not replayed once a rig exists.
        app.world_mut().spawn(CameraRig::default());
        app.update();
        assert_eq!(state(&app), InteractionState::Idle);
    }

    #[test]
    fn drag_keeps_its_view_through_a_resize() {
        let mut app = room_app();
        app.world_mut().send_event(WallCommand::Select(WallId::Back));
        app.world_mut().send_event(WallCommand::StartEdit);
        app.world_mut().send_event(WallCommand::AddPoster);
        app.update();

        let eye = Vec3::new(0.0, 2.0, 0.0);
        press(
            &mut app,
            PointerSample {
                just_pressed: true,
                pressed: true,
                cursor: Some(WINDOW / 2.0),
                window_size: WINDOW,
                view: Some(view_from(eye, WINDOW)),
            },
        );
        assert!(app.world().resource::<InteractionController>().is_dragging());
        assert!(first_poster(&app).abs_diff_eq(Vec3::new(0.0, 2.0, 0.25), 1e-4));

        // The window shrinks and the live camera moves; the drag still maps through the view it
        // started with.
        let resized = WINDOW / 2.0;
        press(
            &mut app,
            PointerSample {
                just_pressed: false,
                pressed: true,
                cursor: Some(Vec2::new(300.0, 150.0)),
                window_size: resized,
                view: Some(view_from(Vec3::new(3.0, 2.0, 0.0), resized)),
            },
        );
        let expected = Vec3::new(three_quarters_across(), 2.0, 0.25);
        assert!(
            first_poster(&app).abs_diff_eq(expected, 1e-3),
            "{} != {expected}",
            first_poster(&app)
        );

        press(
            &mut app,
            PointerSample {
                window_size: resized,
                ..Default::default()
            },
        );
        assert_eq!(state(&app), InteractionState::Editing(WallId::Back));

        // Dropping saved the layout.
        let mut reloaded = Room::default();
        let persistence = app.world().resource::<LayoutPersistence>();
        assert_eq!(persistence.load(&mut reloaded, WallId::Back).unwrap(), 1);
        let saved = reloaded.wall(WallId::Back).unwrap().posters()[0].position();
        assert!(saved.abs_diff_eq(expected, 1e-3));
    }
}
