//! The [`InteractionController`] state machine: roaming, wall selection, editing, and dragging.

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::prelude::*;
use bevy_reflect::prelude::*;

use crate::{
    camera::CameraRig,
    persistence::LayoutPersistence,
    room::{Poster, PosterId, Room, WallId},
};

/// A poster being dragged. Holds the poster's id, never the poster itself, so a poster removed
/// mid-drag simply ends the session.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct DragSession {
    /// The poster under the pointer.
    pub poster: PosterId,
    /// Poster position minus the pointer's drag plane hit, in the wall's local frame.
    pub offset: Vec3,
}

/// Where the user is in the interaction flow.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub enum InteractionState {
    /// Free roam: the avatar walks and the camera follows.
    #[default]
    Idle,
    /// The camera frames a wall. Free roam is disabled.
    WallSelected(WallId),
    /// The wall's posters can be added, removed, and dragged.
    Editing(WallId),
    /// A poster is being dragged across the wall.
    Dragging {
        /// The wall being edited.
        wall: WallId,
        /// The active drag.
        session: DragSession,
    },
}

impl InteractionState {
    /// The wall this state is focused on, if any.
    pub fn wall(&self) -> Option<WallId> {
        match *self {
            InteractionState::Idle => None,
            InteractionState::WallSelected(wall)
            | InteractionState::Editing(wall)
            | InteractionState::Dragging { wall, .. } => Some(wall),
        }
    }
}

/// Everything the controller mutates while handling one input.
pub struct InteractionContext<'a> {
    /// The wall registry.
    pub room: &'a mut Room,
    /// The camera whose mode follows the interaction state.
    pub rig: &'a mut CameraRig,
    /// Where layouts are saved to and restored from.
    pub persistence: &'a LayoutPersistence,
    /// Current time, used to start camera transitions.
    pub now: Duration,
    /// Where the avatar stands, used to restore the follow camera.
    pub avatar_position: Vec3,
}

/// Routes pointer and UI input to the room, the camera rig, and layout persistence.
///
/// Every command is only valid in some states. Commands arriving in any other state are logged
/// and ignored; each method returns whether it was applied.
#[derive(Debug, Default, Resource, Reflect)]
pub struct InteractionController {
    state: InteractionState,
}

impl InteractionController {
    /// The current state.
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// May the avatar move and the user orbit the camera?
    pub fn free_roam_enabled(&self) -> bool {
        self.state == InteractionState::Idle
    }

    /// Is a poster being dragged?
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, InteractionState::Dragging { .. })
    }

    fn ignore(&self, command: &str) -> bool {
        debug!("Ignoring {command} while {:?}", self.state);
        false
    }

    /// A primary click. From free roam, selects the wall under `ray`; in edit mode, starts dragging
    /// the poster under it.
    pub fn pointer_pressed(&mut self, ctx: &mut InteractionContext, ray: Ray3d) -> bool {
        match self.state {
            InteractionState::Idle => self.pointer_click(ctx, ray),
            InteractionState::Editing(_) => self.pointer_down(ctx, ray),
            _ => false,
        }
    }

    /// Select the nearest wall hit by `ray`. Only valid while roaming.
    pub fn pointer_click(&mut self, ctx: &mut InteractionContext, ray: Ray3d) -> bool {
        if self.state != InteractionState::Idle {
            return self.ignore("wall click");
        }
        match ctx.room.pick_wall(ray) {
            Some(wall) => self.select_wall(ctx, wall),
            None => false,
        }
    }

    /// Focus the camera on `wall` and restore its layout the first time it is visited.
    pub fn select_wall(&mut self, ctx: &mut InteractionContext, wall: WallId) -> bool {
        if self.state != InteractionState::Idle {
            return self.ignore("wall selection");
        }
        if let Err(e) = ctx.room.try_wall(wall) {
            warn!("Cannot select wall: {e}");
            return false;
        }

        ctx.rig.set_controls_enabled(false);
        ctx.rig.focus_wall(wall, ctx.now);
        Self::ensure_loaded(ctx, wall);
        self.state = InteractionState::WallSelected(wall);
        info!("Selected the {wall} wall");
        true
    }

    fn ensure_loaded(ctx: &mut InteractionContext, wall: WallId) {
        if ctx.room.wall(wall).is_some_and(|w| w.is_loaded()) {
            return;
        }
        if let Err(e) = ctx.persistence.load(ctx.room, wall) {
            warn!("Failed to restore the {wall} wall layout: {e}");
        }
    }

    /// Enter edit mode on the selected wall.
    pub fn start_edit(&mut self, ctx: &mut InteractionContext) -> bool {
        let InteractionState::WallSelected(wall) = self.state else {
            return self.ignore("start edit");
        };
        ctx.rig.set_controls_enabled(false);
        ctx.room.set_edit_mode(wall, true);
        self.state = InteractionState::Editing(wall);
        info!("Editing the {wall} wall");
        true
    }

    /// Begin dragging the poster under `ray`. Ignored while a drag is already in progress.
    pub fn pointer_down(&mut self, ctx: &mut InteractionContext, ray: Ray3d) -> bool {
        let InteractionState::Editing(wall) = self.state else {
            return self.ignore("pointer down");
        };
        let Some(target) = ctx.room.wall(wall) else {
            return false;
        };
        let Some(poster) = target.pick_poster(ray).map(|(id, _)| id) else {
            return false;
        };
        let (Some(hit), Some(position)) = (
            target.drag_plane_hit(ray),
            target.poster(poster).map(Poster::position),
        ) else {
            return false;
        };

        let offset = (position - hit).with_z(0.0);
        self.state = InteractionState::Dragging {
            wall,
            session: DragSession { poster, offset },
        };
        debug!("Dragging poster {poster:?} on the {wall} wall");
        true
    }

    /// Move the dragged poster to follow `ray`. Returns the clamped position that was applied.
    pub fn pointer_move(&mut self, ctx: &mut InteractionContext, ray: Ray3d) -> Option<Vec3> {
        let InteractionState::Dragging { wall, session } = self.state else {
            return None;
        };
        let hit = ctx.room.wall(wall)?.drag_plane_hit(ray)?;
        match ctx.room.move_poster(wall, session.poster, hit + session.offset) {
            Ok(position) => Some(position),
            Err(e) => {
                warn!("Ending drag: {e}");
                self.state = InteractionState::Editing(wall);
                None
            }
        }
    }

    /// Drop the dragged poster and persist the wall's layout.
    pub fn pointer_up(&mut self, ctx: &mut InteractionContext) -> bool {
        let InteractionState::Dragging { wall, session } = self.state else {
            return false;
        };
        self.state = InteractionState::Editing(wall);
        debug!("Dropped poster {:?}", session.poster);
        if let Err(e) = ctx.persistence.save(ctx.room, wall) {
            warn!("Failed to save the {wall} wall layout: {e}");
        }
        true
    }

    /// Leave edit mode. `save` persists the current layout; otherwise the wall is reverted to its
    /// persisted layout.
    pub fn stop_edit(&mut self, ctx: &mut InteractionContext, save: bool) -> bool {
        let InteractionState::Editing(wall) = self.state else {
            return self.ignore(if save { "save" } else { "cancel" });
        };
        let result = if save {
            ctx.persistence.save(ctx.room, wall).map(|_| ())
        } else {
            ctx.room
                .clear_posters(wall)
                .and_then(|_| ctx.persistence.load(ctx.room, wall))
                .map(|_| ())
        };
        if let Err(e) = result {
            warn!("Failed to leave edit mode on the {wall} wall cleanly: {e}");
        }
        ctx.room.set_edit_mode(wall, false);
        self.state = InteractionState::WallSelected(wall);
        info!(
            "Stopped editing the {wall} wall ({})",
            if save { "saved" } else { "reverted" }
        );
        true
    }

    /// Return from the selected wall to free roam.
    pub fn back_to_room(&mut self, ctx: &mut InteractionContext) -> bool {
        let InteractionState::WallSelected(wall) = self.state else {
            return self.ignore("back to room");
        };
        ctx.rig.set_controls_enabled(true);
        ctx.rig.return_to_follow(ctx.avatar_position);
        self.state = InteractionState::Idle;
        info!("Left the {wall} wall");
        true
    }

    /// Hang a default-sized poster in the middle of the wall being edited.
    pub fn add_poster(&mut self, ctx: &mut InteractionContext) -> Option<PosterId> {
        let InteractionState::Editing(wall) = self.state else {
            self.ignore("add poster");
            return None;
        };
        let size = Poster::DEFAULT_SIZE;
        let position = Vec3::new(0.0, Poster::DEFAULT_HEIGHT, 0.0);
        let added = Poster::create_placement(size.x, size.y, position, wall)
            .and_then(|poster| ctx.room.add_poster(wall, poster));
        match added {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to add a poster: {e}");
                None
            }
        }
    }

    /// Take a poster off the wall being edited.
    pub fn remove_poster(&mut self, ctx: &mut InteractionContext, poster: PosterId) -> bool {
        let InteractionState::Editing(wall) = self.state else {
            return self.ignore("remove poster");
        };
        match ctx.room.remove_poster(wall, poster) {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to remove a poster: {e}");
                false
            }
        }
    }

    /// Remove every poster from the focused wall and forget its persisted layout.
    pub fn clear(&mut self, ctx: &mut InteractionContext) -> bool {
        let (InteractionState::WallSelected(wall) | InteractionState::Editing(wall)) = self.state
        else {
            return self.ignore("clear");
        };
        match ctx.persistence.clear(ctx.room, wall) {
            Ok(count) => {
                info!("Cleared {count} posters from the {wall} wall");
                true
            }
            Err(e) => {
                warn!("Failed to clear the {wall} wall: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraMode;

    struct Fixture {
        room: Room,
        rig: CameraRig,
        persistence: LayoutPersistence,
        controller: InteractionController,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                room: Room::default(),
                rig: CameraRig::default(),
                persistence: LayoutPersistence::default(),
                controller: InteractionController::default(),
            }
        }

        fn run<R>(
            &mut self,
            f: impl FnOnce(&mut InteractionController, &mut InteractionContext) -> R,
        ) -> R {
            let mut ctx = InteractionContext {
                room: &mut self.room,
                rig: &mut self.rig,
                persistence: &self.persistence,
                now: Duration::ZERO,
                avatar_position: Vec3::new(0.0, 0.25, 0.0),
            };
            f(&mut self.controller, &mut ctx)
        }

        fn editing_back_wall() -> Self {
            let mut fixture = Self::new();
            fixture.run(|c, ctx| {
                assert!(c.select_wall(ctx, WallId::Back));
                assert!(c.start_edit(ctx));
            });
            fixture
        }
    }

    fn ray_at(x: f32, y: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, y, 0.0), Dir3::NEG_Z)
    }

    #[test]
    fn click_selects_wall_and_disables_roam() {
        let mut f = Fixture::new();
        assert!(f.run(|c, ctx| c.pointer_click(ctx, ray_at(0.0, 2.0))));
        assert_eq!(f.controller.state(), InteractionState::WallSelected(WallId::Back));
        assert!(!f.controller.free_roam_enabled());
        assert!(!f.rig.controls_enabled());
        assert!(matches!(f.rig.mode(), CameraMode::Transitioning(_)));
        assert!(f.room.wall(WallId::Back).unwrap().is_loaded());
    }

    #[test]
    fn click_on_nothing_stays_idle() {
        let mut f = Fixture::new();
        let open_side = Ray3d::new(Vec3::new(0.0, 2.0, 0.0), Dir3::Z);
        assert!(!f.run(|c, ctx| c.pointer_click(ctx, open_side)));
        assert_eq!(f.controller.state(), InteractionState::Idle);
    }

    #[test]
    fn unregistered_wall_cannot_be_selected() {
        let mut f = Fixture::new();
        assert!(!f.run(|c, ctx| c.select_wall(ctx, WallId::Left)));
        assert_eq!(f.controller.state(), InteractionState::Idle);
        assert!(f.rig.controls_enabled());
    }

    #[test]
    fn invalid_commands_are_ignored() {
        let mut f = Fixture::new();
        f.run(|c, ctx| {
            assert!(!c.start_edit(ctx));
            assert!(!c.back_to_room(ctx));
            assert!(!c.stop_edit(ctx, true));
            assert!(c.add_poster(ctx).is_none());
            assert!(!c.clear(ctx));
        });
        assert_eq!(f.controller.state(), InteractionState::Idle);
    }

    #[test]
    fn drag_clamps_to_wall() {
        let mut f = Fixture::editing_back_wall();
        let id = f.run(|c, ctx| c.add_poster(ctx)).unwrap();
        assert!(f.run(|c, ctx| c.pointer_down(ctx, ray_at(0.0, 2.0))));

        let applied = f.run(|c, ctx| c.pointer_move(ctx, ray_at(10.0, 2.0)));
        assert_eq!(applied, Some(Vec3::new(3.5, 2.0, 0.25)));
        let applied = f.run(|c, ctx| c.pointer_move(ctx, ray_at(-2.0, -4.0)));
        assert_eq!(applied, Some(Vec3::new(-2.0, 0.75, 0.25)));

        assert!(f.run(|c, ctx| c.pointer_up(ctx)));
        assert_eq!(f.controller.state(), InteractionState::Editing(WallId::Back));
        assert_eq!(
            f.room.poster(id).unwrap().position(),
            Vec3::new(-2.0, 0.75, 0.25)
        );
    }

    #[test]
    fn grab_offset_prevents_jump() {
        let mut f = Fixture::editing_back_wall();
        let id = f.run(|c, ctx| c.add_poster(ctx)).unwrap();
        // Grab near the poster's top-right corner.
        assert!(f.run(|c, ctx| c.pointer_down(ctx, ray_at(0.4, 2.6))));
        let applied = f.run(|c, ctx| c.pointer_move(ctx, ray_at(0.4, 2.6)));
        assert_eq!(applied, Some(f.room.poster(id).unwrap().position()));
        assert!(applied.unwrap().abs_diff_eq(Vec3::new(0.0, 2.0, 0.25), 1e-5));
    }

    #[test]
    fn only_one_drag_session() {
        let mut f = Fixture::editing_back_wall();
        let first = f.run(|c, ctx| c.add_poster(ctx)).unwrap();
        f.run(|c, ctx| {
            ctx.room
                .move_poster(WallId::Back, first, Vec3::new(-2.0, 2.0, 0.0))
                .unwrap();
            c.add_poster(ctx)
        });
        assert!(f.run(|c, ctx| c.pointer_down(ctx, ray_at(-2.0, 2.0))));
        assert!(!f.run(|c, ctx| c.pointer_down(ctx, ray_at(0.0, 2.0))));
        match f.controller.state() {
            InteractionState::Dragging { session, .. } => assert_eq!(session.poster, first),
            other => panic!("expected a drag, got {other:?}"),
        }
    }

    #[test]
    fn pointer_down_on_empty_wall_keeps_editing() {
        let mut f = Fixture::editing_back_wall();
        assert!(!f.run(|c, ctx| c.pointer_down(ctx, ray_at(0.0, 2.0))));
        assert_eq!(f.controller.state(), InteractionState::Editing(WallId::Back));
    }

    #[test]
    fn removing_dragged_poster_ends_drag() {
        let mut f = Fixture::editing_back_wall();
        let id = f.run(|c, ctx| c.add_poster(ctx)).unwrap();
        f.run(|c, ctx| c.pointer_down(ctx, ray_at(0.0, 2.0)));
        f.room.remove_poster(WallId::Back, id).unwrap();
        assert_eq!(f.run(|c, ctx| c.pointer_move(ctx, ray_at(1.0, 2.0))), None);
        assert_eq!(f.controller.state(), InteractionState::Editing(WallId::Back));
    }

    #[test]
    fn drop_saves_layout() {
        let mut f = Fixture::editing_back_wall();
        f.run(|c, ctx| c.add_poster(ctx));
        f.run(|c, ctx| {
            c.pointer_down(ctx, ray_at(0.0, 2.0));
            c.pointer_move(ctx, ray_at(1.0, 3.0));
            c.pointer_up(ctx)
        });
        // Reverting restores what the drop saved.
        f.run(|c, ctx| c.stop_edit(ctx, false));
        let posters = f.room.wall(WallId::Back).unwrap().posters();
        assert_eq!(posters.len(), 1);
        assert_eq!(posters[0].position(), Vec3::new(1.0, 3.0, 0.25));
    }

    #[test]
    fn cancel_reverts_to_saved_layout() {
        let mut f = Fixture::editing_back_wall();
        f.run(|c, ctx| {
            c.add_poster(ctx);
            assert!(c.stop_edit(ctx, true));
            assert!(c.start_edit(ctx));
            c.add_poster(ctx);
            c.add_poster(ctx);
            assert!(c.stop_edit(ctx, false));
        });
        let wall = f.room.wall(WallId::Back).unwrap();
        assert_eq!(wall.posters().len(), 1);
        assert!(!wall.edit_mode());
        assert_eq!(f.controller.state(), InteractionState::WallSelected(WallId::Back));
    }

    #[test]
    fn remove_and_clear() {
        let mut f = Fixture::editing_back_wall();
        let a = f.run(|c, ctx| c.add_poster(ctx)).unwrap();
        f.run(|c, ctx| c.add_poster(ctx));
        assert!(f.run(|c, ctx| c.remove_poster(ctx, a)));
        assert!(!f.run(|c, ctx| c.remove_poster(ctx, a)));
        f.run(|c, ctx| c.stop_edit(ctx, true));

        assert!(f.run(|c, ctx| c.clear(ctx)));
        assert!(f.room.wall(WallId::Back).unwrap().posters().is_empty());
        assert_eq!(
            f.persistence.load(&mut f.room, WallId::Back).unwrap(),
            0,
            "clear also forgets the persisted layout"
        );
    }

    #[test]
    fn layout_is_restored_once_per_wall() {
        let mut f = Fixture::editing_back_wall();
        f.run(|c, ctx| {
            c.add_poster(ctx);
            c.stop_edit(ctx, true);
            assert!(c.back_to_room(ctx));
            assert!(c.select_wall(ctx, WallId::Back));
        });
        assert_eq!(f.room.wall(WallId::Back).unwrap().posters().len(), 1);
    }

    #[test]
    fn back_to_room_restores_follow() {
        let mut f = Fixture::new();
        f.run(|c, ctx| {
            c.select_wall(ctx, WallId::Right);
            assert!(c.back_to_room(ctx));
        });
        assert_eq!(f.controller.state(), InteractionState::Idle);
        assert!(f.controller.free_roam_enabled());
        assert!(f.rig.controls_enabled());
        assert_eq!(f.rig.mode(), &CameraMode::Follow);
    }
}
