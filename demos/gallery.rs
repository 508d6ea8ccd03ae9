//! Walk around the room, click a wall, and hang some posters.
//!
//! Layouts are saved next to the binary in `gallery_layouts/`, so they survive restarts.

use bevy::prelude::*;
use bevy_poster_room::prelude::*;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            DefaultRoomPlugins.set(RoomPlugin {
                storage: LayoutStorage::Directory("gallery_layouts".into()),
                ..Default::default()
            }),
        ))
        .insert_resource(ClearColor(Color::srgb(0.12, 0.13, 0.16)))
        .add_systems(Startup, (setup, setup_ui))
        .add_systems(Update, (send_wall_commands, update_help_text))
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((Camera3d::default(), CameraRig::default()));
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..Default::default()
        },
        Transform::from_xyz(4.0, 10.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        brightness: 400.0,
        ..Default::default()
    });
}

#[derive(Component)]
struct HelpText;

fn setup_ui(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..Default::default()
        },
        HelpText,
    ));
}

fn send_wall_commands(
    keys: Res<ButtonInput<KeyCode>>,
    room: Res<Room>,
    controller: Res<InteractionController>,
    mut wall_commands: EventWriter<WallCommand>,
) {
    let bindings = [
        (KeyCode::KeyE, WallCommand::StartEdit),
        (KeyCode::KeyN, WallCommand::AddPoster),
        (KeyCode::Enter, WallCommand::Save),
        (KeyCode::Escape, WallCommand::Cancel),
        (KeyCode::Delete, WallCommand::Clear),
        (KeyCode::Backspace, WallCommand::BackToRoom),
        (KeyCode::Digit1, WallCommand::Select(WallId::Back)),
        (KeyCode::Digit2, WallCommand::Select(WallId::Right)),
    ];
    for (key, command) in bindings {
        if keys.just_pressed(key) {
            wall_commands.write(command);
        }
    }

    // Remove the most recently added poster.
    if keys.just_pressed(KeyCode::KeyX) {
        let newest = controller
            .state()
            .wall()
            .and_then(|wall| room.wall(wall))
            .and_then(|wall| wall.posters().last())
            .map(Poster::id);
        if let Some(poster) = newest {
            wall_commands.write(WallCommand::RemovePoster(poster));
        }
    }
}

fn update_help_text(
    controller: Res<InteractionController>,
    room: Res<Room>,
    rigs: Query<&CameraRig>,
    mut text: Query<&mut Text, With<HelpText>>,
) {
    let Ok(mut text) = text.single_mut() else {
        return;
    };
    let help = match controller.state() {
        InteractionState::Idle => {
            "Arrows/WASD: walk | Right drag: orbit | Wheel: zoom | V: overview\n\
             Click a wall (or 1/2) to view it"
        }
        InteractionState::WallSelected(_) => "E: edit | Delete: clear | Backspace: back to room",
        InteractionState::Editing(_) | InteractionState::Dragging { .. } => {
            "Drag posters to move them | N: add | X: remove newest | Delete: clear\n\
             Enter: save | Escape: cancel"
        }
    };
    let posters: usize = room.walls().map(|wall| wall.posters().len()).sum();
    let camera = rigs
        .single()
        .map(|rig| format!("{:?}, {:?} view", rig.mode(), rig.view()))
        .unwrap_or_default();

    text.0 = format!(
        "{help}\n\nState: {:?}\nCamera: {camera}\nPosters: {posters}",
        controller.state()
    );
}
