use bevy::prelude::*;

pub mod audio;
pub mod board;
pub mod config;
pub mod countdown;
pub mod picking;
pub mod puzzle;
pub mod screen;
pub mod skybox;

use config::{PuzzleConfig, ViewerConfig};

#[derive(States, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    #[default]
    Start,
    LevelSelect,
    Viewer,
    Puzzle,
}

/// The single 3D camera. The viewer orbits it; the puzzle parks it overhead.
#[derive(Component)]
pub struct MainCamera;

pub fn run() {
    room_helpers::get_default_app(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        .init_state::<Screen>()
        .register_type::<PuzzleConfig>()
        .register_type::<ViewerConfig>()
        .init_resource::<PuzzleConfig>()
        .init_resource::<ViewerConfig>()
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 500.0,
        })
        .add_plugins(room_helpers::ui::ButtonStylePlugin)
        .add_plugins(screen::ScreenPlugin)
        .add_plugins(skybox::ViewerPlugin)
        .add_plugins(puzzle::PuzzlePlugin)
        .add_plugins(audio::GameAudioPlugin)
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands, puzzle: Res<PuzzleConfig>, viewer: Res<ViewerConfig>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: puzzle.camera_fov_degrees.to_radians(),
            ..default()
        }),
        Transform::from_translation(viewer.camera_start),
        MainCamera,
    ));
}
