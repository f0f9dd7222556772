use core::f32::consts::FRAC_PI_2;

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::render::render_resource::Face;
use room_helpers::cleanup::despawn_marked;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::config::ViewerConfig;
use crate::{MainCamera, Screen};

/// Keeps the camera off the poles, where yaw stops making sense.
const MAX_PITCH: f32 = FRAC_PI_2 - 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumIter, Display, Serialize, Deserialize)]
pub enum Level {
    #[default]
    #[strum(to_string = "Level 1")]
    One,
    #[strum(to_string = "Level 2")]
    Two,
}

impl Level {
    pub const fn directory(self) -> &'static str {
        match self {
            Self::One => "room1",
            Self::Two => "room2",
        }
    }

    pub fn face_path(self, face: CubeFace) -> String {
        format!("{}/{face}.jpg", self.directory())
    }
}

#[derive(Resource, Debug, Default)]
pub struct SelectedLevel(pub Level);

/// Faces of the skybox cube, in the order their images are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum CubeFace {
    Right,
    Left,
    Top,
    Bottom,
    Front,
    Back,
}

impl CubeFace {
    /// The cube side this image covers, and where the image's right and top
    /// edges point when the side is seen from outside.
    pub const fn axes(self) -> (Vec3, Vec3, Vec3) {
        match self {
            Self::Left => (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            Self::Right => (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            Self::Bottom => (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            Self::Top => (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            Self::Front => (Vec3::Z, Vec3::X, Vec3::Y),
            Self::Back => (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        }
    }

    /// Places a quad (facing +Z) on this side of a cube of side `size`,
    /// facing away from the center. The skybox material culls front faces,
    /// so from inside the cube each image reads mirrored.
    pub fn outward_transform(self, size: f32) -> Transform {
        let (outward, right, up) = self.axes();
        Transform::from_translation(outward * (size / 2.0))
            .with_rotation(Quat::from_mat3(&Mat3::from_cols(right, up, outward)))
    }
}

#[derive(Component)]
pub struct ViewerEntity;

/// Damped orbit around a target point. Pointer input accumulates pending
/// rotation; each step applies a `damping` fraction of it, so the camera
/// eases to a stop after the pointer is released.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    target: Vec3,
    radius: f32,
    yaw: f32,
    pitch: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    damping: f32,
    min_radius: f32,
    max_radius: f32,
}

impl OrbitCamera {
    pub fn new(config: &ViewerConfig) -> Self {
        let offset = config.camera_start - config.orbit_target;
        let radius = offset.length().max(config.min_radius);
        Self {
            target: config.orbit_target,
            radius,
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / radius).clamp(-1.0, 1.0).asin().clamp(-MAX_PITCH, MAX_PITCH),
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            damping: config.damping,
            min_radius: config.min_radius,
            max_radius: config.max_radius,
        }
    }

    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.pending_yaw += yaw;
        self.pending_pitch += pitch;
    }

    pub fn zoom(&mut self, factor: f32) {
        self.radius = (self.radius * factor).clamp(self.min_radius, self.max_radius);
    }

    pub fn step(&mut self) {
        self.yaw += self.pending_yaw * self.damping;
        self.pitch = self
            .pending_pitch
            .mul_add(self.damping, self.pitch)
            .clamp(-MAX_PITCH, MAX_PITCH);
        self.pending_yaw *= 1.0 - self.damping;
        self.pending_pitch *= 1.0 - self.damping;
    }

    pub fn position(&self) -> Vec3 {
        let horizontal = self.radius * self.pitch.cos();
        self.target
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.radius * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position()).looking_at(self.target, Vec3::Y)
    }

    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    pub const fn pitch(&self) -> f32 {
        self.pitch
    }

    pub const fn radius(&self) -> f32 {
        self.radius
    }
}

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SelectedLevel>()
            .add_systems(OnEnter(Screen::Viewer), (spawn_skybox, attach_orbit_camera))
            .add_systems(
                OnExit(Screen::Viewer),
                (despawn_marked::<ViewerEntity>, detach_orbit_camera),
            )
            .add_systems(
                Update,
                (orbit_input, apply_orbit)
                    .chain()
                    .run_if(in_state(Screen::Viewer)),
            );
    }
}

fn spawn_skybox(
    mut commands: Commands,
    config: Res<ViewerConfig>,
    level: Res<SelectedLevel>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let face_mesh = meshes.add(Rectangle::new(config.skybox_size, config.skybox_size));
    for face in CubeFace::iter() {
        commands.spawn((
            Mesh3d(face_mesh.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color_texture: Some(asset_server.load(level.0.face_path(face))),
                unlit: true,
                cull_mode: Some(Face::Front),
                ..default()
            })),
            face.outward_transform(config.skybox_size),
            ViewerEntity,
        ));
    }
    info!("Showing {} skybox", level.0);
}

fn attach_orbit_camera(
    mut commands: Commands,
    config: Res<ViewerConfig>,
    mut camera: Query<(Entity, &mut Transform), With<MainCamera>>,
) {
    let Ok((entity, mut transform)) = camera.get_single_mut() else {
        warn!("No camera to orbit");
        return;
    };
    let orbit = OrbitCamera::new(&config);
    *transform = orbit.transform();
    commands.entity(entity).insert(orbit);
}

fn detach_orbit_camera(mut commands: Commands, camera: Query<Entity, With<OrbitCamera>>) {
    for entity in &camera {
        commands.entity(entity).remove::<OrbitCamera>();
    }
}

fn orbit_input(
    config: Res<ViewerConfig>,
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    mut cameras: Query<&mut OrbitCamera>,
) {
    let mut delta: Vec2 = motion.read().map(|event| event.delta).sum();
    if !buttons.pressed(MouseButton::Left) {
        delta = Vec2::ZERO;
    }
    if let Some(touch) = touches.iter().next() {
        delta += touch.delta();
    }

    let scroll: f32 = wheel
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y / 100.0,
        })
        .sum();

    for mut orbit in &mut cameras {
        if delta != Vec2::ZERO {
            orbit.rotate(
                -delta.x * config.rotate_sensitivity,
                delta.y * config.rotate_sensitivity,
            );
        }
        if scroll.abs() > f32::EPSILON {
            orbit.zoom(1.0 - scroll * config.zoom_sensitivity);
        }
    }
}

fn apply_orbit(mut cameras: Query<(&mut OrbitCamera, &mut Transform)>) {
    for (mut orbit, mut transform) in &mut cameras {
        orbit.step();
        *transform = orbit.transform();
    }
}
