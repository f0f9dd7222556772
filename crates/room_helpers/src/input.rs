//! Pointer helpers shared by mouse and touch input.
//!
//! Positions are in window coordinates; the `*_ray` variants project them
//! through the single active camera into a world-space ray.

use bevy::prelude::*;
use bevy::window::CursorMoved;

pub fn just_pressed_screen_position(
    button_input: &Res<ButtonInput<MouseButton>>,
    touch_input: &Res<Touches>,
    windows: &Query<&Window>,
) -> Option<Vec2> {
    if button_input.just_pressed(MouseButton::Left) {
        windows.get_single().ok()?.cursor_position()
    } else if touch_input.any_just_pressed() {
        let touch = touch_input.iter_just_pressed().next()?;
        Some(touch.position())
    } else {
        None
    }
}

/// Position of a pointer that is currently held down, if any.
pub fn held_screen_position(
    button_input: &Res<ButtonInput<MouseButton>>,
    touch_input: &Res<Touches>,
    windows: &Query<&Window>,
) -> Option<Vec2> {
    if button_input.pressed(MouseButton::Left) {
        windows.get_single().ok()?.cursor_position()
    } else {
        touch_input.iter().next().map(|touch| touch.position())
    }
}

pub fn just_released_screen_position(
    button_input: &Res<ButtonInput<MouseButton>>,
    touch_input: &Res<Touches>,
    windows: &Query<&Window>,
) -> Option<Vec2> {
    if button_input.just_released(MouseButton::Left) {
        windows.get_single().ok()?.cursor_position()
    } else if touch_input.any_just_released() {
        let touch = touch_input.iter_just_released().next()?;
        Some(touch.position())
    } else {
        None
    }
}

/// True on the frame the primary pointer goes down.
pub fn pointer_just_pressed(
    button_input: &Res<ButtonInput<MouseButton>>,
    touch_input: &Res<Touches>,
) -> bool {
    button_input.just_pressed(MouseButton::Left) || touch_input.any_just_pressed()
}

/// True when the cursor or any touch moved since the last frame.
pub fn pointer_moved(
    cursor_moved: &mut EventReader<CursorMoved>,
    touch_input: &Res<Touches>,
) -> bool {
    let cursor = cursor_moved.read().count() > 0;
    cursor || touch_input.iter().any(|touch| touch.delta() != Vec2::ZERO)
}

/// True on the frame the primary pointer is lifted, even when the release
/// happens outside the window and no position is known.
pub fn pointer_just_released(
    button_input: &Res<ButtonInput<MouseButton>>,
    touch_input: &Res<Touches>,
) -> bool {
    button_input.just_released(MouseButton::Left) || touch_input.any_just_released()
}

pub fn screen_ray(
    position: Vec2,
    camera: &Query<(&Camera, &GlobalTransform)>,
) -> Option<Ray3d> {
    let (camera, camera_transform) = camera.get_single().ok()?;

    camera.viewport_to_world(camera_transform, position).ok()
}

pub fn just_pressed_ray(
    button_input: &Res<ButtonInput<MouseButton>>,
    touch_input: &Res<Touches>,
    windows: &Query<&Window>,
    camera: &Query<(&Camera, &GlobalTransform)>,
) -> Option<Ray3d> {
    let position = just_pressed_screen_position(button_input, touch_input, windows)?;
    screen_ray(position, camera)
}

pub fn held_ray(
    button_input: &Res<ButtonInput<MouseButton>>,
    touch_input: &Res<Touches>,
    windows: &Query<&Window>,
    camera: &Query<(&Camera, &GlobalTransform)>,
) -> Option<Ray3d> {
    let position = held_screen_position(button_input, touch_input, windows)?;
    screen_ray(position, camera)
}

pub fn just_released_ray(
    button_input: &Res<ButtonInput<MouseButton>>,
    touch_input: &Res<Touches>,
    windows: &Query<&Window>,
    camera: &Query<(&Camera, &GlobalTransform)>,
) -> Option<Ray3d> {
    let position = just_released_screen_position(button_input, touch_input, windows)?;
    screen_ray(position, camera)
}
