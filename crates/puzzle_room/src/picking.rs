//! Ray hit-tests against the puzzle scene. Every target is a horizontal
//! square, so a hit is a ray/plane intersection inside the square's extent.

use bevy::prelude::*;

use crate::board::{PuzzleBoard, SlotIndex, TileId};
use crate::config::PuzzleConfig;

const HORIZONTAL: InfinitePlane3d = InfinitePlane3d { normal: Dir3::Y };

/// Distance along `ray` to the horizontal square centered on `center`.
pub fn hit_square(ray: Ray3d, center: Vec3, half_extent: f32) -> Option<f32> {
    let distance = ray.intersect_plane(center, HORIZONTAL)?;
    let point = ray.get_point(distance);
    let inside = (point.x - center.x).abs() <= half_extent
        && (point.z - center.z).abs() <= half_extent;
    inside.then_some(distance)
}

/// Nearest tile under the ray.
pub fn tile_at(ray: Ray3d, board: &PuzzleBoard) -> Option<TileId> {
    let half_extent = board.config().tile_size / 2.0;
    board
        .tiles()
        .iter()
        .filter_map(|tile| {
            hit_square(ray, tile.position(), half_extent).map(|distance| (tile.id(), distance))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(id, _)| id)
}

/// Slot whose box top is under the ray. Tiles are not considered.
pub fn slot_at(ray: Ray3d, config: &PuzzleConfig) -> Option<SlotIndex> {
    let half_extent = config.slot_box_size / 2.0;
    let top = Vec3::Y * (config.slot_box_height / 2.0);
    SlotIndex::all()
        .filter_map(|slot| {
            hit_square(ray, config.slot_anchor(slot) + top, half_extent)
                .map(|distance| (slot, distance))
        })
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(slot, _)| slot)
}

/// Point where the ray meets the invisible drag plane, if within its extent.
pub fn drag_plane_point(ray: Ray3d, config: &PuzzleConfig) -> Option<Vec3> {
    let center = Vec3::Y * config.drag_height;
    hit_square(ray, center, config.drag_plane_half_extent).map(|distance| ray.get_point(distance))
}
