use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::board::{GRID_SIZE, SlotIndex, TileId};

/// Geometry and timing of the puzzle scene.
#[derive(Reflect, Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
pub struct PuzzleConfig {
    /// Starting value of the countdown, in whole seconds.
    pub countdown_secs: u32,
    /// Distance between neighbouring slot centers.
    pub slot_spacing: f32,
    /// Width and depth of a slot box.
    pub slot_box_size: f32,
    pub slot_box_height: f32,
    /// Height above a slot anchor at which a placed tile rests.
    pub slot_clearance: f32,
    pub tile_size: f32,
    /// Gap between tiles in the staging row.
    pub tile_gap: f32,
    pub staging_height: f32,
    pub staging_depth: f32,
    /// Height of the invisible drag plane; dragged tiles are pinned to it.
    pub drag_height: f32,
    pub drag_plane_half_extent: f32,
    pub camera_height: f32,
    /// Vertical field of view, in degrees.
    pub camera_fov_degrees: f32,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 120,
            slot_spacing: 1.55,
            slot_box_size: 1.5,
            slot_box_height: 0.1,
            slot_clearance: 0.1,
            tile_size: 1.5,
            tile_gap: 0.2,
            staging_height: 2.0,
            staging_depth: 2.5,
            drag_height: 0.1,
            drag_plane_half_extent: 5.0,
            camera_height: 7.0,
            camera_fov_degrees: 75.0,
        }
    }
}

impl PuzzleConfig {
    pub fn slot_anchor(&self, slot: SlotIndex) -> Vec3 {
        let center = (GRID_SIZE / 2) as f32;
        Vec3::new(
            (slot.col() as f32 - center) * self.slot_spacing,
            0.0,
            (slot.row() as f32 - center) * self.slot_spacing,
        )
    }

    /// Where a tile rests once placed into `slot`.
    pub fn slot_resting_position(&self, slot: SlotIndex) -> Vec3 {
        self.slot_anchor(slot) + Vec3::Y * self.slot_clearance
    }

    /// Off-grid position of a freshly created tile: a row centered on tile #5.
    pub fn staging_position(&self, tile: TileId) -> Vec3 {
        let offset = tile.get() as f32 - 5.0;
        Vec3::new(
            offset * (self.tile_size + self.tile_gap),
            self.staging_height,
            self.staging_depth,
        )
    }
}

/// Skybox and orbit camera settings of the viewer screen.
#[derive(Reflect, Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[reflect(Resource)]
pub struct ViewerConfig {
    pub skybox_size: f32,
    pub camera_start: Vec3,
    pub orbit_target: Vec3,
    /// Fraction of the remaining rotation applied each frame.
    pub damping: f32,
    /// Radians of rotation per pixel of pointer motion.
    pub rotate_sensitivity: f32,
    pub zoom_sensitivity: f32,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            skybox_size: 100.0,
            camera_start: Vec3::new(0.0, 1.5, 0.0),
            orbit_target: Vec3::ZERO,
            damping: 0.25,
            rotate_sensitivity: 0.005,
            zoom_sensitivity: 0.1,
            min_radius: 0.5,
            max_radius: 40.0,
        }
    }
}
