use core::fmt::{self, Display, Formatter};

use bevy::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PuzzleConfig;

pub const GRID_SIZE: usize = 3;
pub const SLOT_COUNT: usize = GRID_SIZE * GRID_SIZE;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("slot index {0} is outside the {SLOT_COUNT}-slot grid")]
    SlotOutOfRange(usize),

    #[error("tile identity {0} is outside 1..={SLOT_COUNT}")]
    TileOutOfRange(usize),
}

/// Position of a slot in the grid, row-major, `0..SLOT_COUNT`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(usize);

impl SlotIndex {
    pub const fn new(index: usize) -> Result<Self, PuzzleError> {
        if index < SLOT_COUNT {
            Ok(Self(index))
        } else {
            Err(PuzzleError::SlotOutOfRange(index))
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..SLOT_COUNT).map(Self)
    }

    pub const fn get(self) -> usize {
        self.0
    }

    pub const fn row(self) -> usize {
        self.0 / GRID_SIZE
    }

    pub const fn col(self) -> usize {
        self.0 % GRID_SIZE
    }

    /// The tile that belongs in this slot when the puzzle is solved.
    pub const fn correct_tile(self) -> TileId {
        TileId(self.0 + 1)
    }
}

impl Display for SlotIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// Identity of a tile, `1..=SLOT_COUNT`. Tile `n` belongs in slot `n - 1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(usize);

impl TileId {
    pub const fn new(index: usize) -> Result<Self, PuzzleError> {
        if index >= 1 && index <= SLOT_COUNT {
            Ok(Self(index))
        } else {
            Err(PuzzleError::TileOutOfRange(index))
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=SLOT_COUNT).map(Self)
    }

    pub const fn get(self) -> usize {
        self.0
    }

    pub const fn correct_slot(self) -> SlotIndex {
        SlotIndex(self.0 - 1)
    }
}

impl Display for TileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "tile #{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    id: TileId,
    position: Vec3,
    pre_drag: Option<Vec3>,
}

impl Tile {
    pub const fn id(&self) -> TileId {
        self.id
    }

    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Where the tile was when it was last picked up.
    pub const fn pre_drag_position(&self) -> Option<Vec3> {
        self.pre_drag
    }
}

/// Slot occupancy. Only tile identities are stored here; positions live on
/// the tiles themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotGrid {
    slots: [Option<TileId>; SLOT_COUNT],
}

impl SlotGrid {
    pub fn get(&self, slot: SlotIndex) -> Option<TileId> {
        self.slots.get(slot.0).copied().flatten()
    }

    /// Overwrites the slot without looking at what was there.
    pub fn set(&mut self, slot: SlotIndex, tile: TileId) {
        if let Some(entry) = self.slots.get_mut(slot.0) {
            *entry = Some(tile);
        }
    }

    pub fn clear_slot(&mut self, slot: SlotIndex) {
        if let Some(entry) = self.slots.get_mut(slot.0) {
            *entry = None;
        }
    }

    pub fn find_slot_of(&self, tile: TileId) -> Option<SlotIndex> {
        self.slots
            .iter()
            .position(|entry| *entry == Some(tile))
            .map(SlotIndex)
    }

    pub fn is_solved(&self) -> bool {
        SlotIndex::all().all(|slot| self.get(slot) == Some(slot.correct_tile()))
    }

    pub fn occupied(&self) -> impl Iterator<Item = (SlotIndex, TileId)> + '_ {
        SlotIndex::all().filter_map(|slot| self.get(slot).map(|tile| (slot, tile)))
    }
}

impl Display for SlotGrid {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for row in self.slots.chunks(GRID_SIZE) {
            for entry in row {
                match entry {
                    Some(tile) => write!(f, "{:>2} ", tile.0)?,
                    None => write!(f, " . ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        tile: TileId,
        /// Slot the tile was pulled out of, if it was on the grid.
        origin: Option<SlotIndex>,
    },
}

/// How a drop was resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Released away from the grid; back into `slot` or to its free position.
    Returned { slot: Option<SlotIndex> },
    Placed(SlotIndex),
    /// `displaced` left `slot` for `displaced_to`, or for the dragged tile's
    /// pre-drag position when that is `None`.
    Swapped {
        slot: SlotIndex,
        displaced: TileId,
        displaced_to: Option<SlotIndex>,
    },
    /// Dropped back onto the slot that already holds it.
    Unchanged(SlotIndex),
}

/// The puzzle context: grid, tile pool and the current drag session.
#[derive(Resource, Debug, Clone)]
pub struct PuzzleBoard {
    config: PuzzleConfig,
    grid: SlotGrid,
    tiles: Vec<Tile>,
    drag: DragState,
}

impl PuzzleBoard {
    pub fn new(config: PuzzleConfig) -> Self {
        Self {
            config,
            grid: SlotGrid::default(),
            tiles: Vec::with_capacity(SLOT_COUNT),
            drag: DragState::Idle,
        }
    }

    pub const fn config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub const fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|tile| tile.id == id)
    }

    fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.iter_mut().find(|tile| tile.id == id)
    }

    pub const fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Adds a tile at its staging position. Tiles may arrive in any order;
    /// a second arrival of the same identity is ignored.
    pub fn add_tile(&mut self, id: TileId) -> bool {
        if self.tile(id).is_some() {
            warn!("{id} is already on the board");
            return false;
        }
        let position = self.config.staging_position(id);
        self.tiles.push(Tile {
            id,
            position,
            pre_drag: None,
        });
        true
    }

    /// Puts `tile` into `slot` and moves it onto the slot. Whatever the slot
    /// held before is overwritten, so callers check occupancy first.
    pub fn place_tile(&mut self, tile: TileId, slot: SlotIndex) {
        self.grid.set(slot, tile);
        let position = self.config.slot_resting_position(slot);
        if let Some(tile) = self.tile_mut(tile) {
            tile.position = position;
        }
    }

    pub fn clear_slot(&mut self, slot: SlotIndex) {
        self.grid.clear_slot(slot);
    }

    pub fn find_slot_of(&self, tile: TileId) -> Option<SlotIndex> {
        self.grid.find_slot_of(tile)
    }

    pub fn is_solved(&self) -> bool {
        self.grid.is_solved()
    }

    /// Picks up `id`, vacating its slot. Returns false when a drag is
    /// already in progress or the tile is not on the board.
    pub fn begin_drag(&mut self, id: TileId) -> bool {
        if self.drag != DragState::Idle {
            return false;
        }
        let Some(tile) = self.tile_mut(id) else {
            return false;
        };
        tile.pre_drag = Some(tile.position);

        let origin = self.grid.find_slot_of(id);
        if let Some(slot) = origin {
            self.grid.clear_slot(slot);
        }
        self.drag = DragState::Dragging { tile: id, origin };
        debug!("picked up {id} from {origin:?}");
        true
    }

    /// Moves the dragged tile over `point`, pinned to the drag height.
    pub fn drag_to(&mut self, point: Vec3) -> bool {
        let DragState::Dragging { tile, .. } = self.drag else {
            return false;
        };
        let height = self.config.drag_height;
        let Some(tile) = self.tile_mut(tile) else {
            return false;
        };
        tile.position = Vec3::new(point.x, height, point.z);
        true
    }

    /// Releases the dragged tile over `target` (or away from the grid) and
    /// ends the drag session. Returns `None` when nothing was being dragged.
    pub fn end_drag(&mut self, target: Option<SlotIndex>) -> Option<DropOutcome> {
        let DragState::Dragging { tile, origin } = core::mem::take(&mut self.drag) else {
            return None;
        };

        let outcome = match target {
            None => {
                self.return_tile(tile, origin);
                DropOutcome::Returned { slot: origin }
            }
            Some(slot) => match self.grid.get(slot) {
                None => {
                    self.place_tile(tile, slot);
                    DropOutcome::Placed(slot)
                }
                Some(existing) if existing == tile => DropOutcome::Unchanged(slot),
                Some(displaced) => {
                    self.place_tile(tile, slot);
                    match origin {
                        Some(origin) => self.place_tile(displaced, origin),
                        // The displaced tile leaves the grid for the dragged
                        // tile's old free position.
                        None => self.move_to_pre_drag(displaced, tile),
                    }
                    DropOutcome::Swapped {
                        slot,
                        displaced,
                        displaced_to: origin,
                    }
                }
            },
        };
        debug!("dropped {tile}: {outcome:?}\n{}", self.grid);
        Some(outcome)
    }

    fn return_tile(&mut self, tile: TileId, origin: Option<SlotIndex>) {
        match origin {
            Some(slot) => self.place_tile(tile, slot),
            None => self.move_to_pre_drag(tile, tile),
        }
    }

    /// Moves `tile` to where `source` was before its drag started.
    fn move_to_pre_drag(&mut self, tile: TileId, source: TileId) {
        let Some(position) = self.tile(source).and_then(Tile::pre_drag_position) else {
            return;
        };
        if let Some(tile) = self.tile_mut(tile) {
            tile.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: usize) -> SlotIndex {
        SlotIndex::new(index).expect("valid slot")
    }

    fn tile(index: usize) -> TileId {
        TileId::new(index).expect("valid tile")
    }

    fn full_pool() -> PuzzleBoard {
        let mut board = PuzzleBoard::new(PuzzleConfig::default());
        for id in TileId::all() {
            board.add_tile(id);
        }
        board
    }

    fn position(board: &PuzzleBoard, id: usize) -> Vec3 {
        board.tile(tile(id)).map(Tile::position).expect("tile exists")
    }

    fn drag_and_drop(board: &mut PuzzleBoard, id: usize, target: Option<usize>) -> DropOutcome {
        assert!(board.begin_drag(tile(id)), "could not pick up {id}");
        board
            .end_drag(target.map(slot))
            .expect("drag session was active")
    }

    fn assert_no_duplicates(board: &PuzzleBoard) {
        let mut seen = Vec::new();
        for (_, id) in board.grid().occupied() {
            assert!(!seen.contains(&id), "{id} appears in two slots");
            seen.push(id);
        }
    }

    #[test]
    fn indices_are_validated() {
        assert_eq!(SlotIndex::new(9), Err(PuzzleError::SlotOutOfRange(9)), "slot 9");
        assert_eq!(TileId::new(0), Err(PuzzleError::TileOutOfRange(0)), "tile 0");
        assert_eq!(TileId::new(10), Err(PuzzleError::TileOutOfRange(10)), "tile 10");
        assert_eq!(tile(9).correct_slot(), slot(8), "tile 9 belongs in slot 8");
        assert_eq!(slot(0).correct_tile(), tile(1), "slot 0 wants tile 1");
    }

    #[test]
    fn tiles_arrive_out_of_order() {
        let mut board = PuzzleBoard::new(PuzzleConfig::default());
        for id in [7, 2, 9] {
            assert!(board.add_tile(tile(id)), "first arrival of {id}");
        }
        assert!(!board.add_tile(tile(2)), "duplicate arrival accepted");

        assert_eq!(board.tiles().len(), 3, "pool size");
        assert_eq!(
            position(&board, 7),
            PuzzleConfig::default().staging_position(tile(7)),
            "tile staged off-grid"
        );
        assert!(board.grid().occupied().next().is_none(), "grid starts empty");
    }

    #[test]
    fn missing_tile_cannot_be_picked_up() {
        let mut board = PuzzleBoard::new(PuzzleConfig::default());
        board.add_tile(tile(1));

        assert!(!board.begin_drag(tile(4)), "picked up a tile that never loaded");
        assert_eq!(board.drag_state(), DragState::Idle, "still idle");
    }

    #[test]
    fn only_one_drag_session_at_a_time() {
        let mut board = full_pool();

        assert!(board.begin_drag(tile(1)), "first pick up");
        assert!(!board.begin_drag(tile(2)), "second pick up while dragging");
        assert_eq!(
            board.drag_state(),
            DragState::Dragging {
                tile: tile(1),
                origin: None
            },
            "first session kept"
        );
    }

    #[test]
    fn pick_up_vacates_slot() {
        let mut board = full_pool();
        board.place_tile(tile(3), slot(6));

        assert!(board.begin_drag(tile(3)), "pick up");
        assert_eq!(board.grid().get(slot(6)), None, "slot cleared while in hand");
        assert_eq!(
            board.drag_state(),
            DragState::Dragging {
                tile: tile(3),
                origin: Some(slot(6))
            },
            "origin recorded"
        );
    }

    #[test]
    fn dragging_pins_tile_to_drag_height() {
        let mut board = full_pool();
        assert!(!board.drag_to(Vec3::ONE), "moved while idle");

        board.begin_drag(tile(2));
        assert!(board.drag_to(Vec3::new(1.0, 3.0, -2.0)), "move while dragging");

        assert_eq!(position(&board, 2), Vec3::new(1.0, 0.1, -2.0), "pinned height");
        assert!(board.grid().occupied().next().is_none(), "no slot change during move");
    }

    #[test]
    fn drop_on_empty_slot_places_tile() {
        let mut board = full_pool();
        board.place_tile(tile(1), slot(0));

        let outcome = drag_and_drop(&mut board, 5, Some(4));

        assert_eq!(outcome, DropOutcome::Placed(slot(4)), "outcome");
        assert_eq!(board.grid().get(slot(4)), Some(tile(5)), "slot 4 holds tile 5");
        assert_eq!(board.grid().get(slot(0)), Some(tile(1)), "other slot untouched");
        assert_eq!(position(&board, 5), Vec3::new(0.0, 0.1, 0.0), "tile moved onto slot");
        assert!(!board.is_solved(), "one correct tile does not solve the puzzle");
        assert_eq!(board.drag_state(), DragState::Idle, "session cleared");
    }

    #[test]
    fn drop_outside_grid_returns_free_tile() {
        let mut board = full_pool();
        let staged = position(&board, 6);

        board.begin_drag(tile(6));
        board.drag_to(Vec3::new(4.0, 0.0, 4.0));
        let outcome = board.end_drag(None);

        assert_eq!(outcome, Some(DropOutcome::Returned { slot: None }), "outcome");
        assert_eq!(position(&board, 6), staged, "back at staging position");
        assert_eq!(board.find_slot_of(tile(6)), None, "still off-grid");
    }

    #[test]
    fn drop_outside_grid_restores_origin_slot() {
        let mut board = full_pool();
        board.place_tile(tile(6), slot(2));
        board.place_tile(tile(8), slot(7));

        board.begin_drag(tile(6));
        board.drag_to(Vec3::new(4.0, 0.0, 4.0));
        let outcome = board.end_drag(None);

        assert_eq!(outcome, Some(DropOutcome::Returned { slot: Some(slot(2)) }), "outcome");
        assert_eq!(board.grid().get(slot(2)), Some(tile(6)), "occupancy restored");
        assert_eq!(board.grid().get(slot(7)), Some(tile(8)), "other slot untouched");
        assert_eq!(
            position(&board, 6),
            PuzzleConfig::default().slot_resting_position(slot(2)),
            "back on its slot"
        );
    }

    #[test]
    fn swap_between_slots() {
        let mut board = full_pool();
        board.place_tile(tile(1), slot(3));
        board.place_tile(tile(4), slot(0));

        let outcome = drag_and_drop(&mut board, 1, Some(0));

        assert_eq!(
            outcome,
            DropOutcome::Swapped {
                slot: slot(0),
                displaced: tile(4),
                displaced_to: Some(slot(3)),
            },
            "outcome"
        );
        assert_eq!(board.grid().get(slot(0)), Some(tile(1)), "dragged tile took slot 0");
        assert_eq!(board.grid().get(slot(3)), Some(tile(4)), "displaced tile took slot 3");
        assert_eq!(
            position(&board, 4),
            PuzzleConfig::default().slot_resting_position(slot(3)),
            "displaced tile moved onto slot 3"
        );
        assert_no_duplicates(&board);
    }

    #[test]
    fn swap_from_staging_strands_displaced_tile() {
        let mut board = full_pool();
        let staged = position(&board, 2);
        board.place_tile(tile(7), slot(1));

        let outcome = drag_and_drop(&mut board, 2, Some(1));

        assert_eq!(
            outcome,
            DropOutcome::Swapped {
                slot: slot(1),
                displaced: tile(7),
                displaced_to: None,
            },
            "outcome"
        );
        assert_eq!(board.grid().get(slot(1)), Some(tile(2)), "dragged tile placed");
        assert_eq!(board.find_slot_of(tile(7)), None, "displaced tile left the grid");
        assert_eq!(position(&board, 7), staged, "displaced tile took the free position");
        assert_no_duplicates(&board);
    }

    #[test]
    fn drop_on_own_slot_is_a_no_op() {
        let mut board = full_pool();
        board.place_tile(tile(9), slot(8));

        // The slot is vacated on pick up, so dropping back lands on an empty
        // slot; the identity guard covers a slot re-filled mid-drag.
        let outcome = drag_and_drop(&mut board, 9, Some(8));
        assert_eq!(outcome, DropOutcome::Placed(slot(8)), "re-placed");

        board.begin_drag(tile(9));
        board.place_tile(tile(9), slot(8));
        let outcome = board.end_drag(Some(slot(8)));
        assert_eq!(outcome, Some(DropOutcome::Unchanged(slot(8))), "guarded no-op");
        assert_eq!(board.grid().get(slot(8)), Some(tile(9)), "slot kept");
    }

    #[test]
    fn release_while_idle_is_ignored() {
        let mut board = full_pool();
        assert_eq!(board.end_drag(Some(slot(0))), None, "nothing to drop");
        assert!(board.grid().occupied().next().is_none(), "grid untouched");
    }

    #[test]
    fn solved_when_every_tile_in_its_slot() {
        let mut board = full_pool();
        for id in (1..=9).rev() {
            drag_and_drop(&mut board, id, Some(id - 1));
            assert_no_duplicates(&board);
            assert_eq!(board.is_solved(), id == 1, "solved only after the last drop");
        }
    }

    #[test]
    fn misplaced_pair_is_not_solved() {
        let mut board = full_pool();
        for id in TileId::all() {
            board.place_tile(id, id.correct_slot());
        }
        assert!(board.is_solved(), "all correct");

        drag_and_drop(&mut board, 1, Some(1));
        assert!(!board.is_solved(), "tiles 1 and 2 swapped");
        assert_eq!(board.grid().get(slot(0)), Some(tile(2)), "tile 2 moved to slot 0");
    }

    #[test]
    fn grid_display_shows_occupancy() {
        let mut grid = SlotGrid::default();
        grid.set(slot(0), tile(1));
        grid.set(slot(4), tile(5));

        assert_eq!(grid.to_string(), " 1  .  . \n .  5  . \n .  .  . \n", "rendering");
    }
}
