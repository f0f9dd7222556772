use bevy::asset::AssetLoadFailedEvent;
use bevy::prelude::*;
use bevy::window::CursorMoved;
use room_helpers::cleanup::{despawn_marked, remove_resource};
use room_helpers::input::{
    held_ray, just_pressed_ray, just_released_ray, pointer_just_pressed, pointer_just_released,
    pointer_moved,
};

use crate::board::{DragState, PuzzleBoard, SlotIndex, Tile, TileId};
use crate::config::PuzzleConfig;
use crate::countdown::{Countdown, TimerText, format_remaining, tick_countdown, update_timer_text};
use crate::picking::{drag_plane_point, slot_at, tile_at};
use crate::screen::spawn_outcome_overlay;
use crate::{MainCamera, Screen};

/// Progress of the puzzle screen. Pointer input and the countdown only run
/// while `Playing`; reaching an outcome moves to `Finished`, which freezes
/// the board.
#[derive(States, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PuzzlePhase {
    #[default]
    Inactive,
    Playing,
    Finished,
}

#[derive(Event, Debug, Copy, Clone, PartialEq, Eq)]
pub enum PuzzleOutcome {
    Solved { seconds: u32 },
    TimedOut,
}

/// Tags everything the puzzle screen spawns.
#[derive(Component)]
pub struct PuzzleEntity;

#[derive(Component)]
pub struct TileVisual {
    pub id: TileId,
}

/// Tile images requested but not yet turned into tiles.
#[derive(Resource)]
pub struct PendingTiles {
    mesh: Handle<Mesh>,
    images: Vec<(TileId, Handle<Image>)>,
}

pub fn tile_image_path(id: TileId) -> String {
    format!("tiles/{}.jpg", id.get())
}

pub struct PuzzlePlugin;

impl Plugin for PuzzlePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<PuzzlePhase>()
            .add_event::<PuzzleOutcome>()
            .add_systems(OnEnter(Screen::Puzzle), setup_puzzle)
            .add_systems(
                OnExit(Screen::Puzzle),
                (
                    despawn_marked::<PuzzleEntity>,
                    remove_resource::<PuzzleBoard>,
                    remove_resource::<Countdown>,
                    remove_resource::<PendingTiles>,
                    deactivate_puzzle,
                ),
            )
            .add_systems(
                Update,
                (
                    (pick_up_tile, drag_tile, drop_tile, tick_countdown, finish_puzzle)
                        .chain()
                        .run_if(in_state(PuzzlePhase::Playing))
                        .run_if(resource_exists::<PuzzleBoard>),
                    (spawn_loaded_tiles, sync_tile_transforms, update_timer_text)
                        .chain()
                        .run_if(in_state(Screen::Puzzle)),
                ),
            );
    }
}

fn setup_puzzle(
    mut commands: Commands,
    config: Res<PuzzleConfig>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut camera: Query<&mut Transform, With<MainCamera>>,
    mut next_phase: ResMut<NextState<PuzzlePhase>>,
) {
    if let Ok(mut transform) = camera.get_single_mut() {
        *transform = Transform::from_xyz(0.0, config.camera_height, 0.0)
            .looking_at(Vec3::ZERO, Vec3::NEG_Z);
    }

    // Slot boxes
    let box_mesh = meshes.add(Cuboid::new(
        config.slot_box_size,
        config.slot_box_height,
        config.slot_box_size,
    ));
    let box_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.0, 0.0, 1.0, 0.5),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });
    for slot in SlotIndex::all() {
        commands.spawn((
            Mesh3d(box_mesh.clone()),
            MeshMaterial3d(box_material.clone()),
            Transform::from_translation(config.slot_anchor(slot)),
            PuzzleEntity,
        ));
    }

    // Timer display
    commands.spawn((
        Text::new(format_remaining(config.countdown_secs)),
        TextFont {
            font_size: 32.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            justify_self: JustifySelf::Center,
            ..default()
        },
        TimerText,
        PuzzleEntity,
    ));

    // Tiles appear one by one as their images finish loading.
    commands.insert_resource(PendingTiles {
        mesh: meshes.add(Plane3d::default().mesh().size(config.tile_size, config.tile_size)),
        images: TileId::all()
            .map(|id| (id, asset_server.load(tile_image_path(id))))
            .collect(),
    });

    commands.insert_resource(PuzzleBoard::new(config.clone()));
    let mut countdown = Countdown::new(config.countdown_secs);
    countdown.start();
    commands.insert_resource(countdown);

    next_phase.set(PuzzlePhase::Playing);
    info!("Puzzle started with {}s on the clock", config.countdown_secs);
}

fn deactivate_puzzle(mut next_phase: ResMut<NextState<PuzzlePhase>>) {
    next_phase.set(PuzzlePhase::Inactive);
}

fn spawn_loaded_tiles(
    mut commands: Commands,
    images: Res<Assets<Image>>,
    mut failures: EventReader<AssetLoadFailedEvent<Image>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    pending: Option<ResMut<PendingTiles>>,
    board: Option<ResMut<PuzzleBoard>>,
) {
    let (Some(mut pending), Some(mut board)) = (pending, board) else {
        failures.clear();
        return;
    };

    for failure in failures.read() {
        let waiting = pending.images.len();
        pending.images.retain(|(_, image)| image.id() != failure.id);
        if pending.images.len() < waiting {
            error!("Could not load {}: {}", failure.path, failure.error);
        }
    }

    let (ready, still_loading): (Vec<_>, Vec<_>) = core::mem::take(&mut pending.images)
        .into_iter()
        .partition(|(_, image)| images.contains(image.id()));
    pending.images = still_loading;

    for (id, image) in ready {
        if !board.add_tile(id) {
            continue;
        }
        let position = board.tile(id).map_or(Vec3::ZERO, Tile::position);
        commands.spawn((
            Mesh3d(pending.mesh.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color_texture: Some(image),
                unlit: true,
                ..default()
            })),
            Transform::from_translation(position),
            TileVisual { id },
            PuzzleEntity,
        ));
        debug!("{id} loaded");
    }
}

fn pick_up_tile(
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window>,
    camera: Query<(&Camera, &GlobalTransform)>,
    mut board: ResMut<PuzzleBoard>,
) {
    let Some(ray) = just_pressed_ray(&buttons, &touches, &windows, &camera) else {
        return;
    };
    if let Some(id) = tile_at(ray, &board) {
        board.begin_drag(id);
    }
}

fn drag_tile(
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    mut cursor_moved: EventReader<CursorMoved>,
    windows: Query<&Window>,
    camera: Query<(&Camera, &GlobalTransform)>,
    mut board: ResMut<PuzzleBoard>,
) {
    // A freshly picked tile stays put until the pointer moves.
    let moved = pointer_moved(&mut cursor_moved, &touches);
    if board.drag_state() == DragState::Idle || pointer_just_pressed(&buttons, &touches) || !moved
    {
        return;
    }
    let Some(ray) = held_ray(&buttons, &touches, &windows, &camera) else {
        return;
    };
    if let Some(point) = drag_plane_point(ray, board.config()) {
        board.drag_to(point);
    }
}

fn drop_tile(
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows: Query<&Window>,
    camera: Query<(&Camera, &GlobalTransform)>,
    mut board: ResMut<PuzzleBoard>,
    mut countdown: ResMut<Countdown>,
    mut outcomes: EventWriter<PuzzleOutcome>,
) {
    if !pointer_just_released(&buttons, &touches) {
        return;
    }
    // A release outside the window counts as a drop away from the grid.
    let target = just_released_ray(&buttons, &touches, &windows, &camera)
        .and_then(|ray| slot_at(ray, board.config()));
    if board.end_drag(target).is_none() {
        return;
    }

    if board.is_solved() {
        countdown.stop();
        outcomes.send(PuzzleOutcome::Solved {
            seconds: countdown.elapsed_secs(),
        });
    }
}

fn finish_puzzle(
    mut commands: Commands,
    mut outcomes: EventReader<PuzzleOutcome>,
    mut countdown: ResMut<Countdown>,
    mut next_phase: ResMut<NextState<PuzzlePhase>>,
) {
    // A win and a timeout can land in the same frame; the first one counts.
    let Some(outcome) = outcomes.read().next().copied() else {
        return;
    };
    outcomes.clear();

    countdown.stop();
    info!("Puzzle finished: {outcome:?}");
    spawn_outcome_overlay(&mut commands, outcome);
    next_phase.set(PuzzlePhase::Finished);
}

fn sync_tile_transforms(
    board: Option<Res<PuzzleBoard>>,
    mut tiles: Query<(&TileVisual, &mut Transform)>,
) {
    let Some(board) = board else {
        return;
    };
    if !board.is_changed() {
        return;
    }
    for (visual, mut transform) in &mut tiles {
        if let Some(tile) = board.tile(visual.id) {
            transform.translation = tile.position();
        }
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use bevy::asset::io::AssetReaderError;
    use bevy::state::app::StatesPlugin;

    use super::*;

    fn tile(index: usize) -> TileId {
        TileId::new(index).expect("valid tile")
    }

    fn slot(index: usize) -> SlotIndex {
        SlotIndex::new(index).expect("valid slot")
    }

    #[test]
    fn tile_images_follow_numbering() {
        assert_eq!(tile_image_path(tile(1)), "tiles/1.jpg", "first tile");
        assert_eq!(tile_image_path(tile(9)), "tiles/9.jpg", "last tile");
    }

    #[test]
    fn tile_entities_follow_the_board() {
        let mut world = World::new();
        let mut board = PuzzleBoard::new(PuzzleConfig::default());
        board.add_tile(tile(3));
        board.place_tile(tile(3), slot(4));
        world.insert_resource(board);
        let entity = world
            .spawn((TileVisual { id: tile(3) }, Transform::default()))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(sync_tile_transforms);
        schedule.run(&mut world);

        let translation = world.get::<Transform>(entity).map(|t| t.translation);
        assert_eq!(translation, Some(Vec3::new(0.0, 0.1, 0.0)), "moved onto the center slot");
    }

    fn loading_world(ids: &[usize]) -> (World, Vec<Handle<Image>>) {
        let mut world = World::new();
        world.init_resource::<Assets<Image>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.init_resource::<Events<AssetLoadFailedEvent<Image>>>();
        world.insert_resource(PuzzleBoard::new(PuzzleConfig::default()));

        let handles: Vec<_> = ids
            .iter()
            .map(|index| Handle::<Image>::weak_from_u128(*index as u128 + 1000))
            .collect();
        world.insert_resource(PendingTiles {
            mesh: Handle::default(),
            images: ids.iter().map(|index| tile(*index)).zip(handles.clone()).collect(),
        });
        (world, handles)
    }

    fn spawned_tiles(world: &mut World) -> Vec<(TileId, Vec3)> {
        let mut query = world.query::<(&TileVisual, &Transform)>();
        let mut tiles: Vec<_> = query
            .iter(world)
            .map(|(visual, transform)| (visual.id, transform.translation))
            .collect();
        tiles.sort_by_key(|(id, _)| *id);
        tiles
    }

    fn pending_ids(world: &World) -> Vec<TileId> {
        world
            .resource::<PendingTiles>()
            .images
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    #[test]
    fn tiles_spawn_as_their_images_arrive() {
        let (mut world, handles) = loading_world(&[3, 5, 7, 8]);
        let [three, five, seven, eight] =
            <[Handle<Image>; 4]>::try_from(handles).expect("one handle per tile");
        {
            let mut images = world.resource_mut::<Assets<Image>>();
            images.insert(eight.id(), Image::default());
            images.insert(three.id(), Image::default());
        }
        world.send_event(AssetLoadFailedEvent::<Image> {
            id: seven.id(),
            path: "tiles/7.jpg".into(),
            error: AssetReaderError::NotFound("tiles/7.jpg".into()).into(),
        });

        let mut schedule = Schedule::default();
        schedule.add_systems(spawn_loaded_tiles);
        schedule.run(&mut world);

        let config = PuzzleConfig::default();
        assert_eq!(
            spawned_tiles(&mut world),
            [
                (tile(3), config.staging_position(tile(3))),
                (tile(8), config.staging_position(tile(8))),
            ],
            "only loaded tiles appear, at their staging spots"
        );
        assert_eq!(pending_ids(&world), [tile(5)], "failed tile no longer waited on");

        world
            .resource_mut::<Assets<Image>>()
            .insert(five.id(), Image::default());
        schedule.run(&mut world);
        schedule.run(&mut world);

        let spawned: Vec<_> = spawned_tiles(&mut world).into_iter().map(|(id, _)| id).collect();
        assert_eq!(spawned, [tile(3), tile(5), tile(8)], "late tile joins, none twice");
        assert!(pending_ids(&world).is_empty(), "nothing left to load");
        assert_eq!(world.resource::<PuzzleBoard>().tiles().len(), 3, "board pool");
    }

    fn finishing_app() -> App {
        let mut app = App::new();
        app.add_plugins(StatesPlugin)
            .init_state::<PuzzlePhase>()
            .add_event::<PuzzleOutcome>()
            .add_systems(Update, finish_puzzle.run_if(in_state(PuzzlePhase::Playing)));
        let mut countdown = Countdown::new(120);
        countdown.start();
        app.insert_resource(countdown);
        app.world_mut()
            .resource_mut::<NextState<PuzzlePhase>>()
            .set(PuzzlePhase::Playing);
        app.update();
        app
    }

    #[test]
    fn first_outcome_finishes_the_puzzle() {
        let mut app = finishing_app();
        app.world_mut().send_event(PuzzleOutcome::Solved { seconds: 42 });
        app.world_mut().send_event(PuzzleOutcome::TimedOut);
        app.update();
        app.update();

        let phase = *app.world().resource::<State<PuzzlePhase>>().get();
        assert_eq!(phase, PuzzlePhase::Finished, "board frozen");
        assert!(!app.world().resource::<Countdown>().is_running(), "countdown stopped");

        let mut overlays = app.world_mut().query::<&crate::screen::OutcomeOverlay>();
        let overlays: Vec<_> = overlays.iter(app.world()).collect();
        assert_eq!(overlays.len(), 1, "one notification");
        assert_eq!(
            overlays.first().map(|overlay| overlay.outcome),
            Some(PuzzleOutcome::Solved { seconds: 42 }),
            "win reported, timeout ignored"
        );
    }

    #[test]
    fn timeout_alone_ends_the_round() {
        let mut app = finishing_app();
        app.world_mut().send_event(PuzzleOutcome::TimedOut);
        app.update();
        app.update();

        let phase = *app.world().resource::<State<PuzzlePhase>>().get();
        assert_eq!(phase, PuzzlePhase::Finished, "board frozen");
        assert!(!app.world().resource::<Countdown>().is_running(), "countdown stopped");

        let mut overlays = app.world_mut().query::<&crate::screen::OutcomeOverlay>();
        let outcomes: Vec<_> = overlays.iter(app.world()).map(|overlay| overlay.outcome).collect();
        assert_eq!(outcomes, [PuzzleOutcome::TimedOut], "one lose notification");

        let mut texts = app.world_mut().query::<&Text>();
        let shown: Vec<_> = texts.iter(app.world()).map(|text| text.0.clone()).collect();
        assert!(
            shown.iter().any(|text| text == "Game Over! Time's up!"),
            "lose message shown, got {shown:?}"
        );
    }

    #[test]
    fn solving_reports_elapsed_seconds() {
        let mut app = App::new();
        app.add_event::<PuzzleOutcome>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<Touches>()
            .add_systems(Update, drop_tile);

        let mut board = PuzzleBoard::new(PuzzleConfig::default());
        for id in TileId::all() {
            board.add_tile(id);
            if id != tile(9) {
                board.place_tile(id, id.correct_slot());
            }
        }
        board.place_tile(tile(9), slot(8));
        board.begin_drag(tile(9));
        app.insert_resource(board);

        let mut countdown = Countdown::new(120);
        countdown.start();
        countdown.tick(Duration::from_secs(30));
        app.insert_resource(countdown);

        // Released with no window: treated as a drop away from the grid,
        // which puts tile 9 back into its origin slot.
        let mut buttons = app.world_mut().resource_mut::<ButtonInput<MouseButton>>();
        buttons.press(MouseButton::Left);
        buttons.release(MouseButton::Left);
        app.update();

        let events = app.world().resource::<Events<PuzzleOutcome>>();
        assert_eq!(
            events.iter_current_update_events().next(),
            Some(&PuzzleOutcome::Solved { seconds: 30 }),
            "solved after 30 seconds"
        );
        assert!(!app.world().resource::<Countdown>().is_running(), "countdown stopped on win");
    }
}
