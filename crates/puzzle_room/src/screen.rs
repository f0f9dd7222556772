use bevy::prelude::*;
use room_helpers::cleanup::despawn_marked;
use room_helpers::ui::{centered_column, spawn_button, spawn_title};
use strum::IntoEnumIterator;

use crate::Screen;
use crate::countdown::Countdown;
use crate::puzzle::{PuzzleEntity, PuzzleOutcome};
use crate::skybox::{Level, SelectedLevel};

/// What a button does when pressed.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    ChooseLevel(Level),
    EnterPuzzle,
    PlayAgain,
}

#[derive(Component)]
pub struct StartScreen;

#[derive(Component)]
pub struct LevelSelectScreen;

#[derive(Component)]
pub struct ViewerOverlay;

/// End-of-game notification, shown on top of the frozen board.
#[derive(Component)]
pub struct OutcomeOverlay {
    pub outcome: PuzzleOutcome,
}

pub struct ScreenPlugin;

impl Plugin for ScreenPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(Screen::Start), spawn_start_screen)
            .add_systems(OnExit(Screen::Start), despawn_marked::<StartScreen>)
            .add_systems(OnEnter(Screen::LevelSelect), spawn_level_select)
            .add_systems(
                OnExit(Screen::LevelSelect),
                despawn_marked::<LevelSelectScreen>,
            )
            .add_systems(OnEnter(Screen::Viewer), spawn_viewer_overlay)
            .add_systems(OnExit(Screen::Viewer), despawn_marked::<ViewerOverlay>)
            .add_systems(Update, handle_menu_actions);
    }
}

fn spawn_start_screen(mut commands: Commands) {
    commands
        .spawn((centered_column(), StartScreen))
        .with_children(|parent| {
            spawn_title(parent, "Puzzle Room", 64.0);
            spawn_button(parent, "Start", MenuAction::Start);
        });
}

fn spawn_level_select(mut commands: Commands) {
    commands
        .spawn((centered_column(), LevelSelectScreen))
        .with_children(|parent| {
            spawn_title(parent, "Choose a room", 48.0);
            for level in Level::iter() {
                spawn_button(parent, level.to_string(), MenuAction::ChooseLevel(level));
            }
        });
}

fn spawn_viewer_overlay(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(24.0),
                width: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                ..default()
            },
            ViewerOverlay,
        ))
        .with_children(|parent| {
            spawn_button(parent, "Move to puzzle", MenuAction::EnterPuzzle);
        });
}

pub fn outcome_message(outcome: PuzzleOutcome) -> String {
    match outcome {
        PuzzleOutcome::Solved { seconds } => {
            format!("Congratulations! You solved the puzzle in {seconds} seconds!")
        }
        PuzzleOutcome::TimedOut => "Game Over! Time's up!".to_string(),
    }
}

pub fn spawn_outcome_overlay(commands: &mut Commands, outcome: PuzzleOutcome) {
    commands
        .spawn((
            centered_column(),
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
            OutcomeOverlay { outcome },
            PuzzleEntity,
        ))
        .with_children(|parent| {
            spawn_title(parent, outcome_message(outcome), 40.0);
            spawn_button(parent, "Play again", MenuAction::PlayAgain);
        });
}

fn handle_menu_actions(
    interactions: Query<(&Interaction, &MenuAction), (Changed<Interaction>, With<Button>)>,
    mut next_screen: ResMut<NextState<Screen>>,
    mut selected_level: ResMut<SelectedLevel>,
    countdown: Option<ResMut<Countdown>>,
) {
    let Some(action) = interactions
        .iter()
        .find(|(interaction, _)| **interaction == Interaction::Pressed)
        .map(|(_, action)| *action)
    else {
        return;
    };
    info!("Menu action: {action:?}");

    match action {
        MenuAction::Start => next_screen.set(Screen::LevelSelect),
        MenuAction::ChooseLevel(level) => {
            selected_level.0 = level;
            next_screen.set(Screen::Viewer);
        }
        MenuAction::EnterPuzzle => next_screen.set(Screen::Puzzle),
        MenuAction::PlayAgain => {
            if let Some(mut countdown) = countdown {
                countdown.reset();
            }
            next_screen.set(Screen::Start);
        }
    }
}
