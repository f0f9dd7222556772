use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_kira_audio::prelude::*;

use crate::Screen;
use crate::countdown::Countdown;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default, States)]
enum AudioAssetState {
    #[default]
    Loading,
    Loaded,
}

#[derive(AssetCollection, Resource)]
struct AudioAssets {
    #[asset(path = "audio/background.ogg")]
    background: Handle<bevy_kira_audio::prelude::AudioSource>,
    #[asset(path = "audio/ticking.ogg")]
    ticking: Handle<bevy_kira_audio::prelude::AudioSource>,
}

#[derive(Resource)]
struct MusicChannel;

#[derive(Resource)]
struct TickingChannel;

/// Which loops are currently playing. Browsers refuse audio before the first
/// user gesture, so music stays off until the start screen is left.
#[derive(Resource, Default, Debug)]
struct AudioCues {
    music_unlocked: bool,
    music_playing: bool,
    ticking_playing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueChange {
    Play,
    Stop,
}

pub const fn cue_change(wanted: bool, playing: bool) -> Option<CueChange> {
    match (wanted, playing) {
        (true, false) => Some(CueChange::Play),
        (false, true) => Some(CueChange::Stop),
        _ => None,
    }
}

/// Background music plays everywhere but the puzzle screen, once unlocked.
pub fn music_wanted(screen: Screen, unlocked: bool) -> bool {
    unlocked && screen != Screen::Puzzle
}

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(AudioPlugin)
            .add_audio_channel::<MusicChannel>()
            .add_audio_channel::<TickingChannel>()
            .init_resource::<AudioCues>()
            .init_state::<AudioAssetState>()
            .add_loading_state(
                LoadingState::new(AudioAssetState::Loading)
                    .continue_to_state(AudioAssetState::Loaded)
                    .load_collection::<AudioAssets>(),
            )
            .add_systems(OnExit(Screen::Start), unlock_music)
            .add_systems(
                Update,
                (sync_background_music, sync_ticking).run_if(in_state(AudioAssetState::Loaded)),
            );
    }
}

fn unlock_music(mut cues: ResMut<AudioCues>) {
    cues.music_unlocked = true;
}

fn sync_background_music(
    screen: Res<State<Screen>>,
    assets: Res<AudioAssets>,
    channel: Res<AudioChannel<MusicChannel>>,
    mut cues: ResMut<AudioCues>,
) {
    let wanted = music_wanted(*screen.get(), cues.music_unlocked);
    match cue_change(wanted, cues.music_playing) {
        Some(CueChange::Play) => {
            channel.play(assets.background.clone_weak()).looped();
            cues.music_playing = true;
        }
        Some(CueChange::Stop) => {
            channel.stop();
            cues.music_playing = false;
        }
        None => {}
    }
}

fn sync_ticking(
    countdown: Option<Res<Countdown>>,
    assets: Res<AudioAssets>,
    channel: Res<AudioChannel<TickingChannel>>,
    mut cues: ResMut<AudioCues>,
) {
    let wanted = countdown.is_some_and(|countdown| countdown.is_running());
    match cue_change(wanted, cues.ticking_playing) {
        Some(CueChange::Play) => {
            channel.play(assets.ticking.clone_weak()).looped();
            cues.ticking_playing = true;
        }
        Some(CueChange::Stop) => {
            channel.stop();
            cues.ticking_playing = false;
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cues_only_change_on_mismatch() {
        assert_eq!(cue_change(true, false), Some(CueChange::Play), "start loop");
        assert_eq!(cue_change(false, true), Some(CueChange::Stop), "stop loop");
        assert_eq!(cue_change(true, true), None, "already playing");
        assert_eq!(cue_change(false, false), None, "already silent");
    }

    #[test]
    fn music_pauses_for_the_puzzle() {
        assert!(!music_wanted(Screen::Start, false), "locked before first gesture");
        assert!(music_wanted(Screen::Viewer, true), "viewer plays music");
        assert!(!music_wanted(Screen::Puzzle, true), "puzzle is silent");
        assert!(music_wanted(Screen::Start, true), "resumes after play again");
    }
}
