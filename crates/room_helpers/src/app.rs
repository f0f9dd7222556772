use bevy::asset::{AssetMetaCheck, AssetMode, AssetPlugin};
use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::render::settings::{
    Backends, PowerPreference, RenderCreation, WgpuSettings, WgpuSettingsPriority,
};
use bevy::window::{PresentMode, WindowMode, WindowResolution};

#[cfg(target_arch = "wasm32")]
use crate::window_resizing::handle_browser_resize;

pub const WINDOW_WIDTH: f32 = 1280.0;
pub const WINDOW_HEIGHT: f32 = 720.0;

/// Canvas element the game attaches to when running in a browser.
pub const CANVAS_SELECTOR: &str = "#puzzle-room";

/// Where assets are served from. Browser builds are deployed side by side,
/// one directory per game version.
pub fn asset_root(name: &str, version: &str, web: bool) -> String {
    if web {
        format!("games/{name}-{version}/assets")
    } else {
        "assets".to_string()
    }
}

fn asset_plugin(name: &str, version: &str) -> AssetPlugin {
    AssetPlugin {
        mode: AssetMode::Unprocessed,
        file_path: asset_root(name, version, cfg!(target_arch = "wasm32")),
        processed_file_path: "imported_assets/Default".to_string(),
        watch_for_changes_override: None,
        meta_check: AssetMetaCheck::Never,
    }
}

fn window_plugin(title: &str) -> WindowPlugin {
    WindowPlugin {
        primary_window: Some(Window {
            title: title.to_string(),
            present_mode: PresentMode::Fifo,
            resolution: WindowResolution::new(WINDOW_WIDTH, WINDOW_HEIGHT),
            canvas: Some(CANVAS_SELECTOR.into()),
            fit_canvas_to_parent: true,
            mode: WindowMode::Windowed,
            // Keep browser shortcuts like F5 working.
            prevent_default_event_handling: false,
            ..default()
        }),
        ..default()
    }
}

fn render_plugin() -> RenderPlugin {
    RenderPlugin {
        render_creation: RenderCreation::Automatic(WgpuSettings {
            backends: Some(Backends::BROWSER_WEBGPU | Backends::GL),
            power_preference: PowerPreference::HighPerformance,
            priority: WgpuSettingsPriority::Functionality,
            ..default()
        }),
        ..default()
    }
}

/// Builds the app with window, asset and render settings for `name`.
/// Game plugins are added by the caller.
pub fn get_default_app(name: &str, version: &str) -> App {
    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(asset_plugin(name, version))
            .set(window_plugin(name))
            .set(render_plugin()),
    )
    // https://github.com/aevyrie/bevy_framepace
    .add_plugins(bevy_framepace::FramepacePlugin)
    .insert_resource(ClearColor(Color::BLACK));

    #[cfg(target_arch = "wasm32")]
    app.add_systems(PreUpdate, handle_browser_resize);

    info!("Built app for {name} {version}");
    app
}
