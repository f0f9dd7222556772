mod app;
pub use app::*;

pub mod cleanup;
pub mod input;
pub mod ui;

pub mod window_resizing;
