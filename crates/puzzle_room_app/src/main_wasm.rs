use wasm_bindgen::prelude::*;
use web_sys::console;

pub(crate) fn main_wasm() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("No browser window"))?;
    console::log_1(&format!("Starting puzzle room at {}", window.location().href()?).into());
    puzzle_room::run();
    Ok(())
}
