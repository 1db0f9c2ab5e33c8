//! glass-grid
//!
//! Loads an equirectangular HDR environment and a batch of normal maps, then
//! renders one glass panel per normal map on a centred three-row grid. Runs
//! natively and in the browser (WebGL2) from the same code.
//!
//! High-level modules
//! - `camera`: perspective camera, orbit controls and the camera uniform
//! - `config`: code-level scene configuration and its defaults
//! - `context`: window and GPU context that owns device, queue and uniforms
//! - `data_structures`: scene data (assets, environment, geometry, grid, materials)
//! - `flow`: application shell and event loop
//! - `loading`: the environment -> textures -> grid pipeline
//! - `pipelines`: the glass render pipeline and light uniform
//! - `resources`: asset sources and the async loaders
//! - `render`: the frame loop and GPU upload of a scene
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod loading;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use config::SceneConfig;
pub use flow::run;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run(SceneConfig::default()).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
