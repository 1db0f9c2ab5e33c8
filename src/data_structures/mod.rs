//! Scene data: everything between decoded bytes and GPU buffers.
//!
//! - `asset` holds decoded normal maps and their wrap configuration
//! - `environment` holds the prefiltered environment chain and its generator
//! - `geometry` holds the vertex layout and the shared panel box
//! - `grid` places panels on the centred row-major grid
//! - `instance` holds per-instance transformation data
//! - `material` describes the glass look
//! - `scene` is the registry the loading pipeline fills
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod asset;
pub mod environment;
pub mod geometry;
pub mod grid;
pub mod instance;
pub mod material;
pub mod scene;
pub mod texture;
