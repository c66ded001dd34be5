//! Scene files for the voxel liquid core.
//!
//! A scene describes a region, its tuning constants, the solid geometry and
//! the initial liquid, sources and sinks. Scenes are written in RON, TOML or
//! JSON and turned into a ready [`Simulation`](voxwater_core::step::Simulation).

pub mod loader;
pub mod schema;

pub use loader::{
    Format, SceneLoadError, build_simulation, detect_format, find_scene_file, load_scene_file,
    load_simulation, parse_scene,
};
pub use schema::SceneData;
