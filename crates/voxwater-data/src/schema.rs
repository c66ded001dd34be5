//! Serde structs for scene files.
//!
//! Coordinates are written as `[x, y, z]` triples (`(x, y, z)` in RON).
//! Everything except the region has a default, so a minimal scene is just
//! a region and some liquid.

use serde::Deserialize;
use voxwater_core::coord::GridCoord;

// ===========================================================================
// Scene
// ===========================================================================

/// A complete scene definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneData {
    #[serde(default)]
    pub name: Option<String>,
    pub region: RegionData,
    /// World-space edge length of one cell.
    #[serde(default = "default_unit_size")]
    pub unit_size: f64,
    /// Host ticks between simulation steps.
    #[serde(default = "default_tick_interval")]
    pub tick_interval: u64,
    #[serde(default = "default_source_emission")]
    pub source_emission: u32,
    #[serde(default)]
    pub liquid: Vec<CellData>,
    #[serde(default)]
    pub sources: Vec<[i32; 3]>,
    #[serde(default)]
    pub sinks: Vec<[i32; 3]>,
    #[serde(default)]
    pub solids: Vec<SolidBox>,
}

fn default_unit_size() -> f64 {
    1.0
}

fn default_tick_interval() -> u64 {
    50
}

fn default_source_emission() -> u32 {
    10
}

// ===========================================================================
// Parts
// ===========================================================================

/// Inclusive region bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RegionData {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

/// One initial liquid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CellData {
    pub at: [i32; 3],
    pub volume: u32,
}

/// An inclusive box of solid voxels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SolidBox {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

/// Convert a `[x, y, z]` triple from a scene file.
pub fn coord([x, y, z]: [i32; 3]) -> GridCoord {
    GridCoord::new(x, y, z)
}
