//! Scene loading pipeline: detect the format, deserialize, validate and
//! build a ready simulation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use voxwater_core::config::{ConfigError, Region, SimConfig};
use voxwater_core::coord::GridCoord;
use voxwater_core::fixed::checked_f64_to_fixed64;
use voxwater_core::grid::GridError;
use voxwater_core::oracle::SolidVoxels;
use voxwater_core::step::Simulation;

use crate::schema::{SceneData, coord};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneLoadError {
    /// No scene file with the requested name exists.
    #[error("scene '{name}' not found in {dir}")]
    MissingScene { name: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The unit size is NaN or does not fit the fixed-point range.
    #[error("unit size {0} is not representable")]
    InvalidUnitSize(f64),

    /// The scene's constants do not form a valid configuration.
    #[error("invalid scene configuration: {0}")]
    Config(#[from] ConfigError),

    /// A cell could not be placed in the grid.
    #[error("cannot place cell: {0}")]
    Grid(#[from] GridError),

    /// Two liquid, source or sink entries share a coordinate.
    #[error("more than one cell placed at {at}")]
    DuplicateCell { at: GridCoord },

    /// A liquid, source or sink entry sits inside a solid box.
    #[error("cell at {at} lies inside a solid")]
    CellInsideSolid { at: GridCoord },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported scene file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    const ALL: [(Format, &'static str); 3] =
        [(Format::Ron, "ron"), (Format::Toml, "toml"), (Format::Json, "json")];
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, SceneLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .iter()
        .find(|(_, name)| Some(*name) == ext)
        .map(|&(format, _)| format)
        .ok_or_else(|| SceneLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `{name}.ron`, `{name}.toml` or `{name}.json` in `dir`.
///
/// Exactly one of them must exist.
pub fn find_scene_file(dir: &Path, name: &str) -> Result<PathBuf, SceneLoadError> {
    let mut found: Option<PathBuf> = None;

    for (_, ext) in Format::ALL {
        let candidate = dir.join(format!("{name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(SceneLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    found.ok_or_else(|| SceneLoadError::MissingScene {
        name: name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn deserialize<T: DeserializeOwned>(
    text: &str,
    format: Format,
    file: &Path,
) -> Result<T, SceneLoadError> {
    let parse_err = |detail: String| SceneLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(text).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string())),
    }
}

/// Parse a scene held in memory.
pub fn parse_scene(text: &str, format: Format) -> Result<SceneData, SceneLoadError> {
    deserialize(text, format, Path::new("<memory>"))
}

/// Read and parse a scene file, detecting its format from the extension.
pub fn load_scene_file(path: &Path) -> Result<SceneData, SceneLoadError> {
    let format = detect_format(path)?;
    let text = std::fs::read_to_string(path)?;
    deserialize(&text, format, path)
}

// ===========================================================================
// Building
// ===========================================================================

/// Turn a parsed scene into a simulation ready to step.
pub fn build_simulation(scene: &SceneData) -> Result<Simulation<SolidVoxels>, SceneLoadError> {
    let unit_size = checked_f64_to_fixed64(scene.unit_size)
        .ok_or(SceneLoadError::InvalidUnitSize(scene.unit_size))?;
    let config = SimConfig {
        region: Region::new(coord(scene.region.min), coord(scene.region.max)),
        unit_size,
        tick_interval: scene.tick_interval,
        source_emission: scene.source_emission,
    };

    let mut solids = SolidVoxels::new();
    for solid in &scene.solids {
        solids.fill_box(coord(solid.min), coord(solid.max));
    }

    let mut occupied = BTreeSet::new();
    let placements = scene
        .liquid
        .iter()
        .map(|c| c.at)
        .chain(scene.sources.iter().copied())
        .chain(scene.sinks.iter().copied());
    for at in placements.map(coord) {
        if !occupied.insert(at) {
            return Err(SceneLoadError::DuplicateCell { at });
        }
        if solids.contains(at) {
            return Err(SceneLoadError::CellInsideSolid { at });
        }
    }

    let mut sim = Simulation::new(config, solids)?;
    for cell in &scene.liquid {
        sim.place_liquid(coord(cell.at), cell.volume)?;
    }
    for &at in &scene.sources {
        sim.place_source(coord(at))?;
    }
    for &at in &scene.sinks {
        sim.place_sink(coord(at))?;
    }

    log::debug!(
        "built scene {}: {} cells, {} units, {} solid voxels",
        scene.name.as_deref().unwrap_or("<unnamed>"),
        sim.cell_count(),
        sim.total_volume(),
        sim.oracle().len()
    );
    Ok(sim)
}

/// Load a scene file and build its simulation in one go.
pub fn load_simulation(path: &Path) -> Result<Simulation<SolidVoxels>, SceneLoadError> {
    build_simulation(&load_scene_file(path)?)
}

// ===========================================================================
// Tests
// ===========================================================================
