//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::{Region, SimConfig};
use crate::coord::GridCoord;
use crate::fixed::Fixed64;
use crate::observer::{CellObserver, CellView};
use crate::oracle::{NoObstacles, SolidVoxels};
use crate::step::{Simulation, StepReport};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Configs
// ===========================================================================

/// A 17-cell cube centred on the origin.
pub fn small_region() -> Region {
    Region::new(GridCoord::new(-8, -8, -8), GridCoord::new(8, 8, 8))
}

pub fn small_config() -> SimConfig {
    SimConfig::new(small_region())
}

// ===========================================================================
// Geometry
// ===========================================================================

/// An open-topped box: floor at `y = -1`, walls at `x, z = ±(half + 1)`.
///
/// The interior is the `(2 * half + 1)`-wide square column over the floor.
pub fn basin(half: i32, wall_height: i32) -> SolidVoxels {
    let mut solids = SolidVoxels::new();
    let w = half + 1;
    solids.fill_box(GridCoord::new(-w, -1, -w), GridCoord::new(w, -1, w));
    for y in 0..wall_height {
        solids.fill_box(GridCoord::new(-w, y, -w), GridCoord::new(w, y, -w));
        solids.fill_box(GridCoord::new(-w, y, w), GridCoord::new(w, y, w));
        solids.fill_box(GridCoord::new(-w, y, -w), GridCoord::new(-w, y, w));
        solids.fill_box(GridCoord::new(w, y, -w), GridCoord::new(w, y, w));
    }
    solids
}

/// A flat solid floor at `y = -1` across the whole region.
pub fn floor(region: Region) -> SolidVoxels {
    let mut solids = SolidVoxels::new();
    solids.fill_box(
        GridCoord::new(region.min.x, -1, region.min.z),
        GridCoord::new(region.max.x, -1, region.max.z),
    );
    solids
}

// ===========================================================================
// Simulation builders
// ===========================================================================

pub fn open_sim() -> Simulation<NoObstacles> {
    Simulation::new(small_config(), NoObstacles).expect("small config is valid")
}

pub fn basin_sim(half: i32, wall_height: i32) -> Simulation<SolidVoxels> {
    Simulation::new(small_config(), basin(half, wall_height)).expect("small config is valid")
}

pub fn floor_sim() -> Simulation<SolidVoxels> {
    Simulation::new(small_config(), floor(small_region())).expect("small config is valid")
}

/// Place `count` cells of `volume` in a vertical stack starting at `base`.
pub fn place_column<O: crate::oracle::ObstacleOracle>(
    sim: &mut Simulation<O>,
    base: GridCoord,
    count: i32,
    volume: u32,
) {
    for dy in 0..count {
        sim.place_liquid(GridCoord::new(base.x, base.y + dy, base.z), volume)
            .expect("column inside region");
    }
}

/// Scatter `count` cells with volumes in `1..=max_volume` over the region.
///
/// Positions and volumes come from a fixed xorshift sequence seeded by
/// `seed`, so the same arguments always build the same world.
pub fn scatter<O: crate::oracle::ObstacleOracle>(
    sim: &mut Simulation<O>,
    seed: u64,
    count: usize,
    max_volume: u32,
) {
    let region = sim.config().region;
    let (ex, ey, ez) = region.extent().expect("valid region");
    let mut state = seed | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    for _ in 0..count {
        let coord = GridCoord::new(
            region.min.x + (next() % ex as u64) as i32,
            region.min.y + (next() % ey as u64) as i32,
            region.min.z + (next() % ez as u64) as i32,
        );
        let volume = 1 + (next() % u64::from(max_volume.max(1))) as u32;
        sim.place_liquid(coord, volume).expect("scatter stays in region");
    }
}

/// Run `n` steps and collect their reports.
pub fn run_steps<O: crate::oracle::ObstacleOracle>(
    sim: &mut Simulation<O>,
    n: usize,
) -> Vec<StepReport> {
    (0..n).map(|_| sim.step()).collect()
}

// ===========================================================================
// Observer
// ===========================================================================

/// Records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub changed: Vec<CellView>,
    pub removed: Vec<GridCoord>,
}

impl CellObserver for RecordingObserver {
    fn cell_changed(&mut self, view: &CellView) {
        self.changed.push(*view);
    }

    fn cell_removed(&mut self, coord: GridCoord) {
        self.removed.push(coord);
    }
}
