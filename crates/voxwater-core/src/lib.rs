//! Voxwater Core -- integer voxel liquid simulation.
//!
//! Liquid lives in a bounded 3D lattice of cells. Each cell holds an integer
//! volume and a behavioural state; every step reclassifies each cell from its
//! own volume, its six neighbours and a host-supplied obstacle oracle, then
//! applies the effect of that state. Volume is never created or destroyed
//! except by sources and sinks: the sum of all cells plus the shared excess
//! pool is conserved across steps.
//!
//! # Step Pipeline
//!
//! Each call to [`step::Simulation::step`] runs:
//!
//! 1. **Batch** -- Split live cells into two checkerboard parity batches.
//! 2. **Classify** -- Per batch, refresh neighbour caches and pick each
//!    cell's state. Runs on rayon with the `parallel` feature.
//! 3. **Execute** -- Apply each state in storage order, depositing flowed
//!    volume straight into neighbouring records.
//! 4. **Spawn** -- Insert queued cells into empty slots, merging collisions.
//! 5. **Retire** -- Remove cells that drained to zero.
//! 6. **Report** -- Bump the tick and return what changed.
//!
//! # Key Types
//!
//! - [`step::Simulation`] -- Owns the grid and runs steps.
//! - [`grid::GridIndex`] -- Dense region-bounded cell storage.
//! - [`cell::CellRecord`] -- Per-cell volume, state and neighbour cache.
//! - [`classify::classify`] -- The state classifier.
//! - [`transition::execute`] -- The per-state effects.
//! - [`oracle::ObstacleOracle`] -- Host-side solid geometry queries.
//! - [`sim::TickDriver`] -- Fixed-interval stepping from a host clock.
//! - [`observer::CellObserver`] -- Change notifications for a renderer.

pub mod cell;
pub mod classify;
pub mod config;
pub mod coord;
pub mod dirty;
pub mod excess;
pub mod fixed;
pub mod grid;
pub mod observer;
pub mod oracle;
pub mod sim;
pub mod step;
pub mod transition;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
