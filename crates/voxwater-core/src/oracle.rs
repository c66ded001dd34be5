//! The boundary predicate: is there a solid obstacle next to a cell?
//!
//! The host collision system sits behind [`ObstacleOracle`]. The core asks
//! one question per direction per classification and never caches the
//! answer across calls, since obstacles can move between ticks.

use std::collections::BTreeSet;

use crate::coord::{Direction, GridCoord};

/// Errors an obstacle query can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObstacleError {
    /// The host collision system could not answer.
    #[error("obstacle query unavailable: {0}")]
    Unavailable(String),
}

/// Answers "does a solid obstacle occupy the slot one unit from `origin`
/// in `direction`?".
///
/// Implementations must be non-blocking and must not cache across ticks.
pub trait ObstacleOracle: Send + Sync {
    fn exists(&self, origin: GridCoord, direction: Direction) -> Result<bool, ObstacleError>;
}

/// Ask the oracle, treating a failed query as "obstacle present".
pub fn probe<O: ObstacleOracle + ?Sized>(oracle: &O, origin: GridCoord, direction: Direction) -> bool {
    match oracle.exists(origin, direction) {
        Ok(blocked) => blocked,
        Err(err) => {
            log::warn!("obstacle query at {origin} toward {direction:?} failed: {err}; treating as blocked");
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Memoised probes for a single classification
// ---------------------------------------------------------------------------

/// Per-call memo of obstacle answers around one cell.
///
/// Each direction is queried at most once over the lifetime of a scan. A
/// scan lives for one classification (or one transition) and is then
/// dropped.
pub struct ObstacleScan<'a, O: ObstacleOracle + ?Sized> {
    oracle: &'a O,
    origin: GridCoord,
    answers: [Option<bool>; 6],
}

impl<'a, O: ObstacleOracle + ?Sized> ObstacleScan<'a, O> {
    pub fn new(oracle: &'a O, origin: GridCoord) -> Self {
        Self {
            oracle,
            origin,
            answers: [None; 6],
        }
    }

    pub fn blocked(&mut self, direction: Direction) -> bool {
        let (oracle, origin) = (self.oracle, self.origin);
        *self.answers[direction.index()].get_or_insert_with(|| probe(oracle, origin, direction))
    }
}

// ---------------------------------------------------------------------------
// Stock oracles
// ---------------------------------------------------------------------------

/// An open world with no obstacles at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl ObstacleOracle for NoObstacles {
    fn exists(&self, _origin: GridCoord, _direction: Direction) -> Result<bool, ObstacleError> {
        Ok(false)
    }
}

/// A voxel obstacle map: a set of solid lattice coordinates.
#[derive(Debug, Clone, Default)]
pub struct SolidVoxels {
    solids: BTreeSet<GridCoord>,
}

impl SolidVoxels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coord: GridCoord) {
        self.solids.insert(coord);
    }

    pub fn remove(&mut self, coord: GridCoord) -> bool {
        self.solids.remove(&coord)
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.solids.contains(&coord)
    }

    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Fill the inclusive box `[min, max]` with solid voxels.
    pub fn fill_box(&mut self, min: GridCoord, max: GridCoord) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.solids.insert(GridCoord::new(x, y, z));
                }
            }
        }
    }
}

impl ObstacleOracle for SolidVoxels {
    fn exists(&self, origin: GridCoord, direction: Direction) -> Result<bool, ObstacleError> {
        Ok(self.contains(origin.step(direction)))
    }
}

/// Adapts a closure into an oracle, e.g. a raycast into a host physics world.
pub struct FnOracle<F>(pub F);

impl<F> ObstacleOracle for FnOracle<F>
where
    F: Fn(GridCoord, Direction) -> Result<bool, ObstacleError> + Send + Sync,
{
    fn exists(&self, origin: GridCoord, direction: Direction) -> Result<bool, ObstacleError> {
        (self.0)(origin, direction)
    }
}
