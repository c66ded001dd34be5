//! The state classifier: a pure function from a cell's volume, its cached
//! neighbours and the obstacle predicate to its next [`CellState`].
//!
//! Rules are evaluated in strict priority order; the first match wins.
//!
//! 1. Source -> `Create`, sink -> `Destroy`.
//! 2. Volume 0 -> `Empty`.
//! 3. No record below and no obstacle below -> `Fall`.
//! 4. At least one open side and volume > 1 -> `Flow`.
//! 5. The cell below is `Shallow` -> `Merge`.
//! 6. No open side, volume 1 -> `Still`.
//! 7. No open side, volume > 1 -> `Pressured`.
//! 8. Open sides, volume 1 -> `Shallow`.
//!
//! An open side is one of the five [`Direction::FLOW_ORDER`] directions whose
//! slot is absent or holds a cell that accepts inflow, and which no obstacle
//! blocks.

use crate::cell::{CellRecord, CellState, Neighbor};
use crate::coord::Direction;
use crate::oracle::{ObstacleOracle, ObstacleScan};

// ---------------------------------------------------------------------------
// Open sides
// ---------------------------------------------------------------------------

/// The set of open flow directions around a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenSides {
    /// Bit `i` set means `Direction::FLOW_ORDER[i]` is open.
    mask: u8,
}

impl OpenSides {
    pub fn count(self) -> u32 {
        self.mask.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.mask == 0
    }

    pub fn contains(self, direction: Direction) -> bool {
        Direction::FLOW_ORDER
            .iter()
            .position(|&d| d == direction)
            .is_some_and(|i| self.mask & (1 << i) != 0)
    }

    /// Open directions in flow order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::FLOW_ORDER
            .into_iter()
            .enumerate()
            .filter(move |&(i, _)| self.mask & (1 << i) != 0)
            .map(|(_, d)| d)
    }

    fn insert_index(&mut self, i: usize) {
        self.mask |= 1 << i;
    }
}

/// Compute the open sides of `cell`, probing obstacles through `scan`.
///
/// Obstacles are only queried for slots that are vacant, so a direction
/// occupied by liquid never costs a host query.
pub(crate) fn scan_open_sides<O: ObstacleOracle + ?Sized>(
    cell: &CellRecord,
    scan: &mut ObstacleScan<'_, O>,
) -> OpenSides {
    let mut open = OpenSides::default();
    for (i, dir) in Direction::FLOW_ORDER.into_iter().enumerate() {
        if cell.neighbor(dir).is_vacant() && !scan.blocked(dir) {
            open.insert_index(i);
        }
    }
    open
}

/// Open sides of `cell` using fresh obstacle queries.
pub fn open_sides<O: ObstacleOracle + ?Sized>(cell: &CellRecord, oracle: &O) -> OpenSides {
    let mut scan = ObstacleScan::new(oracle, cell.coord);
    scan_open_sides(cell, &mut scan)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Compute the next state of `cell` from its volume and cached neighbours.
///
/// Does not modify the cell. Each obstacle direction is queried at most once.
pub fn classify<O: ObstacleOracle + ?Sized>(cell: &CellRecord, oracle: &O) -> CellState {
    if cell.is_source {
        return CellState::Create;
    }
    if cell.is_sink {
        return CellState::Destroy;
    }
    if cell.volume == 0 {
        return CellState::Empty;
    }

    let mut scan = ObstacleScan::new(oracle, cell.coord);

    let bottom = cell.neighbor(Direction::Bottom);
    if bottom.is_absent() && !scan.blocked(Direction::Bottom) {
        return CellState::Fall;
    }

    let open = scan_open_sides(cell, &mut scan).count();
    if open > 0 && cell.volume > 1 {
        return CellState::Flow;
    }

    if let Neighbor::Present {
        state: CellState::Shallow,
        ..
    } = bottom
    {
        return CellState::Merge;
    }

    match (open, cell.volume) {
        (0, 1) => CellState::Still,
        (0, _) => CellState::Pressured,
        _ => CellState::Shallow,
    }
}
