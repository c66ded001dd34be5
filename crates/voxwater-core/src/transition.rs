//! The transition executor: the effect of each state on a classified cell.
//!
//! Every function takes the cell by mutable reference, changes its own
//! volume and the cached volumes in its [`NeighborCache`](crate::cell::NeighborCache),
//! and returns any cells that must be spawned into empty slots. Nothing here
//! touches the grid; the scheduler turns cache changes into deposits.

use crate::cell::{CellRecord, CellState, Neighbor};
use crate::classify::{OpenSides, open_sides};
use crate::coord::Direction;
use crate::excess::ExcessPool;
use crate::oracle::ObstacleOracle;

/// Outcome of executing one cell's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Cells to insert into currently empty slots once the tick completes.
    pub spawned: Vec<CellRecord>,
    /// The cell asks to be removed from the grid at the end of the tick.
    pub retire: bool,
    /// Volume destroyed by a sink.
    pub discarded: u32,
}

impl Transition {
    fn spawning(spawned: Vec<CellRecord>) -> Self {
        Self {
            spawned,
            ..Self::default()
        }
    }
}

/// Run the effect of `cell.state`.
pub fn execute<O: ObstacleOracle + ?Sized>(
    cell: &mut CellRecord,
    oracle: &O,
    pool: &mut ExcessPool,
    emission: u32,
) -> Transition {
    match cell.state {
        CellState::Flow => Transition::spawning(flow(cell, oracle)),
        CellState::Pressured => {
            pressured(cell, pool);
            Transition::default()
        }
        CellState::Shallow => {
            shallow(cell, pool);
            Transition::default()
        }
        CellState::Fall => Transition::spawning(fall(cell).into_iter().collect()),
        CellState::Merge => {
            merge(cell);
            Transition::default()
        }
        CellState::Create => Transition::spawning(create(cell, oracle, emission)),
        CellState::Destroy => {
            let discarded = destroy(cell, pool);
            Transition {
                retire: !cell.is_sink,
                discarded,
                ..Transition::default()
            }
        }
        CellState::Empty => Transition {
            retire: true,
            ..Transition::default()
        },
        CellState::Still | CellState::Uninitialized => Transition::default(),
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Split `amount` across the open sides in flow order.
///
/// Each side gets `amount / k`; the first `amount % k` sides get one more.
/// Shares to an existing neighbour are added to its cached volume; shares
/// to an absent slot become a spawned cell. Returns the total handed out.
fn distribute(
    cell: &mut CellRecord,
    open: OpenSides,
    amount: u32,
    spawned: &mut Vec<CellRecord>,
) -> u32 {
    let k = open.count();
    if k == 0 {
        return 0;
    }
    let each = amount / k;
    let mut remainder = amount % k;
    let mut handed_out = 0;

    for dir in open.iter() {
        let mut share = each;
        if remainder > 0 {
            remainder -= 1;
            share += 1;
        }
        if share == 0 {
            continue;
        }
        if !cell.neighbors.deposit(dir, share) {
            spawned.push(CellRecord::new(cell.coord.step(dir), share));
        }
        handed_out += share;
    }
    handed_out
}

// ---------------------------------------------------------------------------
// Per-state effects
// ---------------------------------------------------------------------------

/// Spread everything but one unit over the open sides.
///
/// Open sides are recomputed with fresh obstacle queries. The residual unit
/// keeps the cell wet.
pub fn flow<O: ObstacleOracle + ?Sized>(cell: &mut CellRecord, oracle: &O) -> Vec<CellRecord> {
    let mut spawned = Vec::new();
    if cell.volume <= 1 {
        return spawned;
    }
    let open = open_sides(cell, oracle);
    let spare = cell.volume - 1;
    let moved = distribute(cell, open, spare, &mut spawned);
    cell.withdraw(moved);
    spawned
}

/// Release one unit into the shared pool.
pub fn pressured(cell: &mut CellRecord, pool: &mut ExcessPool) {
    cell.withdraw(1);
    pool.release(1);
}

/// Absorb one unit from the shared pool, if it has one.
pub fn shallow(cell: &mut CellRecord, pool: &mut ExcessPool) {
    if pool.take(1) {
        cell.volume += 1;
    }
}

/// Move the whole volume one unit down, never splitting it.
///
/// Returns the spawned cell when nothing exists below yet.
pub fn fall(cell: &mut CellRecord) -> Option<CellRecord> {
    match cell.neighbor(Direction::Bottom) {
        Neighbor::Absent => {
            let volume = cell.take_all();
            Some(CellRecord::new(cell.coord.step(Direction::Bottom), volume))
        }
        Neighbor::Present { .. } => {
            merge(cell);
            None
        }
        Neighbor::Boundary => None,
    }
}

/// Empty the whole volume into the existing cell below.
pub fn merge(cell: &mut CellRecord) {
    let volume = cell.volume;
    if cell.neighbors.deposit(Direction::Bottom, volume) {
        cell.volume = 0;
    }
}

/// Emit from a source without depleting it.
///
/// With open sides this behaves as [`flow`] over the emission. With every
/// side closed the full emission is split over all five flow directions,
/// feeding existing neighbours regardless of obstruction so pressure can
/// build up around the source.
pub fn create<O: ObstacleOracle + ?Sized>(
    cell: &mut CellRecord,
    oracle: &O,
    emission: u32,
) -> Vec<CellRecord> {
    cell.volume = emission;
    let mut spawned = Vec::new();
    let open = open_sides(cell, oracle);
    if open.is_empty() {
        spill_all(cell, emission);
    } else {
        distribute(cell, open, emission.saturating_sub(1), &mut spawned);
    }
    spawned
}

fn spill_all(cell: &mut CellRecord, emission: u32) {
    let k = Direction::FLOW_ORDER.len() as u32;
    let each = emission / k;
    let mut remainder = emission % k;
    for dir in Direction::FLOW_ORDER {
        let mut share = each;
        if remainder > 0 {
            remainder -= 1;
            share += 1;
        }
        if share > 0 {
            cell.neighbors.deposit(dir, share);
        }
    }
}

/// Drain the cell.
///
/// A sink discards the volume and returns how much it destroyed; any other
/// cell hands its residue back to the pool.
pub fn destroy(cell: &mut CellRecord, pool: &mut ExcessPool) -> u32 {
    let volume = cell.take_all();
    if cell.is_sink {
        volume
    } else {
        pool.release(volume);
        0
    }
}
