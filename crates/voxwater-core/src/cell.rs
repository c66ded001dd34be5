//! The per-cell state snapshot and its cached view of the six neighbours.
//!
//! A [`CellRecord`] is plain data. Neighbours are never referenced directly;
//! the [`NeighborCache`] holds a copy of each neighbour's `(state, volume)`
//! taken from the grid at the start of the cell's processing, so the
//! classifier and executor never need live cross-cell access.

use serde::{Deserialize, Serialize};

use crate::coord::{Direction, GridCoord};

// ---------------------------------------------------------------------------
// Cell state
// ---------------------------------------------------------------------------

/// Discrete state of a cell, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    /// Has more than one unit and at least one open side.
    Flow,
    /// Exactly one unit, fully enclosed. The idle fixed point.
    Still,
    /// More than one unit, fully enclosed.
    Pressured,
    /// Exactly one unit with somewhere to go.
    Shallow,
    /// Nothing below and no obstacle below.
    Fall,
    /// Holds no liquid.
    Empty,
    /// Sits on top of a shallow pool and empties into it.
    Merge,
    /// Source emitter.
    Create,
    /// Sink absorber, or a cell being torn down.
    Destroy,
    /// Freshly spawned, not yet classified.
    #[default]
    Uninitialized,
}

impl CellState {
    /// Whether a neighbour in this state counts as an open side for flow.
    pub fn accepts_inflow(self) -> bool {
        matches!(self, CellState::Empty | CellState::Destroy)
    }

    /// Stable discriminant used by the state hash.
    pub(crate) fn code(self) -> u32 {
        match self {
            CellState::Flow => 0,
            CellState::Still => 1,
            CellState::Pressured => 2,
            CellState::Shallow => 3,
            CellState::Fall => 4,
            CellState::Empty => 5,
            CellState::Merge => 6,
            CellState::Create => 7,
            CellState::Destroy => 8,
            CellState::Uninitialized => 9,
        }
    }
}

// ---------------------------------------------------------------------------
// Neighbour cache
// ---------------------------------------------------------------------------

/// What a cell saw in one neighbouring slot at its last refresh.
///
/// `Absent` (no record, slot inside the region) and `Present` with state
/// `Empty` are different things and must never be conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Neighbor {
    /// The slot lies outside the simulation region. Acts as a wall.
    Boundary,
    /// The slot is inside the region and holds no record.
    #[default]
    Absent,
    /// A record exists in the slot.
    Present { state: CellState, volume: u32 },
}

impl Neighbor {
    pub fn is_absent(self) -> bool {
        matches!(self, Neighbor::Absent)
    }

    pub fn is_present(self) -> bool {
        matches!(self, Neighbor::Present { .. })
    }

    /// Absent, or present in a state that accepts inflow.
    pub fn is_vacant(self) -> bool {
        match self {
            Neighbor::Absent => true,
            Neighbor::Present { state, .. } => state.accepts_inflow(),
            Neighbor::Boundary => false,
        }
    }

    pub fn state(self) -> Option<CellState> {
        match self {
            Neighbor::Present { state, .. } => Some(state),
            _ => None,
        }
    }

    pub fn volume(self) -> Option<u32> {
        match self {
            Neighbor::Present { volume, .. } => Some(volume),
            _ => None,
        }
    }
}

/// Cached `(state, volume)` of all six neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NeighborCache {
    slots: [Neighbor; 6],
}

impl NeighborCache {
    pub fn get(&self, direction: Direction) -> Neighbor {
        self.slots[direction.index()]
    }

    pub fn set(&mut self, direction: Direction, neighbor: Neighbor) {
        self.slots[direction.index()] = neighbor;
    }

    /// Add `amount` to the cached volume in `direction`.
    ///
    /// Returns `false` (and changes nothing) if no record exists there.
    pub fn deposit(&mut self, direction: Direction, amount: u32) -> bool {
        match &mut self.slots[direction.index()] {
            Neighbor::Present { volume, .. } => {
                *volume += amount;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, Neighbor)> + '_ {
        Direction::ALL.iter().map(move |&d| (d, self.get(d)))
    }
}

// ---------------------------------------------------------------------------
// Cell record
// ---------------------------------------------------------------------------

/// One lattice slot holding an integer volume of liquid and a discrete state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub coord: GridCoord,
    pub volume: u32,
    pub state: CellState,
    /// State before the most recent classification.
    pub previous_state: CellState,
    pub neighbors: NeighborCache,
    /// Infinite emitter; always classified `Create`.
    pub is_source: bool,
    /// Infinite absorber; always classified `Destroy`.
    pub is_sink: bool,
}

impl CellRecord {
    /// An ordinary liquid cell.
    pub fn new(coord: GridCoord, volume: u32) -> Self {
        Self {
            coord,
            volume,
            state: CellState::Uninitialized,
            previous_state: CellState::Uninitialized,
            neighbors: NeighborCache::default(),
            is_source: false,
            is_sink: false,
        }
    }

    pub fn source(coord: GridCoord, emission: u32) -> Self {
        Self {
            is_source: true,
            state: CellState::Create,
            ..Self::new(coord, emission)
        }
    }

    pub fn sink(coord: GridCoord) -> Self {
        Self {
            is_sink: true,
            state: CellState::Destroy,
            ..Self::new(coord, 0)
        }
    }

    pub fn neighbor(&self, direction: Direction) -> Neighbor {
        self.neighbors.get(direction)
    }

    /// The view other cells cache of this one.
    pub fn as_neighbor(&self) -> Neighbor {
        Neighbor::Present {
            state: self.state,
            volume: self.volume,
        }
    }

    /// Remove `amount` units from this cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell holds less than `amount`; a negative volume means
    /// a transition rule is broken.
    pub fn withdraw(&mut self, amount: u32) {
        assert!(
            amount <= self.volume,
            "cell {} would go negative: withdrawing {amount} from {}",
            self.coord,
            self.volume
        );
        self.volume -= amount;
    }

    /// Drain the whole volume and return it.
    pub fn take_all(&mut self) -> u32 {
        std::mem::take(&mut self.volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cell_is_uninitialized() {
        let c = CellRecord::new(GridCoord::new(1, 2, 3), 4);
        assert_eq!(c.state, CellState::Uninitialized);
        assert_eq!(c.previous_state, CellState::Uninitialized);
        assert!(!c.is_source && !c.is_sink);
        for (_, n) in c.neighbors.iter() {
            assert!(n.is_absent());
        }
    }

    #[test]
    fn absent_and_empty_are_distinct() {
        let absent = Neighbor::Absent;
        let empty = Neighbor::Present {
            state: CellState::Empty,
            volume: 0,
        };
        assert_ne!(absent, empty);
        assert!(absent.is_absent());
        assert!(!empty.is_absent());
        assert!(absent.is_vacant() && empty.is_vacant());
        assert!(!Neighbor::Boundary.is_vacant());
    }

    #[test]
    fn deposit_only_hits_present_slots() {
        let mut cache = NeighborCache::default();
        cache.set(
            Direction::Front,
            Neighbor::Present {
                state: CellState::Still,
                volume: 1,
            },
        );
        assert!(cache.deposit(Direction::Front, 3));
        assert!(!cache.deposit(Direction::Back, 3));
        assert_eq!(cache.get(Direction::Front).volume(), Some(4));
        assert_eq!(cache.get(Direction::Back), Neighbor::Absent);
    }

    #[test]
    fn withdraw_reduces_volume() {
        let mut c = CellRecord::new(GridCoord::default(), 5);
        c.withdraw(4);
        assert_eq!(c.volume, 1);
        assert_eq!(c.take_all(), 1);
        assert_eq!(c.volume, 0);
    }

    #[test]
    #[should_panic(expected = "would go negative")]
    fn withdraw_past_zero_panics() {
        let mut c = CellRecord::new(GridCoord::default(), 1);
        c.withdraw(2);
    }

    #[test]
    fn source_and_sink_constructors() {
        let s = CellRecord::source(GridCoord::default(), 10);
        assert!(s.is_source);
        assert_eq!(s.volume, 10);
        assert_eq!(s.state, CellState::Create);

        let k = CellRecord::sink(GridCoord::default());
        assert!(k.is_sink);
        assert_eq!(k.volume, 0);
        assert_eq!(k.state, CellState::Destroy);
    }
}
