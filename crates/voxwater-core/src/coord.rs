//! Lattice coordinates, axis directions, and fixed-point world positions.

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, fixed64_to_f64};

// ---------------------------------------------------------------------------
// Grid coordinate
// ---------------------------------------------------------------------------

/// Integer position of a cell in the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The coordinate one unit away in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy, dz) = direction.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Like [`step`](Self::step), but `None` past the edge of the `i32` lattice.
    pub fn checked_step(self, direction: Direction) -> Option<Self> {
        let (dx, dy, dz) = direction.offset();
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }

    /// Checkerboard colour of this coordinate: 0 or 1.
    ///
    /// Every axis neighbour has the opposite parity, which is what lets the
    /// scheduler process one parity class without any two cells in it
    /// touching each other's records.
    pub fn parity(self) -> u8 {
        (i64::from(self.x) + i64::from(self.y) + i64::from(self.z)).rem_euclid(2) as u8
    }

    /// World-space position of this coordinate for the given unit size.
    pub fn to_world(self, unit_size: Fixed64) -> WorldPos {
        WorldPos {
            x: Fixed64::from_num(self.x) * unit_size,
            y: Fixed64::from_num(self.y) * unit_size,
            z: Fixed64::from_num(self.z) * unit_size,
        }
    }
}

impl std::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// World position
// ---------------------------------------------------------------------------

/// A continuous world-space position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: Fixed64,
    pub y: Fixed64,
    pub z: Fixed64,
}

impl WorldPos {
    pub fn new(x: Fixed64, y: Fixed64, z: Fixed64) -> Self {
        Self { x, y, z }
    }

    /// The lattice cell containing this position (`floor(p / unit)` per axis).
    ///
    /// Returns `None` if `unit_size` is zero or the quotient does not fit an `i32`.
    pub fn to_grid(self, unit_size: Fixed64) -> Option<GridCoord> {
        let axis = |p: Fixed64| -> Option<i32> {
            let cells = p.checked_div(unit_size)?.floor();
            cells.checked_to_num::<i32>()
        };
        Some(GridCoord::new(axis(self.x)?, axis(self.y)?, axis(self.z)?))
    }

    /// Lossy float view for renderers.
    pub fn to_f64(self) -> [f64; 3] {
        [
            fixed64_to_f64(self.x),
            fixed64_to_f64(self.y),
            fixed64_to_f64(self.z),
        ]
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// The six axis-aligned neighbour directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// +x
    Front,
    /// -x
    Back,
    /// +z
    Left,
    /// -z
    Right,
    /// +y
    Top,
    /// -y
    Bottom,
}

impl Direction {
    /// All six directions, in neighbour-cache order.
    pub const ALL: [Direction; 6] = [
        Direction::Front,
        Direction::Back,
        Direction::Left,
        Direction::Right,
        Direction::Top,
        Direction::Bottom,
    ];

    /// The five directions liquid may flow into, in distribution order.
    /// Remainder units always go to the earliest open entries of this list.
    pub const FLOW_ORDER: [Direction; 5] = [
        Direction::Front,
        Direction::Right,
        Direction::Back,
        Direction::Left,
        Direction::Bottom,
    ];

    /// Unit offset `(dx, dy, dz)`.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::Front => (1, 0, 0),
            Direction::Back => (-1, 0, 0),
            Direction::Left => (0, 0, 1),
            Direction::Right => (0, 0, -1),
            Direction::Top => (0, 1, 0),
            Direction::Bottom => (0, -1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Front => Direction::Back,
            Direction::Back => Direction::Front,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
        }
    }

    /// Slot of this direction in a neighbour cache.
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Front => 0,
            Direction::Back => 1,
            Direction::Left => 2,
            Direction::Right => 3,
            Direction::Top => 4,
            Direction::Bottom => 5,
        }
    }
}
