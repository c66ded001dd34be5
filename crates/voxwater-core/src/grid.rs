//! Dense 3D storage for cell records over a bounded region.
//!
//! Storage covers the region plus a one-cell halo on every face, so the six
//! neighbour reads of any in-region cell stay inside the array. Halo slots
//! never hold records; reading one yields [`Neighbor::Boundary`].
//!
//! A coordinate maps to storage by the affine transform
//! `index = coord - region.min + HALO` per axis, flattened x-major.

use std::collections::BTreeSet;

use crate::cell::{CellRecord, Neighbor};
use crate::config::Region;
use crate::coord::{Direction, GridCoord, WorldPos};
use crate::fixed::Fixed64;

/// Errors from grid operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("coordinate {0} lies outside the simulation region")]
    OutOfBounds(GridCoord),
    #[error("no cell record at {0}")]
    Vacant(GridCoord),
    #[error("world position does not map onto the lattice")]
    Unmappable,
}

const HALO: usize = 1;

/// Owns every [`CellRecord`] of a simulation.
#[derive(Debug, Clone)]
pub struct GridIndex {
    region: Region,
    dims: (usize, usize, usize),
    slots: Vec<Option<CellRecord>>,
    /// Storage indices of occupied slots, kept sorted for deterministic
    /// iteration.
    occupied: BTreeSet<usize>,
}

impl GridIndex {
    /// Allocate storage for `region`.
    ///
    /// The region must already be validated (see
    /// [`SimConfig::validate`](crate::config::SimConfig::validate)).
    pub fn new(region: Region) -> Self {
        let (ex, ey, ez) = region.extent().unwrap_or((0, 0, 0));
        let dims = (ex + 2 * HALO, ey + 2 * HALO, ez + 2 * HALO);
        Self {
            region,
            dims,
            slots: vec![None; dims.0 * dims.1 * dims.2],
            occupied: BTreeSet::new(),
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    // -- Index mapping --

    /// Storage index of `coord`, or `OutOfBounds` if outside the region.
    pub fn index_of(&self, coord: GridCoord) -> Result<usize, GridError> {
        if !self.region.contains(coord) {
            return Err(GridError::OutOfBounds(coord));
        }
        let sx = (coord.x - self.region.min.x) as usize + HALO;
        let sy = (coord.y - self.region.min.y) as usize + HALO;
        let sz = (coord.z - self.region.min.z) as usize + HALO;
        Ok(self.flatten(sx, sy, sz))
    }

    fn flatten(&self, sx: usize, sy: usize, sz: usize) -> usize {
        (sx * self.dims.1 + sy) * self.dims.2 + sz
    }

    fn coord_of(&self, index: usize) -> GridCoord {
        let sz = index % self.dims.2;
        let sy = (index / self.dims.2) % self.dims.1;
        let sx = index / (self.dims.1 * self.dims.2);
        GridCoord::new(
            self.region.min.x + (sx - HALO) as i32,
            self.region.min.y + (sy - HALO) as i32,
            self.region.min.z + (sz - HALO) as i32,
        )
    }

    /// Map a world position onto the lattice cell that contains it.
    pub fn world_to_coord(&self, pos: WorldPos, unit_size: Fixed64) -> Result<GridCoord, GridError> {
        let coord = pos.to_grid(unit_size).ok_or(GridError::Unmappable)?;
        self.index_of(coord)?;
        Ok(coord)
    }

    // -- Access --

    pub fn get(&self, coord: GridCoord) -> Option<&CellRecord> {
        let index = self.index_of(coord).ok()?;
        self.slots[index].as_ref()
    }

    pub fn get_mut(&mut self, coord: GridCoord) -> Option<&mut CellRecord> {
        let index = self.index_of(coord).ok()?;
        self.slots[index].as_mut()
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.get(coord).is_some()
    }

    /// Store `record` at its own coordinate, overwriting whatever was there.
    pub fn put(&mut self, record: CellRecord) -> Result<(), GridError> {
        let index = self.index_of(record.coord)?;
        self.slots[index] = Some(record);
        self.occupied.insert(index);
        Ok(())
    }

    pub fn remove(&mut self, coord: GridCoord) -> Option<CellRecord> {
        let index = self.index_of(coord).ok()?;
        self.occupied.remove(&index);
        self.slots[index].take()
    }

    /// Add `amount` to the stored volume at `coord`.
    pub fn deposit(&mut self, coord: GridCoord, amount: u32) -> Result<(), GridError> {
        let index = self.index_of(coord)?;
        match self.slots[index].as_mut() {
            Some(record) => {
                record.volume += amount;
                Ok(())
            }
            None => Err(GridError::Vacant(coord)),
        }
    }

    /// What a cell at `coord` would see in `direction`.
    pub fn neighbor(&self, coord: GridCoord, direction: Direction) -> Neighbor {
        let Some(there) = coord.checked_step(direction) else {
            return Neighbor::Boundary;
        };
        match self.index_of(there) {
            Err(_) => Neighbor::Boundary,
            Ok(index) => match &self.slots[index] {
                Some(record) => record.as_neighbor(),
                None => Neighbor::Absent,
            },
        }
    }

    /// All six neighbours of `coord`, in [`Direction::ALL`] order.
    pub fn neighbors(&self, coord: GridCoord) -> [Neighbor; 6] {
        Direction::ALL.map(|d| self.neighbor(coord, d))
    }

    /// Overwrite `record`'s neighbour cache with the current grid contents.
    pub fn refresh_neighbors(&self, record: &mut CellRecord) {
        for dir in Direction::ALL {
            record.neighbors.set(dir, self.neighbor(record.coord, dir));
        }
    }

    // -- Iteration --

    /// Coordinates of every live record, in storage order.
    pub fn coords(&self) -> Vec<GridCoord> {
        self.occupied.iter().map(|&i| self.coord_of(i)).collect()
    }

    /// Every live record, in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &CellRecord> + '_ {
        self.occupied.iter().filter_map(|&i| self.slots[i].as_ref())
    }
}
