//! Simulation configuration, fixed at construction.

use serde::{Deserialize, Serialize};

use crate::coord::GridCoord;
use crate::fixed::{Fixed64, Ticks};

/// Errors from validating a [`SimConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("region min {min} exceeds max {max}")]
    InvertedRegion { min: GridCoord, max: GridCoord },
    #[error("region {min}..={max} leaves no room for a boundary layer in the lattice")]
    RegionAtLatticeEdge { min: GridCoord, max: GridCoord },
    #[error("region {min}..={max} is too large to allocate")]
    RegionTooLarge { min: GridCoord, max: GridCoord },
    #[error("unit size must be positive, got {0}")]
    NonPositiveUnit(Fixed64),
    #[error("tick interval must be at least 1")]
    ZeroTickInterval,
    #[error("source emission must be at least 1")]
    ZeroEmission,
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Inclusive bounds of the simulated lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub min: GridCoord,
    pub max: GridCoord,
}

impl Region {
    pub fn new(min: GridCoord, max: GridCoord) -> Self {
        Self { min, max }
    }

    /// The cube of edge `size` whose min corner is `origin * size`.
    ///
    /// `origin` counts regions, not cells, so neighbouring chunks tile the
    /// world without overlap. Returns `None` for a zero size or a chunk that
    /// would not leave a boundary layer inside the `i32` lattice.
    pub fn chunk(origin: GridCoord, size: u32) -> Option<Self> {
        let s = i32::try_from(size).ok().filter(|&s| s > 0)?;
        let axis = |o: i32| -> Option<(i32, i32)> {
            let lo = o.checked_mul(s)?;
            let hi = lo.checked_add(s - 1)?;
            Some((lo, hi))
        };
        let (x0, x1) = axis(origin.x)?;
        let (y0, y1) = axis(origin.y)?;
        let (z0, z1) = axis(origin.z)?;
        let region = Self::new(GridCoord::new(x0, y0, z0), GridCoord::new(x1, y1, z1));
        region.has_boundary_layer().then_some(region)
    }

    /// Whether the slots one past every face are still representable.
    pub fn has_boundary_layer(&self) -> bool {
        let below = |v: i32| v > i32::MIN;
        let above = |v: i32| v < i32::MAX;
        below(self.min.x)
            && below(self.min.y)
            && below(self.min.z)
            && above(self.max.x)
            && above(self.max.y)
            && above(self.max.z)
    }

    pub fn contains(&self, c: GridCoord) -> bool {
        (self.min.x..=self.max.x).contains(&c.x)
            && (self.min.y..=self.max.y).contains(&c.y)
            && (self.min.z..=self.max.z).contains(&c.z)
    }

    /// Edge lengths `(x, y, z)` in cells, or `None` if inverted.
    pub fn extent(&self) -> Option<(usize, usize, usize)> {
        let axis = |lo: i32, hi: i32| -> Option<usize> {
            let span = i64::from(hi) - i64::from(lo) + 1;
            usize::try_from(span).ok().filter(|&n| n > 0)
        };
        Some((
            axis(self.min.x, self.max.x)?,
            axis(self.min.y, self.max.y)?,
            axis(self.min.z, self.max.z)?,
        ))
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Immutable parameters of a simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// The bounded lattice. Cells outside it cannot exist.
    pub region: Region,
    /// World-space edge length of one cell.
    pub unit_size: Fixed64,
    /// Host ticks between simulation steps, used by the tick driver.
    pub tick_interval: Ticks,
    /// Volume a source re-supplies itself to every step.
    pub source_emission: u32,
}

impl SimConfig {
    /// Storage slots allowed for one region including its halo.
    pub const MAX_SLOTS: usize = 1 << 26;

    pub fn new(region: Region) -> Self {
        Self {
            region,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let Region { min, max } = self.region;
        let (ex, ey, ez) = self
            .region
            .extent()
            .ok_or(ConfigError::InvertedRegion { min, max })?;
        if !self.region.has_boundary_layer() {
            return Err(ConfigError::RegionAtLatticeEdge { min, max });
        }
        let slots = (ex + 2)
            .checked_mul(ey + 2)
            .and_then(|n| n.checked_mul(ez + 2))
            .filter(|&n| n <= Self::MAX_SLOTS);
        if slots.is_none() {
            return Err(ConfigError::RegionTooLarge { min, max });
        }
        if self.unit_size <= Fixed64::ZERO {
            return Err(ConfigError::NonPositiveUnit(self.unit_size));
        }
        if self.tick_interval == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.source_emission == 0 {
            return Err(ConfigError::ZeroEmission);
        }
        Ok(())
    }
}

impl Default for SimConfig {
    /// A 32-cell cube centred on the origin, unit cells, one step every 50
    /// host ticks, sources emitting 10 units.
    fn default() -> Self {
        Self {
            region: Region::new(GridCoord::new(-16, -16, -16), GridCoord::new(15, 15, 15)),
            unit_size: Fixed64::ONE,
            tick_interval: 50,
            source_emission: 10,
        }
    }
}
