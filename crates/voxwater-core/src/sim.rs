//! Host-clock driving and state hashing.
//!
//! The step scheduler knows nothing about time. A host embeds it by calling
//! [`TickDriver::advance`] with elapsed host ticks; the driver accumulates
//! them and runs one step per `tick_interval`, carrying the remainder
//! forward.

use crate::cell::CellRecord;
use crate::config::SimConfig;
use crate::coord::GridCoord;
use crate::fixed::Ticks;
use crate::oracle::ObstacleOracle;
use crate::step::{Simulation, StepReport};

// ---------------------------------------------------------------------------
// Tick driver
// ---------------------------------------------------------------------------

/// Runs fixed-interval steps from a variable host clock.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TickDriver {
    /// Host ticks per simulation step. Never zero.
    interval: Ticks,

    /// Host ticks received but not yet spent on a step.
    accumulator: Ticks,

    /// While paused, elapsed time is discarded rather than accumulated.
    paused: bool,
}

impl TickDriver {
    /// A driver stepping once every `interval` host ticks (minimum 1).
    pub fn new(interval: Ticks) -> Self {
        Self {
            interval: interval.max(1),
            accumulator: 0,
            paused: false,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.tick_interval)
    }

    pub fn interval(&self) -> Ticks {
        self.interval
    }

    pub fn accumulator(&self) -> Ticks {
        self.accumulator
    }

    /// Stop stepping. Time passed to `advance` while paused is dropped.
    pub fn pause(&mut self) {
        if !self.paused {
            log::debug!("tick driver paused with {} ticks pending", self.accumulator);
        }
        self.paused = true;
        self.accumulator = 0;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Feed `elapsed` host ticks and run every step that became due.
    pub fn advance<O: ObstacleOracle>(
        &mut self,
        sim: &mut Simulation<O>,
        elapsed: Ticks,
    ) -> AdvanceResult {
        let mut result = AdvanceResult::default();
        if self.paused {
            return result;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            result.reports.push(sim.step());
            result.steps_run += 1;
        }
        result
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Advance result
// ---------------------------------------------------------------------------

/// Result of a [`TickDriver::advance`] call.
#[derive(Debug, Default)]
pub struct AdvanceResult {
    /// Number of simulation steps actually executed.
    pub steps_run: u64,

    /// One report per executed step, oldest first.
    pub reports: Vec<StepReport>,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A deterministic hash of simulation state for comparing runs.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_coord(&mut self, c: GridCoord) {
        self.write_i32(c.x);
        self.write_i32(c.y);
        self.write_i32(c.z);
    }

    /// Feed the observable parts of a cell: coordinate, state, volume and
    /// source/sink flags. The neighbour cache is rebuilt every step and is
    /// left out.
    pub fn write_cell(&mut self, cell: &CellRecord) {
        self.write_coord(cell.coord);
        self.write_u32(cell.state.code());
        self.write_u32(cell.volume);
        self.write_u32(u32::from(cell.is_source) | (u32::from(cell.is_sink) << 1));
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
