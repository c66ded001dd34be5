//! The step scheduler: one full tick over every live cell.
//!
//! # Staging
//!
//! Live cells are split by checkerboard parity into two batches, even
//! `x + y + z` first. Axis neighbours always have opposite parity, so no two
//! cells of one batch read or write each other's record. Each batch runs in
//! two phases:
//!
//! 1. **Prepare** (read-only) -- re-fetch the record, refresh its neighbour
//!    cache from the grid, classify. With the `parallel` feature this phase
//!    runs on rayon; obstacle queries are the expensive part.
//! 2. **Settle** (sequential, storage order) -- execute the transition,
//!    deposit neighbour volume changes straight into the grid, queue spawns,
//!    write the record back.
//!
//! Deposits are additive, so two cells feeding the same target never lose a
//! unit. Spawns are held back until both batches are done and two spawns
//! into one slot merge. Cells that drained to zero are removed last, unless
//! something flowed into them later in the tick.

use std::collections::BTreeMap;

use crate::cell::{CellRecord, CellState};
use crate::classify::classify;
use crate::config::{ConfigError, SimConfig};
use crate::coord::{Direction, GridCoord, WorldPos};
use crate::dirty::ChangeTracker;
use crate::excess::ExcessPool;
use crate::fixed::Ticks;
use crate::grid::{GridError, GridIndex};
use crate::observer::{CellObserver, CellView};
use crate::oracle::ObstacleOracle;
use crate::sim::StateHash;
use crate::transition::execute;

// ---------------------------------------------------------------------------
// Step report
// ---------------------------------------------------------------------------

/// What happened during one [`Simulation::step`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Tick counter after the step.
    pub tick: Ticks,
    /// Cells whose state or volume changed, including newly spawned ones.
    pub changed: Vec<GridCoord>,
    /// Cells deleted from the grid.
    pub removed: Vec<GridCoord>,
    /// Records inserted for spawns.
    pub spawned: usize,
    /// Cells skipped by the idle fast path.
    pub idle: usize,
    /// Volume destroyed by sinks.
    pub discarded: u64,
    /// Volume lost because a spawn or deposit fell outside the grid.
    pub dropped_volume: u64,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A voxel liquid simulation: owns the grid and drives ticks over it.
///
/// The grid is exclusively borrowed for the duration of [`step`](Self::step),
/// so no two ticks can ever run against it at once.
#[derive(Debug)]
pub struct Simulation<O: ObstacleOracle> {
    config: SimConfig,
    grid: GridIndex,
    oracle: O,
    pool: ExcessPool,
    tracker: ChangeTracker,
    tick: Ticks,
}

impl<O: ObstacleOracle> Simulation<O> {
    pub fn new(config: SimConfig, oracle: O) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid: GridIndex::new(config.region),
            config,
            oracle,
            pool: ExcessPool::new(),
            tracker: ChangeTracker::new(),
            tick: 0,
        })
    }

    // -----------------------------------------------------------------------
    // Placement
    // -----------------------------------------------------------------------

    /// Put a liquid cell at `coord`, replacing whatever record was there.
    pub fn place_liquid(&mut self, coord: GridCoord, volume: u32) -> Result<(), GridError> {
        self.grid.put(CellRecord::new(coord, volume))
    }

    /// Put a source at `coord`. It emits `source_emission` units every step.
    pub fn place_source(&mut self, coord: GridCoord) -> Result<(), GridError> {
        self.grid
            .put(CellRecord::source(coord, self.config.source_emission))
    }

    /// Put a sink at `coord`. It destroys whatever reaches it.
    pub fn place_sink(&mut self, coord: GridCoord) -> Result<(), GridError> {
        self.grid.put(CellRecord::sink(coord))
    }

    pub fn remove_cell(&mut self, coord: GridCoord) -> Option<CellRecord> {
        self.grid.remove(coord)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn cell(&self, coord: GridCoord) -> Option<&CellRecord> {
        self.grid.get(coord)
    }

    pub fn view(&self, coord: GridCoord) -> Option<CellView> {
        self.grid
            .get(coord)
            .map(|r| CellView::of(r, self.config.unit_size))
    }

    pub fn cell_count(&self) -> usize {
        self.grid.len()
    }

    /// Sum of every cell's volume.
    pub fn liquid_volume(&self) -> u64 {
        self.grid.iter().map(|c| u64::from(c.volume)).sum()
    }

    /// Cell volumes plus the excess pool: the conserved quantity.
    pub fn total_volume(&self) -> u64 {
        self.liquid_volume() + self.pool.units()
    }

    pub fn excess(&self) -> u64 {
        self.pool.units()
    }

    /// Number of completed steps.
    pub fn tick(&self) -> Ticks {
        self.tick
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Obstacles may change between steps; they are never cached.
    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    pub fn world_to_coord(&self, pos: WorldPos) -> Result<GridCoord, GridError> {
        self.grid.world_to_coord(pos, self.config.unit_size)
    }

    /// Deterministic hash of tick, pool and every live cell.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.tick);
        hasher.write_u64(self.pool.units());
        for cell in self.grid.iter() {
            hasher.write_cell(cell);
        }
        hasher.finish()
    }

    // -----------------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------------

    /// Run one tick and report every changed cell to `observer` afterwards.
    pub fn step_observed<B: CellObserver + ?Sized>(&mut self, observer: &mut B) -> StepReport {
        let report = self.step();
        for &coord in &report.changed {
            if let Some(view) = self.view(coord) {
                observer.cell_changed(&view);
            }
        }
        for &coord in &report.removed {
            observer.cell_removed(coord);
        }
        report
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) -> StepReport {
        self.run_step(Self::prepare_batch)
    }

    fn run_step(&mut self, prepare: fn(&Self, &[GridCoord]) -> Vec<CellRecord>) -> StepReport {
        self.tracker.mark_clean();
        let mut report = StepReport::default();
        let mut pending: BTreeMap<GridCoord, CellRecord> = BTreeMap::new();
        let mut retiring: Vec<GridCoord> = Vec::new();

        let (even, odd): (Vec<GridCoord>, Vec<GridCoord>) = self
            .grid
            .coords()
            .into_iter()
            .partition(|c| c.parity() == 0);

        for batch in [even, odd] {
            for cell in prepare(self, &batch) {
                self.settle(cell, &mut pending, &mut retiring, &mut report);
            }
        }

        self.commit_spawns(pending, &mut report);
        self.retire(&retiring);

        self.tick += 1;
        report.tick = self.tick;
        report.changed = self.tracker.changed().iter().copied().collect();
        report.removed = self.tracker.removed().iter().copied().collect();

        log::debug!(
            "tick {}: {} cells, {} changed, {} spawned, {} removed, {} idle, excess {}",
            self.tick,
            self.grid.len(),
            report.changed.len(),
            report.spawned,
            report.removed.len(),
            report.idle,
            self.pool.units()
        );
        report
    }

    // -- Prepare --

    fn prepare(&self, coord: GridCoord) -> Option<CellRecord> {
        let mut cell = self.grid.get(coord)?.clone();
        self.grid.refresh_neighbors(&mut cell);
        let next = classify(&cell, &self.oracle);
        cell.previous_state = cell.state;
        cell.state = next;
        Some(cell)
    }

    #[cfg(feature = "parallel")]
    fn prepare_batch(&self, batch: &[GridCoord]) -> Vec<CellRecord> {
        use rayon::prelude::*;
        batch.par_iter().filter_map(|&c| self.prepare(c)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn prepare_batch(&self, batch: &[GridCoord]) -> Vec<CellRecord> {
        self.prepare_serial(batch)
    }

    #[cfg_attr(all(feature = "parallel", not(test)), allow(dead_code))]
    fn prepare_serial(&self, batch: &[GridCoord]) -> Vec<CellRecord> {
        batch.iter().filter_map(|&c| self.prepare(c)).collect()
    }

    // -- Settle --

    fn settle(
        &mut self,
        mut cell: CellRecord,
        pending: &mut BTreeMap<GridCoord, CellRecord>,
        retiring: &mut Vec<GridCoord>,
        report: &mut StepReport,
    ) {
        let coord = cell.coord;

        if cell.previous_state == cell.state
            && matches!(cell.state, CellState::Still | CellState::Empty)
        {
            report.idle += 1;
            if cell.state == CellState::Empty {
                retiring.push(coord);
            }
            self.write_back(cell);
            return;
        }

        let before = cell.clone();
        let mut transition = execute(
            &mut cell,
            &self.oracle,
            &mut self.pool,
            self.config.source_emission,
        );

        if cell.volume == 0 && !cell.is_source && !cell.is_sink {
            cell.state = CellState::Empty;
            transition.retire = true;
        }

        log::trace!(
            "{coord}: {:?} -> {:?}, volume {} -> {}",
            cell.previous_state,
            cell.state,
            before.volume,
            cell.volume
        );

        let mut touched = false;
        for dir in Direction::ALL {
            let (Some(was), Some(now)) = (before.neighbor(dir).volume(), cell.neighbor(dir).volume())
            else {
                continue;
            };
            if now <= was {
                continue;
            }
            let target = coord.step(dir);
            let amount = now - was;
            match self.grid.deposit(target, amount) {
                Ok(()) => {
                    self.tracker.mark_changed(target);
                    touched = true;
                }
                Err(err) => {
                    log::warn!("dropping {amount} units flowing from {coord}: {err}");
                    report.dropped_volume += u64::from(amount);
                }
            }
        }

        report.discarded += u64::from(transition.discarded);
        touched |= !transition.spawned.is_empty();
        for spawn in transition.spawned {
            pending
                .entry(spawn.coord)
                .and_modify(|queued| queued.volume += spawn.volume)
                .or_insert(spawn);
        }
        if transition.retire {
            retiring.push(coord);
        }

        if touched || cell.state != cell.previous_state || cell.volume != before.volume {
            self.tracker.mark_changed(coord);
        }
        self.write_back(cell);
    }

    fn write_back(&mut self, cell: CellRecord) {
        let coord = cell.coord;
        if let Err(err) = self.grid.put(cell) {
            log::warn!("could not write back cell {coord}: {err}");
        }
    }

    // -- Commit --

    fn commit_spawns(&mut self, pending: BTreeMap<GridCoord, CellRecord>, report: &mut StepReport) {
        for (coord, spawn) in pending {
            let volume = spawn.volume;
            if let Some(existing) = self.grid.get_mut(coord) {
                existing.volume += volume;
                self.tracker.mark_changed(coord);
                continue;
            }
            match self.grid.put(spawn) {
                Ok(()) => {
                    report.spawned += 1;
                    self.tracker.mark_changed(coord);
                }
                Err(err) => {
                    log::warn!("dropping spawn of {volume} units: {err}");
                    report.dropped_volume += u64::from(volume);
                }
            }
        }
    }

    fn retire(&mut self, retiring: &[GridCoord]) {
        for &coord in retiring {
            let drained = self
                .grid
                .get(coord)
                .is_some_and(|c| c.volume == 0 && !c.is_source && !c.is_sink);
            if drained {
                self.grid.remove(coord);
                self.tracker.mark_removed(coord);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Region;
    use crate::oracle::{NoObstacles, SolidVoxels};

    fn config() -> SimConfig {
        SimConfig::new(Region::new(
            GridCoord::new(-4, -4, -4),
            GridCoord::new(4, 4, 4),
        ))
    }

    /// A solid floor at y = -1 under the whole region.
    fn floor() -> SolidVoxels {
        let mut solids = SolidVoxels::new();
        solids.fill_box(GridCoord::new(-4, -1, -4), GridCoord::new(4, -1, 4));
        solids
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = SimConfig {
            tick_interval: 0,
            ..config()
        };
        assert!(Simulation::new(cfg, NoObstacles).is_err());
    }

    #[test]
    fn placement_outside_region_fails() {
        let mut sim = Simulation::new(config(), NoObstacles).unwrap();
        let far = GridCoord::new(5, 0, 0);
        assert_eq!(sim.place_liquid(far, 1), Err(GridError::OutOfBounds(far)));
    }

    #[test]
    fn falling_cell_relocates_whole_volume() {
        let mut sim = Simulation::new(config(), NoObstacles).unwrap();
        let top = GridCoord::new(0, 2, 0);
        sim.place_liquid(top, 7).unwrap();

        let report = sim.step();

        assert!(sim.cell(top).is_none());
        let below = sim.cell(GridCoord::new(0, 1, 0)).expect("spawned below");
        assert_eq!(below.volume, 7);
        assert_eq!(report.spawned, 1);
        assert_eq!(report.removed, vec![top]);
        assert_eq!(report.changed, vec![GridCoord::new(0, 1, 0)]);
    }

    #[test]
    fn cell_on_floor_with_one_unit_goes_shallow_then_stays() {
        let mut sim = Simulation::new(config(), floor()).unwrap();
        let c = GridCoord::new(0, 0, 0);
        sim.place_liquid(c, 1).unwrap();

        sim.step();
        assert_eq!(sim.cell(c).map(|r| r.state), Some(CellState::Shallow));
        let report = sim.step();
        assert_eq!(sim.cell(c).map(|r| r.volume), Some(1));
        assert!(report.changed.is_empty());
    }

    #[test]
    fn zero_volume_placeholder_becomes_empty_and_is_removed() {
        let mut sim = Simulation::new(config(), floor()).unwrap();
        let c = GridCoord::new(1, 0, 1);
        sim.place_liquid(c, 0).unwrap();
        let report = sim.step();
        assert!(sim.cell(c).is_none());
        assert_eq!(report.removed, vec![c]);
        assert_eq!(report.spawned, 0);
    }

    #[test]
    fn observer_sees_changes_and_removals() {
        #[derive(Default)]
        struct Log {
            changed: Vec<CellView>,
            removed: Vec<GridCoord>,
        }
        impl CellObserver for Log {
            fn cell_changed(&mut self, view: &CellView) {
                self.changed.push(*view);
            }
            fn cell_removed(&mut self, coord: GridCoord) {
                self.removed.push(coord);
            }
        }

        let mut sim = Simulation::new(config(), NoObstacles).unwrap();
        sim.place_liquid(GridCoord::new(0, 0, 0), 3).unwrap();
        let mut log = Log::default();
        sim.step_observed(&mut log);

        assert_eq!(log.removed, vec![GridCoord::new(0, 0, 0)]);
        assert_eq!(log.changed.len(), 1);
        assert_eq!(log.changed[0].coord, GridCoord::new(0, -1, 0));
        assert_eq!(log.changed[0].volume, 3);
    }

    #[test]
    fn tick_counter_advances() {
        let mut sim = Simulation::new(config(), NoObstacles).unwrap();
        assert_eq!(sim.tick(), 0);
        let report = sim.step();
        assert_eq!(report.tick, 1);
        assert_eq!(sim.tick(), 1);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_prepare_matches_serial() {
        use crate::test_utils::scatter;

        let build = || {
            let mut sim = Simulation::new(config(), floor()).unwrap();
            scatter(&mut sim, 0x5eed, 120, 12);
            sim
        };
        let mut parallel = build();
        let mut serial = build();

        let coords = parallel.grid().coords();
        assert_eq!(parallel.prepare_batch(&coords), serial.prepare_serial(&coords));

        for _ in 0..30 {
            let a = parallel.step();
            let b = serial.run_step(Simulation::<SolidVoxels>::prepare_serial);
            assert_eq!(a, b);
            assert_eq!(parallel.state_hash(), serial.state_hash());
        }
    }

    #[test]
    fn state_hash_tracks_contents() {
        let mut a = Simulation::new(config(), NoObstacles).unwrap();
        let mut b = Simulation::new(config(), NoObstacles).unwrap();
        a.place_liquid(GridCoord::new(0, 0, 0), 2).unwrap();
        b.place_liquid(GridCoord::new(0, 0, 0), 2).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
        b.place_liquid(GridCoord::new(0, 0, 0), 3).unwrap();
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
