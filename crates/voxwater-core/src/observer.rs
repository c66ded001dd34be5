//! Reporting changed cells to a renderer.
//!
//! The core only tells an observer what changed after a step has fully
//! committed; nothing an observer does feeds back into the simulation.

use crate::cell::{CellRecord, CellState};
use crate::coord::{GridCoord, WorldPos};
use crate::fixed::Fixed64;

/// Whether a cell should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn of(state: CellState, volume: u32) -> Self {
        if state == CellState::Empty || volume == 0 {
            Visibility::Hidden
        } else {
            Visibility::Visible
        }
    }
}

/// The render-facing view of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellView {
    pub coord: GridCoord,
    pub world: WorldPos,
    pub state: CellState,
    pub volume: u32,
    pub visibility: Visibility,
}

impl CellView {
    pub fn of(record: &CellRecord, unit_size: Fixed64) -> Self {
        Self {
            coord: record.coord,
            world: record.coord.to_world(unit_size),
            state: record.state,
            volume: record.volume,
            visibility: Visibility::of(record.state, record.volume),
        }
    }
}

/// Receives per-cell change notifications after each step.
pub trait CellObserver {
    fn cell_changed(&mut self, view: &CellView);

    fn cell_removed(&mut self, _coord: GridCoord) {}
}
