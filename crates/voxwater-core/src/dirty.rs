use crate::coord::GridCoord;
use std::collections::BTreeSet;

/// Tracks which cells changed or disappeared since the last clean point.
///
/// Filled by the scheduler from before/after comparisons during a step and
/// drained into the step report. Call [`mark_clean`](ChangeTracker::mark_clean)
/// at the start of a step to reset it.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    changed: BTreeSet<GridCoord>,
    removed: BTreeSet<GridCoord>,
}

impl ChangeTracker {
    /// Create a new tracker with nothing dirty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a cell whose state or volume changed, or that was created.
    pub fn mark_changed(&mut self, coord: GridCoord) {
        self.removed.remove(&coord);
        self.changed.insert(coord);
    }

    /// Mark a cell that was deleted from the grid.
    pub fn mark_removed(&mut self, coord: GridCoord) {
        self.changed.remove(&coord);
        self.removed.insert(coord);
    }

    /// Returns `true` if anything has been marked since the last clean.
    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty() || !self.removed.is_empty()
    }

    pub fn is_changed(&self, coord: GridCoord) -> bool {
        self.changed.contains(&coord)
    }

    pub fn is_removed(&self, coord: GridCoord) -> bool {
        self.removed.contains(&coord)
    }

    pub fn changed(&self) -> &BTreeSet<GridCoord> {
        &self.changed
    }

    pub fn removed(&self) -> &BTreeSet<GridCoord> {
        &self.removed
    }

    /// Reset all marks.
    pub fn mark_clean(&mut self) {
        self.changed.clear();
        self.removed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_initially_clean() {
        let tracker = ChangeTracker::new();
        assert!(!tracker.is_dirty());
        assert!(tracker.changed().is_empty());
        assert!(tracker.removed().is_empty());
    }

    #[test]
    fn mark_changed_makes_dirty() {
        let mut tracker = ChangeTracker::new();
        let c = GridCoord::new(1, 2, 3);
        tracker.mark_changed(c);
        assert!(tracker.is_dirty());
        assert!(tracker.is_changed(c));
        assert!(!tracker.is_removed(c));
    }

    #[test]
    fn removal_supersedes_change() {
        let mut tracker = ChangeTracker::new();
        let c = GridCoord::new(0, 0, 0);
        tracker.mark_changed(c);
        tracker.mark_removed(c);
        assert!(!tracker.is_changed(c));
        assert!(tracker.is_removed(c));
    }

    #[test]
    fn respawn_after_removal_counts_as_change() {
        let mut tracker = ChangeTracker::new();
        let c = GridCoord::new(0, 0, 0);
        tracker.mark_removed(c);
        tracker.mark_changed(c);
        assert!(tracker.is_changed(c));
        assert!(!tracker.is_removed(c));
    }

    #[test]
    fn mark_clean_resets() {
        let mut tracker = ChangeTracker::new();
        tracker.mark_changed(GridCoord::new(1, 0, 0));
        tracker.mark_removed(GridCoord::new(2, 0, 0));
        tracker.mark_clean();
        assert!(!tracker.is_dirty());
    }
}
