use serde::{Deserialize, Serialize};

/// Volume released by pressured cells and not yet absorbed by shallow ones.
///
/// Lives for the whole simulation, not a single tick: a unit released on
/// one tick may be picked up several ticks later. Conservation holds over
/// the sum of all cell volumes plus [`units`](ExcessPool::units).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExcessPool {
    units: u64,
}

impl ExcessPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` units to the pool.
    pub fn release(&mut self, amount: u32) {
        self.units += u64::from(amount);
    }

    /// Remove `amount` units if the pool holds at least that many.
    pub fn take(&mut self, amount: u32) -> bool {
        let amount = u64::from(amount);
        if self.units >= amount {
            self.units -= amount;
            true
        } else {
            false
        }
    }

    pub fn units(&self) -> u64 {
        self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_from_empty_pool_fails() {
        let mut pool = ExcessPool::new();
        assert!(!pool.take(1));
        assert!(pool.is_empty());
    }

    #[test]
    fn release_then_take_balances() {
        let mut pool = ExcessPool::new();
        pool.release(2);
        assert!(pool.take(1));
        assert!(pool.take(1));
        assert!(!pool.take(1));
        assert_eq!(pool.units(), 0);
    }

    #[test]
    fn partial_take_is_refused() {
        let mut pool = ExcessPool::new();
        pool.release(1);
        assert!(!pool.take(2));
        assert_eq!(pool.units(), 1);
    }
}
