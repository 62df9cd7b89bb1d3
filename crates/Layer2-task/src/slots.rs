//! Slot controller - admission budget for running processes

use tracing::warn;

/// Bounded count of free execution slots.
///
/// `free() + occupied() == capacity()` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotController {
    capacity: usize,
    free: usize,
}

impl SlotController {
    /// All slots start free
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free: capacity,
        }
    }

    /// Take one slot if any is free
    pub fn try_acquire(&mut self) -> bool {
        if self.free == 0 {
            return false;
        }
        self.free -= 1;
        true
    }

    /// Return one slot.
    ///
    /// A release with every slot already free means the caller's bookkeeping
    /// is off; it is logged and ignored so the count stays in range.
    pub fn release(&mut self) {
        if self.free == self.capacity {
            warn!(
                "Slot released while all {} slots are free; ignoring",
                self.capacity
            );
            return;
        }
        self.free += 1;
    }

    pub fn has_free(&self) -> bool {
        self.free > 0
    }

    pub fn free(&self) -> usize {
        self.free
    }

    pub fn occupied(&self) -> usize {
        self.capacity - self.free
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_until_exhausted() {
        let mut slots = SlotController::new(2);
        assert!(slots.try_acquire());
        assert!(slots.try_acquire());
        assert!(!slots.try_acquire());
        assert_eq!(slots.free(), 0);
        assert_eq!(slots.occupied(), 2);
        assert!(!slots.has_free());
    }

    #[test]
    fn test_release_restores_budget() {
        let mut slots = SlotController::new(3);
        slots.try_acquire();
        slots.try_acquire();
        slots.release();

        assert_eq!(slots.free(), 2);
        assert_eq!(slots.free() + slots.occupied(), slots.capacity());
    }

    #[test]
    fn test_release_never_exceeds_capacity() {
        let mut slots = SlotController::new(1);
        slots.release();
        assert_eq!(slots.free(), 1);
        assert_eq!(slots.occupied(), 0);
    }
}
