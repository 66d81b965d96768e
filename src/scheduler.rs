//! Timed callbacks keyed by absolute engine time.

use crate::engine::Engine;

/// A one-shot callback run at the start of a frame.
pub type Action = Box<dyn FnOnce(&mut Engine) + Send>;

struct Slot {
    due: f64,
    actions: Vec<Action>,
}

/// Callbacks bucketed by due time, kept in ascending order.
///
/// Callbacks sharing a due time run in registration order.
#[derive(Default)]
pub struct Scheduler {
    slots: Vec<Slot>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, action: Action) {
        let at = self.slots.partition_point(|slot| slot.due < due);
        match self.slots.get_mut(at) {
            Some(slot) if slot.due == due => slot.actions.push(action),
            _ => self.slots.insert(
                at,
                Slot {
                    due,
                    actions: vec![action],
                },
            ),
        }
    }

    /// Remove and return every callback due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: f64) -> Vec<Action> {
        let count = self.slots.partition_point(|slot| slot.due <= now);
        self.slots.drain(..count).flat_map(|slot| slot.actions).collect()
    }

    /// Number of pending callbacks.
    pub fn len(&self) -> usize {
        self.slots.iter().map(|slot| slot.actions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.slots.iter().map(|slot| (slot.due, slot.actions.len()))).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_only_due_slots_in_order() {
        let mut s = Scheduler::new();
        s.schedule(0.5, Box::new(|_| {}));
        s.schedule(0.1, Box::new(|_| {}));
        s.schedule(0.1, Box::new(|_| {}));
        s.schedule(2.0, Box::new(|_| {}));
        assert_eq!(s.len(), 4);

        assert_eq!(s.take_due(0.0).len(), 0);
        assert_eq!(s.take_due(0.5).len(), 3);
        assert_eq!(s.len(), 1);
        assert!(!s.is_empty());
        assert_eq!(s.take_due(10.0).len(), 1);
        assert!(s.is_empty());
    }
}
