//! Deferred event firings (waits and glides).

use crate::graph::node::NodeId;

/// One pending firing of an event pin.
#[derive(Clone, Debug, PartialEq)]
pub struct DeferredFire {
    /// Executor-clock time at which the pin fires.
    pub due: f64,
    /// Run cohort that scheduled it; entries of older cohorts never fire.
    pub cohort: u64,
    pub node: NodeId,
    pub pin: String,
    seq: u64,
}

/// Timer queue polled by the executor between ticks.
#[derive(Default, Debug)]
pub struct DeferredQueue {
    entries: Vec<DeferredFire>,
    next_seq: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, cohort: u64, node: NodeId, pin: &str) {
        self.entries.push(DeferredFire {
            due,
            cohort,
            node,
            pin: pin.to_string(),
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Removes and returns the entries of `cohort` due at `now`, earliest
    /// first (ties in scheduling order). Entries of other cohorts are dropped.
    pub fn take_due(&mut self, now: f64, cohort: u64) -> Vec<DeferredFire> {
        self.entries.retain(|e| e.cohort == cohort);
        let (mut due, pending): (Vec<_>, Vec<_>) = self.entries.drain(..).partition(|e| e.due <= now);
        self.entries = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due
    }

    /// Drops entries scheduled by `node`.
    pub fn cancel_node(&mut self, node: NodeId) {
        self.entries.retain(|e| e.node != node);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_due(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.due).min_by(f64::total_cmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_entries_come_out_in_time_order() {
        let a = NodeId::new();
        let b = NodeId::new();
        let mut q = DeferredQueue::new();
        q.schedule(300.0, 1, a, "late");
        q.schedule(100.0, 1, b, "early");
        q.schedule(100.0, 1, a, "early-second");
        q.schedule(900.0, 1, a, "future");

        let due = q.take_due(500.0, 1);
        let pins: Vec<_> = due.iter().map(|e| e.pin.as_str()).collect();
        assert_eq!(pins, ["early", "early-second", "late"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.next_due(), Some(900.0));
    }

    #[test]
    fn stale_cohorts_never_fire() {
        let a = NodeId::new();
        let mut q = DeferredQueue::new();
        q.schedule(10.0, 1, a, "out");
        assert!(q.take_due(100.0, 2).is_empty());
        assert!(q.is_empty());
    }
}
