use std::sync::atomic::{AtomicU64, Ordering};

/// Tag attached to one issued request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Last-issued-wins gate for overlapping async requests.
///
/// Every request takes a ticket from [`SequenceGate::issue`]; when it completes,
/// its result may only be applied if [`SequenceGate::is_current`] still holds.
/// Completions that lost the race are dropped instead of cancelled.
#[derive(Debug, Default)]
pub struct SequenceGate {
    latest: AtomicU64,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket newer than every ticket issued before it.
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Makes every outstanding ticket stale without issuing a new request.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}
