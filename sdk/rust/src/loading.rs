//! Fan-in barrier for concurrent value loads

/// Count of outstanding loads
///
/// Starts at the number of launched loads and is decremented once per
/// completion, successful or not. `complete` reports when the last one
/// finished. A load that never completes keeps the barrier open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PendingLoads {
    remaining: usize,
}

impl PendingLoads {
    pub fn new(count: usize) -> Self {
        Self { remaining: count }
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Record one completion. Returns `true` exactly when this completion
    /// closed the barrier.
    pub fn complete(&mut self) -> bool {
        if self.remaining == 0 {
            tracing::debug!("Completion recorded on an already closed barrier");
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }
}
