use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out unique aliases for one generated statement.
///
/// A single allocator is shared by reference across a statement's whole scope
/// tree and reset before each top-level statement, so aliases are unique
/// within a statement and the sequence restarts for the next one. Parallel
/// generation sessions each own their own allocator.
#[derive(Debug, Default)]
pub struct NameAllocator {
    counter: AtomicU64,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `"<prefix>_<n>"` with a fresh `n`.
    pub fn allocate(&self, prefix: &str) -> String {
        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_{id}")
    }

    pub fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
    }

    /// Number of names handed out since the last reset.
    pub fn allocated(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}
