//! Unique identifier for mutexes

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a GuardedMutex
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutexId(u64);

static NEXT_MUTEX_ID: AtomicU64 = AtomicU64::new(1);

impl MutexId {
    /// Generate a new unique MutexId
    pub fn new() -> Self {
        MutexId(NEXT_MUTEX_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Create a MutexId from a raw value (test doubles, log correlation)
    pub fn from_u64(id: u64) -> Self {
        MutexId(id)
    }
}

impl Default for MutexId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mutex#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutex_id_uniqueness() {
        let id1 = MutexId::new();
        let id2 = MutexId::new();
        assert_ne!(id1, id2);
        assert!(id2.as_u64() > id1.as_u64());
    }

    #[test]
    fn test_mutex_id_display() {
        assert_eq!(MutexId::from_u64(42).to_string(), "mutex#42");
    }
}
