//! Error types

use crate::sync::MutexId;

/// Errors that can occur when destroying a mutex
#[derive(Debug, thiserror::Error)]
pub enum MutexError {
    /// The delayed-destroy helper thread could not be started.
    ///
    /// The mutex is leaked rather than freed early.
    #[error("failed to spawn delayed-destroy helper for {id}: {source}")]
    SpawnFailed {
        /// Mutex that was leaked
        id: MutexId,
        /// Underlying spawn failure
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_spawn_failed_display_and_source() {
        let err = MutexError::SpawnFailed {
            id: MutexId::from_u64(3),
            source: std::io::Error::new(std::io::ErrorKind::WouldBlock, "no threads left"),
        };
        let text = err.to_string();
        assert!(text.contains("mutex#3"));
        assert!(text.contains("no threads left"));
        assert!(err.source().is_some());
    }
}
