//! Deferlock
//!
//! A mutual-exclusion primitive with safe deferred destruction:
//! - **Locking**: blocking `lock`, non-blocking `try_lock`, `unlock`, and raw access
//!   to the native lock (`sync` module)
//! - **Diagnostics**: optional record of which thread holds the lock (`diagnostics` module)
//! - **Destruction**: immediate, or delayed by a grace period on a helper thread so
//!   in-flight lockers never touch freed memory (`sync::destroy`)
//! - **Spawning**: the helper-thread seam (`spawn` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use deferlock::{GuardedMutex, MutexConfig};
//!
//! let mutex = GuardedMutex::create_with(MutexConfig::default());
//! {
//!     let _guard = mutex.guard();
//!     // critical section
//! }
//!
//! // Hand the object to a helper thread that frees it after the grace period.
//! mutex.destroy(true)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Modules
// ============================================================================

/// Per-mutex configuration and build-mode defaults
pub mod config;

/// Holder-label capture and diagnostic state
pub mod diagnostics;

/// Error types
pub mod error;

/// Helper-thread spawning seam
pub mod spawn;

/// The guarded mutex, its guard, and destruction
pub mod sync;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{MutexConfig, ReclaimHook, TryLockPolicy};
pub use diagnostics::HolderLabel;
pub use error::MutexError;
pub use spawn::{HelperHandle, Routine, Spawner, ThreadSpawner};
pub use sync::{
    access_raw, lock, try_lock, unlock, DestroyMode, GuardedMutex, MutexGuard, MutexId,
    MutexPtr, OwnedMutex,
};
