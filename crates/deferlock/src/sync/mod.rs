//! Guarded mutex with deferred destruction
//!
//! A [`GuardedMutex`] is created through [`GuardedMutex::create`], which returns the
//! single owning handle, [`OwnedMutex`]. Other threads reach the mutex either by
//! borrowing from the owner or through a raw [`MutexPtr`]. Destroying the owner
//! either frees the mutex at once or hands it to a helper thread that frees it after
//! a grace period, so pointer holders that are mid-`lock` finish against live memory.

pub mod destroy;
mod guard;
mod mutex;
mod mutex_id;

pub use destroy::DestroyMode;
pub use guard::MutexGuard;
pub use mutex::{access_raw, lock, try_lock, unlock, GuardedMutex, MutexPtr, OwnedMutex};
pub use mutex_id::MutexId;
