//! RAII guard for automatic mutex unlock

use crate::sync::GuardedMutex;
use std::marker::PhantomData;

/// RAII guard for GuardedMutex (auto-unlocks on drop)
///
/// Unlocks even when the critical section panics. The guard is `!Send`: the
/// native lock must be released by the thread that acquired it.
pub struct MutexGuard<'a> {
    /// Reference to the mutex
    mutex: &'a GuardedMutex,
    /// Whether the guard has been manually unlocked
    unlocked: bool,
    _not_send: PhantomData<*const ()>,
}

impl<'a> MutexGuard<'a> {
    /// Wrap a lock the current thread already holds
    fn new(mutex: &'a GuardedMutex) -> Self {
        Self {
            mutex,
            unlocked: false,
            _not_send: PhantomData,
        }
    }

    /// Manually unlock the mutex early (before drop)
    pub fn unlock(mut self) {
        self.unlocked = true;
        // SAFETY: the guard proves this thread holds the lock.
        unsafe { self.mutex.unlock() };
    }

    /// The guarded mutex
    pub fn mutex(&self) -> &'a GuardedMutex {
        self.mutex
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        if !self.unlocked {
            // SAFETY: the guard proves this thread holds the lock.
            unsafe { self.mutex.unlock() };
        }
    }
}

impl GuardedMutex {
    /// Lock with RAII guard
    ///
    /// Blocks like [`GuardedMutex::lock`] and records diagnostics the same way.
    pub fn guard(&self) -> MutexGuard<'_> {
        self.lock();
        MutexGuard::new(self)
    }

    /// Non-blocking variant of [`GuardedMutex::guard`]
    pub fn try_guard(&self) -> Option<MutexGuard<'_>> {
        if self.try_lock() {
            Some(MutexGuard::new(self))
        } else {
            None
        }
    }
}
