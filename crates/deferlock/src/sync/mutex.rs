//! Guarded mutex: lifecycle and locking

use crate::config::{MutexConfig, TryLockPolicy};
use crate::diagnostics::{HolderLabel, HolderState};
use crate::error::MutexError;
use crate::sync::destroy::{self, DestroyMode, DestroyState};
use crate::sync::MutexId;
use parking_lot::lock_api::RawMutex as _;
use parking_lot::{Mutex as ParkingLotMutex, RawMutex};
use std::fmt;
use std::mem;
use std::ops::Deref;
use std::ptr::NonNull;

/// Mutual-exclusion object with holder diagnostics and deferred destruction
///
/// Only reachable through an [`OwnedMutex`] (or a [`MutexPtr`] derived from one), so
/// its memory is freed exactly once: by the owner, or by a delayed-destroy helper
/// once the grace period has passed.
pub struct GuardedMutex {
    /// Unique mutex ID
    id: MutexId,

    /// The native exclusive lock
    raw: RawMutex,

    /// Holder diagnostics, written only while `raw` is held
    holder: ParkingLotMutex<HolderState>,

    /// Destroy bookkeeping, written by the destroying owner and then the helper
    pub(crate) destroy: ParkingLotMutex<DestroyState>,

    pub(crate) config: MutexConfig,
}

impl GuardedMutex {
    /// Create a mutex with the default configuration
    pub fn create() -> OwnedMutex {
        Self::create_with(MutexConfig::default())
    }

    /// Create a mutex with an explicit configuration
    pub fn create_with(config: MutexConfig) -> OwnedMutex {
        let mutex = Box::new(GuardedMutex {
            id: MutexId::new(),
            raw: RawMutex::INIT,
            holder: ParkingLotMutex::new(HolderState::default()),
            destroy: ParkingLotMutex::new(DestroyState::default()),
            config,
        });
        OwnedMutex {
            ptr: NonNull::from(Box::leak(mutex)),
        }
    }

    /// Get the mutex ID
    pub fn id(&self) -> MutexId {
        self.id
    }

    /// The configuration this mutex was created with
    pub fn config(&self) -> &MutexConfig {
        &self.config
    }

    /// Block until the lock is acquired
    ///
    /// With diagnostics enabled, records the calling thread as holder.
    pub fn lock(&self) {
        self.raw.lock();
        if self.config.diagnostics {
            self.holder.lock().record();
        }
    }

    /// Attempt to acquire the lock without blocking
    ///
    /// Diagnostics are recorded only under [`TryLockPolicy::Record`].
    pub fn try_lock(&self) -> bool {
        let acquired = self.raw.try_lock();
        if acquired
            && self.config.diagnostics
            && self.config.try_lock_policy == TryLockPolicy::Record
        {
            self.holder.lock().record();
        }
        acquired
    }

    /// Release the lock
    ///
    /// Diagnostics are cleared before the native unlock, whose release ordering
    /// publishes the cleared state to the next holder.
    ///
    /// # Safety
    /// The lock must be held by the current thread.
    pub unsafe fn unlock(&self) {
        if self.config.diagnostics {
            self.holder.lock().clear();
        }
        // SAFETY: forwarded from the caller.
        unsafe { self.raw.unlock() };
    }

    /// The native lock, for interop that needs the raw primitive
    ///
    /// Locking through it bypasses diagnostics.
    pub fn raw(&self) -> &RawMutex {
        &self.raw
    }

    /// Whether the native lock is currently held by anyone
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Diagnostic view: whether a holder is currently recorded
    pub fn recorded_locked(&self) -> bool {
        self.holder.lock().locked
    }

    /// Diagnostic view: label of the recorded holder (empty when none)
    pub fn holder_label(&self) -> HolderLabel {
        self.holder.lock().label.clone()
    }

    /// Current destruction mode
    pub fn destroy_mode(&self) -> DestroyMode {
        self.destroy.lock().mode
    }

    /// Raw pointer for consumers that cannot hold a borrow
    pub fn as_ptr(&self) -> MutexPtr {
        MutexPtr(NonNull::from(self))
    }
}

impl Drop for GuardedMutex {
    fn drop(&mut self) {
        if let Some(hook) = &self.config.reclaim_hook {
            hook(self.id);
        }
    }
}

impl fmt::Debug for GuardedMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedMutex")
            .field("id", &self.id)
            .field("locked", &self.is_locked())
            .field("holder", &self.holder_label())
            .field("destroy_mode", &self.destroy_mode())
            .finish()
    }
}

// ============================================================================
// Optional-mutex operations
// ============================================================================

/// Lock `mutex` if present; `None` is a no-op
pub fn lock(mutex: Option<&GuardedMutex>) {
    if let Some(mutex) = mutex {
        mutex.lock();
    }
}

/// Try to lock `mutex` if present; `None` counts as acquired
pub fn try_lock(mutex: Option<&GuardedMutex>) -> bool {
    mutex.map_or(true, GuardedMutex::try_lock)
}

/// Unlock `mutex` if present; `None` is a no-op
///
/// # Safety
/// When `mutex` is `Some`, its lock must be held by the current thread.
pub unsafe fn unlock(mutex: Option<&GuardedMutex>) {
    if let Some(mutex) = mutex {
        // SAFETY: forwarded from the caller.
        unsafe { mutex.unlock() };
    }
}

/// The native lock of `mutex`
pub fn access_raw(mutex: &GuardedMutex) -> &RawMutex {
    mutex.raw()
}

// ============================================================================
// Ownership
// ============================================================================

/// The single owning handle of a [`GuardedMutex`]
///
/// Dropping it destroys the mutex immediately; [`OwnedMutex::destroy`] selects
/// between immediate and delayed destruction.
pub struct OwnedMutex {
    ptr: NonNull<GuardedMutex>,
}

// SAFETY: OwnedMutex uniquely owns a GuardedMutex, which is Send + Sync.
unsafe impl Send for OwnedMutex {}
// SAFETY: shared access only hands out &GuardedMutex.
unsafe impl Sync for OwnedMutex {}

impl OwnedMutex {
    /// Destroy now (`delay == false`) or after the grace period (`delay == true`)
    pub fn destroy(self, delay: bool) -> Result<(), MutexError> {
        if delay {
            self.destroy_delayed()
        } else {
            self.destroy_now();
            Ok(())
        }
    }

    /// Free the mutex on the calling thread
    ///
    /// No other thread may hold the lock or be about to acquire it.
    pub fn destroy_now(self) {
        drop(self);
    }

    /// Hand the mutex to a helper thread that frees it after the grace period
    ///
    /// Returns without blocking. If the helper cannot be spawned the mutex is
    /// leaked and `MutexError::SpawnFailed` is returned.
    pub fn destroy_delayed(self) -> Result<(), MutexError> {
        destroy::schedule(self.into_raw())
    }

    fn into_raw(self) -> NonNull<GuardedMutex> {
        let ptr = self.ptr;
        mem::forget(self);
        ptr
    }
}

impl Deref for OwnedMutex {
    type Target = GuardedMutex;

    fn deref(&self) -> &GuardedMutex {
        // SAFETY: the allocation lives until this handle is dropped or consumed.
        unsafe { self.ptr.as_ref() }
    }
}

impl Drop for OwnedMutex {
    fn drop(&mut self) {
        let id = self.id;
        // SAFETY: the pointer came from `create_with` and this handle was not consumed.
        unsafe { destroy::reclaim(self.ptr) };
        tracing::trace!(mutex = %id, "mutex destroyed");
    }
}

impl fmt::Debug for OwnedMutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedMutex").field(&**self).finish()
    }
}

/// Copyable raw pointer to a [`GuardedMutex`]
///
/// This is what consumers store when they cannot borrow from the owner. After a
/// delayed destroy is requested it remains valid for at least the grace period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutexPtr(NonNull<GuardedMutex>);

// SAFETY: the pointee is Sync; dereferencing is already gated by `unsafe fn get`.
unsafe impl Send for MutexPtr {}
// SAFETY: see above.
unsafe impl Sync for MutexPtr {}

impl MutexPtr {
    /// Borrow the mutex
    ///
    /// # Safety
    /// The mutex must not have been reclaimed, and must stay live for `'a`: either
    /// its owner is still alive, or a delayed destroy was requested less than one
    /// grace period before the borrow ends.
    pub unsafe fn get<'a>(self) -> &'a GuardedMutex {
        // SAFETY: forwarded from the caller.
        unsafe { self.0.as_ref() }
    }

    /// Address of the mutex, for logging
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}
