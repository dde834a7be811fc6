//! Immediate and delayed destruction
//!
//! A delayed destroy hands the mutex to a helper thread. The helper waits out the
//! grace period on the destroy signal, frees the mutex, releases its own thread
//! handle, and only then logs completion:
//!
//! ```text
//! owner                          helper
//! -----                          ------
//! mode = PendingDelayed
//! signal = new
//! spawn(helper) ───────────────▶ wait for arm
//! store handle
//! arm ─────────────────────────▶ wait on signal until now + grace
//! (returns)                      take the native lock
//!                                drop signal
//!                                free mutex
//!                                release own handle
//!                                log
//! ```

use crate::config::REAPER_THREAD_PREFIX;
use crate::error::MutexError;
use crate::spawn::HelperHandle;
use crate::sync::GuardedMutex;
use crossbeam::channel::{self, Receiver};
use parking_lot::lock_api::RawMutex as _;
use parking_lot::{Condvar, Mutex};
use std::ptr::NonNull;
use std::sync::Arc;
use std::time::Instant;

/// How a mutex is being destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DestroyMode {
    /// No destroy requested yet
    #[default]
    None,
    /// A helper thread will free the mutex after the grace period
    PendingDelayed,
}

/// Destroy bookkeeping stored on the mutex
#[derive(Default)]
pub(crate) struct DestroyState {
    pub(crate) mode: DestroyMode,
    /// Helper thread running the delayed destroy
    pub(crate) handle: Option<Box<dyn HelperHandle>>,
    pub(crate) signal: Option<Arc<DestroySignal>>,
}

/// Timed wait used by the delayed-destroy helper
///
/// Nothing notifies it today; the condvar keeps the wait interruptible.
pub struct DestroySignal {
    lock: Mutex<()>,
    cond: Condvar,
}

impl DestroySignal {
    /// Create an unsignaled destroy signal
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Block until `deadline` (or forever when `None`)
    ///
    /// Early wakeups go back to waiting, so this never returns before the deadline.
    pub fn wait_until(&self, deadline: Option<Instant>) {
        let mut guard = self.lock.lock();
        match deadline {
            Some(deadline) => {
                while Instant::now() < deadline {
                    self.cond.wait_until(&mut guard, deadline);
                }
            }
            None => loop {
                self.cond.wait(&mut guard);
            },
        }
    }
}

impl Default for DestroySignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to free a mutex, carried into the helper thread
struct ReclaimTicket {
    ptr: NonNull<GuardedMutex>,
}

// SAFETY: the ticket is the only path that frees the mutex, and GuardedMutex is Send + Sync.
unsafe impl Send for ReclaimTicket {}

/// Free the mutex
///
/// # Safety
/// `ptr` must come from `GuardedMutex::create_with`, must not have been freed, and no
/// reference to it may be used afterwards.
pub(crate) unsafe fn reclaim(ptr: NonNull<GuardedMutex>) {
    // SAFETY: forwarded from the caller.
    drop(unsafe { Box::from_raw(ptr.as_ptr()) });
}

/// Start a delayed destroy of the mutex behind `ptr`
///
/// The caller has given up ownership of `ptr`; from here on only the helper frees it.
pub(crate) fn schedule(ptr: NonNull<GuardedMutex>) -> Result<(), MutexError> {
    // SAFETY: nothing frees the mutex until the helper is armed below.
    let mutex = unsafe { ptr.as_ref() };
    let id = mutex.id();
    let grace = mutex.config.grace_period;

    {
        let mut state = mutex.destroy.lock();
        state.mode = DestroyMode::PendingDelayed;
        state.signal = Some(Arc::new(DestroySignal::new()));
    }

    let (arm_tx, arm_rx) = channel::bounded::<()>(1);
    let ticket = ReclaimTicket { ptr };
    let name = format!("{}-{}", REAPER_THREAD_PREFIX, id.as_u64());

    match mutex
        .config
        .spawner
        .spawn(name, Box::new(move || run_delayed_destroy(ticket, arm_rx)))
    {
        Ok(handle) => {
            mutex.destroy.lock().handle = Some(handle);
            tracing::debug!(
                mutex = %id,
                grace_ms = grace.as_millis() as u64,
                "delayed destroy scheduled"
            );
            // The helper may free the mutex any time after this send.
            let _ = arm_tx.send(());
            Ok(())
        }
        Err(source) => {
            tracing::error!(mutex = %id, error = %source, "failed to spawn destroy helper, leaking mutex");
            Err(MutexError::SpawnFailed { id, source })
        }
    }
}

/// Body of the delayed-destroy helper thread
fn run_delayed_destroy(ticket: ReclaimTicket, armed: Receiver<()>) {
    // Disconnected without arming: the owner never finished scheduling, leak it.
    if armed.recv().is_err() {
        return;
    }

    let ptr = ticket.ptr;
    // SAFETY: this routine is the only one allowed to free the mutex, and has not yet.
    let mutex = unsafe { ptr.as_ref() };
    let id = mutex.id();
    let grace = mutex.config.grace_period;
    let deadline = Instant::now().checked_add(grace);

    let signal = mutex.destroy.lock().signal.clone();
    if let Some(signal) = signal {
        signal.wait_until(deadline);
    }

    // A late locker still inside its critical section finishes before the free.
    // The lock is never released again.
    mutex.raw().lock();

    let handle = {
        let mut state = mutex.destroy.lock();
        state.signal = None;
        state.handle.take()
    };

    // SAFETY: the grace period has elapsed and the owner gave the allocation away in
    // `schedule`; `mutex` is not used past this point.
    unsafe { reclaim(ptr) };

    if let Some(handle) = handle {
        handle.release();
    }

    tracing::info!(
        mutex = %id,
        grace_ms = grace.as_millis() as u64,
        "mutex {:p} was destroyed after delay",
        ptr.as_ptr()
    );
}
