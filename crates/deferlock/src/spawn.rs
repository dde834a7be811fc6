//! Helper-thread spawning
//!
//! Delayed destroys run on a helper thread obtained through [`Spawner`]. The
//! returned [`HelperHandle`] is handed back to the routine it runs, which releases it
//! as its final step.

use std::io;
use std::thread::{self, JoinHandle};

/// Work executed on a helper thread
pub type Routine = Box<dyn FnOnce() + Send + 'static>;

/// Owned handle to a spawned helper thread
pub trait HelperHandle: Send {
    /// Dispose of the thread object.
    ///
    /// Joins when called from another thread; detaches when called from the helper
    /// itself, which is how the delayed-destroy routine uses it.
    fn release(self: Box<Self>);
}

/// Capability to run a routine on a new thread
pub trait Spawner: Send + Sync {
    /// Start `routine` on a thread called `name`
    fn spawn(&self, name: String, routine: Routine) -> io::Result<Box<dyn HelperHandle>>;
}

/// Spawns plain OS threads through `std::thread::Builder`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(&self, name: String, routine: Routine) -> io::Result<Box<dyn HelperHandle>> {
        let handle = thread::Builder::new().name(name).spawn(routine)?;
        Ok(Box::new(handle))
    }
}

impl HelperHandle for JoinHandle<()> {
    fn release(self: Box<Self>) {
        if self.thread().id() == thread::current().id() {
            // Dropping a JoinHandle detaches the thread.
            drop(self);
        } else {
            let _ = (*self).join();
        }
    }
}
