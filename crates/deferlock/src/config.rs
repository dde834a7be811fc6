//! Per-mutex configuration.
//!
//! The diagnostics switch and the grace period used to be build-time choices. They are
//! plain fields here so both modes can be exercised from one build; `Default` still
//! follows the build mode.

use crate::spawn::{Spawner, ThreadSpawner};
use crate::sync::MutexId;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Grace period used when debug assertions are enabled (long enough to inspect a
/// pending destroy from a debugger).
pub const DEBUG_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Grace period used in release builds.
pub const RELEASE_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Name prefix for delayed-destroy helper threads.
pub const REAPER_THREAD_PREFIX: &str = "deferlock-reaper";

/// Grace period matching the current build mode.
pub const fn default_grace_period() -> Duration {
    if cfg!(debug_assertions) {
        DEBUG_GRACE_PERIOD
    } else {
        RELEASE_GRACE_PERIOD
    }
}

/// Callback invoked with the mutex identity once its memory is freed.
pub type ReclaimHook = Arc<dyn Fn(MutexId) + Send + Sync>;

/// Whether a successful `try_lock` records the holder label.
///
/// Only the blocking `lock` path records diagnostics by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TryLockPolicy {
    /// `try_lock` leaves diagnostics untouched.
    #[default]
    Silent,
    /// `try_lock` records holder diagnostics like `lock` does.
    Record,
}

/// Configuration for a guarded mutex
#[derive(Clone)]
pub struct MutexConfig {
    /// Record `is_locked` and the holder label on lock (default: debug assertions)
    pub diagnostics: bool,
    /// Diagnostic behaviour of `try_lock` (default: `Silent`)
    pub try_lock_policy: TryLockPolicy,
    /// Minimum time a delayed destroy waits before freeing (default: 10s debug, 1s release)
    pub grace_period: Duration,
    /// Spawns the delayed-destroy helper (default: `ThreadSpawner`)
    pub spawner: Arc<dyn Spawner>,
    /// Called when the mutex memory is freed (default: none)
    pub reclaim_hook: Option<ReclaimHook>,
}

impl MutexConfig {
    /// Records `try_lock` acquisitions in diagnostics as well.
    pub fn with_try_lock_policy(mut self, policy: TryLockPolicy) -> Self {
        self.try_lock_policy = policy;
        self
    }

    /// Sets the grace period for delayed destroys.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Enables or disables holder diagnostics.
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// Replaces the helper-thread spawner.
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Installs a callback fired when the mutex is freed.
    pub fn on_reclaim(mut self, hook: impl Fn(MutexId) + Send + Sync + 'static) -> Self {
        self.reclaim_hook = Some(Arc::new(hook));
        self
    }
}

impl Default for MutexConfig {
    fn default() -> Self {
        Self {
            diagnostics: cfg!(debug_assertions),
            try_lock_policy: TryLockPolicy::Silent,
            grace_period: default_grace_period(),
            spawner: Arc::new(ThreadSpawner),
            reclaim_hook: None,
        }
    }
}

impl fmt::Debug for MutexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexConfig")
            .field("diagnostics", &self.diagnostics)
            .field("try_lock_policy", &self.try_lock_policy)
            .field("grace_period", &self.grace_period)
            .field("reclaim_hook", &self.reclaim_hook.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_default_follows_build_mode() {
        let config = MutexConfig::default();
        assert_eq!(config.diagnostics, cfg!(debug_assertions));
        assert_eq!(config.try_lock_policy, TryLockPolicy::Silent);
        assert!(config.reclaim_hook.is_none());

        if cfg!(debug_assertions) {
            assert_eq!(config.grace_period, Duration::from_secs(10));
        } else {
            assert_eq!(config.grace_period, Duration::from_secs(1));
        }
    }

    #[test]
    fn test_builder_methods() {
        let config = MutexConfig::default()
            .with_diagnostics(true)
            .with_try_lock_policy(TryLockPolicy::Record)
            .with_grace_period(Duration::from_millis(5));

        assert!(config.diagnostics);
        assert_eq!(config.try_lock_policy, TryLockPolicy::Record);
        assert_eq!(config.grace_period, Duration::from_millis(5));
    }

    #[test]
    fn test_reclaim_hook_is_callable() {
        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        let config = MutexConfig::default().on_reclaim(move |id| {
            sink.store(id.as_u64(), Ordering::SeqCst);
        });

        let hook = config.reclaim_hook.clone().unwrap();
        hook(MutexId::from_u64(7));
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_debug_hides_spawner() {
        let rendered = format!("{:?}", MutexConfig::default());
        assert!(rendered.contains("grace_period"));
        assert!(rendered.contains("reclaim_hook: false"));
    }
}
