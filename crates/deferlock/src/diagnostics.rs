//! Holder diagnostics
//!
//! When diagnostics are enabled, every blocking `lock` records the name of the
//! acquiring thread and `unlock` clears it again. The label is only meant for humans
//! (debuggers, log lines); nothing in the locking protocol reads it.

use std::fmt;
use std::thread;

/// Maximum size of a holder label in bytes.
pub const MAX_HOLDER_LABEL_LEN: usize = 250;

/// Bounded name of the thread holding a mutex
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolderLabel(String);

impl HolderLabel {
    /// Build a label, truncating on a character boundary to `MAX_HOLDER_LABEL_LEN` bytes
    pub fn new(name: &str) -> Self {
        let mut end = name.len().min(MAX_HOLDER_LABEL_LEN);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        Self(name[..end].to_owned())
    }

    /// Label for the calling thread
    ///
    /// Uses the Rust thread name, then the OS thread name, then the thread id.
    pub fn capture() -> Self {
        let current = thread::current();
        if let Some(name) = current.name() {
            return Self::new(name);
        }
        if let Some(name) = os_thread_name() {
            return Self::new(&name);
        }
        Self::new(&format!("{:?}", current.id()))
    }

    /// The label text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the label is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reset to the empty label, keeping the allocation
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for HolderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Diagnostic state of one mutex
///
/// Written only by the thread holding the underlying lock.
#[derive(Debug, Default)]
pub(crate) struct HolderState {
    pub(crate) locked: bool,
    pub(crate) label: HolderLabel,
}

impl HolderState {
    pub(crate) fn record(&mut self) {
        self.locked = true;
        self.label = HolderLabel::capture();
    }

    pub(crate) fn clear(&mut self) {
        self.locked = false;
        self.label.clear();
    }
}

#[cfg(any(all(target_os = "linux", target_env = "gnu"), target_os = "macos"))]
fn os_thread_name() -> Option<String> {
    let mut buf = [0 as libc::c_char; MAX_HOLDER_LABEL_LEN];
    // SAFETY: buf is writable for its full length and pthread_self() is always valid.
    let rc = unsafe { libc::pthread_getname_np(libc::pthread_self(), buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: on success the name is NUL-terminated within buf.
    let name = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) };
    let name = name.to_string_lossy();
    if name.is_empty() {
        None
    } else {
        Some(name.into_owned())
    }
}

#[cfg(not(any(all(target_os = "linux", target_env = "gnu"), target_os = "macos")))]
fn os_thread_name() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_truncates_to_limit() {
        let long = "x".repeat(MAX_HOLDER_LABEL_LEN + 40);
        let label = HolderLabel::new(&long);
        assert_eq!(label.as_str().len(), MAX_HOLDER_LABEL_LEN);
    }

    #[test]
    fn test_label_truncates_on_char_boundary() {
        // 'é' is two bytes; 249 ASCII bytes + 'é' would end at byte 251
        let name = format!("{}é", "a".repeat(MAX_HOLDER_LABEL_LEN - 1));
        let label = HolderLabel::new(&name);
        assert_eq!(label.as_str().len(), MAX_HOLDER_LABEL_LEN - 1);
        assert!(label.as_str().chars().all(|c| c == 'a'));
    }

    #[test]
    fn test_capture_uses_thread_name() {
        let label = thread::Builder::new()
            .name("decoder-7".to_string())
            .spawn(HolderLabel::capture)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(label.as_str(), "decoder-7");
    }

    #[test]
    fn test_capture_unnamed_thread_is_not_empty() {
        let label = thread::spawn(HolderLabel::capture).join().unwrap();
        assert!(!label.is_empty());
    }

    #[test]
    fn test_holder_state_record_and_clear() {
        let mut state = HolderState::default();
        assert!(!state.locked);
        assert!(state.label.is_empty());

        state.record();
        assert!(state.locked);
        assert!(!state.label.is_empty());

        state.clear();
        assert!(!state.locked);
        assert!(state.label.is_empty());
    }
}
