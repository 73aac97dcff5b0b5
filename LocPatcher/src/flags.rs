//! Flag-change notifications
//!
//! The host reports flag changes through a [`FlagNotifier`]. Notifications
//! queue up in a [`FlagChannel`] owned by the patcher and are dispatched when
//! the patcher drains it, on the patcher's own thread.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;

/// Current flag values of the host
pub trait FlagSource {
    fn is_set(&self, flag: &str) -> bool;
}

impl FlagSource for HashMap<String, bool> {
    fn is_set(&self, flag: &str) -> bool {
        self.get(flag).copied().unwrap_or(false)
    }
}

impl FlagSource for HashSet<String> {
    fn is_set(&self, flag: &str) -> bool {
        self.contains(flag)
    }
}

/// Sending half handed to the host
#[derive(Debug, Clone)]
pub struct FlagNotifier {
    tx: mpsc::Sender<String>,
}

impl FlagNotifier {
    /// Report that `flag` changed. Returns `false` once the patcher is gone.
    pub fn notify(&self, flag: impl Into<String>) -> bool {
        self.tx.send(flag.into()).is_ok()
    }
}

/// Queue of pending flag changes
#[derive(Debug)]
pub struct FlagChannel {
    tx: mpsc::Sender<String>,
    rx: mpsc::Receiver<String>,
}

impl Default for FlagChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagChannel {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    #[must_use]
    pub fn notifier(&self) -> FlagNotifier {
        FlagNotifier {
            tx: self.tx.clone(),
        }
    }

    /// Take every queued flag id without blocking
    pub fn drain(&self) -> Vec<String> {
        self.rx.try_iter().collect()
    }
}

/// Flag name → names of the patches waiting on it
#[derive(Debug, Clone, Default)]
pub struct FlagListeners {
    listeners: HashMap<String, Vec<String>>,
}

impl FlagListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(&mut self, flag: &str, patch_name: &str) {
        let names = self.listeners.entry(flag.to_string()).or_default();
        if !names.iter().any(|n| n == patch_name) {
            names.push(patch_name.to_string());
        }
    }

    /// Stop dispatching to `patch_name` for every flag
    pub fn forget(&mut self, patch_name: &str) {
        for names in self.listeners.values_mut() {
            names.retain(|n| n != patch_name);
        }
        self.listeners.retain(|_, names| !names.is_empty());
    }

    #[must_use]
    pub fn patches_for(&self, flag: &str) -> &[String] {
        self.listeners.get(flag).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
