//! Signal handling: SIGTERM/SIGINT request a graceful stop of the badge loop.
//!
//! Uses the `signal-hook` crate for safe signal registration. The run loop
//! polls the shared flag every tick rather than blocking on signals.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Shutdown flag shared between the OS signal hooks and the run loop.
///
/// `Ordering::Relaxed` is enough: the loop polls every tick and nothing else
/// is ordered against the flag.
#[derive(Debug, Clone)]
pub struct SignalHandler {
    shutdown_flag: Arc<AtomicBool>,
}

impl SignalHandler {
    /// Create a handler and register the OS hooks.
    ///
    /// Registration is best-effort. Failures are logged but not fatal.
    #[must_use]
    pub fn new() -> Self {
        let handler = Self::unregistered();
        handler.register_signals();
        handler
    }

    /// A handler with no OS hooks, for tests and embedding.
    #[must_use]
    pub fn unregistered() -> Self {
        Self {
            shutdown_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown_flag.load(Ordering::Relaxed)
    }

    pub fn request_shutdown(&self) {
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }

    /// The raw flag, for handing to the runtime.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown_flag)
    }

    fn register_signals(&self) {
        for (name, signal) in [("SIGTERM", SIGTERM), ("SIGINT", SIGINT)] {
            if let Err(err) = signal_hook::flag::register(signal, Arc::clone(&self.shutdown_flag)) {
                tracing::warn!(signal = name, error = %err, "failed to register signal hook");
            }
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shutdown_is_visible_through_flag() {
        let handler = SignalHandler::unregistered();
        let flag = handler.flag();
        assert!(!handler.should_shutdown());
        handler.request_shutdown();
        assert!(handler.should_shutdown());
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn clones_share_state() {
        let handler = SignalHandler::unregistered();
        let clone = handler.clone();
        clone.request_shutdown();
        assert!(handler.should_shutdown());
    }
}
