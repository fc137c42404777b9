//! Connection state shared between the pump tasks and the status
//! indicator.

use core::sync::atomic::{AtomicBool, Ordering};

/// One connected flag per interface.
///
/// Cortex-M0+ has no atomic read-modify-write, so the flags stick to
/// plain loads and stores; each flag has exactly one writer.
pub struct InterfaceFlags<const N: usize> {
    connected: [AtomicBool; N],
}

impl<const N: usize> InterfaceFlags<N> {
    pub const fn new() -> Self {
        const CLEAR: AtomicBool = AtomicBool::new(false);
        Self {
            connected: [CLEAR; N],
        }
    }

    pub fn set_connected(&self, itf: usize, connected: bool) {
        self.connected[itf].store(connected, Ordering::Relaxed);
    }

    pub fn is_connected(&self, itf: usize) -> bool {
        self.connected[itf].load(Ordering::Relaxed)
    }

    /// Whether any interface currently has a host attached.
    pub fn any(&self) -> bool {
        self.connected.iter().any(|c| c.load(Ordering::Relaxed))
    }
}
