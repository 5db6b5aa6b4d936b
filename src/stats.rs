//! Terminal diagnostics counters.
//!
//! Written only by the terminal's polling loop, readable from any other
//! subsystem (display page, remote status) without locking.

use core::sync::atomic::{AtomicU32, Ordering};

/// Lock-free counters describing terminal activity since boot.
pub struct TerminalStats {
    /// Commands that ran to completion.
    commands: AtomicU32,
    /// Lines abandoned on unrecognized or incomplete input.
    malformed: AtomicU32,
    /// Commands rejected for an out-of-range index or read-only table.
    addressing: AtomicU32,
    /// Accumulator operations rejected (divide by zero, negative root).
    arithmetic: AtomicU32,
    /// Intake bytes dropped on a full ring.
    overflow: AtomicU32,
}

impl TerminalStats {
    pub const fn new() -> Self {
        Self {
            commands: AtomicU32::new(0),
            malformed: AtomicU32::new(0),
            addressing: AtomicU32::new(0),
            arithmetic: AtomicU32::new(0),
            overflow: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn record_command(&self) -> u32 {
        self.commands.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    #[inline]
    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_addressing(&self) {
        self.addressing.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_arithmetic(&self) {
        self.arithmetic.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_overflow(&self, bytes: u32) {
        self.overflow.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Commands completed so far (also the log sequence stamp).
    #[inline]
    pub fn commands(&self) -> u32 {
        self.commands.load(Ordering::Relaxed)
    }

    /// Consistent-enough copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            commands: self.commands.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            addressing: self.addressing.load(Ordering::Relaxed),
            arithmetic: self.arithmetic.load(Ordering::Relaxed),
            overflow: self.overflow.load(Ordering::Relaxed),
        }
    }
}

impl Default for TerminalStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub commands: u32,
    pub malformed: u32,
    pub addressing: u32,
    pub arithmetic: u32,
    pub overflow: u32,
}
