//! Allocation-free event logging for the terminal.
//!
//! ```text
//! Terminal / intake          LogStream            drain task
//! ─────────────────          ─────────            ──────────
//!
//! term_warn!() ────────────▶ [L0][L1][L2] ──────▶ UART / stderr
//! never blocks               lock-free            blocking ok
//! ```
//!
//! Entries carry a sequence stamp supplied by the caller instead of a clock;
//! the terminal uses its command counter. When the ring is full the entry is
//! dropped and counted.

use core::cell::UnsafeCell;
use core::fmt::Write;
use core::sync::atomic::{AtomicU32, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log ring size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// One log record.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Caller-supplied sequence stamp.
    pub seq: u32,
    pub level: LogLevel,
    /// Message length in bytes.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: LogEntry = LogEntry {
        seq: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text (lossy on invalid UTF-8).
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

/// Lock-free log ring: any number of producers, one drain.
///
/// A producer claims a slot by advancing `write_idx`, fills it, then
/// publishes it by storing `claim + 1` into the slot's `ready` stamp.
/// The drain only copies a slot whose stamp matches, so a claimed but
/// unfinished slot is never read.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: [UnsafeCell<LogEntry>; N],
    ready: [AtomicU32; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: producers claim distinct slots through the CAS on write_idx and
// a slot is only reused after the drain moved read_idx past it; the drain
// only reads slots whose ready stamp was published with Release.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        Self {
            entries: [const { UnsafeCell::new(LogEntry::EMPTY) }; N],
            ready: [const { AtomicU32::new(0) }; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue a message. Returns `false` if the ring was full.
    pub fn push(&self, seq: u32, level: LogLevel, msg: &[u8]) -> bool {
        let read = self.read_idx.load(Ordering::Acquire);
        let mut write = self.write_idx.load(Ordering::Relaxed);

        // Claim a slot only while there is room, so a full ring never
        // advances write_idx past unread entries.
        loop {
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let idx = (write as usize) & Self::MASK;
        let len = msg.len().min(MAX_MSG_LEN);

        // SAFETY: the CAS above handed this slot to exactly one producer,
        // and the drain does not touch it until `ready` is published below.
        unsafe {
            let entry = &mut *self.entries[idx].get();
            entry.seq = seq;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }
        self.ready[idx].store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Take the oldest entry (drain side only).
    ///
    /// Returns `None` when the ring is empty or the oldest claimed slot is
    /// still being written; a later call picks it up.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;
        if self.ready[idx].load(Ordering::Acquire) != read.wrapping_add(1) {
            return None;
        }

        // SAFETY: single drain, slot published by its producer's Release
        // store on `ready`, and no producer reclaims it before read_idx moves.
        let entry = unsafe { *self.entries[idx].get() };
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Entries waiting to be drained.
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Read and reset the drop counter.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncating formatter over a byte slice.
struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let n = bytes.len().min(self.buf.len() - self.pos);
        self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
        self.pos += n;
        Ok(())
    }
}

/// Format `args` into `buf`, returning the number of bytes written.
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut w = SliceWriter { buf, pos: 0 };
    let _ = w.write_fmt(args);
    w.pos
}

/// Render an entry as `[seq] LEVEL: message\r\n` for the log output.
pub fn format_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    format_to_buffer(
        buf,
        format_args!("[{:8}] {}: {}\r\n", entry.seq, entry.level.as_str(), entry.message()),
    )
}

/// Log a formatted message without allocating.
///
/// ```ignore
/// term_log!(LogLevel::Warn, TERMINAL_LOG, seq, "dropped {} bytes", n);
/// ```
#[macro_export]
macro_rules! term_log {
    ($level:expr, $stream:expr, $seq:expr, $($arg:tt)*) => {{
        let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
        let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
        $stream.push($seq, $level, &buf[..len])
    }};
}

#[macro_export]
macro_rules! term_info {
    ($stream:expr, $seq:expr, $($arg:tt)*) => {
        $crate::term_log!($crate::logging::LogLevel::Info, $stream, $seq, $($arg)*)
    };
}

#[macro_export]
macro_rules! term_warn {
    ($stream:expr, $seq:expr, $($arg:tt)*) => {
        $crate::term_log!($crate::logging::LogLevel::Warn, $stream, $seq, $($arg)*)
    };
}

#[macro_export]
macro_rules! term_error {
    ($stream:expr, $seq:expr, $($arg:tt)*) => {
        $crate::term_log!($crate::logging::LogLevel::Error, $stream, $seq, $($arg)*)
    };
}

#[macro_export]
macro_rules! term_debug {
    ($stream:expr, $seq:expr, $($arg:tt)*) => {
        $crate::term_log!($crate::logging::LogLevel::Debug, $stream, $seq, $($arg)*)
    };
}
