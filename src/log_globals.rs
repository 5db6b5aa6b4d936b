//! Global log stream instances.

use crate::logging::LogStream;

/// Terminal event log.
///
/// Fed by the command engine and the intake polling helper, drained by the
/// log output task (UART on the device, stderr on the host).
pub static TERMINAL_LOG: LogStream = LogStream::new();
