//! Diagnostic command terminal.
//!
//! Byte-at-a-time protocol engine polled from the main loop.
//! Zero heap allocation - all fixed-capacity buffers.

/// Write one output line terminated by CR LF, ignoring sink errors.
macro_rules! outln {
    ($out:expr) => {{
        let _ = $out.write_str("\r\n");
    }};
    ($out:expr, $($arg:tt)*) => {{
        let _ = $out.write_fmt(format_args!($($arg)*));
        let _ = $out.write_str("\r\n");
    }};
}

pub mod accumulator;
pub mod adapters;
pub mod commands;
pub mod error;
pub mod machine;
pub mod number;
pub mod vars;

pub use accumulator::{MathAccumulator, MathOp};
pub use adapters::{Button, ButtonPress, ButtonQueue, ButtonSink, Passthrough};
pub use commands::{CommandDescriptor, COMMANDS};
pub use error::TerminalError;
pub use machine::{Device, InputModeFlags, Terminal, TerminalState};
pub use number::{NumberEntry, Radix};
pub use vars::{AddressRange, RamTable, TableError, Tables, TripFunctions, VarTable, VariableClass, Width};
