//! # TripTerminal
//!
//! Diagnostic command terminal for an embedded trip computer.
//!
//! ## Architecture
//!
//! Bytes arrive through [`ByteQueue`], a lock-free SPSC ring filled by the
//! transport receive path. The main loop drains it into [`Terminal`], which
//! parses one byte at a time and runs each completed command against the
//! borrowed [`terminal::Device`]:
//! - variable tables (P V M T O) behind [`terminal::VarTable`]
//! - trip functions behind [`terminal::TripFunctions`]
//! - button injection and the wireless link behind adapter traits
//!
//! No heap allocation, no locks, no callbacks into the transport.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod fixed;
pub mod intake;
pub mod logging;
pub mod log_globals;
pub mod stats;
pub mod terminal;

pub use config::TerminalConfig;
pub use fixed::Fixed;
pub use intake::ByteQueue;
pub use log_globals::TERMINAL_LOG;
pub use stats::{StatsSnapshot, TerminalStats};
pub use terminal::{Terminal, TerminalError};
