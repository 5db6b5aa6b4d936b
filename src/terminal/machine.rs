//! Command state machine.
//!
//! Consumes one byte at a time and never blocks. Each byte either extends
//! the command being built or completes it; a completed command runs
//! immediately against the borrowed [`Device`] and writes its output lines.
//!
//! Grammar per line, with every number optional:
//!
//! ```text
//! [z]<[y].[x]C      C in P V M T O L U R, or end of line / operator (number entry)
//! x:C v v ...       sequential write, C in P V M T
//! op v              op in = + - * /, v a signed decimal literal
//! |  I<letter>  Y<text>  S  ?
//! ```
//!
//! A carriage return or line feed always ends the line and returns to
//! [`TerminalState::Idle`]. A failed command discards the rest of its line.

use core::fmt::Write;

use heapless::Vec;

use crate::config::{TerminalConfig, MAX_OUTPUT_DECIMALS, PASSTHROUGH_LINE_SIZE};
use crate::fixed::Fixed;
use crate::intake::ByteQueue;
use crate::log_globals::TERMINAL_LOG;
use crate::stats::TerminalStats;
use crate::{term_debug, term_info, term_warn};

use super::accumulator::{MathAccumulator, MathOp};
use super::adapters::{ButtonPress, ButtonSink, Passthrough};
use super::commands;
use super::number::{NumberEntry, Radix};
use super::vars::{AddressRange, Tables, VariableClass};
use super::TerminalError;

const MALFORMED: Option<Result<(), TerminalError>> = Some(Err(TerminalError::MalformedCommand));

/// Most passthrough response chunks mirrored per command.
const LINK_ECHO_CHUNKS: usize = 8;

/// Collaborators one byte may touch, borrowed for the call.
pub struct Device<'a> {
    pub tables: Tables<'a>,
    pub buttons: &'a mut dyn ButtonSink,
    pub link: Option<&'a mut dyn Passthrough>,
}

/// Externally visible terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalState {
    Idle,
    /// Reading the plain `[x]` operand.
    ReadingAddress,
    /// After `<`: reading `[y].[x]`.
    ReadingSource,
    /// After `.`: reading `[x]`.
    ReadingTarget,
    /// After `x:`, waiting for the class letter.
    ReadingWriteClass,
    /// Reading space-separated values to store.
    WritingValues,
    /// Reading an accumulator operand.
    ReadingNumber,
    /// After `I`, waiting for the button letter.
    ReadingButtonCode,
    /// After `Y`, collecting the line for the link.
    Passthrough,
    /// Ignoring the rest of a failed line.
    Discarding,
}

/// Bit view of how the pending token will be interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputModeFlags(u8);

impl InputModeFlags {
    pub const BYTE_READ_IN: u8 = 0x80;
    pub const SOURCE_READ_IN: u8 = 0x40;
    pub const TARGET_READ_IN: u8 = 0x20;
    pub const ADDRESS_READ_IN: u8 = 0x10;
    pub const HEX_INPUT: u8 = 0x08;
    pub const DECIMAL_INPUT: u8 = 0x04;
    pub const BUTTON_INPUT: u8 = 0x02;
    pub const INIT_INPUT: u8 = 0x01;

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    fn for_entry(entry: &NumberEntry) -> u8 {
        let mut bits = match entry.radix() {
            Radix::Hex => Self::HEX_INPUT,
            Radix::Decimal => Self::DECIMAL_INPUT,
        };
        if entry.is_empty() {
            bits |= Self::INIT_INPUT;
        } else {
            bits |= Self::BYTE_READ_IN;
        }
        bits
    }
}

/// Operand fields collected before a command letter: `[z]<[y].[x]`.
#[derive(Clone, Copy, Debug, Default)]
struct Operands {
    /// `z`, the field before `<`.
    window: Option<u64>,
    /// `y`, the field before `.`.
    first: Option<u64>,
    windowed: bool,
    dotted: bool,
    /// The number currently being read.
    entry: NumberEntry,
}

impl Operands {
    fn new(entry: NumberEntry) -> Self {
        Self { entry, ..Self::default() }
    }

    fn is_pending(&self) -> bool {
        self.windowed || self.dotted || !self.entry.is_empty() || self.entry.radix() == Radix::Hex
    }

    /// `x`, the lone or trailing number.
    fn value(&self) -> Option<u64> {
        (!self.entry.is_empty()).then(|| self.entry.to_word())
    }

    fn take_entry(&mut self, fresh: NumberEntry) -> Option<u64> {
        let value = self.value();
        self.entry = fresh;
        value
    }

    fn range(&self) -> AddressRange {
        let x = self.value().map(to_index);
        if self.dotted {
            AddressRange { start: self.first.map(to_index), end: x }
        } else {
            AddressRange { start: x, end: None }
        }
    }
}

#[derive(Clone, Debug)]
enum State {
    Idle,
    Operands(Operands),
    WriteClass { index: usize },
    WriteValues { class: VariableClass, index: usize, entry: NumberEntry, written: usize },
    Number { op: MathOp, entry: NumberEntry },
    Button,
    Passthrough(Vec<u8, PASSTHROUGH_LINE_SIZE>),
    Discard,
}

/// The terminal command engine.
pub struct Terminal {
    state: State,
    acc: MathAccumulator,
    config: TerminalConfig,
    status_echo: bool,
    stats: TerminalStats,
}

impl Terminal {
    pub const fn new(config: TerminalConfig) -> Self {
        Self {
            state: State::Idle,
            acc: MathAccumulator::new(),
            status_echo: config.status_echo,
            config,
            stats: TerminalStats::new(),
        }
    }

    pub fn accumulator(&self) -> &MathAccumulator {
        &self.acc
    }

    pub fn accumulator_mut(&mut self) -> &mut MathAccumulator {
        &mut self.acc
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn status_echo(&self) -> bool {
        self.status_echo
    }

    pub fn stats(&self) -> &TerminalStats {
        &self.stats
    }

    /// Abandon any partial command. The accumulator is kept.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    pub fn state(&self) -> TerminalState {
        match &self.state {
            State::Idle => TerminalState::Idle,
            State::Operands(ops) if ops.dotted => TerminalState::ReadingTarget,
            State::Operands(ops) if ops.windowed => TerminalState::ReadingSource,
            State::Operands(_) => TerminalState::ReadingAddress,
            State::WriteClass { .. } => TerminalState::ReadingWriteClass,
            State::WriteValues { .. } => TerminalState::WritingValues,
            State::Number { .. } => TerminalState::ReadingNumber,
            State::Button => TerminalState::ReadingButtonCode,
            State::Passthrough(_) => TerminalState::Passthrough,
            State::Discard => TerminalState::Discarding,
        }
    }

    pub fn input_mode(&self) -> InputModeFlags {
        let bits = match &self.state {
            State::Idle => InputModeFlags::INIT_INPUT,
            State::Operands(ops) => {
                let mut bits = InputModeFlags::for_entry(&ops.entry);
                if ops.windowed {
                    bits |= InputModeFlags::SOURCE_READ_IN;
                }
                if ops.dotted {
                    bits |= InputModeFlags::TARGET_READ_IN;
                }
                bits
            }
            State::WriteClass { .. } => InputModeFlags::ADDRESS_READ_IN,
            State::WriteValues { entry, .. } => {
                InputModeFlags::ADDRESS_READ_IN | InputModeFlags::for_entry(entry)
            }
            State::Number { entry, .. } => InputModeFlags::for_entry(entry),
            State::Button => InputModeFlags::BUTTON_INPUT,
            State::Passthrough(_) | State::Discard => 0,
        };
        InputModeFlags(bits)
    }

    /// Process a single input byte
    ///
    /// Returns Some(result) if a command completed or failed, None if more
    /// input is needed.
    pub fn process_byte(
        &mut self,
        byte: u8,
        dev: &mut Device<'_>,
        out: &mut dyn Write,
    ) -> Option<Result<(), TerminalError>> {
        let terminator = byte == b'\r' || byte == b'\n';

        let result = if terminator {
            self.end_of_line(dev, out)
        } else {
            self.step(byte, dev, out)
        };

        match result {
            Some(Ok(())) => {
                self.stats.record_command();
            }
            Some(Err(e)) => {
                self.note_error(e);
                if !terminator {
                    self.state = State::Discard;
                }
            }
            None => {}
        }
        result
    }

    /// Process a block of bytes, printing reported errors.
    pub fn feed(&mut self, bytes: &[u8], dev: &mut Device<'_>, out: &mut dyn Write) {
        for &byte in bytes {
            self.handle(byte, dev, out);
        }
    }

    /// Drain the intake ring, printing reported errors.
    ///
    /// Returns the number of bytes consumed.
    pub fn poll<const N: usize>(
        &mut self,
        queue: &ByteQueue<N>,
        dev: &mut Device<'_>,
        out: &mut dyn Write,
    ) -> usize {
        let dropped = queue.take_dropped();
        if dropped > 0 {
            self.stats.record_overflow(dropped);
            term_warn!(TERMINAL_LOG, self.stats.commands(), "intake dropped {} bytes", dropped);
            outln!(out, "{} ({} dropped)", TerminalError::BufferOverflow, dropped);
        }

        let mut consumed = 0;
        while let Some(byte) = queue.pop() {
            self.handle(byte, dev, out);
            consumed += 1;
        }
        consumed
    }

    /// Mirror a display status line when status echo is on.
    pub fn status_message(&self, msg: &str, out: &mut dyn Write) {
        if self.status_echo {
            outln!(out, "{}", msg);
        }
    }

    /// Mirror unsolicited link traffic when link echo is on.
    pub fn relay_link(&self, link: &mut dyn Passthrough, out: &mut dyn Write) {
        if self.config.link_echo {
            echo_link(link, out);
        }
    }

    /// Empty number entry honouring the configured digit limit.
    fn entry(&self) -> NumberEntry {
        NumberEntry::with_max_digits(self.config.max_input_digits)
    }

    fn handle(&mut self, byte: u8, dev: &mut Device<'_>, out: &mut dyn Write) {
        if let Some(Err(e)) = self.process_byte(byte, dev, out) {
            if e.is_reported() {
                outln!(out, "{}", e);
            }
        }
    }

    fn note_error(&self, e: TerminalError) {
        match e {
            TerminalError::MalformedCommand => self.stats.record_malformed(),
            TerminalError::AddressingError | TerminalError::ReadOnly => self.stats.record_addressing(),
            TerminalError::ArithmeticError => self.stats.record_arithmetic(),
            TerminalError::BufferOverflow | TerminalError::LinkUnavailable => {}
        }
        if e.is_reported() {
            term_warn!(TERMINAL_LOG, self.stats.commands(), "{}", e);
        }
    }

    /// Keep `state` as the next state unless `r` failed.
    fn stay(&mut self, state: State, r: Result<(), TerminalError>) -> Option<Result<(), TerminalError>> {
        match r {
            Ok(()) => {
                self.state = state;
                None
            }
            Err(e) => Some(Err(e)),
        }
    }

    fn step(&mut self, byte: u8, dev: &mut Device<'_>, out: &mut dyn Write) -> Option<Result<(), TerminalError>> {
        let state = core::mem::replace(&mut self.state, State::Idle);

        match state {
            State::Idle if byte == b' ' => None,
            State::Idle => self.operands(byte, Operands::new(self.entry()), dev, out),
            State::Operands(ops) => self.operands(byte, ops, dev, out),
            State::WriteClass { index } => self.write_class(byte, index),
            State::WriteValues { class, index, entry, written } => {
                self.write_values(byte, class, index, entry, written, dev)
            }
            State::Number { op, entry } => self.number(byte, op, entry, dev, out),
            State::Button => self.button(byte, dev, out),
            State::Passthrough(line) => self.passthrough(byte, line, dev),
            State::Discard => {
                self.state = State::Discard;
                None
            }
        }
    }

    fn end_of_line(&mut self, dev: &mut Device<'_>, out: &mut dyn Write) -> Option<Result<(), TerminalError>> {
        let state = core::mem::replace(&mut self.state, State::Idle);

        match state {
            State::Idle | State::Discard => None,
            State::Operands(ops) if ops.is_pending() => Some(self.enter_number(&ops, out)),
            State::Operands(_) => None,
            State::WriteClass { .. } | State::Button => MALFORMED,
            State::WriteValues { class, index, entry, written } => {
                if !entry.is_empty() {
                    Some(self.store(dev, class, index, &entry))
                } else if written > 0 {
                    Some(Ok(()))
                } else {
                    MALFORMED
                }
            }
            State::Number { op, entry } => Some(self.commit_math(op, &entry, out)),
            State::Passthrough(line) => Some(self.forward(&line, dev, out)),
        }
    }

    fn operands(
        &mut self,
        byte: u8,
        mut ops: Operands,
        dev: &mut Device<'_>,
        out: &mut dyn Write,
    ) -> Option<Result<(), TerminalError>> {
        if ops.entry.accepts(byte) {
            let r = ops.entry.push_digit(byte);
            return self.stay(State::Operands(ops), r);
        }

        match byte {
            b' ' => self.stay(State::Operands(ops), Ok(())),
            b'$' => {
                let r = ops.entry.set_hex();
                self.stay(State::Operands(ops), r)
            }
            b'<' if ops.windowed || ops.dotted => MALFORMED,
            b'<' => {
                ops.window = ops.take_entry(self.entry());
                ops.windowed = true;
                self.stay(State::Operands(ops), Ok(()))
            }
            b'.' if ops.dotted => MALFORMED,
            b'.' => {
                ops.first = ops.take_entry(self.entry());
                ops.dotted = true;
                self.stay(State::Operands(ops), Ok(()))
            }
            b':' if ops.windowed || ops.dotted => MALFORMED,
            b':' => {
                let index = ops.entry.to_index().unwrap_or(0);
                self.state = State::WriteClass { index };
                None
            }
            _ => self.command(byte, &ops, dev, out),
        }
    }

    /// A command byte ending an operand prefix.
    fn command(
        &mut self,
        byte: u8,
        ops: &Operands,
        dev: &mut Device<'_>,
        out: &mut dyn Write,
    ) -> Option<Result<(), TerminalError>> {
        if let Some(op) = MathOp::from_byte(byte) {
            if ops.is_pending() {
                if let Err(e) = self.enter_number(ops, out) {
                    return Some(Err(e));
                }
                self.stats.record_command();
            }
            return self.begin_math(op, out);
        }

        if let Some(class) = VariableClass::from_letter(byte) {
            return Some(commands::list_table(class, &dev.tables, ops.range(), out));
        }

        match byte {
            b'L' => {
                let digits = self.config.digits();
                let window = ops.window.map_or(self.config.window_for(digits), clamp_u8);
                Some(commands::list_functions(&*dev.tables.trips, ops.range(), digits, window, out))
            }
            b'U' => {
                let digits = ops.first.map_or(self.config.digits(), |y| {
                    clamp_u8(y).min(MAX_OUTPUT_DECIMALS)
                });
                let window = ops.window.map_or(self.config.window_for(digits), clamp_u8);
                let round = ops.value().is_some_and(|x| x != 0);
                commands::print_number(self.acc.value(), digits, window, round, out);
                Some(Ok(()))
            }
            b'R' if ops.dotted => MALFORMED,
            b'R' => Some(commands::copy_trip(
                &mut *dev.tables.trips,
                ops.window.map(to_index),
                ops.value().map(to_index),
                out,
            )),
            b'I' | b'Y' | b'S' | b'?' if ops.is_pending() => MALFORMED,
            b'I' => {
                self.state = State::Button;
                None
            }
            b'Y' => {
                self.state = State::Passthrough(Vec::new());
                None
            }
            b'S' => {
                self.status_echo = !self.status_echo;
                outln!(out, "status echo {}", if self.status_echo { "on" } else { "off" });
                Some(Ok(()))
            }
            b'?' => {
                commands::print_help(out);
                Some(Ok(()))
            }
            _ => MALFORMED,
        }
    }

    /// `[z]<[y].x`: load x with y implied decimals, echo in window z.
    fn enter_number(&mut self, ops: &Operands, out: &mut dyn Write) -> Result<(), TerminalError> {
        if ops.entry.is_empty() {
            return Err(TerminalError::MalformedCommand);
        }

        let implied = ops.first.map_or(0, |y| y.min(u32::MAX as u64) as u32);
        let value = ops.entry.to_fixed(implied);
        self.acc.set(value);

        let digits = self.config.digits();
        let window = ops.window.map_or(self.config.window_for(digits), clamp_u8);
        commands::print_number(value, digits, window, false, out);
        Ok(())
    }

    fn begin_math(&mut self, op: MathOp, out: &mut dyn Write) -> Option<Result<(), TerminalError>> {
        if op.takes_operand() {
            self.state = State::Number { op, entry: self.entry() };
            None
        } else {
            Some(self.apply_math(op, None, out))
        }
    }

    fn commit_math(&mut self, op: MathOp, entry: &NumberEntry, out: &mut dyn Write) -> Result<(), TerminalError> {
        if entry.is_empty() {
            return Err(TerminalError::MalformedCommand);
        }
        self.apply_math(op, Some(entry.to_fixed(0)), out)
    }

    fn apply_math(
        &mut self,
        op: MathOp,
        operand: Option<Fixed>,
        out: &mut dyn Write,
    ) -> Result<(), TerminalError> {
        let value = self.acc.apply(op, operand)?;
        let digits = self.config.digits();
        commands::print_number(value, digits, self.config.window_for(digits), false, out);
        Ok(())
    }

    fn number(
        &mut self,
        byte: u8,
        op: MathOp,
        mut entry: NumberEntry,
        dev: &mut Device<'_>,
        out: &mut dyn Write,
    ) -> Option<Result<(), TerminalError>> {
        if entry.accepts(byte) {
            let r = entry.push_digit(byte);
            return self.stay(State::Number { op, entry }, r);
        }

        match byte {
            b'$' => {
                let r = entry.set_hex();
                self.stay(State::Number { op, entry }, r)
            }
            b'.' => {
                let r = entry.mark_fraction();
                self.stay(State::Number { op, entry }, r)
            }
            b'+' | b'-' if entry.accepts_sign() => {
                let r = entry.set_sign(byte == b'-');
                self.stay(State::Number { op, entry }, r)
            }
            b' ' if entry.is_empty() => self.stay(State::Number { op, entry }, Ok(())),
            b' ' => Some(self.commit_math(op, &entry, out)),
            _ if is_command_byte(byte) => {
                if let Err(e) = self.commit_math(op, &entry, out) {
                    return Some(Err(e));
                }
                self.stats.record_command();
                self.operands(byte, Operands::new(self.entry()), dev, out)
            }
            _ => MALFORMED,
        }
    }

    fn write_class(&mut self, byte: u8, index: usize) -> Option<Result<(), TerminalError>> {
        if byte == b' ' {
            self.state = State::WriteClass { index };
            return None;
        }

        match VariableClass::from_letter(byte) {
            Some(class) if class.is_writable() => {
                self.state = State::WriteValues { class, index, entry: self.entry(), written: 0 };
                None
            }
            Some(_) => Some(Err(TerminalError::ReadOnly)),
            None => MALFORMED,
        }
    }

    fn write_values(
        &mut self,
        byte: u8,
        class: VariableClass,
        index: usize,
        mut entry: NumberEntry,
        written: usize,
        dev: &mut Device<'_>,
    ) -> Option<Result<(), TerminalError>> {
        if entry.accepts(byte) {
            let r = entry.push_digit(byte);
            return self.stay(State::WriteValues { class, index, entry, written }, r);
        }

        match byte {
            b'$' => {
                let r = entry.set_hex();
                self.stay(State::WriteValues { class, index, entry, written }, r)
            }
            b'+' | b'-' if entry.accepts_sign() => {
                let r = entry.set_sign(byte == b'-');
                self.stay(State::WriteValues { class, index, entry, written }, r)
            }
            b' ' if entry.is_empty() => self.stay(State::WriteValues { class, index, entry, written }, Ok(())),
            b' ' => {
                let r = self.store(dev, class, index, &entry);
                let next = State::WriteValues {
                    class,
                    index: index.saturating_add(1),
                    entry: self.entry(),
                    written: written + 1,
                };
                self.stay(next, r)
            }
            _ => MALFORMED,
        }
    }

    /// Commit one value of a sequential write. Earlier writes are never undone.
    fn store(
        &mut self,
        dev: &mut Device<'_>,
        class: VariableClass,
        index: usize,
        entry: &NumberEntry,
    ) -> Result<(), TerminalError> {
        let word = entry.to_word();
        dev.tables.write(class, index, word)?;
        term_debug!(TERMINAL_LOG, self.stats.commands(), "{}{} <- {}", class.letter(), index, word);
        Ok(())
    }

    fn button(&mut self, byte: u8, dev: &mut Device<'_>, out: &mut dyn Write) -> Option<Result<(), TerminalError>> {
        if byte == b' ' {
            self.state = State::Button;
            return None;
        }

        let press = match ButtonPress::from_letter(byte, self.config.legacy_buttons) {
            Some(press) => press,
            None => return MALFORMED,
        };
        if !dev.buttons.inject(press) {
            return Some(Err(TerminalError::BufferOverflow));
        }
        outln!(out, "button {} {}", if press.long { "long" } else { "short" }, press.button.name());
        Some(Ok(()))
    }

    /// Collect a `Y` line. A full buffer is sent on to the link as it
    /// stands so lines longer than the buffer still arrive whole.
    fn passthrough(
        &mut self,
        byte: u8,
        mut line: Vec<u8, PASSTHROUGH_LINE_SIZE>,
        dev: &mut Device<'_>,
    ) -> Option<Result<(), TerminalError>> {
        if line.is_full() {
            let Some(link) = dev.link.as_deref_mut() else {
                return Some(Err(TerminalError::LinkUnavailable));
            };
            link.send(&line);
            term_info!(TERMINAL_LOG, self.stats.commands(), "link tx {} bytes", line.len());
            line.clear();
        }
        // Cannot fail: the line was just flushed if it was full.
        let _ = line.push(byte);
        self.state = State::Passthrough(line);
        None
    }

    fn forward(&mut self, line: &[u8], dev: &mut Device<'_>, out: &mut dyn Write) -> Result<(), TerminalError> {
        let link = dev.link.as_deref_mut().ok_or(TerminalError::LinkUnavailable)?;
        if !line.is_empty() {
            link.send(line);
            term_info!(TERMINAL_LOG, self.stats.commands(), "link tx {} bytes", line.len());
        }

        if self.config.link_echo {
            echo_link(link, out);
        }
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new(TerminalConfig::default())
    }
}

/// Bytes that start a new command after a committed accumulator operand.
fn is_command_byte(byte: u8) -> bool {
    MathOp::from_byte(byte).is_some()
        || VariableClass::from_letter(byte).is_some()
        || matches!(byte, b'L' | b'U' | b'R' | b'I' | b'Y' | b'S' | b'?')
}

/// Mirror link replies as text. Replies are 7-bit ASCII; any other byte is
/// shown as a `\xNN` escape.
fn echo_link(link: &mut dyn Passthrough, out: &mut dyn Write) {
    let mut buf = [0u8; 32];
    for _ in 0..LINK_ECHO_CHUNKS {
        let n = link.receive(&mut buf);
        if n == 0 {
            break;
        }
        for &b in &buf[..n.min(buf.len())] {
            if b.is_ascii() {
                let _ = out.write_char(b as char);
            } else {
                let _ = write!(out, "\\x{:02X}", b);
            }
        }
    }
}

#[inline]
fn to_index(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[inline]
fn clamp_u8(value: u64) -> u8 {
    value.min(u8::MAX as u64) as u8
}
