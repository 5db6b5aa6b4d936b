//! Injection and passthrough adapters.
//!
//! Side channels a command can reach: the device's button input path and
//! a paired wireless link.

use heapless::Deque;

use crate::config::BUTTON_QUEUE_SIZE;

/// Physical button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Left,
    Center,
    Right,
    Up,
    Down,
}

impl Button {
    pub fn name(self) -> &'static str {
        match self {
            Button::Left => "left",
            Button::Center => "center",
            Button::Right => "right",
            Button::Up => "up",
            Button::Down => "down",
        }
    }
}

/// A debounced press as seen by the input handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonPress {
    pub button: Button,
    pub long: bool,
}

impl ButtonPress {
    /// Decode an injection letter: lowercase is a short press, uppercase long.
    ///
    /// With `legacy` only left/center/right exist.
    pub fn from_letter(byte: u8, legacy: bool) -> Option<Self> {
        let button = match byte.to_ascii_lowercase() {
            b'l' => Button::Left,
            b'c' => Button::Center,
            b'r' => Button::Right,
            b'u' if !legacy => Button::Up,
            b'd' if !legacy => Button::Down,
            _ => return None,
        };
        Some(Self { button, long: byte.is_ascii_uppercase() })
    }
}

/// Receiver of synthetic button presses.
pub trait ButtonSink {
    /// Queue a press. Returns `false` if it could not be accepted.
    fn inject(&mut self, press: ButtonPress) -> bool;
}

/// Bounded press queue drained by the input handler.
pub struct ButtonQueue<const N: usize = BUTTON_QUEUE_SIZE> {
    presses: Deque<ButtonPress, N>,
}

impl<const N: usize> ButtonQueue<N> {
    pub const fn new() -> Self {
        Self { presses: Deque::new() }
    }

    /// Oldest pending press.
    pub fn pop(&mut self) -> Option<ButtonPress> {
        self.presses.pop_front()
    }

    pub fn len(&self) -> usize {
        self.presses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presses.is_empty()
    }
}

impl<const N: usize> Default for ButtonQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ButtonSink for ButtonQueue<N> {
    fn inject(&mut self, press: ButtonPress) -> bool {
        self.presses.push_back(press).is_ok()
    }
}

/// Paired wireless link.
pub trait Passthrough {
    /// Forward bytes unmodified.
    fn send(&mut self, bytes: &[u8]);

    /// Copy pending response bytes into `buf`, returning how many.
    fn receive(&mut self, buf: &mut [u8]) -> usize;
}
