//! Shared fixture for terminal integration tests

#![allow(dead_code)]

use trip_terminal::fixed::Fixed;
use trip_terminal::terminal::{
    ButtonPress, ButtonQueue, ButtonSink, Device, Passthrough, RamTable, Tables, Terminal,
    TripFunctions, VarTable, Width,
};

/// Three trip slots of two raw variables each; function `f` of a slot is
/// its variable `f` as an integer, and function 2 is their sum.
pub struct TestTrips {
    pub slots: [RamTable<2>; 3],
    pub terminal_slot: usize,
}

impl TestTrips {
    pub fn new(values: [[u64; 2]; 3]) -> Self {
        let slot = |v: [u64; 2]| {
            let mut table = RamTable::new(Width::U32);
            *table.values_mut() = v;
            table
        };
        Self { slots: values.map(slot), terminal_slot: 1 }
    }
}

impl TripFunctions for TestTrips {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot_name(&self, slot: usize) -> &str {
        ["instant", "current", "tank"][slot]
    }

    fn terminal_slot(&self) -> usize {
        self.terminal_slot
    }

    fn copy_slot(&mut self, from: usize, to: usize) {
        let values = *self.slots[from].values();
        *self.slots[to].values_mut() = values;
    }

    fn terminal_vars(&self) -> &dyn VarTable {
        &self.slots[self.terminal_slot]
    }

    fn terminal_vars_mut(&mut self) -> &mut dyn VarTable {
        &mut self.slots[self.terminal_slot]
    }

    fn function_count(&self) -> usize {
        3
    }

    fn function_label(&self, function: usize) -> &str {
        ["distance", "fuel", "total"][function]
    }

    fn function_value(&self, slot: usize, function: usize) -> Fixed {
        let [a, b] = (*self.slots[slot].values()).map(|v| v as i64);
        match function {
            0 => Fixed::from_int(a),
            1 => Fixed::from_int(b),
            _ => Fixed::from_int(a + b),
        }
    }
}

/// Link that records sent lines and replays a canned response.
#[derive(Default)]
pub struct MockLink {
    pub sent: Vec<Vec<u8>>,
    pub response: Vec<u8>,
}

impl Passthrough for MockLink {
    fn send(&mut self, bytes: &[u8]) {
        self.sent.push(bytes.to_vec());
    }

    fn receive(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.response.len());
        buf[..n].copy_from_slice(&self.response[..n]);
        self.response.drain(..n);
        n
    }
}

/// Sink that accepts nothing.
pub struct RejectingSink;

impl ButtonSink for RejectingSink {
    fn inject(&mut self, _press: ButtonPress) -> bool {
        false
    }
}

pub struct Fixture {
    pub parameters: RamTable<4>,
    pub volatiles: RamTable<2>,
    pub main_program: RamTable<3>,
    pub constants: RamTable<3>,
    pub trips: TestTrips,
    pub buttons: ButtonQueue<4>,
    pub link: MockLink,
    pub has_link: bool,
}

impl Fixture {
    pub fn new() -> Self {
        let mut parameters = RamTable::new(Width::U16).with_labels(["ppk", "inj", "tank", "flags"]);
        parameters.values_mut().copy_from_slice(&[6000, 250, 55, 0]);

        Self {
            parameters,
            volatiles: RamTable::new(Width::U32),
            main_program: RamTable::new(Width::U8),
            constants: RamTable::constants([1000, 3600, 100]),
            trips: TestTrips::new([[1, 2], [10, 20], [100, 200]]),
            buttons: ButtonQueue::new(),
            link: MockLink::default(),
            has_link: true,
        }
    }

    pub fn device(&mut self) -> Device<'_> {
        let link: Option<&mut dyn Passthrough> = if self.has_link { Some(&mut self.link) } else { None };
        Device {
            tables: Tables {
                parameters: &mut self.parameters,
                volatiles: &mut self.volatiles,
                main_program: &mut self.main_program,
                trips: &mut self.trips,
                constants: &self.constants,
            },
            buttons: &mut self.buttons,
            link,
        }
    }

    /// Feed `input` as one block and return everything printed.
    pub fn run(&mut self, terminal: &mut Terminal, input: &str) -> String {
        let mut out = String::new();
        terminal.feed(input.as_bytes(), &mut self.device(), &mut out);
        out
    }
}
