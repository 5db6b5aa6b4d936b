//! TripTerminal - Main entry point
//!
//! Runs the diagnostic terminal against a set of demo tables.
//! On the device the transport is UART0; on a host it is stdin/stdout,
//! which makes the binary usable as a protocol playground.
//!
//! 1. A reader thread pushes received bytes into `INTAKE`
//! 2. The main loop polls the terminal and drains `TERMINAL_LOG`

use std::io::{Read, Write as _};
use std::thread;
use std::time::Duration;

use trip_terminal::config::TerminalConfig;
use trip_terminal::fixed::Fixed;
use trip_terminal::intake::ByteQueue;
use trip_terminal::log_globals::TERMINAL_LOG;
use trip_terminal::logging::format_entry;
use trip_terminal::terminal::{
    ButtonQueue, Device, Passthrough, RamTable, Tables, Terminal, TripFunctions, VarTable, Width,
};

/// Shared between the reader thread (producer) and the main loop (consumer).
static INTAKE: ByteQueue = ByteQueue::new();

const POLL_INTERVAL: Duration = Duration::from_millis(10);

const TRIP_NAMES: [&str; 4] = ["instant", "current", "tank", "saved"];
const FUNCTION_LABELS: [&str; 5] = ["distance km", "fuel l", "time h", "speed km/h", "economy l/100km"];

const TRIP_VAR_LABELS: [&str; 3] = ["distance m", "fuel ml", "time s"];

/// Raw trip accumulators: distance (m), fuel (ml), time (s).
struct DemoTrips {
    slots: [RamTable<3>; 4],
    current: usize,
}

impl DemoTrips {
    fn new() -> Self {
        let slot = |values: [u64; 3]| {
            let mut table = RamTable::new(Width::U32).with_labels(TRIP_VAR_LABELS);
            *table.values_mut() = values;
            table
        };
        Self {
            slots: [
                slot([1_200, 90, 60]),
                slot([42_500, 3_150, 2_700]),
                slot([512_000, 38_400, 30_600]),
                slot([0, 0, 0]),
            ],
            current: 1,
        }
    }
}

impl TripFunctions for DemoTrips {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot_name(&self, slot: usize) -> &str {
        TRIP_NAMES.get(slot).copied().unwrap_or("?")
    }

    fn terminal_slot(&self) -> usize {
        self.current
    }

    fn copy_slot(&mut self, from: usize, to: usize) {
        let values = *self.slots[from].values();
        *self.slots[to].values_mut() = values;
    }

    fn terminal_vars(&self) -> &dyn VarTable {
        &self.slots[self.current]
    }

    fn terminal_vars_mut(&mut self) -> &mut dyn VarTable {
        &mut self.slots[self.current]
    }

    fn function_count(&self) -> usize {
        FUNCTION_LABELS.len()
    }

    fn function_label(&self, function: usize) -> &str {
        FUNCTION_LABELS.get(function).copied().unwrap_or("?")
    }

    fn function_value(&self, slot: usize, function: usize) -> Fixed {
        let [metres, millilitres, seconds] = *self.slots[slot].values();
        let distance = Fixed::from_raw(metres as i64);
        let fuel = Fixed::from_raw(millilitres as i64);
        let time = Fixed::from_int(seconds as i64).checked_div(Fixed::from_int(3600));

        match function {
            0 => distance,
            1 => fuel,
            2 => time.unwrap_or(Fixed::ZERO),
            3 => time.and_then(|t| distance.checked_div(t)).unwrap_or(Fixed::ZERO),
            _ => fuel
                .saturating_mul(Fixed::from_int(100))
                .checked_div(distance)
                .unwrap_or(Fixed::ZERO),
        }
    }
}

/// Loopback link: echoes every line back with a prefix.
#[derive(Default)]
struct LoopbackLink {
    pending: Vec<u8>,
}

impl Passthrough for LoopbackLink {
    fn send(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(b"link: ");
        self.pending.extend_from_slice(bytes);
        self.pending.extend_from_slice(b"\r\n");
    }

    fn receive(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        n
    }
}

/// Adapts `std::io::Write` to the terminal's `core::fmt::Write` sink.
struct IoSink<W: std::io::Write>(W);

impl<W: std::io::Write> core::fmt::Write for IoSink<W> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.0.write_all(s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}

fn drain_log() {
    let mut buf = [0u8; 128];
    let mut err = std::io::stderr().lock();
    while let Some(entry) = TERMINAL_LOG.drain() {
        let len = format_entry(&entry, &mut buf);
        let _ = err.write_all(&buf[..len]);
    }
    let dropped = TERMINAL_LOG.take_dropped();
    if dropped > 0 {
        let _ = writeln!(err, "[log] {} entries dropped", dropped);
    }
}

fn main() {
    let version = env!("VERSION_STRING");

    platform::init();
    platform::spawn_reader(&INTAKE);

    let mut parameters = RamTable::<8>::new(Width::U16).with_labels([
        "pulses/km", "injector ml/min", "tank l", "idle rpm",
        "units", "backlight", "contrast", "flags",
    ]);
    parameters.values_mut().copy_from_slice(&[6_000, 250, 55, 800, 0, 80, 40, 0]);
    let mut volatiles = RamTable::<6>::new(Width::U32).with_labels([
        "vss pulses", "inj open us", "engine rpm", "vss speed", "loop count", "supply mv",
    ]);
    let mut main_program = RamTable::<4>::new(Width::U8).with_labels([
        "screen", "page", "cursor", "mode",
    ]);
    let constants = RamTable::constants([1_000, 3_600, 100, 0x0102]).with_labels([
        "milli", "seconds/hour", "percent", "version",
    ]);

    let mut trips = DemoTrips::new();
    let mut buttons: ButtonQueue = ButtonQueue::new();
    let mut link = LoopbackLink::default();

    let mut terminal = Terminal::new(TerminalConfig::new());
    let mut out = IoSink(std::io::stdout());

    {
        use core::fmt::Write as _;
        let _ = write!(out, "{}\r\n? for help\r\n", version);
    }

    loop {
        let mut device = Device {
            tables: Tables {
                parameters: &mut parameters,
                volatiles: &mut volatiles,
                main_program: &mut main_program,
                trips: &mut trips,
                constants: &constants,
            },
            buttons: &mut buttons,
            link: Some(&mut link),
        };
        if terminal.poll(&INTAKE, &mut device, &mut out) > 0 {
            let _ = out.0.flush();
        }

        while let Some(press) = buttons.pop() {
            let status = format!("{} {}", if press.long { "hold" } else { "press" }, press.button.name());
            terminal.status_message(&status, &mut out);
        }
        terminal.relay_link(&mut link, &mut out);

        drain_log();
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(not(target_os = "espidf"))]
mod platform {
    use super::*;

    pub fn init() {}

    /// Feed stdin into the intake ring until EOF.
    pub fn spawn_reader(intake: &'static ByteQueue) {
        thread::spawn(move || {
            let mut stdin = std::io::stdin().lock();
            let mut buf = [0u8; 64];
            loop {
                match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        // A full ring drops and counts; keep reading.
                        intake.push_slice(&buf[..n]);
                    }
                }
            }
        });
    }
}

#[cfg(target_os = "espidf")]
mod platform {
    use super::*;

    use esp_idf_svc::hal::delay::BLOCK;
    use esp_idf_svc::hal::gpio;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::{self, UartDriver};
    use esp_idf_svc::hal::units::Hertz;

    const BAUD_RATE: u32 = 115_200;

    pub fn init() {
        esp_idf_svc::sys::link_patches();
    }

    /// Feed UART0 RX into the intake ring.
    pub fn spawn_reader(intake: &'static ByteQueue) {
        let peripherals = match Peripherals::take() {
            Ok(p) => p,
            Err(e) => {
                trip_terminal::term_error!(TERMINAL_LOG, 0, "peripherals: {:?}", e);
                return;
            }
        };

        #[cfg(feature = "esp32s3")]
        let (tx, rx) = (peripherals.pins.gpio43, peripherals.pins.gpio44);
        #[cfg(all(feature = "esp32p4", not(feature = "esp32s3")))]
        let (tx, rx) = (peripherals.pins.gpio37, peripherals.pins.gpio38);

        let config = uart::config::Config::default().baudrate(Hertz(BAUD_RATE));
        let uart = match UartDriver::new(
            peripherals.uart0,
            tx,
            rx,
            Option::<gpio::AnyIOPin>::None,
            Option::<gpio::AnyIOPin>::None,
            &config,
        ) {
            Ok(uart) => uart,
            Err(e) => {
                trip_terminal::term_error!(TERMINAL_LOG, 0, "uart init: {:?}", e);
                return;
            }
        };

        thread::spawn(move || {
            let mut buf = [0u8; 32];
            loop {
                if let Ok(n) = uart.read(&mut buf, BLOCK) {
                    intake.push_slice(&buf[..n]);
                }
            }
        });
    }
}
