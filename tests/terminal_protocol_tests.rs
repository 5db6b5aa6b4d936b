//! Command state machine and adapter tests

mod common;

use common::{Fixture, RejectingSink};
use trip_terminal::intake::ByteQueue;
use trip_terminal::terminal::{
    Button, ButtonPress, Device, InputModeFlags, Tables, Terminal, TerminalState, COMMANDS,
};
use trip_terminal::config::PASSTHROUGH_LINE_SIZE;
use trip_terminal::TerminalConfig;

const SCRIPT: &str = "P\r=5+3\r1:V 9 8\r1V\r0<2R\rIl\rS\rZZ\r4P\r1.U\r";

#[test]
fn test_byte_at_a_time_matches_block_feed() {
    let mut fx_block = Fixture::new();
    let mut term_block = Terminal::default();
    let block = fx_block.run(&mut term_block, SCRIPT);

    let mut fx_bytes = Fixture::new();
    let mut term_bytes = Terminal::default();
    let mut bytes = String::new();
    for b in SCRIPT.bytes() {
        let mut out = String::new();
        term_bytes.feed(&[b], &mut fx_bytes.device(), &mut out);
        bytes.push_str(&out);
    }

    assert_eq!(block, bytes);
    assert_eq!(fx_block.volatiles.values(), fx_bytes.volatiles.values());
    assert_eq!(term_block.stats().snapshot(), term_bytes.stats().snapshot());
}

#[test]
fn test_malformed_line_is_silent_and_resyncs() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    assert_eq!(fx.run(&mut term, "Zjunk 5P\r"), "");
    assert_eq!(term.state(), TerminalState::Idle);
    assert_eq!(fx.run(&mut term, "3P\r"), "P  3: 0x0000 0 - flags\r\n");
    assert_eq!(term.stats().snapshot().malformed, 1);
}

#[test]
fn test_discard_until_terminator() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    fx.run(&mut term, "1<<");
    assert_eq!(term.state(), TerminalState::Discarding);
    fx.run(&mut term, "\n");
    assert_eq!(term.state(), TerminalState::Idle);
}

#[test]
fn test_crlf_terminates_once() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    assert_eq!(fx.run(&mut term, "3P\r\n"), fx.run(&mut term, "3P\r"));
    assert_eq!(fx.run(&mut term, "\r\n\r\n"), "");
    assert_eq!(term.stats().commands(), 2);
}

#[test]
fn test_state_and_input_mode_tracking() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    fx.run(&mut term, "$");
    assert_eq!(term.state(), TerminalState::ReadingAddress);
    assert!(term.input_mode().contains(InputModeFlags::HEX_INPUT));

    fx.run(&mut term, "1<");
    assert_eq!(term.state(), TerminalState::ReadingSource);
    assert!(term.input_mode().contains(InputModeFlags::SOURCE_READ_IN));

    fx.run(&mut term, "2.");
    assert_eq!(term.state(), TerminalState::ReadingTarget);
    assert!(term.input_mode().contains(InputModeFlags::TARGET_READ_IN));

    fx.run(&mut term, "\r0:");
    assert_eq!(term.state(), TerminalState::ReadingWriteClass);
    fx.run(&mut term, "P");
    assert_eq!(term.state(), TerminalState::WritingValues);

    fx.run(&mut term, "\r=");
    assert_eq!(term.state(), TerminalState::ReadingNumber);
    assert!(term.input_mode().contains(InputModeFlags::DECIMAL_INPUT | InputModeFlags::INIT_INPUT));

    term.reset();
    assert_eq!(term.state(), TerminalState::Idle);
}

#[test]
fn test_button_injection() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    assert_eq!(fx.run(&mut term, "Il\r"), "button short left\r\n");
    assert_eq!(fx.run(&mut term, "IU\r"), "button long up\r\n");

    assert_eq!(fx.buttons.pop(), Some(ButtonPress { button: Button::Left, long: false }));
    assert_eq!(fx.buttons.pop(), Some(ButtonPress { button: Button::Up, long: true }));
    assert!(fx.buttons.is_empty());
}

#[test]
fn test_button_queue_full() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    let out = fx.run(&mut term, "IcIcIcIcIc\r");

    assert!(out.ends_with("E01: input overflow\r\n"));
    assert_eq!(fx.buttons.len(), 4);
}

#[test]
fn test_button_rejected_by_sink() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();
    let mut sink = RejectingSink;
    let mut out = String::new();

    let mut dev = Device {
        tables: Tables {
            parameters: &mut fx.parameters,
            volatiles: &mut fx.volatiles,
            main_program: &mut fx.main_program,
            trips: &mut fx.trips,
            constants: &fx.constants,
        },
        buttons: &mut sink,
        link: None,
    };
    term.feed(b"Ir\r", &mut dev, &mut out);

    assert_eq!(out, "E01: input overflow\r\n");
}

#[test]
fn test_legacy_buttons_reject_up_down() {
    let mut fx = Fixture::new();
    let mut term = Terminal::new(TerminalConfig { legacy_buttons: true, ..TerminalConfig::new() });

    assert_eq!(fx.run(&mut term, "Iu\r"), "");
    assert!(fx.buttons.is_empty());
    assert_eq!(fx.run(&mut term, "IR\r"), "button long right\r\n");
}

#[test]
fn test_passthrough_sends_line_and_echoes_reply() {
    let mut fx = Fixture::new();
    fx.link.response = b"ok\r\n".to_vec();
    let mut term = Terminal::default();

    assert_eq!(fx.run(&mut term, "Yat+ver\r"), "ok\r\n");
    assert_eq!(fx.link.sent, vec![b"at+ver".to_vec()]);
}

#[test]
fn test_passthrough_long_line_arrives_whole() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();
    let payload = "a".repeat(100);

    assert_eq!(fx.run(&mut term, &format!("Y{}\r", payload)), "");

    let sent: Vec<u8> = fx.link.sent.concat();
    assert_eq!(sent, payload.as_bytes());
    assert!(fx.link.sent.iter().all(|chunk| chunk.len() <= PASSTHROUGH_LINE_SIZE));
}

#[test]
fn test_passthrough_echo_escapes_8bit_bytes() {
    let mut fx = Fixture::new();
    fx.link.response = vec![b'o', b'k', 0xB0, b'\r', b'\n'];
    let mut term = Terminal::default();

    assert_eq!(fx.run(&mut term, "Yx\r"), "ok\\xB0\r\n");
}

#[test]
fn test_passthrough_without_link() {
    let mut fx = Fixture::new();
    fx.has_link = false;
    let mut term = Terminal::default();

    assert_eq!(fx.run(&mut term, "Yhello\r"), "E06: no link\r\n");
}

#[test]
fn test_relay_link_respects_echo_setting() {
    let mut fx = Fixture::new();
    let mut out = String::new();

    fx.link.response = b"ping\r\n".to_vec();
    Terminal::new(TerminalConfig { link_echo: false, ..TerminalConfig::new() })
        .relay_link(&mut fx.link, &mut out);
    assert_eq!(out, "");

    Terminal::default().relay_link(&mut fx.link, &mut out);
    assert_eq!(out, "ping\r\n");
}

#[test]
fn test_status_echo_toggle() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();
    let mut out = String::new();

    term.status_message("TANK 12.5L", &mut out);
    assert_eq!(out, "");

    assert_eq!(fx.run(&mut term, "S\r"), "status echo on\r\n");
    term.status_message("TANK 12.5L", &mut out);
    assert_eq!(out, "TANK 12.5L\r\n");

    assert_eq!(fx.run(&mut term, "S\r"), "status echo off\r\n");
    assert!(!term.status_echo());
}

#[test]
fn test_help_lists_every_command() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    let out = fx.run(&mut term, "?\r");

    assert_eq!(out.lines().count(), COMMANDS.len());
    for c in COMMANDS {
        assert!(out.contains(c.brief), "help should describe '{}'", c.syntax);
    }
}

#[test]
fn test_trip_copy_and_listing() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    assert_eq!(fx.run(&mut term, "R\r"), "  0: instant\r\n  1: current\r\n  2: tank\r\n");

    assert_eq!(fx.run(&mut term, "0<2R\r"), "instant <- tank\r\n");
    assert_eq!(fx.trips.slots[0].values(), &[100, 200]);

    // Missing operands default to the terminal slot
    assert_eq!(fx.run(&mut term, "2<R\r"), "tank <- current\r\n");
    assert_eq!(fx.trips.slots[2].values(), &[10, 20]);
    assert_eq!(fx.run(&mut term, "<0R\r"), "current <- instant\r\n");
    assert_eq!(fx.trips.slots[1].values(), &[100, 200]);

    assert_eq!(fx.run(&mut term, "5<R\r"), "E03: address out of range\r\n");
}

#[test]
fn test_trip_copy_changes_terminal_trip_variables() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    assert_eq!(fx.run(&mut term, "T\r"), "T  0: 0x0000000A 10\r\nT  1: 0x00000014 20\r\n");

    assert_eq!(fx.run(&mut term, "2R\r"), "current <- tank\r\n");

    assert_eq!(fx.run(&mut term, "T\r"), "T  0: 0x00000064 100\r\nT  1: 0x000000C8 200\r\n");
    assert_eq!(fx.run(&mut term, "2L\r"), "  2: total - 300.000\r\n");
}

#[test]
fn test_trip_variable_write_feeds_functions() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();

    fx.run(&mut term, "0:T 5\r");
    assert_eq!(fx.run(&mut term, "0L\r"), "  0: distance - 5.000\r\n");
}

#[test]
fn test_poll_drains_intake() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();
    let queue = ByteQueue::<16>::new();
    let mut out = String::new();

    queue.push_slice(b"3P\r");
    assert_eq!(term.poll(&queue, &mut fx.device(), &mut out), 3);
    assert_eq!(out, "P  3: 0x0000 0 - flags\r\n");
    assert!(queue.is_empty());
}

#[test]
fn test_poll_reports_intake_overflow() {
    let mut fx = Fixture::new();
    let mut term = Terminal::default();
    let queue = ByteQueue::<4>::new();
    let mut out = String::new();

    queue.push_slice(b"3P\r\n999");
    assert_eq!(term.poll(&queue, &mut fx.device(), &mut out), 4);

    assert_eq!(out, "E01: input overflow (3 dropped)\r\nP  3: 0x0000 0 - flags\r\n");
    assert_eq!(term.stats().snapshot().overflow, 3);
    assert_eq!(queue.dropped(), 0);
}
