//! Command table and output routines

use core::fmt::Write;

use crate::fixed::Fixed;

use super::vars::{AddressRange, Tables, TripFunctions, VariableClass};
use super::TerminalError;

/// Command descriptor
pub struct CommandDescriptor {
    pub syntax: &'static str,
    pub brief: &'static str,
}

/// All commands, in help order
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor { syntax: "[y].[x]P", brief: "list stored parameters, optionally between y and x" },
    CommandDescriptor { syntax: "[y].[x]V", brief: "list volatile variables, optionally between y and x" },
    CommandDescriptor { syntax: "[y].[x]M", brief: "list main program variables, optionally between y and x" },
    CommandDescriptor { syntax: "[y].[x]T", brief: "list terminal trip variable values, optionally between y and x" },
    CommandDescriptor { syntax: "[y].[x]O", brief: "list program constants, optionally between y and x" },
    CommandDescriptor { syntax: "[z]<[y].[x]L", brief: "list terminal trip function outputs, z = window" },
    CommandDescriptor { syntax: "[z]<[y].[x]U", brief: "show accumulator, y = decimals, z = window, x = round" },
    CommandDescriptor { syntax: "[z]<[y].x", brief: "enter x into accumulator with y implied decimals" },
    CommandDescriptor { syntax: "=x", brief: "enter x into accumulator" },
    CommandDescriptor { syntax: "+x", brief: "add x to accumulator" },
    CommandDescriptor { syntax: "-x", brief: "subtract x from accumulator" },
    CommandDescriptor { syntax: "*x", brief: "multiply accumulator by x" },
    CommandDescriptor { syntax: "/x", brief: "divide accumulator by x" },
    CommandDescriptor { syntax: "|", brief: "square root of accumulator" },
    CommandDescriptor { syntax: "x:Py [y]...", brief: "store values starting at stored parameter x" },
    CommandDescriptor { syntax: "x:Vy [y]...", brief: "store values starting at volatile variable x" },
    CommandDescriptor { syntax: "x:My [y]...", brief: "store values starting at main program variable x" },
    CommandDescriptor { syntax: "x:Ty [y]...", brief: "store values starting at terminal trip variable x" },
    CommandDescriptor { syntax: "[y]<[x]R", brief: "read trip x into trip y, none lists trips" },
    CommandDescriptor { syntax: "I", brief: "inject button, short l c r u d, long L C R U D" },
    CommandDescriptor { syntax: "Y", brief: "send rest of line to wireless link" },
    CommandDescriptor { syntax: "S", brief: "toggle status line echo" },
    CommandDescriptor { syntax: "?", brief: "show this help" },
];

pub fn print_help(out: &mut dyn Write) {
    for c in COMMANDS {
        outln!(out, "{:>14} - {}", c.syntax, c.brief);
    }
}

/// List `range` of a table as `P  3: 0x0000000A 10 - label`.
///
/// The whole range is validated before anything is printed.
pub fn list_table(
    class: VariableClass,
    tables: &Tables<'_>,
    range: AddressRange,
    out: &mut dyn Write,
) -> Result<(), TerminalError> {
    let table = tables.table(class);
    let Some((start, end)) = range.resolve(table.len())? else {
        return Ok(());
    };

    for index in start..=end {
        let value = table.read(index)?;
        let digits = table.width(index).hex_digits();
        let _ = write!(out, "{}{:3}: 0x{:0w$X} {}", class.letter(), index, value, value, w = digits);
        match table.label(index) {
            Some(label) => outln!(out, " - {}", label),
            None => outln!(out),
        }
    }
    Ok(())
}

/// List trip-function outputs of the terminal trip slot.
pub fn list_functions(
    trips: &dyn TripFunctions,
    range: AddressRange,
    digits: u8,
    window: u8,
    out: &mut dyn Write,
) -> Result<(), TerminalError> {
    let Some((start, end)) = range.resolve(trips.function_count())? else {
        return Ok(());
    };
    let slot = trips.terminal_slot();
    if slot >= trips.slot_count() {
        return Err(TerminalError::AddressingError);
    }

    for function in start..=end {
        let _ = write!(out, "{:3}: {} - ", function, trips.function_label(function));
        let _ = trips.function_value(slot, function).format_into(out, digits, window, false);
        outln!(out);
    }
    Ok(())
}

/// Print one fixed-point value on its own line.
pub fn print_number(value: Fixed, digits: u8, window: u8, round: bool, out: &mut dyn Write) {
    let _ = value.format_into(out, digits, window, round);
    outln!(out);
}

/// `[y]<[x]R`: copy trip `source` into trip `target`, or list slots if both are absent.
pub fn copy_trip(
    trips: &mut dyn TripFunctions,
    target: Option<usize>,
    source: Option<usize>,
    out: &mut dyn Write,
) -> Result<(), TerminalError> {
    let count = trips.slot_count();

    if target.is_none() && source.is_none() {
        for slot in 0..count {
            outln!(out, "{:3}: {}", slot, trips.slot_name(slot));
        }
        return Ok(());
    }

    let own = trips.terminal_slot();
    let to = target.unwrap_or(own);
    let from = source.unwrap_or(own);
    if to >= count || from >= count {
        return Err(TerminalError::AddressingError);
    }

    trips.copy_slot(from, to);
    outln!(out, "{} <- {}", trips.slot_name(to), trips.slot_name(from));
    Ok(())
}
