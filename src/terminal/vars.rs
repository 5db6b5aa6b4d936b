//! Variable addressing.
//!
//! Every table the terminal can reach is an externally owned collaborator
//! exposed through [`VarTable`]. The terminal only borrows them for the
//! duration of one byte's processing and bounds-checks every index against
//! the table's reported length before dispatching.

use crate::fixed::Fixed;

use super::TerminalError;

/// Which table a command addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VariableClass {
    /// Stored configuration parameters (`P`).
    Parameter,
    /// Interrupt-maintained volatile variables (`V`).
    Volatile,
    /// Main program variables (`M`).
    MainProgram,
    /// Terminal trip variable values (`T`).
    TripFunction,
    /// Program constants (`O`), read-only.
    Constant,
}

impl VariableClass {
    pub const ALL: [VariableClass; 5] = [
        VariableClass::Parameter,
        VariableClass::Volatile,
        VariableClass::MainProgram,
        VariableClass::TripFunction,
        VariableClass::Constant,
    ];

    /// Class selected by a command letter.
    pub fn from_letter(byte: u8) -> Option<Self> {
        match byte {
            b'P' => Some(Self::Parameter),
            b'V' => Some(Self::Volatile),
            b'M' => Some(Self::MainProgram),
            b'T' => Some(Self::TripFunction),
            b'O' => Some(Self::Constant),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Parameter => 'P',
            Self::Volatile => 'V',
            Self::MainProgram => 'M',
            Self::TripFunction => 'T',
            Self::Constant => 'O',
        }
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Constant)
    }
}

/// Declared storage width of a table slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    U8,
    U16,
    U32,
    U64,
}

impl Width {
    /// Truncate a written word to this width.
    #[inline]
    pub fn truncate(self, value: u64) -> u64 {
        match self {
            Width::U8 => value & 0xFF,
            Width::U16 => value & 0xFFFF,
            Width::U32 => value & 0xFFFF_FFFF,
            Width::U64 => value,
        }
    }

    /// Hex digits needed to print a full slot.
    #[inline]
    pub fn hex_digits(self) -> usize {
        match self {
            Width::U8 => 2,
            Width::U16 => 4,
            Width::U32 => 8,
            Width::U64 => 16,
        }
    }
}

/// Failure reported by a table collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableError {
    OutOfRange,
    ReadOnly,
}

impl From<TableError> for TerminalError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::OutOfRange => TerminalError::AddressingError,
            TableError::ReadOnly => TerminalError::ReadOnly,
        }
    }
}

/// Capability interface to one externally owned variable table.
///
/// Implementations guarantee their own consistency against other
/// subsystems that update the same storage.
pub trait VarTable {
    /// Number of addressable slots.
    fn len(&self) -> usize;

    fn read(&self, index: usize) -> Result<u64, TableError>;

    /// Store `value`, truncated to the slot's width.
    fn write(&mut self, index: usize, value: u64) -> Result<(), TableError>;

    fn width(&self, _index: usize) -> Width {
        Width::U32
    }

    /// Optional human-readable name for a slot.
    fn label(&self, _index: usize) -> Option<&str> {
        None
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory table with per-slot widths and labels.
pub struct RamTable<const N: usize> {
    values: [u64; N],
    widths: [Width; N],
    labels: [Option<&'static str>; N],
    read_only: bool,
}

impl<const N: usize> RamTable<N> {
    /// Zeroed table with every slot the same width.
    pub const fn new(width: Width) -> Self {
        Self {
            values: [0; N],
            widths: [width; N],
            labels: [None; N],
            read_only: false,
        }
    }

    /// Read-only table holding fixed values.
    pub const fn constants(values: [u64; N]) -> Self {
        Self {
            values,
            widths: [Width::U64; N],
            labels: [None; N],
            read_only: true,
        }
    }

    pub fn with_labels(mut self, labels: [&'static str; N]) -> Self {
        for (slot, label) in self.labels.iter_mut().zip(labels) {
            *slot = Some(label);
        }
        self
    }

    pub fn with_width(mut self, index: usize, width: Width) -> Self {
        if let Some(w) = self.widths.get_mut(index) {
            *w = width;
        }
        self
    }

    /// Direct access for the owning subsystem.
    pub fn values(&self) -> &[u64; N] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [u64; N] {
        &mut self.values
    }
}

impl<const N: usize> VarTable for RamTable<N> {
    fn len(&self) -> usize {
        N
    }

    fn read(&self, index: usize) -> Result<u64, TableError> {
        self.values.get(index).copied().ok_or(TableError::OutOfRange)
    }

    fn write(&mut self, index: usize, value: u64) -> Result<(), TableError> {
        if self.read_only {
            return Err(TableError::ReadOnly);
        }
        let width = *self.widths.get(index).ok_or(TableError::OutOfRange)?;
        self.values[index] = width.truncate(value);
        Ok(())
    }

    fn width(&self, index: usize) -> Width {
        self.widths.get(index).copied().unwrap_or(Width::U64)
    }

    fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).copied().flatten()
    }
}

/// Trip-function collaborator: named trip slots and their computed outputs.
///
/// Outputs are read-only from the terminal's side. The raw variables of the
/// terminal's own slot are the `T` table, so copying a slot into it with
/// `R` changes what `T` lists and what `L` computes.
pub trait TripFunctions {
    /// Number of trip slots.
    fn slot_count(&self) -> usize;

    fn slot_name(&self, slot: usize) -> &str;

    /// The terminal's own trip slot, used when a command omits one.
    fn terminal_slot(&self) -> usize;

    /// Copy slot `from` into slot `to`. Both are already bounds-checked.
    fn copy_slot(&mut self, from: usize, to: usize);

    /// Raw variables of the terminal slot.
    fn terminal_vars(&self) -> &dyn VarTable;

    fn terminal_vars_mut(&mut self) -> &mut dyn VarTable;

    /// Number of computed output functions.
    fn function_count(&self) -> usize;

    fn function_label(&self, function: usize) -> &str;

    /// Computed output of `function` over trip `slot`.
    fn function_value(&self, slot: usize, function: usize) -> Fixed;
}

/// Inclusive index range of a list command.
///
/// Absent start means from the first slot; absent end means the single
/// index `start`. Both absent selects the whole table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddressRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl AddressRange {
    pub const ALL: AddressRange = AddressRange { start: None, end: None };

    pub fn single(index: usize) -> Self {
        Self { start: Some(index), end: None }
    }

    pub fn between(start: usize, end: usize) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    /// Concrete bounds against a table of `len` slots.
    ///
    /// `Ok(None)` is an empty selection (start past end, or an empty table
    /// listed in full). An end bound at or past `len` is an addressing error.
    pub fn resolve(&self, len: usize) -> Result<Option<(usize, usize)>, TerminalError> {
        let (start, end) = match (self.start, self.end) {
            (None, None) if len == 0 => return Ok(None),
            (None, None) => (0, len - 1),
            (Some(s), None) => (s, s),
            (None, Some(e)) => (0, e),
            (Some(s), Some(e)) => (s, e),
        };

        if start > end {
            return Ok(None);
        }
        if end >= len {
            return Err(TerminalError::AddressingError);
        }
        Ok(Some((start, end)))
    }
}

/// The five addressable tables, borrowed for one dispatch.
///
/// The `T` table is the terminal slot of `trips`.
pub struct Tables<'a> {
    pub parameters: &'a mut dyn VarTable,
    pub volatiles: &'a mut dyn VarTable,
    pub main_program: &'a mut dyn VarTable,
    pub trips: &'a mut dyn TripFunctions,
    pub constants: &'a dyn VarTable,
}

impl<'a> Tables<'a> {
    /// Table for `class`.
    pub fn table(&self, class: VariableClass) -> &dyn VarTable {
        match class {
            VariableClass::Parameter => &*self.parameters,
            VariableClass::Volatile => &*self.volatiles,
            VariableClass::MainProgram => &*self.main_program,
            VariableClass::TripFunction => self.trips.terminal_vars(),
            VariableClass::Constant => self.constants,
        }
    }

    fn table_mut(&mut self, class: VariableClass) -> Option<&mut dyn VarTable> {
        match class {
            VariableClass::Parameter => Some(&mut *self.parameters),
            VariableClass::Volatile => Some(&mut *self.volatiles),
            VariableClass::MainProgram => Some(&mut *self.main_program),
            VariableClass::TripFunction => Some(self.trips.terminal_vars_mut()),
            VariableClass::Constant => None,
        }
    }

    pub fn len(&self, class: VariableClass) -> usize {
        self.table(class).len()
    }

    /// Bounds-checked read.
    pub fn read(&self, class: VariableClass, index: usize) -> Result<u64, TerminalError> {
        let table = self.table(class);
        if index >= table.len() {
            return Err(TerminalError::AddressingError);
        }
        Ok(table.read(index)?)
    }

    /// Bounds-checked write.
    pub fn write(&mut self, class: VariableClass, index: usize, value: u64) -> Result<(), TerminalError> {
        let table = self.table_mut(class).ok_or(TerminalError::ReadOnly)?;
        if index >= table.len() {
            return Err(TerminalError::AddressingError);
        }
        Ok(table.write(index, value)?)
    }
}
