//! Shared error plumbing for every layer of the parsing core.
//!
//! Each layer gets its own `snafu`-derived error enum rather than one giant
//! error type, mirroring how `VarintFramingError` stays local to varint
//! framing instead of living in a crate-wide enum.

use snafu::Snafu;

/// Whether it is reasonable to assume that continuing to read from the
/// underlying stream after this error will not hang or corrupt further
/// output.
///
/// Format errors in sequence files are recoverable at the next record
/// boundary; JSON format errors are not (the whole document is abandoned).
pub trait Recoverable {
    /// Returns `true` if the caller may resume reading after this error.
    fn can_continue(&self) -> bool;
}

/// Errors from the byte-stream buffer (component A).
#[derive(Debug, Snafu)]
pub enum BufferError {
    /// The underlying source does not support seeking (a pipe or stdin),
    /// but a reposition, reverse-strand read, or random-access fetch was
    /// attempted.
    #[snafu(display("source cannot be repositioned (not seekable)"))]
    CannotReposition,

    /// The underlying source returned an I/O error on seek or read.
    #[snafu(display("system error reading source: {source}"))]
    System { source: std::io::Error },

    /// An offset requested by a caller does not fit the platform's file-size
    /// type, or otherwise falls outside what the buffer can represent.
    #[snafu(display("offset {offset} out of range"))]
    OutOfRange { offset: u64 },
}

impl Recoverable for BufferError {
    fn can_continue(&self) -> bool {
        matches!(self, BufferError::System { .. })
    }
}

/// Errors from the JSON state machine (component C).
#[derive(Debug, Snafu)]
pub enum JsonError {
    /// An unexpected byte was seen in the given state.
    #[snafu(display("line {line}, column {column}: unexpected character {byte:?} in state {state}"))]
    UnexpectedCharacter {
        line: usize,
        column: usize,
        byte: u8,
        state: &'static str,
    },

    /// A control character (0x00..=0x1F) appeared inside a string or key.
    #[snafu(display("line {line}, column {column}: control character in string"))]
    ControlCharacterInString { line: usize, column: usize },

    /// A `\uXXXX` escape contained a non-hex-digit character.
    #[snafu(display("line {line}, column {column}: invalid hex digit in \\u escape"))]
    InvalidUnicodeEscape { line: usize, column: usize },

    /// A literal keyword (`true`, `false`, `null`) did not match at some
    /// position.
    #[snafu(display("line {line}, column {column}: invalid literal, expected {expected:?}"))]
    InvalidLiteral {
        line: usize,
        column: usize,
        expected: &'static str,
    },

    /// Input ended with an open object/array/string still on the stack.
    #[snafu(display("unexpected end of input: document is not complete"))]
    UnterminatedDocument,

    /// The outermost JSON value was not an object.
    #[snafu(display("the outermost JSON value must be an object"))]
    RootNotObject,
}

impl Recoverable for JsonError {
    fn can_continue(&self) -> bool {
        // A JSON parse is fatal for the whole document; there is no way to
        // resume mid-document once the FSM has rejected a byte.
        false
    }
}

/// Errors from the sequence record reader (components F, G, H, I).
#[derive(Debug, Snafu)]
pub enum SequenceError {
    /// A byte outside the format's admitted alphabet, or a non-ASCII byte,
    /// was encountered in residue data.
    #[snafu(display("line {line}: illegal byte {byte:?} in residue data"))]
    Format { line: usize, byte: u8 },

    /// A record's header did not match any recognized format.
    #[snafu(display("could not recognize sequence format from header"))]
    UnrecognizedFormat,

    /// End of input was reached before a required terminator (`//`, next
    /// `>`, etc).
    #[snafu(display("unexpected end of input before record terminator"))]
    TruncatedRecord,

    /// The underlying buffer could not be repositioned.
    #[snafu(display("{source}"))]
    Reposition { source: BufferError },

    /// A key or record number lookup against the offset index failed.
    #[snafu(display("key {key:?} not found in offset index"))]
    NotFound { key: String },

    /// Subsequence coordinates fell outside `1..=L`.
    #[snafu(display("coordinates {start}..={end} out of range for record of length {length}"))]
    OutOfRange {
        start: u64,
        end: u64,
        length: u64,
    },

    /// Reverse-strand reading was attempted before a forward sweep
    /// completed, or on a non-complementable alphabet.
    #[snafu(display("reverse-strand read requires a completed forward sweep and a complementable alphabet"))]
    ReverseNotReady,

    /// An index claimed an offset that does not begin a record.
    #[snafu(display("index-reported offset {offset} does not begin a valid record"))]
    Corrupt { offset: u64 },

    /// A record's residue count exceeded a caller-configured limit.
    #[snafu(display("record exceeds the configured maximum length of {limit} residues"))]
    RecordTooLong { limit: usize },
}

impl Recoverable for SequenceError {
    fn can_continue(&self) -> bool {
        match self {
            // Format errors in sequence files are recoverable at the next
            // record boundary, per the spec's error-propagation model.
            SequenceError::Format { .. } | SequenceError::TruncatedRecord => true,
            SequenceError::Reposition { source } => source.can_continue(),
            _ => false,
        }
    }
}

impl From<BufferError> for SequenceError {
    fn from(source: BufferError) -> Self {
        SequenceError::Reposition { source }
    }
}
