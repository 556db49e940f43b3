//! Format dispatchers (component G): FASTA, EMBL, and GenBank as
//! implementations of one [`SequenceFormat`] trait, so
//! [`super::reader::SequenceReader`] can be generic over the format and
//! monomorphize rather than going through callback pointers.
//!
//! The original design gives each format three callbacks
//! (`parse_header`, `end_of_record_test`, `parse_end`). Here `parse_end`'s
//! bookkeeping — stamping `eoff` once a terminator is found — turned out to
//! be identical busywork for every format, so it is folded into the shared
//! body loop in [`super::reader`]; formats instead implement
//! [`SequenceFormat::is_terminator_line`] for line-oriented bodies, while
//! block-oriented FASTA relies on the input map's `EndOfData`
//! classification to notice its terminator byte-by-byte without a callback
//! at all.

pub mod embl;
pub mod fasta;
pub mod genbank;

use crate::buffer::{ByteBuffer, ByteSource};
use crate::error::SequenceError;
use crate::seq::inmap::InputMap;

/// Whether a format's body is scanned a chunk at a time or a line at a
/// time. FASTA tolerates residues broken across lines arbitrarily, so it
/// scans in blocks; EMBL and GenBank bodies carry fixed per-line structure
/// (leading spaces, trailing position numbers) that is easiest to strip a
/// line at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    Block,
    Line,
}

/// Metadata extracted from a record's header, plus the offsets the body
/// loop needs to seed a [`crate::seq::record::SequenceRecord`].
#[derive(Debug, Clone)]
pub struct HeaderInfo {
    pub name: String,
    pub accession: Option<String>,
    pub description: Option<String>,
    /// Absolute offset of the first byte of the record.
    pub roff: u64,
    /// Absolute offset of the first residue byte.
    pub doff: u64,
}

/// One sequence file format's header recognition, field extraction, and
/// terminator test.
pub trait SequenceFormat {
    fn body_mode(&self) -> BodyMode;

    /// Whether source exhaustion (not just an explicit terminator) legally
    /// ends the current record. True for FASTA; false for EMBL/GenBank,
    /// which always require an explicit `//`.
    fn eof_terminates_record(&self) -> bool;

    /// The classification table for this format's body bytes, not yet
    /// narrowed by any digital alphabet.
    fn input_map(&self) -> InputMap;

    /// Consumes the header line(s) at the buffer's current position,
    /// leaving it positioned at the first residue byte.
    fn parse_header<S: ByteSource>(
        &self,
        buffer: &mut ByteBuffer<S>,
    ) -> Result<HeaderInfo, SequenceError>;

    /// For line-mode formats: does this already-read line (newline
    /// stripped) mark the end of the record? Block-mode formats never call
    /// this — their terminator is an ordinary body byte the input map
    /// classifies as [`crate::seq::inmap::ByteClass::EndOfData`].
    fn is_terminator_line(&self, line: &[u8]) -> bool {
        let _ = line;
        false
    }
}

/// Splits a header line into a leading token and the remainder, both with
/// surrounding whitespace trimmed. Shared by FASTA/EMBL/GenBank header
/// parsing.
pub(crate) fn split_first_token(line: &[u8]) -> (&[u8], &[u8]) {
    let line = trim(line);
    match line.iter().position(|&b| b == b' ' || b == b'\t') {
        Some(pos) => (&line[..pos], trim(&line[pos..])),
        None => (line, &[]),
    }
}

pub(crate) fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| !b.is_ascii_whitespace()).map_or(start, |p| p + 1);
    &bytes[start..end]
}

pub(crate) fn to_string_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
