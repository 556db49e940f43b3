//! Biological sequence file parsing: chunked FASTA/EMBL/GenBank reading
//! with whole-record, metadata-only, and windowed reading modes, plus
//! random-access glue over an external offset index.

pub mod config;
pub mod format;
pub mod index;
pub mod inmap;
pub mod reader;
pub mod record;
pub mod window;

pub use config::{SequenceReaderConfig, SequenceReaderOptions};
pub use format::{fasta::Fasta, embl::Embl, genbank::GenBank, BodyMode, HeaderInfo, SequenceFormat};
pub use index::{fetch_subseq, position_by_key, position_by_number, IndexEntry, IndexLocation, OffsetIndex, SubseqLocation};
pub use inmap::{AlphabetMap, ByteClass, InputMap};
pub use reader::SequenceReader;
pub use record::{Bookmark, ResidueData, SequenceRecord};
pub use window::{Window, WindowOutcome, WindowedReader};

use crate::buffer::{ByteBuffer, ByteSource};
use crate::error::SequenceError;

/// The sequence format a record's first non-blank line identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Fasta,
    Embl,
    GenBank,
}

/// Peeks at `buffer`'s first non-blank line, using an anchor so the bytes
/// are not lost, and reports which format it matches.
///
/// Does not consume anything — the caller opens a format-specific
/// [`SequenceReader`] afterward starting from the same position.
pub fn detect_format<S: ByteSource>(
    buffer: &mut ByteBuffer<S>,
) -> Result<Option<DetectedFormat>, SequenceError> {
    let start = buffer.set_anchor();
    let result = loop {
        let Some(line) = buffer.read_line()? else {
            break None;
        };
        let trimmed = format::trim(line);
        if trimmed.is_empty() {
            continue;
        }
        break if Fasta::looks_like(trimmed) {
            Some(DetectedFormat::Fasta)
        } else if Embl::looks_like(trimmed) {
            Some(DetectedFormat::Embl)
        } else if GenBank::looks_like(trimmed) {
            Some(DetectedFormat::GenBank)
        } else {
            None
        };
    };
    buffer.rewind_to(start);
    buffer.raise_anchor();
    Ok(result)
}
