//! Builder-style configuration for opening a [`SequenceReader`], mirroring
//! the `FooDecoderConfig { foo: FooDecoderOptions } -> build() -> Foo`
//! pattern used throughout the framing/format config types this crate's
//! reader loop is modeled on.

use crate::buffer::{ByteBuffer, ByteSource, DEFAULT_CHUNK};
use crate::seq::format::SequenceFormat;
use crate::seq::inmap::AlphabetMap;
use crate::seq::reader::SequenceReader;

/// Options controlling how a [`SequenceReader`] scans its source.
#[derive(Debug, Clone)]
pub struct SequenceReaderOptions {
    /// Bytes pulled from the source per refill.
    pub chunk_size: usize,
    /// Residue count past which a record is rejected rather than grown
    /// without bound.
    pub max_record_length: Option<usize>,
}

impl Default for SequenceReaderOptions {
    fn default() -> Self {
        SequenceReaderOptions {
            chunk_size: DEFAULT_CHUNK,
            max_record_length: None,
        }
    }
}

/// Builds a [`SequenceReader`] for one format `F`.
#[derive(Debug, Clone)]
pub struct SequenceReaderConfig<F> {
    format: F,
    sequence_reader: SequenceReaderOptions,
}

impl<F: SequenceFormat> SequenceReaderConfig<F> {
    pub fn new(format: F) -> Self {
        SequenceReaderConfig {
            format,
            sequence_reader: SequenceReaderOptions::default(),
        }
    }

    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.sequence_reader.chunk_size = chunk_size;
        self
    }

    pub const fn with_max_record_length(mut self, limit: usize) -> Self {
        self.sequence_reader.max_record_length = Some(limit);
        self
    }

    /// Builds the reader in text mode.
    pub fn build<S: ByteSource>(self, source: S) -> SequenceReader<F, S> {
        let buffer = ByteBuffer::with_chunk_size(source, self.sequence_reader.chunk_size);
        let reader = SequenceReader::new(self.format, buffer);
        match self.sequence_reader.max_record_length {
            Some(limit) => reader.with_max_record_length(limit),
            None => reader,
        }
    }

    /// Builds the reader in digital mode, encoding residues through
    /// `alphabet`.
    pub fn build_digital<S: ByteSource>(
        self,
        source: S,
        alphabet: Box<dyn AlphabetMap>,
    ) -> SequenceReader<F, S> {
        self.build(source).with_alphabet(alphabet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::format::fasta::Fasta;
    use std::io::Cursor;

    #[test]
    fn builds_a_reader_with_configured_chunk_size_and_limit() {
        let config = SequenceReaderConfig::new(Fasta)
            .with_chunk_size(8)
            .with_max_record_length(4);
        let mut reader = config.build(Cursor::new(&b">s1\nACDEFG\n"[..]));
        let err = reader.next_record().unwrap_err();
        assert!(matches!(
            err,
            crate::error::SequenceError::RecordTooLong { limit: 4 }
        ));
    }
}
