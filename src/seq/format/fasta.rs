//! FASTA: `>`-headed records, residues freely broken across lines.

use crate::buffer::{ByteBuffer, ByteSource};
use crate::error::SequenceError;
use crate::seq::inmap::InputMap;

use super::{split_first_token, to_string_lossy, BodyMode, HeaderInfo, SequenceFormat};

/// First non-whitespace byte that identifies a FASTA header line.
pub const SENTINEL: u8 = b'>';

#[derive(Debug, Default, Clone, Copy)]
pub struct Fasta;

impl Fasta {
    /// True if `line` (whitespace-trimmed, as peeked during auto-detect)
    /// begins a FASTA record.
    pub fn looks_like(first_line: &[u8]) -> bool {
        super::trim(first_line).first() == Some(&SENTINEL)
    }
}

impl SequenceFormat for Fasta {
    fn body_mode(&self) -> BodyMode {
        BodyMode::Block
    }

    fn eof_terminates_record(&self) -> bool {
        true
    }

    fn input_map(&self) -> InputMap {
        InputMap::text().reject_digits().with_end_of_data(SENTINEL)
    }

    fn parse_header<S: ByteSource>(
        &self,
        buffer: &mut ByteBuffer<S>,
    ) -> Result<HeaderInfo, SequenceError> {
        let roff = buffer.offset();
        let line = buffer
            .read_line()?
            .ok_or(SequenceError::TruncatedRecord)?
            .to_vec();
        let rest = line
            .strip_prefix(&[SENTINEL])
            .ok_or(SequenceError::UnrecognizedFormat)?;
        let (name, description) = split_first_token(rest);
        let doff = buffer.offset();
        Ok(HeaderInfo {
            name: to_string_lossy(name),
            accession: None,
            description: if description.is_empty() {
                None
            } else {
                Some(to_string_lossy(description))
            },
            roff,
            doff,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_header_sentinel() {
        assert!(Fasta::looks_like(b">s1 desc"));
        assert!(!Fasta::looks_like(b"ID   PROT_X"));
    }

    #[test]
    fn parses_name_and_description() {
        use std::io::Cursor;
        let mut buffer = ByteBuffer::new(Cursor::new(&b">s1 desc1\nACDEFG\n"[..]));
        let header = Fasta.parse_header(&mut buffer).unwrap();
        assert_eq!(header.name, "s1");
        assert_eq!(header.description.as_deref(), Some("desc1"));
        assert_eq!(header.doff, 10);
    }

    #[test]
    fn parses_name_without_description() {
        use std::io::Cursor;
        let mut buffer = ByteBuffer::new(Cursor::new(&b">s2\nPQRSTV\n"[..]));
        let header = Fasta.parse_header(&mut buffer).unwrap();
        assert_eq!(header.name, "s2");
        assert_eq!(header.description, None);
    }
}
