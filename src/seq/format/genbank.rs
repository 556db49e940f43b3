//! GenBank/DDBJ flat-file format.

use crate::buffer::{ByteBuffer, ByteSource};
use crate::error::SequenceError;
use crate::seq::inmap::InputMap;

use super::{split_first_token, to_string_lossy, trim, BodyMode, HeaderInfo, SequenceFormat};

#[derive(Debug, Default, Clone, Copy)]
pub struct GenBank;

impl GenBank {
    pub fn looks_like(first_line: &[u8]) -> bool {
        let line = trim(first_line);
        line.starts_with(b"LOCUS") || line.starts_with(b"Genetic Sequence Data Bank")
    }
}

impl SequenceFormat for GenBank {
    fn body_mode(&self) -> BodyMode {
        BodyMode::Line
    }

    fn eof_terminates_record(&self) -> bool {
        false
    }

    fn input_map(&self) -> InputMap {
        // GenBank body lines interleave residue position numbers with the
        // sequence; digits are already ignored by the text-mode table.
        InputMap::text()
    }

    fn parse_header<S: ByteSource>(
        &self,
        buffer: &mut ByteBuffer<S>,
    ) -> Result<HeaderInfo, SequenceError> {
        let roff = buffer.offset();
        let mut name = None;
        let mut accession = None;
        let mut description: Option<String> = None;

        loop {
            let line = buffer
                .read_line()?
                .ok_or(SequenceError::TruncatedRecord)?
                .to_vec();
            let (tag, value) = split_first_token(&line);
            match tag {
                b"LOCUS" => {
                    let (tok, _) = split_first_token(value);
                    name = Some(to_string_lossy(tok));
                }
                b"DEFINITION" => description = Some(to_string_lossy(value)),
                b"VERSION" => {
                    let (tok, _) = split_first_token(value);
                    accession = Some(to_string_lossy(tok));
                }
                b"ORIGIN" => {
                    let doff = buffer.offset();
                    let name = name.ok_or(SequenceError::UnrecognizedFormat)?;
                    return Ok(HeaderInfo {
                        name,
                        accession,
                        description,
                        roff,
                        doff,
                    });
                }
                _ => {} // other header fields (SOURCE, ORGANISM, FEATURES, ...) unused
            }
        }
    }

    fn is_terminator_line(&self, line: &[u8]) -> bool {
        trim(line) == b"//"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const RECORD: &[u8] = b"LOCUS       EX000001     12 bp    DNA\n\
DEFINITION  Example sequence.\n\
VERSION     EX000001.1\n\
ORIGIN\n\
        1 acdefghikl mn\n\
//\n";

    #[test]
    fn extracts_locus_definition_version() {
        let mut buffer = ByteBuffer::new(Cursor::new(RECORD));
        let header = GenBank.parse_header(&mut buffer).unwrap();
        assert_eq!(header.name, "EX000001");
        assert_eq!(header.accession.as_deref(), Some("EX000001.1"));
        assert_eq!(header.description.as_deref(), Some("Example sequence."));
    }

    #[test]
    fn recognizes_header_and_terminator() {
        assert!(GenBank::looks_like(b"LOCUS       EX000001"));
        assert!(GenBank.is_terminator_line(b"//"));
    }
}
