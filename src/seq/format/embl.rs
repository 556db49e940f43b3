//! EMBL/UniProt flat-file format.
//!
//! The source library tells EMBL and UniProt apart only by filename
//! convention; both parse identically here, so there is one format.

use crate::buffer::{ByteBuffer, ByteSource};
use crate::error::SequenceError;
use crate::seq::inmap::InputMap;

use super::{split_first_token, to_string_lossy, trim, BodyMode, HeaderInfo, SequenceFormat};

#[derive(Debug, Default, Clone, Copy)]
pub struct Embl;

impl Embl {
    pub fn looks_like(first_line: &[u8]) -> bool {
        trim(first_line).starts_with(b"ID")
    }
}

fn strip_trailing_semicolon(bytes: &[u8]) -> &[u8] {
    match bytes.last() {
        Some(b';') => &bytes[..bytes.len() - 1],
        _ => bytes,
    }
}

impl SequenceFormat for Embl {
    fn body_mode(&self) -> BodyMode {
        BodyMode::Line
    }

    fn eof_terminates_record(&self) -> bool {
        false
    }

    fn input_map(&self) -> InputMap {
        InputMap::text()
    }

    fn parse_header<S: ByteSource>(
        &self,
        buffer: &mut ByteBuffer<S>,
    ) -> Result<HeaderInfo, SequenceError> {
        let roff = buffer.offset();
        let mut name = None;
        let mut accession = None;
        let mut description_parts: Vec<String> = Vec::new();

        loop {
            let line = buffer
                .read_line()?
                .ok_or(SequenceError::TruncatedRecord)?
                .to_vec();
            let (tag, value) = split_first_token(&line);
            match tag {
                b"ID" => {
                    let (tok, _) = split_first_token(value);
                    name = Some(to_string_lossy(strip_trailing_semicolon(tok)));
                }
                b"AC" => {
                    let (tok, _) = split_first_token(value);
                    accession = Some(to_string_lossy(strip_trailing_semicolon(tok)));
                }
                b"DE" => description_parts.push(to_string_lossy(value)),
                b"SQ" => {
                    let doff = buffer.offset();
                    let name = name.ok_or(SequenceError::UnrecognizedFormat)?;
                    return Ok(HeaderInfo {
                        name,
                        accession,
                        description: if description_parts.is_empty() {
                            None
                        } else {
                            Some(description_parts.join(" "))
                        },
                        roff,
                        doff,
                    });
                }
                _ => {} // other header tags (OS, OC, RN, ...) carry no field we extract
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

    const RECORD: &[u8] = b"ID   PROT_X; SV 1; linear;\n\
AC   Q12345;\n\
DE   Example protein,\n\
DE   second line.\n\
SQ   Sequence 12 AA;\n\
     ACDEFG HIKLMN\n\
//\n";

    #[test]
    fn extracts_id_ac_de() {
        let mut buffer = ByteBuffer::new(Cursor::new(RECORD));
        let header = Embl.parse_header(&mut buffer).unwrap();
        assert_eq!(header.name, "PROT_X");
        assert_eq!(header.accession.as_deref(), Some("Q12345"));
        assert_eq!(
            header.description.as_deref(),
            Some("Example protein, second line.")
        );
    }

    #[test]
    fn recognizes_terminator() {
        assert!(Embl.is_terminator_line(b"//"));
        assert!(!Embl.is_terminator_line(b"     ACDEFG"));
    }
}
