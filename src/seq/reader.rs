//! Sequence record reader (component F): the format-agnostic driver that
//! turns header parsing, body scanning, and terminator recognition
//! (component G) into a stream of [`SequenceRecord`]s.

use tracing::trace;

use crate::buffer::{ByteBuffer, ByteSource};
use crate::error::SequenceError;
use crate::seq::format::{BodyMode, SequenceFormat};
use crate::seq::inmap::{AlphabetMap, ByteClass, InputMap};
use crate::seq::record::{Bookmark, ResidueData, SequenceRecord};

/// Running bytes-per-line / residues-per-line bookkeeping (§4.4).
///
/// `Unknown` until a line is observed, `Invalid` once two observed lines
/// disagree, `Consistent(n)` while every observed line has agreed on `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStat {
    Unknown,
    Invalid,
    Consistent(usize),
}

impl LineStat {
    fn observe(&mut self, n: usize) {
        *self = match *self {
            LineStat::Unknown => LineStat::Consistent(n),
            LineStat::Consistent(v) if v == n => LineStat::Consistent(n),
            LineStat::Consistent(_) => LineStat::Invalid,
            LineStat::Invalid => LineStat::Invalid,
        };
    }

    pub fn value(self) -> Option<usize> {
        match self {
            LineStat::Consistent(n) => Some(n),
            _ => None,
        }
    }
}

impl Default for LineStat {
    fn default() -> Self {
        LineStat::Unknown
    }
}

/// Drives one [`SequenceFormat`] over one [`ByteBuffer`], producing
/// [`SequenceRecord`]s one at a time.
pub struct SequenceReader<F, S> {
    format: F,
    buffer: ByteBuffer<S>,
    alphabet: Option<Box<dyn AlphabetMap>>,
    bpl: LineStat,
    rpl: LineStat,
    /// Most recent line's `(bytes, residues)` counts, not yet folded into
    /// `bpl`/`rpl` — a record's final line is never counted, since it is
    /// often short, so every line is held back one step before committing.
    pending_line: Option<(usize, usize)>,
    /// Resume point captured at the most recent record boundary.
    pub(crate) bookmark: Option<Bookmark>,
    max_record_length: Option<usize>,
}

impl<F: SequenceFormat, S: ByteSource> SequenceReader<F, S> {
    pub fn new(format: F, buffer: ByteBuffer<S>) -> Self {
        SequenceReader {
            format,
            buffer,
            alphabet: None,
            bpl: LineStat::Unknown,
            rpl: LineStat::Unknown,
            pending_line: None,
            bookmark: None,
            max_record_length: None,
        }
    }

    /// Reads in digital mode, encoding residues through `alphabet` instead
    /// of storing them as raw text.
    pub fn with_alphabet(mut self, alphabet: Box<dyn AlphabetMap>) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    /// Fails a record with [`SequenceError::RecordTooLong`] once its residue
    /// count exceeds `limit`, bounding memory use against a corrupt or
    /// unexpectedly huge record.
    pub fn with_max_record_length(mut self, limit: usize) -> Self {
        self.max_record_length = Some(limit);
        self
    }

    pub fn bpl(&self) -> Option<usize> {
        self.bpl.value()
    }

    pub fn rpl(&self) -> Option<usize> {
        self.rpl.value()
    }

    pub fn buffer(&self) -> &ByteBuffer<S> {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ByteBuffer<S> {
        &mut self.buffer
    }

    pub(crate) fn is_complementable(&self) -> bool {
        self.alphabet.as_deref().is_some_and(|a| a.is_complementable())
    }

    pub(crate) fn complement(&self, code: u8) -> Option<u8> {
        self.alphabet.as_deref().and_then(|a| a.complement(code))
    }

    /// Invalidates running bpl/rpl bookkeeping and the pending line, as
    /// required after any random-access jump (§4.6): the lines observed
    /// before a jump say nothing about the lines that follow it.
    pub(crate) fn reset_line_stats(&mut self) {
        self.bpl = LineStat::Unknown;
        self.rpl = LineStat::Unknown;
        self.pending_line = None;
    }

    pub(crate) fn input_map(&self) -> InputMap {
        let base = self.format.input_map();
        match &self.alphabet {
            Some(alphabet) => base.apply_alphabet(alphabet.as_ref()),
            None => base,
        }
    }

    fn observe_line(&mut self, bytes: usize, residues: usize) {
        if let Some((pb, pr)) = self.pending_line.take() {
            self.bpl.observe(pb);
            self.rpl.observe(pr);
        }
        self.pending_line = Some((bytes, residues));
    }

    /// Drops the pending line without committing it — called once a record
    /// ends, since the last line of a record is excluded from bpl/rpl by
    /// design (it is frequently shorter than the rest).
    fn finish_lines(&mut self) {
        self.pending_line = None;
    }

    fn finalize_residues(&self, raw: Vec<u8>, total: usize, collect: bool) -> ResidueData {
        if !collect {
            return ResidueData::Info { length: total };
        }
        match &self.alphabet {
            Some(alphabet) => {
                let sentinel = alphabet.sentinel();
                let mut codes = Vec::with_capacity(raw.len() + 2);
                codes.push(sentinel);
                codes.extend_from_slice(&raw);
                codes.push(sentinel);
                ResidueData::Digital { codes, sentinel }
            }
            None => ResidueData::Text(raw),
        }
    }

    /// Reads the next record, or `Ok(None)` once the source is exhausted
    /// between records (not mid-record — a truncated record is an error).
    pub fn next_record(&mut self) -> Result<Option<SequenceRecord>, SequenceError> {
        if self.buffer.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let header = self.format.parse_header(&mut self.buffer)?;
        trace!(name = %header.name, roff = header.roff, "parsed sequence header");

        let (residues, total, eoff) = match self.format.body_mode() {
            BodyMode::Block => self.scan_block(true)?,
            BodyMode::Line => self.scan_lines(true)?,
        };
        self.finish_lines();
        self.bookmark_next_record();

        Ok(Some(SequenceRecord {
            name: header.name,
            accession: header.accession,
            description: header.description,
            residues: self.finalize_residues(residues, total, true),
            structure: None,
            roff: header.roff,
            doff: header.doff,
            eoff,
        }))
    }

    /// Reads the next record's header and length without materializing its
    /// residues — the "metadata-only" reading mode.
    pub fn next_metadata(&mut self) -> Result<Option<SequenceRecord>, SequenceError> {
        if self.buffer.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let header = self.format.parse_header(&mut self.buffer)?;
        let (residues, total, eoff) = match self.format.body_mode() {
            BodyMode::Block => self.scan_block(false)?,
            BodyMode::Line => self.scan_lines(false)?,
        };
        self.finish_lines();
        self.bookmark_next_record();

        Ok(Some(SequenceRecord {
            name: header.name,
            accession: header.accession,
            description: header.description,
            residues: self.finalize_residues(residues, total, false),
            structure: None,
            roff: header.roff,
            doff: header.doff,
            eoff,
        }))
    }

    fn bookmark_next_record(&mut self) {
        self.bookmark = Some(Bookmark {
            offset: self.buffer.offset(),
            line: None,
        });
    }

    /// Block-mode body scan (FASTA): classify bytes a chunk at a time,
    /// stopping at the input map's `EndOfData` sentinel or source end.
    fn scan_block(&mut self, collect: bool) -> Result<(Vec<u8>, usize, u64), SequenceError> {
        let map = self.input_map();
        let mut residues = Vec::new();
        let mut total = 0usize;
        let mut cur_bytes = 0usize;
        let mut cur_residues = 0usize;
        let mut line = 1usize;

        loop {
            let chunk = self.buffer.fill_buf()?;
            if chunk.is_empty() {
                if self.format.eof_terminates_record() {
                    let eoff = self.buffer.offset().saturating_sub(1);
                    return Ok((residues, total, eoff));
                }
                return Err(SequenceError::TruncatedRecord);
            }

            let mut consumed = 0usize;
            let mut stopped = false;
            for &byte in chunk {
                match map.classify(byte) {
                    ByteClass::Symbol(code) => {
                        if collect {
                            residues.push(code);
                        }
                        total += 1;
                        if let Some(limit) = self.max_record_length {
                            if total > limit {
                                return Err(SequenceError::RecordTooLong { limit });
                            }
                        }
                        cur_bytes += 1;
                        cur_residues += 1;
                    }
                    ByteClass::Ignored => cur_bytes += 1,
                    ByteClass::EndOfLine => {
                        cur_bytes += 1;
                        line += 1;
                        self.observe_line(cur_bytes, cur_residues);
                        cur_bytes = 0;
                        cur_residues = 0;
                    }
                    ByteClass::EndOfData => {
                        stopped = true;
                        break;
                    }
                    ByteClass::Illegal => {
                        return Err(SequenceError::Format { line, byte });
                    }
                }
                consumed += 1;
            }

            let boundary_offset = self.buffer.offset() + consumed as u64;
            self.buffer.consume(consumed);
            if stopped {
                let eoff = boundary_offset.saturating_sub(1);
                return Ok((residues, total, eoff));
            }
        }
    }

    /// Line-mode body scan (EMBL/GenBank): read one stripped line at a
    /// time, checking the format's terminator before treating it as
    /// residue data.
    fn scan_lines(&mut self, collect: bool) -> Result<(Vec<u8>, usize, u64), SequenceError> {
        let map = self.input_map();
        let mut residues = Vec::new();
        let mut total = 0usize;
        let mut line_no = 1usize;

        loop {
            let line_start = self.buffer.offset();
            let Some(line) = self.buffer.read_line()? else {
                if self.format.eof_terminates_record() {
                    let eoff = self.buffer.offset().saturating_sub(1);
                    return Ok((residues, total, eoff));
                }
                return Err(SequenceError::TruncatedRecord);
            };
            let line = line.to_vec();

            if self.format.is_terminator_line(&line) {
                let eoff = line_start + line.len() as u64 - 1;
                return Ok((residues, total, eoff));
            }

            let raw_bytes = (self.buffer.offset() - line_start) as usize;
            let mut line_residues = 0usize;
            for &byte in &line {
                match map.classify(byte) {
                    ByteClass::Symbol(code) => {
                        if collect {
                            residues.push(code);
                        }
                        total += 1;
                        if let Some(limit) = self.max_record_length {
                            if total > limit {
                                return Err(SequenceError::RecordTooLong { limit });
                            }
                        }
                        line_residues += 1;
                    }
                    ByteClass::Ignored => {}
                    ByteClass::EndOfLine | ByteClass::EndOfData => {}
                    ByteClass::Illegal => {
                        return Err(SequenceError::Format { line: line_no, byte });
                    }
                }
            }
            self.observe_line(raw_bytes, line_residues);
            line_no += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::format::fasta::Fasta;
    use std::io::Cursor;

    #[test]
    fn reads_two_fasta_records_and_tracks_bpl_rpl() {
        let input = b">s1 desc1\nACDEFG\nHIKLMN\n>s2\nPQRSTV\n";
        let mut reader = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(&input[..])));

        let r1 = reader.next_record().unwrap().unwrap();
        assert_eq!(r1.name, "s1");
        assert_eq!(r1.description.as_deref(), Some("desc1"));
        assert_eq!(r1.residues.residues(), b"ACDEFGHIKLMN");
        assert_eq!(r1.len(), 12);

        let r2 = reader.next_record().unwrap().unwrap();
        assert_eq!(r2.name, "s2");
        assert_eq!(r2.description, None);
        assert_eq!(r2.residues.residues(), b"PQRSTV");
        assert_eq!(r2.len(), 6);

        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.rpl(), Some(6));
        assert_eq!(reader.bpl(), Some(7));
    }

    #[test]
    fn metadata_only_read_skips_residue_storage() {
        let input = b">s1 desc1\nACDEFGHIKLMN\n";
        let mut reader = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(&input[..])));
        let r1 = reader.next_metadata().unwrap().unwrap();
        assert_eq!(r1.len(), 12);
        assert_eq!(r1.residues.residues(), b"");
        assert!(matches!(r1.residues, ResidueData::Info { length: 12 }));
    }

    #[test]
    fn rejects_a_record_past_the_configured_max_length() {
        let input = b">s1\nACDEFGHIKLMN\n";
        let mut reader = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(&input[..])))
            .with_max_record_length(5);
        let err = reader.next_record().unwrap_err();
        assert!(matches!(err, SequenceError::RecordTooLong { limit: 5 }));
    }

    #[test]
    fn rejects_illegal_byte_in_residues() {
        let input = b">s1\nACD3FG\n";
        let mut reader = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(&input[..])));
        let err = reader.next_record().unwrap_err();
        assert!(matches!(err, SequenceError::Format { .. }));
    }

    #[test]
    fn records_split_across_chunk_boundaries_parse_identically() {
        let input = b">s1 desc1\nACDEFGHIKLMN\n>s2\nPQRSTV\n";
        for chunk_size in 1..12 {
            let mut reader = SequenceReader::new(
                Fasta,
                ByteBuffer::with_chunk_size(Cursor::new(&input[..]), chunk_size),
            );
            let r1 = reader.next_record().unwrap().unwrap();
            assert_eq!(r1.name, "s1");
            assert_eq!(r1.residues.residues(), b"ACDEFGHIKLMN", "chunk_size={chunk_size}");
            let r2 = reader.next_record().unwrap().unwrap();
            assert_eq!(r2.residues.residues(), b"PQRSTV", "chunk_size={chunk_size}");
        }
    }
}
