//! Random-access glue over an external offset index (component I).
//!
//! The index's on-disk format and the bpl/rpl-based seek math it uses to
//! resolve a subsequence request to a byte offset are an external
//! collaborator's concern (§4.6), the same way [`super::inmap::AlphabetMap`]
//! is external to the residue scanner. This module defines the narrow
//! [`OffsetIndex`] interface this core needs from it, the per-record
//! [`IndexEntry`] this core hands an index *builder*, and the positioning
//! operations ([`position_by_key`], [`position_by_number`],
//! [`fetch_subseq`]) built on top of either.

use crate::buffer::ByteSource;
use crate::error::SequenceError;
use crate::seq::format::SequenceFormat;
use crate::seq::inmap::ByteClass;
use crate::seq::reader::SequenceReader;
use crate::seq::record::SequenceRecord;

/// Where a record begins in its source file.
#[derive(Debug, Clone, Copy)]
pub struct IndexLocation {
    pub record_offset: u64,
}

/// Where a subsequence read should begin. `actual_start` is the residue
/// position `data_offset` actually corresponds to — indexes commonly
/// resolve to a line boundary at or before the requested `start`, leaving a
/// short run of residues to skip before the first one the caller wants.
#[derive(Debug, Clone, Copy)]
pub struct SubseqLocation {
    pub record_offset: u64,
    pub data_offset: u64,
    pub length: u64,
    pub actual_start: u64,
}

/// Per-record bookkeeping this core hands an index builder so it can serve
/// `find_name`/`find_number`/`find_subseq` lookups later. The index file
/// format itself is out of scope.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub name: String,
    pub accession: Option<String>,
    pub record_offset: u64,
    pub data_offset: u64,
    pub residue_length: u64,
    /// Present only when the file's line layout was consistent enough to
    /// support O(1) subseq positioning (§4.4).
    pub line_stats: Option<(usize, usize)>,
}

/// An external, read-only offset index (§4.6). Not implemented by this
/// crate; callers supply one backed by whatever on-disk format they use.
pub trait OffsetIndex {
    fn find_name(&self, key: &str) -> Option<IndexLocation>;
    fn find_number(&self, n: u64) -> Option<IndexLocation>;
    fn find_subseq(&self, key: &str, start: u64) -> Option<SubseqLocation>;
}

impl<F: SequenceFormat, S: ByteSource> SequenceReader<F, S> {
    /// Builds this record's entry for an external index.
    pub fn index_entry(&self, record: &SequenceRecord) -> IndexEntry {
        let line_stats = match (self.bpl(), self.rpl()) {
            (Some(bpl), Some(rpl)) if bpl > 0 && rpl > 0 => Some((bpl, rpl)),
            _ => None,
        };
        IndexEntry {
            name: record.name.clone(),
            accession: record.accession.clone(),
            record_offset: record.roff,
            data_offset: record.doff,
            residue_length: record.len() as u64,
            line_stats,
        }
    }

    /// Repositions to an absolute offset reported by an index lookup,
    /// invalidating bookkeeping that no longer applies to whatever follows.
    fn jump_to(&mut self, offset: u64) -> Result<(), SequenceError> {
        self.buffer_mut().reposition(offset)?;
        self.reset_line_stats();
        Ok(())
    }
}

/// Positions `reader` at the record named `key`, per the index.
pub fn position_by_key<F: SequenceFormat, S: ByteSource>(
    reader: &mut SequenceReader<F, S>,
    index: &dyn OffsetIndex,
    key: &str,
) -> Result<(), SequenceError> {
    let location = index.find_name(key).ok_or_else(|| SequenceError::NotFound {
        key: key.to_string(),
    })?;
    reader.jump_to(location.record_offset)
}

/// Positions `reader` at the `n`th record, per the index.
pub fn position_by_number<F: SequenceFormat, S: ByteSource>(
    reader: &mut SequenceReader<F, S>,
    index: &dyn OffsetIndex,
    n: u64,
) -> Result<(), SequenceError> {
    let location = index.find_number(n).ok_or_else(|| SequenceError::NotFound {
        key: n.to_string(),
    })?;
    reader.jump_to(location.record_offset)
}

/// Reads residues `start..=end` (1-based, inclusive) of the record named
/// `key`, without reading the rest of the record.
pub fn fetch_subseq<F: SequenceFormat, S: ByteSource>(
    reader: &mut SequenceReader<F, S>,
    index: &dyn OffsetIndex,
    key: &str,
    start: u64,
    end: u64,
) -> Result<Vec<u8>, SequenceError> {
    let location = index
        .find_subseq(key, start)
        .ok_or_else(|| SequenceError::NotFound {
            key: key.to_string(),
        })?;
    if start < 1 || start > end || end > location.length {
        return Err(SequenceError::OutOfRange {
            start,
            end,
            length: location.length,
        });
    }

    reader.jump_to(location.data_offset)?;
    let map = reader.input_map();
    let want = (end - start + 1) as usize;
    let mut skip = start.saturating_sub(location.actual_start);
    let mut collected = Vec::with_capacity(want);

    loop {
        let chunk = reader.buffer_mut().fill_buf()?;
        if chunk.is_empty() {
            return Err(SequenceError::TruncatedRecord);
        }

        let mut consumed = 0usize;
        let mut done = false;
        let mut hit_sentinel = false;
        for &byte in chunk {
            consumed += 1;
            match map.classify(byte) {
                ByteClass::Symbol(code) => {
                    if skip > 0 {
                        skip -= 1;
                    } else {
                        collected.push(code);
                    }
                }
                ByteClass::Ignored | ByteClass::EndOfLine => {}
                ByteClass::EndOfData => {
                    hit_sentinel = true;
                    consumed -= 1;
                    break;
                }
                ByteClass::Illegal => {
                    return Err(SequenceError::Format { line: 0, byte });
                }
            }
            if collected.len() == want {
                done = true;
                break;
            }
        }
        reader.buffer_mut().consume(consumed);
        if hit_sentinel && !done {
            return Err(SequenceError::OutOfRange {
                start,
                end,
                length: location.length,
            });
        }
        if done {
            return Ok(collected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteBuffer;
    use crate::seq::format::fasta::Fasta;
    use std::collections::HashMap;
    use std::io::Cursor;

    struct StubIndex {
        records: HashMap<&'static str, (u64, u64, u64)>, // roff, doff, length
    }

    impl OffsetIndex for StubIndex {
        fn find_name(&self, key: &str) -> Option<IndexLocation> {
            self.records
                .get(key)
                .map(|&(roff, _, _)| IndexLocation { record_offset: roff })
        }

        fn find_number(&self, _n: u64) -> Option<IndexLocation> {
            None
        }

        fn find_subseq(&self, key: &str, _start: u64) -> Option<SubseqLocation> {
            // This stub always resolves to the record's first residue byte
            // (no bpl/rpl-based jump), so `actual_start` is always 1.
            self.records.get(key).map(|&(roff, doff, length)| SubseqLocation {
                record_offset: roff,
                data_offset: doff,
                length,
                actual_start: 1,
            })
        }
    }

    const INPUT: &[u8] = b">s1 desc1\nACDEFGHIKLMN\n>s2\nPQRSTV\n";

    #[test]
    fn fetch_subseq_reads_middle_of_a_record_without_the_rest() {
        let mut reader = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(INPUT)));
        let r1 = reader.next_record().unwrap().unwrap();
        let entry = reader.index_entry(&r1);
        assert_eq!(entry.name, "s1");
        assert_eq!(entry.residue_length, 12);

        let mut records = HashMap::new();
        records.insert("s1", (entry.record_offset, entry.data_offset, entry.residue_length));
        let index = StubIndex { records };

        let mut reader2 = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(INPUT)));
        let subseq = fetch_subseq(&mut reader2, &index, "s1", 4, 8).unwrap();
        assert_eq!(subseq, b"EFGHI");
    }

    #[test]
    fn fetch_subseq_rejects_out_of_range_coordinates() {
        let mut reader = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(INPUT)));
        let r1 = reader.next_record().unwrap().unwrap();
        let entry = reader.index_entry(&r1);

        let mut records = HashMap::new();
        records.insert("s1", (entry.record_offset, entry.data_offset, entry.residue_length));
        let index = StubIndex { records };

        let mut reader2 = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(INPUT)));
        let err = fetch_subseq(&mut reader2, &index, "s1", 1, 99).unwrap_err();
        assert!(matches!(err, SequenceError::OutOfRange { .. }));
    }

    #[test]
    fn position_by_key_seeks_the_buffer_to_the_record_start() {
        let mut reader = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(INPUT)));
        let r1 = reader.next_record().unwrap().unwrap();
        let r2 = reader.next_record().unwrap().unwrap();
        let e1 = reader.index_entry(&r1);
        let e2 = reader.index_entry(&r2);

        let mut records = HashMap::new();
        records.insert("s1", (e1.record_offset, e1.data_offset, e1.residue_length));
        records.insert("s2", (e2.record_offset, e2.data_offset, e2.residue_length));
        let index = StubIndex { records };

        let mut reader2 = SequenceReader::new(Fasta, ByteBuffer::new(Cursor::new(INPUT)));
        position_by_key(&mut reader2, &index, "s2").unwrap();
        let record = reader2.next_record().unwrap().unwrap();
        assert_eq!(record.name, "s2");
        assert_eq!(record.residues.residues(), b"PQRSTV");
    }
}
