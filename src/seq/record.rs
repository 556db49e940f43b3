//! The sequence record produced by a [`super::reader::SequenceReader`]
//! (component F's output type, §3).

/// Residue storage mode. Residues are always stored densely — gaps are
/// excluded, matching the "no embedded gap characters" contract of a flat
/// record (alignments, with gap characters, are out of scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidueData {
    /// Raw residue bytes, case as they appeared in the source.
    Text(Vec<u8>),
    /// Digitally encoded residues with a leading and trailing sentinel byte
    /// flanking them, as produced when an [`super::inmap::AlphabetMap`] is
    /// active.
    Digital { codes: Vec<u8>, sentinel: u8 },
    /// Metadata-only: the record's length is known but its residues were
    /// never materialized — produced by metadata-only reads and by
    /// [`super::window::WindowedReader`] once a forward sweep completes.
    Info { length: usize },
}

impl ResidueData {
    /// Number of residues, excluding the digital mode's flanking sentinels.
    pub fn len(&self) -> usize {
        match self {
            ResidueData::Text(bytes) => bytes.len(),
            ResidueData::Digital { codes, .. } => codes.len().saturating_sub(2),
            ResidueData::Info { length } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The residue bytes without sentinels, in original (forward) order.
    /// Empty for [`ResidueData::Info`], whose residues were never kept.
    pub fn residues(&self) -> &[u8] {
        match self {
            ResidueData::Text(bytes) => bytes,
            ResidueData::Digital { codes, .. } => {
                let n = codes.len();
                if n < 2 {
                    &[]
                } else {
                    &codes[1..n - 1]
                }
            }
            ResidueData::Info { .. } => &[],
        }
    }
}

/// One biological sequence entry: header metadata plus residue data plus
/// the byte range it occupied in the source.
#[derive(Debug, Clone)]
pub struct SequenceRecord {
    pub name: String,
    pub accession: Option<String>,
    pub description: Option<String>,
    pub residues: ResidueData,
    /// Per-residue secondary-structure annotation, if the format and
    /// record carry one (same length as `residues`).
    pub structure: Option<Vec<u8>>,
    /// Absolute offset of the first byte of the record (the header).
    pub roff: u64,
    /// Absolute offset of the first residue byte.
    pub doff: u64,
    /// Absolute offset of the last byte of the record (its terminator).
    pub eoff: u64,
}

impl SequenceRecord {
    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

/// A resume point captured at a record boundary, so a reverse-complement
/// pass can return to where the next forward record read should begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookmark {
    pub offset: u64,
    /// 1-based line number, or `None` if not tracked (block-mode FASTA
    /// bodies do not count lines outside of bpl/rpl bookkeeping).
    pub line: Option<u64>,
}
