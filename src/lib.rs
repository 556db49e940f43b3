//! A chunked, incremental parsing core for two independent grammars:
//! line/byte-oriented biological sequence file formats (FASTA, EMBL,
//! GenBank) and JSON. Both share the same [`buffer`] byte-stream layer and
//! the same [`error`] conventions; neither depends on the other.

pub mod buffer;
pub mod error;
pub mod json;
pub mod seq;

pub use buffer::{ByteBuffer, ByteSource, NonSeekable};
pub use error::{BufferError, JsonError, Recoverable, SequenceError};
pub use json::{parse, JsonParseError, JsonParser, ParseProgress, Token, TokenKind, TokenTree, NONE};
pub use seq::{
    detect_format, fetch_subseq, position_by_key, position_by_number, AlphabetMap, Bookmark,
    BodyMode, ByteClass, DetectedFormat, Embl, Fasta, GenBank, HeaderInfo, IndexEntry,
    IndexLocation, InputMap, OffsetIndex, ResidueData, SequenceFormat, SequenceReader,
    SequenceReaderConfig, SequenceReaderOptions, SequenceRecord, SubseqLocation, Window,
    WindowOutcome, WindowedReader,
};
