//! Chunked JSON parsing, instantiating the byte-stream core for JSON's
//! grammar.
//!
//! - [`token`] — the flat token-tree arena tokens are emitted into
//!   (component D).
//! - [`state`] — the per-byte finite-state machine that emits them
//!   (component C).
//! - [`fuzz`] — a grammar-driven generator sharing the parser's state enum,
//!   used for differential round-trip testing (component E).
//!
//! [`parse`] ties the state machine to a [`crate::buffer::ByteBuffer`] for
//! the common case of parsing a whole source in one call; callers who need
//! to interleave parsing with their own I/O can drive [`JsonParser::push`]
//! directly instead.

pub mod fuzz;
pub mod state;
pub mod token;

use snafu::Snafu;

use crate::buffer::{ByteBuffer, ByteSource};
use crate::error::{BufferError, JsonError};

pub use state::{JsonParser, ParseProgress};
pub use token::{Token, TokenKind, TokenTree, NONE};

/// Errors from [`parse`], which can fail either at the buffer layer or the
/// JSON grammar layer.
#[derive(Debug, Snafu)]
pub enum JsonParseError {
    #[snafu(display("{source}"))]
    Buffer { source: BufferError },
    #[snafu(display("{source}"))]
    Json { source: JsonError },
}

impl From<BufferError> for JsonParseError {
    fn from(source: BufferError) -> Self {
        JsonParseError::Buffer { source }
    }
}

impl From<JsonError> for JsonParseError {
    fn from(source: JsonError) -> Self {
        JsonParseError::Json { source }
    }
}

/// Parses one complete JSON document from `buffer`, pulling chunks until the
/// document closes or the source is exhausted.
///
/// On success, `buffer` is left positioned just past the document's closing
/// brace; trailing bytes (a second document, in a concatenated stream) are
/// left unconsumed.
pub fn parse<S: ByteSource>(buffer: &mut ByteBuffer<S>) -> Result<TokenTree, JsonParseError> {
    let mut parser = JsonParser::new();
    let mut tree = TokenTree::new();
    buffer.set_anchor();
    loop {
        let chunk = buffer.fill_buf()?;
        if chunk.is_empty() {
            return Err(JsonError::UnterminatedDocument.into());
        }
        match parser.push(&mut tree, chunk)? {
            ParseProgress::NeedMore => {
                let n = chunk.len();
                buffer.consume(n);
            }
            ParseProgress::Done { consumed } => {
                buffer.consume(consumed);
                buffer.raise_anchor();
                return Ok(tree);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_from_a_buffer_leaving_trailing_bytes_untouched() {
        let mut buffer = ByteBuffer::with_chunk_size(Cursor::new(&b"{\"a\":1}TRAILING"[..]), 3);
        let tree = parse(&mut buffer).unwrap();
        assert_eq!(tree.get(0).kind, TokenKind::Object);
        assert_eq!(buffer.offset(), 7);
    }

    #[test]
    fn reports_unterminated_document() {
        let mut buffer = ByteBuffer::new(Cursor::new(&b"{\"a\":1"[..]));
        let err = parse(&mut buffer).unwrap_err();
        assert!(matches!(err, JsonParseError::Json { .. }));
    }
}
