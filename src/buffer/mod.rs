//! Chunked byte-stream buffer (component A).
//!
//! `ByteBuffer` pulls bytes from an underlying [`ByteSource`] in fixed-size
//! chunks, tracks the absolute file offset of every byte it hands out, and
//! exposes two view modes over the same underlying storage: a block view
//! (`fill_buf`/`consume`, modeled on `std::io::BufRead`) for formats that
//! scan residues a chunk at a time, and a line view (`read_line`) for
//! line-oriented headers. An optional anchor pins the earliest byte the
//! buffer may discard, which is what makes format auto-detection's
//! peek-then-rewind possible.

use std::io::{self, Read, Seek, SeekFrom};

use snafu::ResultExt;

use crate::error::{BufferError, SystemSnafu};

/// Default chunk size used by [`ByteBuffer::load_mem`], matching the
/// "≥4 KiB" guidance in the design.
pub const DEFAULT_CHUNK: usize = 4096;

/// A readable byte source that may or may not support seeking.
///
/// Implemented for files (seekable), in-memory cursors (seekable), and a
/// [`NonSeekable`] wrapper for pipes and stdin.
pub trait ByteSource: Read {
    /// Seeks to an absolute offset, or fails with
    /// [`BufferError::CannotReposition`] if the source does not support it.
    fn try_seek(&mut self, offset: u64) -> Result<(), BufferError>;
}

impl ByteSource for std::fs::File {
    fn try_seek(&mut self, offset: u64) -> Result<(), BufferError> {
        self.seek(SeekFrom::Start(offset)).context(SystemSnafu)?;
        Ok(())
    }
}

impl<T: AsRef<[u8]>> ByteSource for io::Cursor<T> {
    fn try_seek(&mut self, offset: u64) -> Result<(), BufferError> {
        Seek::seek(self, SeekFrom::Start(offset)).context(SystemSnafu)?;
        Ok(())
    }
}

/// Wraps a non-seekable reader (a pipe, stdin, or a decompressor's stdout)
/// so it can be used as a [`ByteSource`]. Any `Reposition` request fails.
pub struct NonSeekable<R>(pub R);

impl<R: Read> Read for NonSeekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read> ByteSource for NonSeekable<R> {
    fn try_seek(&mut self, _offset: u64) -> Result<(), BufferError> {
        Err(BufferError::CannotReposition)
    }
}

/// Chunked, offset-tracking, anchor-aware byte-stream buffer.
pub struct ByteBuffer<S> {
    source: S,
    mem: Vec<u8>,
    /// Absolute offset of `mem[0]`.
    moff: u64,
    /// Index into `mem` of the next unconsumed byte.
    consumed: usize,
    /// Absolute offset the buffer must retain bytes from, if any.
    anchor: Option<u64>,
    chunk_size: usize,
    line_buf: Vec<u8>,
    at_eof: bool,
}

impl<S: ByteSource> ByteBuffer<S> {
    /// Opens a buffer over `source` using the default chunk size.
    pub fn new(source: S) -> Self {
        Self::with_chunk_size(source, DEFAULT_CHUNK)
    }

    /// Opens a buffer over `source`, loading `chunk_size` bytes per refill.
    pub fn with_chunk_size(source: S, chunk_size: usize) -> Self {
        ByteBuffer {
            source,
            mem: Vec::new(),
            moff: 0,
            consumed: 0,
            anchor: None,
            chunk_size: chunk_size.max(1),
            line_buf: Vec::new(),
            at_eof: false,
        }
    }

    /// The absolute offset of the next byte to be consumed.
    pub fn offset(&self) -> u64 {
        self.moff + self.consumed as u64
    }

    /// Records the current offset as the earliest byte the buffer must
    /// retain. Only one anchor may be active; setting a new one replaces
    /// the old.
    pub fn set_anchor(&mut self) -> u64 {
        let at = self.offset();
        self.anchor = Some(at);
        at
    }

    /// Clears the anchor, permitting the buffer to discard consumed bytes
    /// again on the next refill.
    pub fn raise_anchor(&mut self) {
        self.anchor = None;
    }

    /// Rewinds the block/line views back to `offset`, an offset at or after
    /// the current anchor. Unlike [`ByteBuffer::reposition`], this never
    /// touches the underlying source — it only replays already-buffered
    /// bytes — so it works on non-seekable sources too, which is the whole
    /// point of anchoring: peek-then-rewind for format auto-detection
    /// without requiring a seekable source.
    ///
    /// Panics if `offset` falls before the start of the retained buffer
    /// (i.e. before the anchor, or before `moff` with no anchor set).
    pub fn rewind_to(&mut self, offset: u64) {
        assert!(offset >= self.moff, "rewind target was already discarded");
        self.consumed = (offset - self.moff) as usize;
    }

    /// Seeks the underlying source to `offset` and invalidates all buffered
    /// state, forcing the next read to refill from there. Fails with
    /// [`BufferError::CannotReposition`] for non-seekable sources.
    pub fn reposition(&mut self, offset: u64) -> Result<(), BufferError> {
        self.source.try_seek(offset)?;
        self.mem.clear();
        self.moff = offset;
        self.consumed = 0;
        self.anchor = None;
        self.at_eof = false;
        Ok(())
    }

    /// Discards bytes before the anchor (or before `consumed`, if no anchor
    /// is set), sliding `moff` forward to match.
    fn compact(&mut self) {
        let keep_from = match self.anchor {
            Some(anchor) if anchor > self.moff => {
                ((anchor - self.moff) as usize).min(self.mem.len())
            }
            Some(_) => 0,
            None => self.consumed,
        };
        if keep_from > 0 {
            self.mem.drain(0..keep_from);
            self.moff += keep_from as u64;
            self.consumed -= keep_from;
        }
    }

    /// Appends up to `chunk_size` bytes from the source. Returns `Ok(false)`
    /// at end of source (not an error — callers treat that as a normal
    /// termination signal, per the spec).
    fn load_mem(&mut self) -> Result<bool, BufferError> {
        if self.at_eof {
            return Ok(false);
        }
        self.compact();
        let start = self.mem.len();
        self.mem.resize(start + self.chunk_size, 0);
        let n = self.source.read(&mut self.mem[start..]).context(SystemSnafu)?;
        self.mem.truncate(start + n);
        if n == 0 {
            self.at_eof = true;
        }
        Ok(n > 0)
    }

    /// Block view: returns the currently buffered, unconsumed bytes,
    /// refilling from the source once if empty. An empty slice means end
    /// of source.
    pub fn fill_buf(&mut self) -> Result<&[u8], BufferError> {
        if self.consumed >= self.mem.len() && !self.at_eof {
            self.load_mem()?;
        }
        Ok(&self.mem[self.consumed..])
    }

    /// Marks `amt` bytes from the block view as consumed.
    pub fn consume(&mut self, amt: usize) {
        debug_assert!(self.consumed + amt <= self.mem.len());
        self.consumed = (self.consumed + amt).min(self.mem.len());
    }

    /// Line view: returns the next line with its trailing `\n` (and, if
    /// present, the preceding `\r`) stripped. Returns `None` only at end of
    /// source with no partial line pending.
    pub fn read_line(&mut self) -> Result<Option<&[u8]>, BufferError> {
        self.line_buf.clear();
        loop {
            let avail = &self.mem[self.consumed..];
            if let Some(rel) = memchr::memchr(b'\n', avail) {
                let mut end = rel;
                if end > 0 && avail[end - 1] == b'\r' {
                    end -= 1;
                }
                self.line_buf.extend_from_slice(&avail[..end]);
                self.consumed += rel + 1;
                return Ok(Some(&self.line_buf[..]));
            }
            let take = avail.len();
            if take > 0 {
                self.line_buf.extend_from_slice(avail);
                self.consumed += take;
            }
            if !self.load_mem()? {
                return Ok(if self.line_buf.is_empty() {
                    None
                } else {
                    Some(&self.line_buf[..])
                });
            }
        }
    }

    /// True once the underlying source has returned zero bytes at least
    /// once and nothing unconsumed remains buffered.
    pub fn is_exhausted(&self) -> bool {
        self.at_eof && self.consumed >= self.mem.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn buf_of(bytes: &'static [u8]) -> ByteBuffer<Cursor<&'static [u8]>> {
        ByteBuffer::with_chunk_size(Cursor::new(bytes), 4)
    }

    #[test]
    fn fill_buf_refills_across_chunk_boundaries() {
        let mut b = buf_of(b"abcdefghij");
        let mut collected = Vec::new();
        loop {
            let chunk = b.fill_buf().unwrap().to_vec();
            if chunk.is_empty() {
                break;
            }
            collected.extend_from_slice(&chunk);
            b.consume(chunk.len());
        }
        assert_eq!(collected, b"abcdefghij");
    }

    #[test]
    fn offset_tracks_consumption() {
        let mut b = buf_of(b"0123456789");
        assert_eq!(b.offset(), 0);
        let n = b.fill_buf().unwrap().len();
        b.consume(n.min(3));
        assert_eq!(b.offset(), 3);
    }

    #[test]
    fn anchor_retains_bytes_for_rewind() {
        let mut b = buf_of(b"abcdefgh");
        let anchor = b.set_anchor();
        assert_eq!(anchor, 0);
        // Consume everything, forcing several refills.
        loop {
            let n = b.fill_buf().unwrap().len();
            if n == 0 {
                break;
            }
            b.consume(n);
        }
        // With the anchor still held, mem must not have compacted past it.
        b.raise_anchor();
        // After raising, a fresh compact() may discard everything consumed.
        assert_eq!(b.offset(), 8);
    }

    #[test]
    fn read_line_strips_unix_and_dos_endings() {
        let mut b = ByteBuffer::with_chunk_size(Cursor::new(&b"one\ntwo\r\nthree"[..]), 3);
        assert_eq!(b.read_line().unwrap(), Some(&b"one"[..]));
        assert_eq!(b.read_line().unwrap(), Some(&b"two"[..]));
        assert_eq!(b.read_line().unwrap(), Some(&b"three"[..]));
        assert_eq!(b.read_line().unwrap(), None);
    }

    #[test]
    fn reposition_requires_seekable_source() {
        let mut b = ByteBuffer::new(NonSeekable(Cursor::new(&b"abc"[..])));
        assert!(matches!(
            b.reposition(0),
            Err(BufferError::CannotReposition)
        ));
    }

    #[test]
    fn reposition_reloads_from_new_offset() {
        let mut b = buf_of(b"0123456789");
        b.reposition(5).unwrap();
        assert_eq!(b.offset(), 5);
        let chunk = b.fill_buf().unwrap().to_vec();
        assert_eq!(&chunk[..1], b"5");
    }
}
