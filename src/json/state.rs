//! JSON per-byte state machine (component C).
//!
//! Drives one byte at a time through roughly thirty FSM states, emitting
//! tokens into a [`TokenTree`] as it goes. The state lives in [`JsonParser`],
//! a plain value the caller owns and feeds chunks to via [`JsonParser::push`]
//! — the same "retained state struct, fed repeatedly" shape as
//! `tokio_util::codec::Decoder::decode`, but synchronous: there is no
//! `AsyncRead` here, the caller pulls chunks from a [`crate::buffer::ByteBuffer`]
//! itself and hands them over.
//!
//! The `NUM_EXPDIGIT` branch in the original C state machine this is modeled
//! on falls through into the literal-keyword state without a `break`;
//! exponent digits here simply loop on themselves and close on
//! whitespace/`,`/`]`/`}`, as the grammar actually intends.

use crate::error::JsonError;
use crate::json::token::{TokenKind, TokenTree, NONE};

const LITERAL_TRUE: &[u8] = b"true";
const LITERAL_FALSE: &[u8] = b"false";
const LITERAL_NULL: &[u8] = b"null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ObjNone,
    ObjOpen,
    ObjComma,
    ObjColon,
    ArrOpen,
    ArrComma,
    StrOpen,
    StrChar,
    StrBackslash,
    StrProtected,
    StrUnicode,
    KeyOpen,
    KeyChar,
    KeyBackslash,
    KeyProtected,
    KeyUnicode,
    StrAsKey,
    NumSign,
    NumZero,
    NumNonzero,
    NumLeadDigit,
    NumPoint,
    NumFracDigit,
    NumExp,
    NumExpSign,
    NumExpDigit,
    ValTrue,
    ValFalse,
    ValNull,
    ValInObj,
    ValInArr,
    Done,
}

impl State {
    fn name(self) -> &'static str {
        // Used only for diagnostics; kept terse on purpose.
        match self {
            State::ObjNone => "ObjNone",
            State::ObjOpen => "ObjOpen",
            State::ObjComma => "ObjComma",
            State::ObjColon => "ObjColon",
            State::ArrOpen => "ArrOpen",
            State::ArrComma => "ArrComma",
            State::StrOpen => "StrOpen",
            State::StrChar => "StrChar",
            State::StrBackslash => "StrBackslash",
            State::StrProtected => "StrProtected",
            State::StrUnicode => "StrUnicode",
            State::KeyOpen => "KeyOpen",
            State::KeyChar => "KeyChar",
            State::KeyBackslash => "KeyBackslash",
            State::KeyProtected => "KeyProtected",
            State::KeyUnicode => "KeyUnicode",
            State::StrAsKey => "StrAsKey",
            State::NumSign => "NumSign",
            State::NumZero => "NumZero",
            State::NumNonzero => "NumNonzero",
            State::NumLeadDigit => "NumLeadDigit",
            State::NumPoint => "NumPoint",
            State::NumFracDigit => "NumFracDigit",
            State::NumExp => "NumExp",
            State::NumExpSign => "NumExpSign",
            State::NumExpDigit => "NumExpDigit",
            State::ValTrue => "ValTrue",
            State::ValFalse => "ValFalse",
            State::ValNull => "ValNull",
            State::ValInObj => "ValInObj",
            State::ValInArr => "ValInArr",
            State::Done => "Done",
        }
    }
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Outcome of feeding one chunk to [`JsonParser::push`].
#[derive(Debug, PartialEq, Eq)]
pub enum ParseProgress {
    /// All bytes in the chunk were consumed; the document is not complete.
    NeedMore,
    /// The document completed after consuming `consumed` bytes of the
    /// chunk; any bytes past that were not looked at.
    Done { consumed: usize },
}

/// Retained JSON parser state, fed chunks via [`JsonParser::push`].
///
/// Safe to drop and recreate between documents, or reset via
/// [`JsonParser::reset`] for reuse.
#[derive(Debug)]
pub struct JsonParser {
    state: State,
    /// Index of the token currently being built, or `NONE` before the
    /// document starts.
    current: i32,
    /// Indices of ancestor tokens to return to as each child closes.
    stack: Vec<i32>,
    line: usize,
    column: usize,
    pos: i64,
    /// Shared counter for the fixed-length tokens: literal keywords and
    /// `\uXXXX` escapes.
    literal_counter: usize,
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonParser {
    /// Creates a parser positioned before any document.
    pub fn new() -> Self {
        JsonParser {
            state: State::ObjNone,
            current: NONE,
            stack: Vec::new(),
            line: 1,
            column: 1,
            pos: 0,
            literal_counter: 0,
        }
    }

    /// Resets the parser to its initial state for reuse across documents.
    pub fn reset(&mut self) {
        self.state = State::ObjNone;
        self.current = NONE;
        self.stack.clear();
        self.line = 1;
        self.column = 1;
        self.pos = 0;
        self.literal_counter = 0;
    }

    /// Whether the most recent call completed a document.
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// The absolute byte position the parser has reached.
    pub fn position(&self) -> i64 {
        self.pos
    }

    /// Feeds one chunk of bytes. May be called repeatedly with successive
    /// chunks of the same document, passing the same `(self, tree)` pair.
    pub fn push(
        &mut self,
        tree: &mut TokenTree,
        chunk: &[u8],
    ) -> Result<ParseProgress, JsonError> {
        for (i, &byte) in chunk.iter().enumerate() {
            self.step(tree, byte)?;
            self.pos += 1;
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            if self.state == State::Done {
                return Ok(ParseProgress::Done { consumed: i + 1 });
            }
        }
        Ok(ParseProgress::NeedMore)
    }

    fn unexpected(&self, byte: u8) -> JsonError {
        JsonError::UnexpectedCharacter {
            line: self.line,
            column: self.column,
            byte,
            state: self.state.name(),
        }
    }

    /// Allocates a new token as a child of `self.current`, pushing the old
    /// current onto the ancestor stack.
    fn open_value(&mut self, tree: &mut TokenTree, kind: TokenKind, startpos: i64) -> i32 {
        let idx = tree.open(self.current, kind, startpos);
        self.stack.push(self.current);
        self.current = idx;
        idx
    }

    /// Closes `self.current`, popping back through any enclosing `Key`
    /// tokens (a key always has exactly one child: its value).
    fn finish_token(&mut self, tree: &mut TokenTree, endpos: i64) {
        tree.set_endpos(self.current, endpos);
        self.current = self.stack.pop().unwrap_or(NONE);
        while self.current != NONE && tree.get(self.current).kind == TokenKind::Key {
            self.current = self.stack.pop().unwrap_or(NONE);
        }
    }

    /// The state to resume in once `self.current` again points at a
    /// container (or `NONE`, meaning the document is complete).
    fn state_after_close(&self, tree: &TokenTree) -> State {
        if self.current == NONE {
            State::Done
        } else {
            match tree.get(self.current).kind {
                TokenKind::Object => State::ValInObj,
                TokenKind::Array => State::ValInArr,
                _ => unreachable!("current after unwinding keys must be a container or root"),
            }
        }
    }

    /// Dispatches a byte while waiting between a closed value and its
    /// container's `,`/`}`/`]`. Shared by the main per-byte loop (for
    /// `ValInObj`/`ValInArr`) and by number/literal termination, which must
    /// re-dispatch their terminating byte through the same logic.
    fn handle_waiting(
        &mut self,
        tree: &mut TokenTree,
        waiting: State,
        byte: u8,
    ) -> Result<(), JsonError> {
        match (waiting, byte) {
            (State::ValInObj, b) if is_ws(b) => self.state = State::ValInObj,
            (State::ValInObj, b',') => self.state = State::ObjComma,
            (State::ValInObj, b'}') => {
                self.finish_token(tree, self.pos);
                self.state = self.state_after_close(tree);
            }
            (State::ValInArr, b) if is_ws(b) => self.state = State::ValInArr,
            (State::ValInArr, b',') => self.state = State::ArrComma,
            (State::ValInArr, b']') => {
                self.finish_token(tree, self.pos);
                self.state = self.state_after_close(tree);
            }
            _ => return Err(self.unexpected(byte)),
        }
        Ok(())
    }

    /// Closes a number or literal value whose end was only detectable by
    /// seeing the following (non-consumed-by-it) byte, then re-dispatches
    /// that byte. This is where the spec's "double-close" falls out
    /// naturally: if `byte` is `}`/`]`, `handle_waiting` both resumes the
    /// enclosing container's state *and* closes it with this same byte.
    fn terminate_number(&mut self, tree: &mut TokenTree, byte: u8) -> Result<(), JsonError> {
        self.finish_token(tree, self.pos - 1);
        let waiting = self.state_after_close(tree);
        self.handle_waiting(tree, waiting, byte)
    }

    /// Opens whatever value kind `byte` introduces, as a child of
    /// `self.current` (a `Key` or an `Array`).
    fn begin_value(&mut self, tree: &mut TokenTree, byte: u8) -> Result<(), JsonError> {
        match byte {
            b'"' => {
                self.open_value(tree, TokenKind::String, self.pos + 1);
                self.state = State::StrOpen;
            }
            b'{' => {
                self.open_value(tree, TokenKind::Object, self.pos);
                self.state = State::ObjOpen;
            }
            b'[' => {
                self.open_value(tree, TokenKind::Array, self.pos);
                self.state = State::ArrOpen;
            }
            b'-' => {
                self.open_value(tree, TokenKind::Number, self.pos);
                self.state = State::NumSign;
            }
            b'0' => {
                self.open_value(tree, TokenKind::Number, self.pos);
                self.state = State::NumZero;
            }
            b'1'..=b'9' => {
                self.open_value(tree, TokenKind::Number, self.pos);
                self.state = State::NumNonzero;
            }
            b't' => {
                self.open_value(tree, TokenKind::Boolean, self.pos);
                self.literal_counter = 1;
                self.state = State::ValTrue;
            }
            b'f' => {
                self.open_value(tree, TokenKind::Boolean, self.pos);
                self.literal_counter = 1;
                self.state = State::ValFalse;
            }
            b'n' => {
                self.open_value(tree, TokenKind::Null, self.pos);
                self.literal_counter = 1;
                self.state = State::ValNull;
            }
            _ => return Err(self.unexpected(byte)),
        }
        Ok(())
    }

    fn step_literal(
        &mut self,
        tree: &mut TokenTree,
        byte: u8,
        literal: &'static [u8],
        expect_name: &'static str,
    ) -> Result<(), JsonError> {
        if literal[self.literal_counter] != byte {
            return Err(JsonError::InvalidLiteral {
                line: self.line,
                column: self.column,
                expected: expect_name,
            });
        }
        self.literal_counter += 1;
        if self.literal_counter == literal.len() {
            self.finish_token(tree, self.pos);
            self.state = self.state_after_close(tree);
        }
        Ok(())
    }

    fn step(&mut self, tree: &mut TokenTree, byte: u8) -> Result<(), JsonError> {
        match self.state {
            State::ObjNone => {
                if is_ws(byte) {
                    // stay
                } else if byte == b'{' {
                    self.open_value(tree, TokenKind::Object, self.pos);
                    self.state = State::ObjOpen;
                } else {
                    return Err(JsonError::RootNotObject);
                }
            }

            State::ObjOpen => {
                if is_ws(byte) {
                } else if byte == b'"' {
                    self.open_value(tree, TokenKind::Key, self.pos + 1);
                    self.state = State::KeyOpen;
                } else if byte == b'}' {
                    self.finish_token(tree, self.pos);
                    self.state = self.state_after_close(tree);
                } else {
                    return Err(self.unexpected(byte));
                }
            }

            State::ObjComma => {
                if is_ws(byte) {
                } else if byte == b'"' {
                    self.open_value(tree, TokenKind::Key, self.pos + 1);
                    self.state = State::KeyOpen;
                } else {
                    return Err(self.unexpected(byte));
                }
            }

            State::ObjColon => {
                if is_ws(byte) {
                } else {
                    self.begin_value(tree, byte)?;
                }
            }

            State::ArrOpen => {
                if is_ws(byte) {
                } else if byte == b']' {
                    self.finish_token(tree, self.pos);
                    self.state = self.state_after_close(tree);
                } else {
                    self.begin_value(tree, byte)?;
                }
            }

            State::ArrComma => {
                if is_ws(byte) {
                } else {
                    self.begin_value(tree, byte)?;
                }
            }

            // STRING-as-value family.
            State::StrOpen | State::StrChar | State::StrProtected => {
                if byte == b'"' {
                    self.finish_token(tree, self.pos - 1);
                    self.state = self.state_after_close(tree);
                } else if byte < 0x20 {
                    return Err(JsonError::ControlCharacterInString {
                        line: self.line,
                        column: self.column,
                    });
                } else if byte == b'\\' {
                    self.state = State::StrBackslash;
                } else {
                    self.state = State::StrChar;
                }
            }
            State::StrBackslash => match byte {
                b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => {
                    self.state = State::StrProtected;
                }
                b'u' => {
                    self.literal_counter = 0;
                    self.state = State::StrUnicode;
                }
                _ => return Err(self.unexpected(byte)),
            },
            State::StrUnicode => {
                if byte.is_ascii_hexdigit() {
                    self.literal_counter += 1;
                    if self.literal_counter == 4 {
                        self.state = State::StrChar;
                    }
                } else {
                    return Err(JsonError::InvalidUnicodeEscape {
                        line: self.line,
                        column: self.column,
                    });
                }
            }

            // KEY family: identical scanning, but closing returns to
            // StrAsKey rather than closing the token.
            State::KeyOpen | State::KeyChar | State::KeyProtected => {
                if byte == b'"' {
                    tree.set_endpos(self.current, self.pos - 1);
                    self.state = State::StrAsKey;
                } else if byte < 0x20 {
                    return Err(JsonError::ControlCharacterInString {
                        line: self.line,
                        column: self.column,
                    });
                } else if byte == b'\\' {
                    self.state = State::KeyBackslash;
                } else {
                    self.state = State::KeyChar;
                }
            }
            State::KeyBackslash => match byte {
                b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => {
                    self.state = State::KeyProtected;
                }
                b'u' => {
                    self.literal_counter = 0;
                    self.state = State::KeyUnicode;
                }
                _ => return Err(self.unexpected(byte)),
            },
            State::KeyUnicode => {
                if byte.is_ascii_hexdigit() {
                    self.literal_counter += 1;
                    if self.literal_counter == 4 {
                        self.state = State::KeyChar;
                    }
                } else {
                    return Err(JsonError::InvalidUnicodeEscape {
                        line: self.line,
                        column: self.column,
                    });
                }
            }

            State::StrAsKey => {
                if is_ws(byte) {
                } else if byte == b':' {
                    self.state = State::ObjColon;
                } else {
                    return Err(self.unexpected(byte));
                }
            }

            // NUMBER family.
            State::NumSign => {
                if byte == b'0' {
                    self.state = State::NumZero;
                } else if byte.is_ascii_digit() {
                    self.state = State::NumNonzero;
                } else {
                    return Err(self.unexpected(byte));
                }
            }
            State::NumZero => match byte {
                b'.' => self.state = State::NumPoint,
                b'e' | b'E' => self.state = State::NumExp,
                _ => self.terminate_number(tree, byte)?,
            },
            State::NumNonzero => match byte {
                b'.' => self.state = State::NumPoint,
                b'e' | b'E' => self.state = State::NumExp,
                b if b.is_ascii_digit() => self.state = State::NumLeadDigit,
                _ => self.terminate_number(tree, byte)?,
            },
            State::NumLeadDigit => match byte {
                b'.' => self.state = State::NumPoint,
                b'e' | b'E' => self.state = State::NumExp,
                b if b.is_ascii_digit() => {}
                _ => self.terminate_number(tree, byte)?,
            },
            State::NumPoint => {
                if byte.is_ascii_digit() {
                    self.state = State::NumFracDigit;
                } else {
                    return Err(self.unexpected(byte));
                }
            }
            State::NumFracDigit => match byte {
                b'e' | b'E' => self.state = State::NumExp,
                b if b.is_ascii_digit() => {}
                _ => self.terminate_number(tree, byte)?,
            },
            State::NumExp => {
                if byte == b'+' || byte == b'-' {
                    self.state = State::NumExpSign;
                } else if byte.is_ascii_digit() {
                    self.state = State::NumExpDigit;
                } else {
                    return Err(self.unexpected(byte));
                }
            }
            State::NumExpSign => {
                if byte.is_ascii_digit() {
                    self.state = State::NumExpDigit;
                } else {
                    return Err(self.unexpected(byte));
                }
            }
            // Digits loop on themselves and close on whitespace/`,`/`]`/`}`,
            // per the documented grammar — not the source's fallthrough bug.
            State::NumExpDigit => {
                if byte.is_ascii_digit() {
                    // stay
                } else {
                    self.terminate_number(tree, byte)?;
                }
            }

            State::ValTrue => self.step_literal(tree, byte, LITERAL_TRUE, "true")?,
            State::ValFalse => self.step_literal(tree, byte, LITERAL_FALSE, "false")?,
            State::ValNull => self.step_literal(tree, byte, LITERAL_NULL, "null")?,

            State::ValInObj | State::ValInArr => {
                let waiting = self.state;
                self.handle_waiting(tree, waiting, byte)?;
            }

            State::Done => {
                // Trailing bytes past the completed document are not our
                // concern; callers stop feeding once `is_done()` is true.
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::token::TokenKind;

    fn parse_all(input: &[u8]) -> (JsonParser, TokenTree) {
        let mut parser = JsonParser::new();
        let mut tree = TokenTree::new();
        let progress = parser.push(&mut tree, input).expect("parse failed");
        assert!(matches!(progress, ParseProgress::Done { .. }));
        (parser, tree)
    }

    #[test]
    fn empty_object() {
        let (_, tree) = parse_all(b"{}");
        assert_eq!(tree.len(), 1);
        let root = tree.get(0);
        assert_eq!(root.kind, TokenKind::Object);
        assert_eq!(root.startpos, 0);
        assert_eq!(root.endpos, 1);
        assert_eq!(root.nchild, 0);
    }

    #[test]
    fn nested_document() {
        let input = br#"{"a":[1,2.5e-3,true,null]}"#;
        let (_, tree) = parse_all(input);

        let root = tree.get(0);
        assert_eq!(root.kind, TokenKind::Object);
        assert_eq!((root.startpos, root.endpos), (0, 25));
        assert_eq!(root.nchild, 1);

        let key = tree.get(root.firstchild);
        assert_eq!(key.kind, TokenKind::Key);
        assert_eq!((key.startpos, key.endpos), (2, 2));
        assert_eq!(key.nchild, 1);

        let arr = tree.get(key.firstchild);
        assert_eq!(arr.kind, TokenKind::Array);
        assert_eq!((arr.startpos, arr.endpos), (5, 24));
        assert_eq!(arr.nchild, 4);

        let mut kids = tree.children(key.firstchild);
        let (_, num1) = kids.next().unwrap();
        assert_eq!(num1.kind, TokenKind::Number);
        assert_eq!((num1.startpos, num1.endpos), (6, 6));

        let (_, num2) = kids.next().unwrap();
        assert_eq!(num2.kind, TokenKind::Number);
        assert_eq!((num2.startpos, num2.endpos), (8, 13));

        let (_, boolean) = kids.next().unwrap();
        assert_eq!(boolean.kind, TokenKind::Boolean);
        assert_eq!((boolean.startpos, boolean.endpos), (15, 18));

        let (_, null) = kids.next().unwrap();
        assert_eq!(null.kind, TokenKind::Null);
        assert_eq!((null.startpos, null.endpos), (20, 23));
        assert!(kids.next().is_none());
    }

    #[test]
    fn chunked_at_every_boundary_matches_whole() {
        let input = br#"{"k":"abc"}"#;
        for split in 1..input.len() {
            let mut parser = JsonParser::new();
            let mut tree = TokenTree::new();
            let first = parser.push(&mut tree, &input[..split]).unwrap();
            assert_eq!(first, ParseProgress::NeedMore, "split={split}");
            let second = parser.push(&mut tree, &input[split..]).unwrap();
            assert!(matches!(second, ParseProgress::Done { .. }), "split={split}");

            let root = tree.get(0);
            assert_eq!(root.kind, TokenKind::Object);
            assert_eq!((root.startpos, root.endpos), (0, (input.len() - 1) as i64));
        }
    }

    #[test]
    fn zero_length_string_and_key() {
        let (_, tree) = parse_all(br#"{"":""}"#);
        let key = tree.get(tree.get(0).firstchild);
        assert_eq!(key.endpos, key.startpos - 1);
        let value = tree.get(key.firstchild);
        assert_eq!(value.kind, TokenKind::String);
        assert_eq!(value.endpos, value.startpos - 1);
    }

    #[test]
    fn rejects_non_object_root() {
        let mut parser = JsonParser::new();
        let mut tree = TokenTree::new();
        let err = parser.push(&mut tree, b"[1,2]").unwrap_err();
        assert!(matches!(err, JsonError::RootNotObject));
    }

    #[test]
    fn rejects_control_character_in_string() {
        let mut parser = JsonParser::new();
        let mut tree = TokenTree::new();
        let err = parser.push(&mut tree, b"{\"a\":\"\x01\"}").unwrap_err();
        assert!(matches!(err, JsonError::ControlCharacterInString { .. }));
    }

    #[test]
    fn rejects_bad_unicode_escape() {
        let mut parser = JsonParser::new();
        let mut tree = TokenTree::new();
        let err = parser.push(&mut tree, b"{\"a\":\"\\uZZZZ\"}").unwrap_err();
        assert!(matches!(err, JsonError::InvalidUnicodeEscape { .. }));
    }

    #[test]
    fn rejects_leading_zero_followed_by_digit() {
        let mut parser = JsonParser::new();
        let mut tree = TokenTree::new();
        let err = parser.push(&mut tree, b"{\"a\":01}").unwrap_err();
        assert!(matches!(err, JsonError::UnexpectedCharacter { .. }));
    }

    #[test]
    fn double_close_at_nested_object_end() {
        let (_, tree) = parse_all(br#"{"a":{"b":{"c":1}}}"#);
        let obj1 = tree.get(0);
        let key_a = tree.get(obj1.firstchild);
        let obj2 = tree.get(key_a.firstchild);
        let key_b = tree.get(obj2.firstchild);
        let obj3 = tree.get(key_b.firstchild);
        let key_c = tree.get(obj3.firstchild);
        let num = tree.get(key_c.firstchild);
        assert_eq!(num.kind, TokenKind::Number);
        assert_eq!(num.startpos, num.endpos); // single digit "1"
        assert_eq!(obj3.endpos, num.endpos + 1); // the same '}' closes obj3
    }

    #[test]
    fn utf8_bytes_in_strings_pass_through_unvalidated() {
        // U+00B5, U+221E, U+10083 encoded as raw UTF-8 bytes; the parser
        // does not validate UTF-8, only rejects ASCII control bytes.
        let input = "{\"a\":\"\u{00B5}\u{221E}\u{10083}\"}".as_bytes();
        let (_, tree) = parse_all(input);
        assert_eq!(tree.get(0).kind, TokenKind::Object);
    }

    #[test]
    fn duplicate_keys_permitted() {
        let (_, tree) = parse_all(br#"{"a":1,"a":2}"#);
        assert_eq!(tree.get(0).nchild, 2);
    }
}
