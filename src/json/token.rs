//! JSON token tree (component D): a flat, grow-on-demand arena of tokens
//! linked by small integer indices rather than pointers, so the tree never
//! needs pointer fix-up when it grows.

/// The kind of JSON constituent a [`Token`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Object,
    Array,
    Key,
    String,
    Number,
    Boolean,
    Null,
}

/// Sentinel used for "no such index" in child/sibling links.
pub const NONE: i32 = -1;

/// One parsed JSON constituent.
///
/// `startpos`/`endpos` are absolute byte offsets into the original input,
/// inclusive, with these per-kind contracts:
///
/// - `Object`/`Array`: positions of the opening and closing brace/bracket.
/// - `Key`/`String`: positions of the first and last character *inside* the
///   quotes; a zero-length string has `endpos == startpos - 1`.
/// - `Number`: positions of the first and last digit/sign character.
/// - `Boolean`/`Null`: positions of the first and last letter.
#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub startpos: i64,
    pub endpos: i64,
    pub nchild: u32,
    pub firstchild: i32,
    pub lastchild: i32,
    pub nextsib: i32,
}

impl Token {
    fn new(kind: TokenKind, startpos: i64) -> Self {
        Token {
            kind,
            startpos,
            endpos: -1,
            nchild: 0,
            firstchild: NONE,
            lastchild: NONE,
            nextsib: NONE,
        }
    }
}

/// A flat, indexable array of [`Token`]s produced by one JSON parse.
#[derive(Debug, Default)]
pub struct TokenTree {
    tokens: Vec<Token>,
}

impl TokenTree {
    pub fn new() -> Self {
        TokenTree { tokens: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, idx: i32) -> &Token {
        &self.tokens[idx as usize]
    }

    fn get_mut(&mut self, idx: i32) -> &mut Token {
        &mut self.tokens[idx as usize]
    }

    /// Allocates a new token of `kind` starting at `startpos`, linking it as
    /// the next child of `parent` (or leaving it parentless if
    /// `parent == NONE`, which is only true for the document root). The
    /// array doubles its capacity on demand, same as any growable `Vec`.
    pub fn open(&mut self, parent: i32, kind: TokenKind, startpos: i64) -> i32 {
        let idx = self.tokens.len() as i32;
        self.tokens.push(Token::new(kind, startpos));
        if parent != NONE {
            let parent_tok = self.get_mut(parent);
            parent_tok.nchild += 1;
            if parent_tok.firstchild == NONE {
                parent_tok.firstchild = idx;
            } else {
                let prev_last = parent_tok.lastchild;
                self.get_mut(prev_last).nextsib = idx;
            }
            self.get_mut(parent).lastchild = idx;
        }
        idx
    }

    /// Sets `endpos` on an already-open token without altering its links.
    pub fn set_endpos(&mut self, idx: i32, endpos: i64) {
        self.get_mut(idx).endpos = endpos;
    }

    /// Iterates the children of `idx` in order via the `firstchild`/`nextsib`
    /// chain.
    pub fn children(&self, idx: i32) -> ChildIter<'_> {
        let start = if idx == NONE { NONE } else { self.get(idx).firstchild };
        ChildIter { tree: self, next: start }
    }
}

/// Iterator over a token's children, following `nextsib` links.
pub struct ChildIter<'a> {
    tree: &'a TokenTree,
    next: i32,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = (i32, &'a Token);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NONE {
            return None;
        }
        let idx = self.next;
        let tok = self.tree.get(idx);
        self.next = tok.nextsib;
        Some((idx, tok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_links_siblings_in_order() {
        let mut tree = TokenTree::new();
        let obj = tree.open(NONE, TokenKind::Object, 0);
        let a = tree.open(obj, TokenKind::Key, 2);
        let b = tree.open(obj, TokenKind::Key, 5);
        tree.set_endpos(a, 2);
        tree.set_endpos(b, 5);
        tree.set_endpos(obj, 10);

        assert_eq!(tree.get(obj).nchild, 2);
        let kids: Vec<i32> = tree.children(obj).map(|(idx, _)| idx).collect();
        assert_eq!(kids, vec![a, b]);
    }

    #[test]
    fn childless_token_has_no_iteration() {
        let mut tree = TokenTree::new();
        let obj = tree.open(NONE, TokenKind::Object, 0);
        tree.set_endpos(obj, 1);
        assert_eq!(tree.children(obj).count(), 0);
    }
}
