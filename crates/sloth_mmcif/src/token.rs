use std::fmt;

/// Location of a token in the input stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in bytes.
    pub column: usize,
    /// Byte offset from the start of the stream.
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Byte range of a token's content (quotes and text-field markers excluded).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `data_<name>`; holds the name without the prefix.
    DataBlock(String),
    Loop,
    /// `_category.item`; the category keeps its leading underscore.
    Tag { category: String, item: String },
    /// Bare or quoted single-line value.
    Value(String),
    /// `;`-delimited multi-line value.
    TextField(String),
    Comment(String),
    /// `save_`, `global_` and `stop_` words, which mmCIF data files do not use.
    Reserved(String),
}

impl TokenKind {
    pub fn is_value(&self) -> bool {
        matches!(self, TokenKind::Value(_) | TokenKind::TextField(_))
    }

    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::DataBlock(_) => "data block header",
            TokenKind::Loop => "loop_",
            TokenKind::Tag { .. } => "tag",
            TokenKind::Value(_) => "value",
            TokenKind::TextField(_) => "text field",
            TokenKind::Comment(_) => "comment",
            TokenKind::Reserved(_) => "reserved word",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub position: Position,
}

impl Token {
    /// Consume the token, returning the text of a value or text field.
    pub fn into_value(self) -> Option<String> {
        match self.kind {
            TokenKind::Value(text) | TokenKind::TextField(text) => Some(text),
            _ => None,
        }
    }
}
