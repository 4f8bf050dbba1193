//! Incremental mmCIF tokenizer.
//!
//! The tokenizer pulls one line at a time from a [`BufRead`], so peak memory
//! tracks the longest line or text field rather than the file size.

use std::io::BufRead;

use crate::error::{Error, Result};
use crate::token::{Position, Span, Token, TokenKind};

pub struct Tokenizer<R> {
    reader: R,
    line: String,
    line_no: usize,
    line_offset: usize,
    pos: usize,
    done: bool,
}

/// Tokenize an in-memory document.
pub fn tokenize(input: &str) -> Tokenizer<&[u8]> {
    Tokenizer::new(input.as_bytes())
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
            line_offset: 0,
            pos: 0,
            done: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            if self.pos >= self.line.len() {
                if !self.advance_line()? {
                    return Ok(None);
                }
                continue;
            }
            let byte = self.line.as_bytes()[self.pos];
            match byte {
                b';' if self.pos == 0 => return self.scan_text_field().map(Some),
                byte if is_separator(byte) => self.pos += 1,
                b'#' => return Ok(Some(self.scan_comment())),
                b'\'' | b'"' => return self.scan_quoted(byte).map(Some),
                _ => return self.scan_bare().map(Some),
            }
        }
    }

    fn advance_line(&mut self) -> Result<bool> {
        self.line_offset += self.line.len();
        self.line.clear();
        self.pos = 0;
        if self.reader.read_line(&mut self.line)? == 0 {
            return Ok(false);
        }
        self.line_no += 1;
        Ok(true)
    }

    fn position_at(&self, column: usize) -> Position {
        Position {
            line: self.line_no,
            column: column + 1,
            offset: self.line_offset + column,
        }
    }

    fn span(&self, start: usize, end: usize) -> Span {
        Span {
            start: self.line_offset + start,
            end: self.line_offset + end,
        }
    }

    fn scan_comment(&mut self) -> Token {
        let start = self.pos;
        let text = self.line[start + 1..]
            .trim_end_matches(['\r', '\n'])
            .to_string();
        let token = Token {
            span: self.span(start + 1, start + 1 + text.len()),
            position: self.position_at(start),
            kind: TokenKind::Comment(text),
        };
        self.pos = self.line.len();
        token
    }

    fn scan_quoted(&mut self, quote: u8) -> Result<Token> {
        let start = self.pos;
        let bytes = self.line.as_bytes();
        let mut index = start + 1;
        loop {
            match bytes.get(index) {
                None | Some(b'\n') => {
                    return Err(Error::syntax(
                        "unterminated quoted value",
                        self.position_at(start),
                    ));
                }
                // A quote only closes the value when whitespace or the end
                // of the line follows it.
                Some(&byte) if byte == quote => {
                    if bytes
                        .get(index + 1)
                        .map_or(true, |&next| is_separator(next))
                    {
                        break;
                    }
                }
                Some(_) => {}
            }
            index += 1;
        }
        let token = Token {
            kind: TokenKind::Value(self.line[start + 1..index].to_string()),
            span: self.span(start + 1, index),
            position: self.position_at(start),
        };
        self.pos = index + 1;
        Ok(token)
    }

    fn scan_bare(&mut self) -> Result<Token> {
        let start = self.pos;
        let bytes = self.line.as_bytes();
        let mut end = start;
        while end < bytes.len() && !is_separator(bytes[end]) {
            end += 1;
        }
        self.pos = end;
        let position = self.position_at(start);
        let kind = classify(&self.line[start..end], position)?;
        Ok(Token {
            kind,
            span: self.span(start, end),
            position,
        })
    }

    fn scan_text_field(&mut self) -> Result<Token> {
        let position = self.position_at(0);
        let content_start = self.line_offset + 1;
        let mut text = self.line[1..].to_string();
        loop {
            if !self.advance_line()? {
                return Err(Error::syntax("unterminated text field", position));
            }
            if self.line.starts_with(';') {
                break;
            }
            text.push_str(&self.line);
        }
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        // Whatever follows the closing ';' on its line is scanned normally.
        self.pos = 1;
        Ok(Token {
            span: Span {
                start: content_start,
                end: content_start + text.len(),
            },
            position,
            kind: TokenKind::TextField(text),
        })
    }
}

impl<R: BufRead> Iterator for Tokenizer<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.next_token().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

fn classify(word: &str, position: Position) -> Result<TokenKind> {
    if word.eq_ignore_ascii_case("loop_") {
        return Ok(TokenKind::Loop);
    }
    if has_prefix_ignore_case(word, "data_") {
        let name = &word[5..];
        if name.is_empty() {
            return Err(Error::syntax("data block header without a name", position));
        }
        return Ok(TokenKind::DataBlock(name.to_string()));
    }
    if has_prefix_ignore_case(word, "save_")
        || word.eq_ignore_ascii_case("global_")
        || word.eq_ignore_ascii_case("stop_")
    {
        return Ok(TokenKind::Reserved(word.to_string()));
    }
    if word.starts_with('_') {
        return match word.split_once('.') {
            Some((category, item)) if category.len() > 1 && !item.is_empty() => {
                Ok(TokenKind::Tag {
                    category: category.to_string(),
                    item: item.to_string(),
                })
            }
            _ => Err(Error::syntax(
                format!("tag '{word}' is not of the form _category.item"),
                position,
            )),
        };
    }
    Ok(TokenKind::Value(word.to_string()))
}

/// Token separators: space, tab, CR and LF.
pub(crate) fn is_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

pub(crate) fn has_prefix_ignore_case(word: &str, prefix: &str) -> bool {
    word.len() >= prefix.len()
        && word.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
