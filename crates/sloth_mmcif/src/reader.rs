//! Grammar reader and parse entry points.
//!
//! The reader consumes a token stream in a single pass and assembles
//! container, blocks, categories and items. Categories outside an optional
//! [`CategorySelection`] are consumed without being stored.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::iter::Peekable;
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use futures::io::{AsyncRead, AsyncReadExt};
use indexmap::IndexSet;
use log::{debug, info, trace};

use crate::block::Block;
use crate::category::{normalize_category_name, Category};
use crate::container::{Container, Origin};
use crate::error::{Error, Result};
use crate::item::Item;
use crate::source::SourceText;
use crate::token::{Position, Span, Token, TokenKind};
use crate::tokenizer::{tokenize, Tokenizer};

/// Names of the categories to keep during a parse.
///
/// Names match exactly; a leading underscore is added when missing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategorySelection {
    names: IndexSet<String>,
}

impl CategorySelection {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().collect()
    }

    pub fn contains(&self, category: &str) -> bool {
        if category.starts_with('_') {
            self.names.contains(category)
        } else {
            self.names.contains(&format!("_{category}"))
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CategorySelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|name| normalize_category_name(name.into()))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ParserOptions {
    /// Keep only these categories. `None` keeps everything.
    pub categories: Option<CategorySelection>,
    /// Store values as spans into the resident or memory-mapped source text
    /// and decode them on first access. Only applies to entry points that
    /// hold the whole text in memory or map it.
    pub deferred: bool,
}

impl ParserOptions {
    pub fn with_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(names.into_iter().collect());
        self
    }

    pub fn with_deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }
}

/// Assemble a container from a token stream. Values are stored owned.
pub fn read<I>(tokens: I, selection: Option<&CategorySelection>) -> Result<Container>
where
    I: Iterator<Item = Result<Token>>,
{
    Reader::new(tokens, selection, None).run()
}

pub fn parse_str(input: &str) -> Result<Container> {
    parse_str_with_options(input, &ParserOptions::default())
}

pub fn parse_str_with_options(input: &str, options: &ParserOptions) -> Result<Container> {
    if options.deferred {
        return parse_shared(Arc::from(input), options);
    }
    read(tokenize(input), options.categories.as_ref())
}

/// Parse text that stays resident for the lifetime of the container.
///
/// With [`ParserOptions::deferred`] set, items keep byte ranges into
/// `source` and only decode them when first read.
pub fn parse_shared(source: Arc<str>, options: &ParserOptions) -> Result<Container> {
    parse_source(SourceText::from(source), options)
}

fn parse_source(source: SourceText, options: &ParserOptions) -> Result<Container> {
    let deferred = options.deferred.then(|| source.clone());
    let tokens = Tokenizer::new(source.bytes());
    Reader::new(tokens, options.categories.as_ref(), deferred).run()
}

/// Parse from a buffered stream, one line at a time.
pub fn parse_reader<R: BufRead>(reader: R, options: &ParserOptions) -> Result<Container> {
    read(Tokenizer::new(reader), options.categories.as_ref())
}

pub fn parse_file(path: impl AsRef<Path>) -> Result<Container> {
    parse_file_with_options(path, &ParserOptions::default())
}

/// Parse a file, decompressing it first when the extension is `.gz`.
///
/// A deferred parse of an uncompressed file maps it into memory and keeps
/// the mapping alive for as long as any deferred item refers to it.
pub fn parse_file_with_options(path: impl AsRef<Path>, options: &ParserOptions) -> Result<Container> {
    let path = path.as_ref();
    info!("reading mmCIF file {}", path.display());
    let file = File::open(path).map_err(|err| Error::from(err).with_path(path))?;
    let gzip = is_gzip(path);
    if options.deferred && !gzip {
        debug!("mapping {} for deferred values", path.display());
        let source = SourceText::map_file(&file).map_err(|err| Error::from(err).with_path(path))?;
        return parse_source(source, options).map_err(|err| err.with_path(path));
    }
    let reader: Box<dyn Read> = if gzip {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let mut reader = BufReader::new(reader);
    let parsed = if options.deferred {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(|err| Error::from(err).with_path(path))?;
        parse_shared(Arc::from(text), options)
    } else {
        parse_reader(reader, options)
    };
    parsed.map_err(|err| err.with_path(path))
}

pub async fn parse_async_reader<R>(mut reader: R, options: &ParserOptions) -> Result<Container>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    let text = String::from_utf8(buf)?;
    if options.deferred {
        parse_shared(Arc::from(text), options)
    } else {
        parse_str_with_options(&text, options)
    }
}

pub(crate) fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"))
}

/// Values of one column while a category is being read.
enum Column {
    Owned(Vec<String>),
    Spans(Vec<Span>),
}

impl Column {
    fn new(deferred: bool) -> Self {
        if deferred {
            Column::Spans(Vec::new())
        } else {
            Column::Owned(Vec::new())
        }
    }

    fn push(&mut self, token: Token) {
        match self {
            Column::Owned(values) => values.extend(token.into_value()),
            Column::Spans(spans) => spans.push(token.span),
        }
    }

    fn into_item(self, name: String, source: Option<&SourceText>) -> Item {
        match (self, source) {
            (Column::Spans(spans), Some(source)) => Item::from_source(name, source.clone(), spans),
            (Column::Owned(values), _) => Item::new(name, values),
            // Spans are only collected when a source is present.
            (Column::Spans(_), None) => Item::new(name, Vec::new()),
        }
    }
}

struct Reader<'o, I: Iterator<Item = Result<Token>>> {
    tokens: Peekable<I>,
    selection: Option<&'o CategorySelection>,
    source: Option<SourceText>,
    container: Container,
    block: Option<Block>,
    /// Categories of the open block that were read from a `loop_`.
    looped: HashSet<String>,
    skipped: usize,
}

impl<'o, I: Iterator<Item = Result<Token>>> Reader<'o, I> {
    fn new(tokens: I, selection: Option<&'o CategorySelection>, source: Option<SourceText>) -> Self {
        Self {
            tokens: tokens.peekable(),
            selection,
            source,
            container: Container::with_origin(Origin::Parsed),
            block: None,
            looped: HashSet::new(),
            skipped: 0,
        }
    }

    fn run(mut self) -> Result<Container> {
        while let Some(token) = self.next_token()? {
            let position = token.position;
            match token.kind {
                TokenKind::DataBlock(name) => self.open_block(name, position)?,
                TokenKind::Loop => self.read_loop(position)?,
                TokenKind::Tag { category, item } => self.read_pair(category, item, position)?,
                TokenKind::Value(_) | TokenKind::TextField(_) => {
                    self.require_block("value", position)?;
                    return Err(Error::syntax("value without a preceding tag", position));
                }
                TokenKind::Reserved(word) => {
                    return Err(Error::syntax(
                        format!("reserved word '{word}' is not supported in data files"),
                        position,
                    ));
                }
                TokenKind::Comment(_) => {}
            }
        }
        self.close_block()?;
        debug!(
            "parsed {} block(s), {} categories, skipped {} unselected",
            self.container.len(),
            self.container.blocks().map(Block::len).sum::<usize>(),
            self.skipped
        );
        Ok(self.container)
    }

    /// Next token that is not a comment.
    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            match self.tokens.next().transpose()? {
                Some(Token {
                    kind: TokenKind::Comment(_),
                    ..
                }) => continue,
                other => return Ok(other),
            }
        }
    }

    /// Kind of the next non-comment token. Errors are left in the stream.
    fn peek(&mut self) -> Option<&TokenKind> {
        while let Some(Ok(Token {
            kind: TokenKind::Comment(_),
            ..
        })) = self.tokens.peek()
        {
            self.tokens.next();
        }
        match self.tokens.peek() {
            Some(Ok(token)) => Some(&token.kind),
            _ => None,
        }
    }

    fn require_block(&self, what: &str, position: Position) -> Result<()> {
        if self.block.is_some() {
            Ok(())
        } else {
            Err(Error::syntax(
                format!("{what} outside of a data block"),
                position,
            ))
        }
    }

    fn is_selected(&self, category: &str) -> bool {
        self.selection
            .map_or(true, |selection| selection.contains(category))
    }

    fn skip(&mut self, category: &str) {
        trace!("skipping unselected category {category}");
        self.skipped += 1;
    }

    fn open_block(&mut self, name: String, position: Position) -> Result<()> {
        self.close_block()?;
        if self.container.get_block(&name).is_some() {
            return Err(Error::structural(
                format!("duplicate data block 'data_{name}'"),
                position,
            ));
        }
        self.block = Some(Block::new(name));
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        if let Some(block) = self.block.take() {
            self.looped.clear();
            self.container.insert_block(block)?;
        }
        Ok(())
    }

    fn read_pair(&mut self, category: String, item: String, position: Position) -> Result<()> {
        self.require_block("tag", position)?;
        let has_value = self.peek().is_some_and(TokenKind::is_value);
        let value = if has_value { self.next_token()? } else { None };
        let Some(value) = value else {
            // Surface a pending tokenizer error before reporting the tag.
            self.next_token()?;
            return Err(Error::syntax(
                format!("tag '{category}.{item}' has no value"),
                position,
            ));
        };
        if !self.is_selected(&category) {
            self.skip(&category);
            return Ok(());
        }
        if self.looped.contains(&category) {
            return Err(Error::structural(
                format!("category '{category}' is already defined by a loop"),
                position,
            ));
        }
        let source = self.source.as_ref();
        let Some(block) = self.block.as_mut() else {
            return Ok(());
        };
        let target = block.category_or_insert(&category)?;
        if target.contains(&item) {
            return Err(Error::structural(
                format!("duplicate item '{category}.{item}'"),
                position,
            ));
        }
        let mut column = Column::new(source.is_some());
        column.push(value);
        target.insert_item_unchecked(column.into_item(item, source));
        Ok(())
    }

    fn read_loop(&mut self, position: Position) -> Result<()> {
        self.require_block("loop_", position)?;
        let mut tags = Vec::new();
        while matches!(self.peek(), Some(TokenKind::Tag { .. })) {
            if let Some(Token {
                kind: TokenKind::Tag { category, item },
                position,
                ..
            }) = self.next_token()?
            {
                tags.push((category, item, position));
            }
        }
        let Some((category, _, _)) = tags.first() else {
            self.next_token()?;
            return Err(Error::syntax("loop_ without tags", position));
        };
        let category = category.clone();
        let selected = self.is_selected(&category);

        if selected {
            self.check_loop_header(&category, &tags)?;
        }

        let deferred = self.source.is_some();
        let mut columns: Vec<Column> = tags.iter().map(|_| Column::new(deferred)).collect();
        let mut count = 0usize;
        while self.peek().is_some_and(TokenKind::is_value) {
            let Some(token) = self.next_token()? else {
                break;
            };
            if selected {
                columns[count % tags.len()].push(token);
            }
            count += 1;
        }

        if !selected {
            self.skip(&category);
            return Ok(());
        }
        if count % tags.len() != 0 {
            return Err(Error::structural(
                format!(
                    "loop for '{category}' has {count} values, which is not a multiple of {} columns",
                    tags.len()
                ),
                position,
            ));
        }

        let mut target = Category::new(category.clone());
        for ((_, item, _), column) in tags.into_iter().zip(columns) {
            target.insert_item_unchecked(column.into_item(item, self.source.as_ref()));
        }
        if let Some(block) = self.block.as_mut() {
            block.insert_category(target)?;
        }
        self.looped.insert(category);
        Ok(())
    }

    fn check_loop_header(&self, category: &str, tags: &[(String, String, Position)]) -> Result<()> {
        if self
            .block
            .as_ref()
            .is_some_and(|block| block.contains(category))
        {
            return Err(Error::structural(
                format!("category '{category}' is already defined"),
                tags[0].2,
            ));
        }
        let mut seen = HashSet::new();
        for (other, item, position) in tags {
            if other != category {
                return Err(Error::structural(
                    format!("loop mixes categories '{category}' and '{other}'"),
                    *position,
                ));
            }
            if !seen.insert(item.as_str()) {
                return Err(Error::structural(
                    format!("duplicate item '{category}.{item}'"),
                    *position,
                ));
            }
        }
        Ok(())
    }
}
