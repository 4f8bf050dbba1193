//! Serializer for containers.
//!
//! Output is checked in full before the first byte is written: column
//! lengths through [`Container::verify`], then every block, category and
//! item name and every value through the same formatting rules used while
//! writing. Each value is formatted once and the result reused for layout.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};

use crate::block::Block;
use crate::category::{check_block_name, check_category_name, check_item_name, Category};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::reader::is_gzip;
use crate::tokenizer::has_prefix_ignore_case;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterOptions {
    /// Pad pair tags so their values line up.
    pub align_pairs: bool,
    /// Pad loop values into columns.
    pub align_loops: bool,
    /// Emit a `#` line after the block header and after each category.
    pub separators: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            align_pairs: true,
            align_loops: true,
            separators: true,
        }
    }
}

pub fn write(container: &Container) -> Result<String> {
    write_with_options(container, &WriterOptions::default())
}

pub fn write_with_options(container: &Container, options: &WriterOptions) -> Result<String> {
    let mut buf = Vec::new();
    write_to(&mut buf, container, options)?;
    Ok(String::from_utf8(buf)?)
}

/// Serialize `container` into `out`. Nothing is written if the container
/// cannot be represented.
pub fn write_to<W: Write>(mut out: W, container: &Container, options: &WriterOptions) -> Result<()> {
    container.verify()?;
    let blocks = container
        .blocks()
        .map(prepare_block)
        .collect::<Result<Vec<_>>>()?;
    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            out.write_all(b"\n")?;
        }
        write_block(&mut out, block, options)?;
    }
    out.flush()?;
    debug!(
        "wrote {} block(s), {} categories",
        container.len(),
        container.blocks().map(Block::len).sum::<usize>()
    );
    Ok(())
}

/// Write to a file, gzip-compressed when the extension is `.gz`.
pub fn write_file(path: impl AsRef<Path>, container: &Container, options: &WriterOptions) -> Result<()> {
    let path = path.as_ref();
    info!("writing mmCIF file {}", path.display());
    let attach = |err: Error| err.with_path(path);
    let file = File::create(path).map_err(|err| attach(err.into()))?;
    let out = BufWriter::new(file);
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(out, Compression::default());
        write_to(&mut encoder, container, options).map_err(attach)?;
        encoder
            .finish()
            .and_then(|mut inner| inner.flush())
            .map_err(|err| attach(err.into()))
    } else {
        write_to(out, container, options).map_err(attach)
    }
}

/// How a single value appears in the output.
#[derive(Debug, PartialEq, Eq)]
enum Formatted<'a> {
    Bare(&'a str),
    Quoted(char, &'a str),
    TextField(&'a str),
}

impl Formatted<'_> {
    fn width(&self) -> usize {
        match self {
            Formatted::Bare(text) => text.chars().count(),
            Formatted::Quoted(_, text) => text.chars().count() + 2,
            Formatted::TextField(_) => 0,
        }
    }

    fn write_inline<W: Write>(&self, out: &mut W) -> Result<()> {
        match self {
            Formatted::Bare(text) => out.write_all(text.as_bytes())?,
            Formatted::Quoted(quote, text) => write!(out, "{quote}{text}{quote}")?,
            Formatted::TextField(text) => write_text_field(out, text)?,
        }
        Ok(())
    }
}

/// A block whose names are checked and whose values are formatted.
struct PreparedBlock<'a> {
    name: &'a str,
    categories: Vec<PreparedCategory<'a>>,
}

struct PreparedCategory<'a> {
    category: &'a Category,
    /// Formatted values, one vector per item.
    columns: Vec<Vec<Formatted<'a>>>,
}

fn prepare_block(block: &Block) -> Result<PreparedBlock<'_>> {
    check_block_name(block.name())?;
    let categories = block
        .categories()
        .filter(|category| !category.is_empty())
        .map(prepare_category)
        .collect::<Result<Vec<_>>>()?;
    Ok(PreparedBlock {
        name: block.name(),
        categories,
    })
}

fn prepare_category(category: &Category) -> Result<PreparedCategory<'_>> {
    check_category_name(category.name())?;
    let columns = category
        .items()
        .map(|item| {
            check_item_name(category.name(), item.name())?;
            item.values()
                .iter()
                .map(String::as_str)
                .map(format_value)
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PreparedCategory { category, columns })
}

const RESERVED_LEADING: &[char] = &['_', '#', '$', '\'', '"', ';', '[', ']'];

fn format_value(value: &str) -> Result<Formatted<'_>> {
    if value.contains('\n') {
        return text_field(value);
    }
    if value.is_empty() {
        return Ok(Formatted::Quoted('\'', value));
    }
    if value == "?" || value == "." || !needs_quotes(value) {
        return Ok(Formatted::Bare(value));
    }
    if !value.contains('\'') {
        Ok(Formatted::Quoted('\'', value))
    } else if !value.contains('"') {
        Ok(Formatted::Quoted('"', value))
    } else {
        text_field(value)
    }
}

/// A value that can only be written as a `;` text field.
fn text_field(value: &str) -> Result<Formatted<'_>> {
    if value.split('\n').skip(1).any(|line| line.starts_with(';')) {
        return Err(Error::invalid_state(format!(
            "value {value:?} has a line starting with ';' and cannot be written"
        )));
    }
    // The reader drops a CR that precedes the closing line break.
    if value.ends_with('\r') {
        return Err(Error::invalid_state(format!(
            "value {value:?} ends with a carriage return and cannot be written as a text field"
        )));
    }
    Ok(Formatted::TextField(value))
}

fn needs_quotes(value: &str) -> bool {
    value.starts_with(RESERVED_LEADING)
        || value.chars().any(|c| matches!(c, ' ' | '\t' | '\r'))
        || has_prefix_ignore_case(value, "data_")
        || has_prefix_ignore_case(value, "save_")
        || ["loop_", "global_", "stop_"]
            .iter()
            .any(|word| value.eq_ignore_ascii_case(word))
}

fn write_block<W: Write>(out: &mut W, block: &PreparedBlock<'_>, options: &WriterOptions) -> Result<()> {
    writeln!(out, "data_{}", block.name)?;
    if options.separators {
        out.write_all(b"#\n")?;
    }
    for prepared in &block.categories {
        if prepared.category.row_count() == 1 {
            write_pairs(out, prepared, options)?;
        } else {
            write_loop(out, prepared, options)?;
        }
        if options.separators {
            out.write_all(b"#\n")?;
        }
    }
    Ok(())
}

fn write_pairs<W: Write>(out: &mut W, prepared: &PreparedCategory<'_>, options: &WriterOptions) -> Result<()> {
    let category = prepared.category;
    let width = if options.align_pairs {
        category.item_names().map(str::len).max().unwrap_or(0)
    } else {
        0
    };
    for (name, column) in category.item_names().zip(&prepared.columns) {
        write!(out, "{}.{name}", category.name())?;
        match column.first() {
            Some(Formatted::TextField(text)) => {
                out.write_all(b"\n")?;
                write_text_field(out, text)?;
            }
            Some(inline) => {
                write!(out, "{:pad$} ", "", pad = width.saturating_sub(name.len()))?;
                inline.write_inline(out)?;
                out.write_all(b"\n")?;
            }
            None => writeln!(out, " ?")?,
        }
    }
    Ok(())
}

fn write_loop<W: Write>(out: &mut W, prepared: &PreparedCategory<'_>, options: &WriterOptions) -> Result<()> {
    let category = prepared.category;
    out.write_all(b"loop_\n")?;
    for name in category.item_names() {
        writeln!(out, "{}.{name}", category.name())?;
    }
    let widths: Vec<usize> = if options.align_loops {
        prepared
            .columns
            .iter()
            .map(|column| column.iter().map(Formatted::width).max().unwrap_or(0))
            .collect()
    } else {
        vec![0; prepared.columns.len()]
    };

    for row in 0..category.row_count() {
        let mut line_open = false;
        let mut pad = 0;
        for (column, width) in prepared.columns.iter().zip(&widths) {
            let formatted = &column[row];
            if let Formatted::TextField(text) = formatted {
                if line_open {
                    out.write_all(b"\n")?;
                    line_open = false;
                }
                write_text_field(out, text)?;
                continue;
            }
            if line_open {
                write!(out, "{:pad$} ", "")?;
            }
            formatted.write_inline(out)?;
            pad = width.saturating_sub(formatted.width());
            line_open = true;
        }
        if line_open {
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn write_text_field<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    write!(out, ";{text}\n;\n")
}
