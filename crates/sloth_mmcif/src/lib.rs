#![deny(unsafe_code)]
//! Reader, in-memory model and writer for mmCIF data files.
//!
//! Parsing yields a [`Container`] of [`Block`]s, each holding ordered
//! [`Category`] tables of [`Item`] columns. Values stay opaque text;
//! `?` and `.` are kept verbatim.
//!
//! ```
//! let container = sloth_mmcif::parse_str(
//!     "data_1ABC\n_entry.id 1ABC\nloop_\n_atom_site.id\n_atom_site.type_symbol\n1 N\n2 C\n",
//! )?;
//! let atoms = container.block("1ABC")?.category("_atom_site")?;
//! assert_eq!(atoms.row(0)?.get("type_symbol")?, "N");
//! assert_eq!(container.lookup("1ABC", "_entry.id")?, ["1ABC"]);
//! assert_eq!(container.block_by_header("data_1ABC")?.name(), "1ABC");
//! # Ok::<(), sloth_mmcif::Error>(())
//! ```

pub mod block;
pub mod builder;
pub mod category;
pub mod container;
pub mod error;
pub mod item;
pub mod reader;
pub mod row;
#[cfg(feature = "serde")]
mod serde_impl;
mod source;
pub mod token;
pub mod tokenizer;
pub mod validate;
pub mod writer;

pub use block::Block;
pub use builder::{BlockBuilder, CategoryBuilder, ContainerBuilder};
pub use category::Category;
pub use container::{Container, Origin};
pub use error::{Error, ErrorKind, Result};
pub use item::Item;
pub use reader::{
    parse_async_reader, parse_file, parse_file_with_options, parse_reader, parse_shared,
    parse_str, parse_str_with_options, read, CategorySelection, ParserOptions,
};
pub use row::{Row, RowMut, Rows};
pub use token::{Position, Span, Token, TokenKind};
pub use tokenizer::{tokenize, Tokenizer};
pub use validate::{Validation, ValidatorRegistry};
pub use writer::{write, write_file, write_to, write_with_options, WriterOptions};
