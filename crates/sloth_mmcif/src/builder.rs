//! Builder mode: the only place where missing blocks, categories and items
//! are created on access.
//!
//! ```
//! use sloth_mmcif::{ContainerBuilder, Origin};
//!
//! let mut builder = ContainerBuilder::new();
//! builder.block("1ABC")?.tag("_entry.id", "1ABC")?;
//! builder
//!     .block("1ABC")?
//!     .category("_atom_site")?
//!     .columns(["id", "type_symbol"])?
//!     .row(["1", "N"])?
//!     .row(["2", "C"])?;
//! let container = builder.finish()?;
//! assert_eq!(container.origin(), Origin::Built);
//! assert_eq!(container.lookup("1ABC", "_atom_site.type_symbol")?, ["N", "C"]);
//! # Ok::<(), sloth_mmcif::Error>(())
//! ```

use crate::block::{split_tag, Block};
use crate::category::{check_item_name, Category};
use crate::container::{Container, Origin};
use crate::error::Result;

#[derive(Debug)]
pub struct ContainerBuilder {
    container: Container,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            container: Container::with_origin(Origin::Built),
        }
    }

    pub(crate) fn from_container(container: Container) -> Self {
        Self { container }
    }

    /// The block named `name`, created at the end if missing.
    ///
    /// Fails with `InvalidState` if the name is empty or contains whitespace.
    pub fn block(&mut self, name: &str) -> Result<BlockBuilder<'_>> {
        Ok(BlockBuilder {
            block: self.container.block_or_insert(name)?,
        })
    }

    /// Read access to what has been built so far.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Check column lengths and hand over the container.
    pub fn finish(mut self) -> Result<Container> {
        self.container.verify()?;
        self.container.set_origin(Origin::Built);
        Ok(self.container)
    }
}

#[derive(Debug)]
pub struct BlockBuilder<'a> {
    block: &'a mut Block,
}

impl BlockBuilder<'_> {
    /// The category named `name`, created if missing. The leading `_` is
    /// optional.
    pub fn category(&mut self, name: &str) -> Result<CategoryBuilder<'_>> {
        Ok(CategoryBuilder {
            category: self.block.category_or_insert(name)?,
        })
    }

    /// Set a single-row value addressed by a full tag. Nothing is created
    /// when the tag holds an invalid name.
    pub fn tag(&mut self, tag: &str, value: impl Into<String>) -> Result<&mut Self> {
        let (category, item) = split_tag(tag)?;
        check_item_name(category, item)?;
        self.block
            .category_or_insert(category)?
            .set_item(item, vec![value.into()])?;
        Ok(self)
    }
}

#[derive(Debug)]
pub struct CategoryBuilder<'a> {
    category: &'a mut Category,
}

impl CategoryBuilder<'_> {
    /// Set a whole column. Its length must match existing columns.
    pub fn item<I, S>(&mut self, name: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.category.set_item(name, values)?;
        Ok(self)
    }

    /// Set a single-row item.
    pub fn value(&mut self, name: &str, value: impl Into<String>) -> Result<&mut Self> {
        self.category.set_item(name, vec![value.into()])?;
        Ok(self)
    }

    /// Declare empty columns for the items not present yet.
    pub fn columns<I, S>(&mut self, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.category.contains(&name) {
                self.category.set_item(name, Vec::new())?;
            }
        }
        Ok(self)
    }

    /// Append a row given in column order.
    pub fn row<I, S>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category.push_row(values)?;
        Ok(self)
    }
}
