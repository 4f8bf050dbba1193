use std::ops::Index;

use indexmap::IndexMap;

use crate::block::Block;
use crate::builder::ContainerBuilder;
use crate::category::check_block_name;
use crate::error::{Error, Result};
use crate::tokenizer::has_prefix_ignore_case;

/// How a container came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Produced by the reader. Lookups never create missing levels.
    Parsed,
    /// Produced by [`ContainerBuilder::finish`].
    Built,
}

/// Top-level document: an ordered collection of data blocks.
#[derive(Clone, Debug)]
pub struct Container {
    blocks: IndexMap<String, Block>,
    origin: Origin,
}

impl Container {
    pub(crate) fn with_origin(origin: Origin) -> Self {
        Self {
            blocks: IndexMap::new(),
            origin,
        }
    }

    /// An empty container to be filled through [`ContainerBuilder`].
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.blocks.keys().map(String::as_str)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks.values()
    }

    pub fn first_block(&self) -> Option<&Block> {
        self.blocks.values().next()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Look up a block by the name after its `data_` header.
    pub fn block(&self, name: &str) -> Result<&Block> {
        self.get_block(name)
            .ok_or_else(|| Error::not_found("block", name))
    }

    pub fn get_block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    /// Look up a block by its full header, e.g. `data_1ABC`.
    pub fn block_by_header(&self, header: &str) -> Result<&Block> {
        if !has_prefix_ignore_case(header, "data_") {
            return Err(Error::not_found("block header", header));
        }
        self.block(&header[5..])
    }

    pub fn block_mut(&mut self, name: &str) -> Result<&mut Block> {
        self.blocks
            .get_mut(name)
            .ok_or_else(|| Error::not_found("block", name))
    }

    pub fn get_block_mut(&mut self, name: &str) -> Option<&mut Block> {
        self.blocks.get_mut(name)
    }

    /// Insert or replace a block, keeping the position of a replaced one.
    ///
    /// Fails with `InvalidState` if the name is empty or contains whitespace.
    pub fn insert_block(&mut self, block: Block) -> Result<Option<Block>> {
        check_block_name(block.name())?;
        Ok(self.blocks.insert(block.name().to_string(), block))
    }

    pub fn remove_block(&mut self, name: &str) -> Option<Block> {
        self.blocks.shift_remove(name)
    }

    pub(crate) fn block_or_insert(&mut self, name: &str) -> Result<&mut Block> {
        check_block_name(name)?;
        Ok(self
            .blocks
            .entry(name.to_string())
            .or_insert_with_key(|key| Block::new(key.clone())))
    }

    /// Values for `tag` in `block`, e.g. `lookup("1ABC", "_entry.id")`.
    pub fn lookup(&self, block: &str, tag: &str) -> Result<&[String]> {
        self.block(block)?.tag(tag)
    }

    /// Re-enter builder mode, where missing levels are created on access.
    pub fn into_builder(self) -> ContainerBuilder {
        ContainerBuilder::from_container(self)
    }

    /// Check column lengths of every category.
    pub fn verify(&self) -> Result<()> {
        self.blocks.values().try_for_each(Block::verify)
    }

    pub fn clear_caches(&mut self) {
        self.blocks.values_mut().for_each(Block::clear_caches);
    }

    pub(crate) fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }
}

// Provenance is not part of the document.
impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Index<&str> for Container {
    type Output = Block;

    fn index(&self, name: &str) -> &Block {
        match self.get_block(name) {
            Some(block) => block,
            None => panic!("block '{name}' not found"),
        }
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = &'a Block;
    type IntoIter = indexmap::map::Values<'a, String, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::Category;
    use pretty_assertions::assert_eq;

    fn container() -> Container {
        let mut container = Container::with_origin(Origin::Parsed);
        let mut block = Block::new("1ABC");
        let mut entry = Category::new("_entry");
        entry.set_item("id", vec!["1ABC".into()]).unwrap();
        block.insert_category(entry).unwrap();
        container.insert_block(block).unwrap();
        container
    }

    #[test]
    fn block_lookup_by_name_or_header() {
        let container = container();
        assert_eq!(container.block("1ABC").unwrap().name(), "1ABC");
        assert_eq!(container.block_by_header("data_1ABC").unwrap().name(), "1ABC");
        assert_eq!(container.block_by_header("DATA_1ABC").unwrap().name(), "1ABC");
        assert!(container.block("data_1ABC").is_err());
        assert!(container.block_by_header("1ABC").is_err());
        assert!(container.contains("1ABC"));
        assert_eq!(container.lookup("1ABC", "_entry.id").unwrap(), ["1ABC"]);
        assert_eq!(container["1ABC"]["_entry"]["id"], ["1ABC"]);
    }

    #[test]
    fn missing_block_is_not_found_and_not_created() {
        let container = container();
        let err = container.block("2XYZ").expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "block '2XYZ' not found");
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn equality_ignores_origin() {
        let parsed = container();
        let mut built = parsed.clone();
        built.set_origin(Origin::Built);
        assert_eq!(parsed, built);
        assert_eq!(built.origin(), Origin::Built);
    }

    #[test]
    fn remove_block_keeps_order_of_the_rest() {
        let mut container = container();
        container.insert_block(Block::new("2XYZ")).unwrap();
        container.insert_block(Block::new("3DEF")).unwrap();
        assert!(container.remove_block("2XYZ").is_some());
        let names: Vec<&str> = container.block_names().collect();
        assert_eq!(names, vec!["1ABC", "3DEF"]);
    }

    #[test]
    fn prefixed_names_are_distinct_blocks() {
        let mut container = container();
        container.insert_block(Block::new("data_1ABC")).unwrap();
        assert_eq!(container.block_names().collect::<Vec<_>>(), vec!["1ABC", "data_1ABC"]);
        assert_eq!(container.block_by_header("data_data_1ABC").unwrap().name(), "data_1ABC");
    }

    #[test]
    fn invalid_block_names_are_rejected() {
        let mut container = container();
        for name in ["", "my block", "tab\there"] {
            let err = container.insert_block(Block::new(name)).expect_err(name);
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }
        assert_eq!(container.len(), 1);
    }
}
