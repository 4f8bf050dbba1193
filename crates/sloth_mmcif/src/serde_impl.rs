//! Order-preserving serde support.
//!
//! A container maps to nested maps: block name → category name → item name
//! → list of values. Deserializing re-checks names and column lengths and
//! yields a container with [`Origin::Built`].

use std::result;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::block::Block;
use crate::category::Category;
use crate::container::{Container, Origin};

type Document = IndexMap<String, IndexMap<String, IndexMap<String, Vec<String>>>>;

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for item in self {
            map.serialize_entry(item.name(), item.values())?;
        }
        map.end()
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for category in self {
            map.serialize_entry(category.name(), category)?;
        }
        map.end()
    }
}

impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for block in self {
            map.serialize_entry(block.name(), block)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Container {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> result::Result<Self, D::Error> {
        let document = Document::deserialize(deserializer)?;
        let mut container = Container::with_origin(Origin::Built);
        for (block_name, categories) in document {
            let mut block = Block::new(block_name);
            for (category_name, items) in categories {
                let mut category = Category::new(category_name);
                for (item_name, values) in items {
                    category
                        .set_item(item_name, values)
                        .map_err(D::Error::custom)?;
                }
                block.insert_category(category).map_err(D::Error::custom)?;
            }
            container.insert_block(block).map_err(D::Error::custom)?;
        }
        Ok(container)
    }
}
