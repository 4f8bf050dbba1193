use std::borrow::Cow;
use std::ops::Index;

use indexmap::IndexMap;

use crate::category::{check_category_name, normalize_category_name, Category};
use crate::error::{Error, ErrorKind, Result};
use crate::validate::{Validation, ValidatorRegistry};

/// One `data_<name>` section.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    name: String,
    categories: IndexMap<String, Category>,
}

impl Block {
    /// Create an empty block. `name` is the text after `data_` and is
    /// stored as given.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categories: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.categories.keys().map(String::as_str)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> + '_ {
        self.categories.values()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category_key(category).as_ref())
    }

    /// Look up a category; the leading underscore is optional.
    pub fn category(&self, name: &str) -> Result<&Category> {
        self.get_category(name)
            .ok_or_else(|| Error::not_found("category", &category_key(name)))
    }

    pub fn get_category(&self, name: &str) -> Option<&Category> {
        self.categories.get(category_key(name).as_ref())
    }

    pub fn category_mut(&mut self, name: &str) -> Result<&mut Category> {
        self.categories
            .get_mut(category_key(name).as_ref())
            .ok_or_else(|| Error::not_found("category", &category_key(name)))
    }

    pub fn get_category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.get_mut(category_key(name).as_ref())
    }

    /// Insert or wholesale replace a category, returning the old one
    /// together with its cached values.
    ///
    /// Fails with `InvalidState` if the category name cannot appear in a tag.
    pub fn insert_category(&mut self, category: Category) -> Result<Option<Category>> {
        check_category_name(category.name())?;
        Ok(self
            .categories
            .insert(category.name().to_string(), category))
    }

    pub fn remove_category(&mut self, name: &str) -> Option<Category> {
        self.categories.shift_remove(category_key(name).as_ref())
    }

    pub(crate) fn category_or_insert(&mut self, name: &str) -> Result<&mut Category> {
        let key = normalize_category_name(name.to_string());
        check_category_name(&key)?;
        Ok(self
            .categories
            .entry(key)
            .or_insert_with_key(|key| Category::new(key.clone())))
    }

    /// Values of a full `_category.item` tag.
    pub fn tag(&self, tag: &str) -> Result<&[String]> {
        let (category, item) = split_tag(tag)?;
        self.category(category)?.values(item)
    }

    /// Replace the values of an existing item addressed by tag.
    ///
    /// The category must already exist. Use the builder to create levels.
    pub fn set_tag(&mut self, tag: &str, values: Vec<String>) -> Result<Option<Vec<String>>> {
        let (category, item) = split_tag(tag)?;
        self.category_mut(category)?.set_item(item, values)
    }

    /// Invoke the validator registered for `category`.
    pub fn validate(&self, category: &str, registry: &ValidatorRegistry) -> Result<Validation> {
        registry.validate(self.category(category)?)
    }

    /// Invoke the cross-checker registered for the ordered pair.
    pub fn cross_check(
        &self,
        first: &str,
        second: &str,
        registry: &ValidatorRegistry,
    ) -> Result<Validation> {
        registry.cross_check(self.category(first)?, self.category(second)?)
    }

    /// Validate every category in order, stopping at the first failure.
    pub fn validate_all(&self, registry: &ValidatorRegistry) -> Result<Vec<(&str, Validation)>> {
        self.categories
            .values()
            .map(|category| Ok((category.name(), registry.validate(category)?)))
            .collect()
    }

    pub fn verify(&self) -> Result<()> {
        self.categories.values().try_for_each(Category::verify)
    }

    pub fn clear_caches(&mut self) {
        self.categories
            .values_mut()
            .for_each(Category::clear_caches);
    }
}

impl Index<&str> for Block {
    type Output = Category;

    /// Panics if the category does not exist; see [`Block::category`].
    fn index(&self, name: &str) -> &Category {
        match self.get_category(name) {
            Some(category) => category,
            None => panic!("category '{name}' not found in block '{}'", self.name),
        }
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a Category;
    type IntoIter = indexmap::map::Values<'a, String, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.values()
    }
}

fn category_key(name: &str) -> Cow<'_, str> {
    if name.starts_with('_') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("_{name}"))
    }
}

pub(crate) fn split_tag(tag: &str) -> Result<(&str, &str)> {
    match tag.split_once('.') {
        Some((category, item)) if category.starts_with('_') && !item.is_empty() => {
            Ok((category, item))
        }
        _ => Err(Error::new(
            ErrorKind::Syntax,
            format!("tag '{tag}' is not of the form _category.item"),
        )),
    }
}
