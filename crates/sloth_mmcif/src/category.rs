use std::ops::{Bound, Index, RangeBounds};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::item::Item;
use crate::row::{Row, RowMut, Rows};
use crate::tokenizer::is_separator;

/// A named group of items: either a single-row key/value group or a
/// `loop_` table. All items hold the same number of values.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    name: String,
    items: IndexMap<String, Item>,
}

impl Category {
    /// Create an empty category. The name keeps its leading underscore,
    /// one is added if missing.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: normalize_category_name(name.into()),
            items: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of items (columns).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.items.values().next().map_or(0, Item::len)
    }

    pub fn item_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.keys().map(String::as_str)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.values()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.contains_key(item)
    }

    pub fn item(&self, name: &str) -> Result<&Item> {
        self.items
            .get(name)
            .ok_or_else(|| Error::not_found("item", &format!("{}.{name}", self.name)))
    }

    pub fn get_item(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    pub(crate) fn item_at(&self, index: usize) -> Option<&Item> {
        self.items.get_index(index).map(|(_, item)| item)
    }

    /// All values of an item, materializing deferred storage on first use.
    pub fn values(&self, name: &str) -> Result<&[String]> {
        self.item(name).map(Item::values)
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.items.get(name).map(Item::values)
    }

    /// Length-preserving mutable access to an item's values.
    pub fn values_mut(&mut self, name: &str) -> Result<&mut [String]> {
        let category = &self.name;
        self.items
            .get_mut(name)
            .map(Item::values_mut)
            .ok_or_else(|| Error::not_found("item", &format!("{category}.{name}")))
    }

    pub fn is_loaded(&self, name: &str) -> Result<bool> {
        self.item(name).map(Item::is_loaded)
    }

    /// Replace (or add) an item's values, returning the previous values.
    ///
    /// Fails with `InvalidState` if the name is empty or contains whitespace,
    /// or if sibling items exist and hold a different number of values.
    /// Replacing the only item may change the row count.
    pub fn set_item(
        &mut self,
        name: impl Into<String>,
        values: Vec<String>,
    ) -> Result<Option<Vec<String>>> {
        let name = name.into();
        check_item_name(&self.name, &name)?;
        let sibling_rows = self
            .items
            .iter()
            .find(|(key, _)| **key != name)
            .map(|(_, item)| item.len());
        if let Some(rows) = sibling_rows {
            if rows != values.len() {
                return Err(Error::invalid_state(format!(
                    "item '{}.{name}' has {} values but the category has {rows} rows",
                    self.name,
                    values.len()
                )));
            }
        }
        let previous = self.items.insert(name.clone(), Item::new(name, values));
        Ok(previous.map(Item::into_values))
    }

    /// Set one value; negative indices count from the end.
    pub fn set_value(&mut self, item: &str, index: isize, value: impl Into<String>) -> Result<()> {
        let rows = self.row_count();
        let position = resolve_index(index, rows).ok_or_else(|| out_of_range(index, rows))?;
        self.values_mut(item)?[position] = value.into();
        Ok(())
    }

    /// Insert a fully formed item, checking its length like [`set_item`].
    ///
    /// [`set_item`]: Category::set_item
    pub fn insert_item(&mut self, item: Item) -> Result<Option<Item>> {
        check_item_name(&self.name, item.name())?;
        let sibling_rows = self
            .items
            .iter()
            .find(|(key, _)| key.as_str() != item.name())
            .map(|(_, sibling)| sibling.len());
        if let Some(rows) = sibling_rows {
            if rows != item.len() {
                return Err(Error::invalid_state(format!(
                    "item '{}.{}' has {} values but the category has {rows} rows",
                    self.name,
                    item.name(),
                    item.len()
                )));
            }
        }
        Ok(self.items.insert(item.name().to_string(), item))
    }

    /// Insert without name or length checks.
    pub(crate) fn insert_item_unchecked(&mut self, item: Item) {
        self.items.insert(item.name().to_string(), item);
    }

    pub fn remove_item(&mut self, name: &str) -> Option<Item> {
        self.items.shift_remove(name)
    }

    /// Append one row given in item order.
    pub fn push_row<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.len() != self.items.len() {
            return Err(Error::invalid_state(format!(
                "row for '{}' has {} values but the category has {} items",
                self.name,
                values.len(),
                self.items.len()
            )));
        }
        for (item, value) in self.items.values_mut().zip(values) {
            item.push(value);
        }
        Ok(())
    }

    pub fn row(&self, index: isize) -> Result<Row<'_>> {
        let rows = self.row_count();
        resolve_index(index, rows)
            .map(|position| Row::new(self, position))
            .ok_or_else(|| out_of_range(index, rows))
    }

    pub fn row_mut(&mut self, index: isize) -> Result<RowMut<'_>> {
        let rows = self.row_count();
        let position = resolve_index(index, rows).ok_or_else(|| out_of_range(index, rows))?;
        Ok(RowMut::new(self, position))
    }

    pub fn rows(&self) -> Rows<'_> {
        Rows::new(self, 0, self.row_count())
    }

    /// Rows selected by a range of possibly negative indices, clamped to the
    /// row count the way sequence slicing does. Use `step_by` for strides.
    pub fn slice<R: RangeBounds<isize>>(&self, range: R) -> Rows<'_> {
        let rows = self.row_count();
        let start = match range.start_bound() {
            Bound::Included(&start) => clamp_index(start, rows),
            Bound::Excluded(&start) => clamp_index(start.saturating_add(1), rows),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            // -1 names the last row, so its exclusive end is the row count.
            Bound::Included(&-1) => rows,
            Bound::Included(&end) => clamp_index(end.saturating_add(1), rows),
            Bound::Excluded(&end) => clamp_index(end, rows),
            Bound::Unbounded => rows,
        };
        Rows::new(self, start, end.max(start))
    }

    /// Item values in item order, forcing deferred storage to load.
    pub fn to_map(&self) -> IndexMap<&str, &[String]> {
        self.items
            .iter()
            .map(|(name, item)| (name.as_str(), item.values()))
            .collect()
    }

    /// Check that every item holds the same number of values.
    pub fn verify(&self) -> Result<()> {
        let rows = self.row_count();
        match self.items.values().find(|item| item.len() != rows) {
            Some(item) => Err(Error::invalid_state(format!(
                "item '{}.{}' has {} values but the category has {rows} rows",
                self.name,
                item.name(),
                item.len()
            ))),
            None => Ok(()),
        }
    }

    pub fn clear_caches(&mut self) {
        self.items.values_mut().for_each(Item::clear_cache);
    }
}

impl Index<&str> for Category {
    type Output = [String];

    /// Panics if the item does not exist; see [`Category::values`].
    fn index(&self, name: &str) -> &[String] {
        match self.get(name) {
            Some(values) => values,
            None => panic!("item '{name}' not found in category '{}'", self.name),
        }
    }
}

impl<'a> IntoIterator for &'a Category {
    type Item = &'a Item;
    type IntoIter = indexmap::map::Values<'a, String, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

pub(crate) fn check_block_name(name: &str) -> Result<()> {
    if name.is_empty() || name.bytes().any(is_separator) {
        return Err(Error::invalid_state(format!(
            "block name {name:?} is empty or contains whitespace"
        )));
    }
    Ok(())
}

pub(crate) fn check_category_name(name: &str) -> Result<()> {
    if name.len() < 2 || !name.starts_with('_') || name.contains('.') || name.bytes().any(is_separator)
    {
        return Err(Error::invalid_state(format!(
            "category name {name:?} must be '_' and a name without '.' or whitespace"
        )));
    }
    Ok(())
}

pub(crate) fn check_item_name(category: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.bytes().any(is_separator) {
        return Err(Error::invalid_state(format!(
            "item name {name:?} in '{category}' is empty or contains whitespace"
        )));
    }
    Ok(())
}

pub(crate) fn normalize_category_name(name: String) -> String {
    if name.starts_with('_') {
        name
    } else {
        format!("_{name}")
    }
}

fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    (resolved < len).then_some(resolved)
}

fn clamp_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        (index as usize).min(len)
    }
}

fn out_of_range(index: isize, rows: usize) -> Error {
    Error::new(
        crate::error::ErrorKind::NotFound,
        format!("row index {index} is out of range for {rows} rows"),
    )
}
