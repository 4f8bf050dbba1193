//! Row views over a category.
//!
//! Rows hold a borrow of their category plus an index and own no storage.
//! Because mutating a category needs `&mut`, no row view can outlive a
//! change of the row count.

use std::borrow::Cow;
use std::iter::FusedIterator;
use std::ops::Index;

use indexmap::IndexMap;

use crate::category::Category;
use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    category: &'a Category,
    index: usize,
}

impl<'a> Row<'a> {
    pub(crate) fn new(category: &'a Category, index: usize) -> Self {
        Self { category, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn category(&self) -> &'a Category {
        self.category
    }

    /// Value of `item` in this row.
    pub fn get(&self, item: &str) -> Result<&'a str> {
        let values = self.category.values(item)?;
        values.get(self.index).map(String::as_str).ok_or_else(|| {
            Error::invalid_state(format!(
                "item '{}.{item}' has no value at row {}",
                self.category.name(),
                self.index
            ))
        })
    }

    pub fn value(&self, item: &str) -> Option<&'a str> {
        self.category
            .get(item)
            .and_then(|values| values.get(self.index))
            .map(String::as_str)
    }

    /// The first item's value, or the row index for an item-less category.
    pub fn name(&self) -> Cow<'a, str> {
        match self.category.item_at(0).and_then(|item| item.get(self.index)) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(self.index.to_string()),
        }
    }

    /// `(item name, value)` pairs in item order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let index = self.index;
        self.category
            .items()
            .filter_map(move |item| item.get(index).map(|value| (item.name(), value)))
    }

    pub fn to_map(&self) -> IndexMap<&'a str, &'a str> {
        self.iter().collect()
    }
}

impl Index<&str> for Row<'_> {
    type Output = str;

    fn index(&self, item: &str) -> &str {
        match self.value(item) {
            Some(value) => value,
            None => panic!(
                "item '{item}' not found in category '{}'",
                self.category.name()
            ),
        }
    }
}

/// Mutable view of one row.
#[derive(Debug)]
pub struct RowMut<'a> {
    category: &'a mut Category,
    index: usize,
}

impl<'a> RowMut<'a> {
    pub(crate) fn new(category: &'a mut Category, index: usize) -> Self {
        Self { category, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, item: &str) -> Result<&str> {
        Row::new(&*self.category, self.index).get(item)
    }

    /// Replace the value of `item` in this row.
    pub fn set(&mut self, item: &str, value: impl Into<String>) -> Result<&mut Self> {
        self.category.values_mut(item)?[self.index] = value.into();
        Ok(self)
    }
}

/// Lazy sequence of rows over an index range.
#[derive(Clone, Debug)]
pub struct Rows<'a> {
    category: &'a Category,
    front: usize,
    back: usize,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(category: &'a Category, start: usize, end: usize) -> Self {
        Self {
            category,
            front: start,
            back: end,
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let row = Row::new(self.category, self.front);
        self.front += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for Rows<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        Some(Row::new(self.category, self.back))
    }
}

impl ExactSizeIterator for Rows<'_> {}

impl FusedIterator for Rows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn coordinates() -> Category {
        let mut category = Category::new("_coord");
        category
            .set_item("x", vec!["1".into(), "2".into()])
            .unwrap();
        category
            .set_item("y", vec!["10".into(), "20".into()])
            .unwrap();
        category
    }

    #[test]
    fn keyed_and_indexing_access_agree() {
        let category = coordinates();
        let row = category.row(1).unwrap();
        assert_eq!(row.get("y").unwrap(), "20");
        assert_eq!(&row["y"], "20");
        assert_eq!(row.value("y"), Some("20"));
        assert_eq!(category["x"][0], category.row(0).unwrap()["x"]);
    }

    #[test]
    fn row_name_and_map() {
        let category = coordinates();
        let row = category.row(0).unwrap();
        assert_eq!(row.name(), "1");
        let map = row.to_map();
        assert_eq!(map.get("x"), Some(&"1"));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(Category::new("_empty").rows().count(), 0);
    }

    #[test]
    fn missing_item_in_row() {
        let category = coordinates();
        let err = category.row(0).unwrap().get("z").expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn row_mut_writes_through() {
        let mut category = coordinates();
        category.row_mut(-1).unwrap().set("x", "99").unwrap();
        assert_eq!(category["x"], ["1", "99"]);
        assert_eq!(category.row_count(), 2);
    }

    #[test]
    fn rows_iterate_in_both_directions() {
        let category = coordinates();
        let forward: Vec<usize> = category.rows().map(|row| row.index()).collect();
        let backward: Vec<usize> = category.rows().rev().map(|row| row.index()).collect();
        assert_eq!(forward, vec![0, 1]);
        assert_eq!(backward, vec![1, 0]);
        assert_eq!(category.rows().len(), 2);
    }
}
