use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::source::SourceText;
use crate::token::Span;

/// A named column of values inside a category.
///
/// Values are either owned strings or spans into shared or memory-mapped
/// source text that are decoded the first time they are read and cached
/// afterwards.
#[derive(Clone)]
pub struct Item {
    name: String,
    storage: Storage,
}

#[derive(Clone)]
enum Storage {
    Owned(Vec<String>),
    Deferred(Deferred),
}

#[derive(Clone)]
struct Deferred {
    source: SourceText,
    spans: Vec<Span>,
    loaded: OnceCell<Vec<String>>,
}

impl Deferred {
    fn load(&self) -> &[String] {
        self.loaded.get_or_init(|| {
            self.spans
                .iter()
                .map(|&span| self.source.decode(span))
                .collect()
        })
    }
}

impl Item {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            storage: Storage::Owned(values),
        }
    }

    /// An item backed by byte ranges of `source`.
    ///
    /// Every span must lie on character boundaries of `source`.
    pub fn deferred(name: impl Into<String>, source: Arc<str>, spans: Vec<Span>) -> Self {
        Self::from_source(name, SourceText::from(source), spans)
    }

    pub(crate) fn from_source(name: impl Into<String>, source: SourceText, spans: Vec<Span>) -> Self {
        Self {
            name: name.into(),
            storage: Storage::Deferred(Deferred {
                source,
                spans,
                loaded: OnceCell::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values; never forces materialization.
    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Owned(values) => values.len(),
            Storage::Deferred(deferred) => deferred.spans.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> &[String] {
        match &self.storage {
            Storage::Owned(values) => values,
            Storage::Deferred(deferred) => deferred.load(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values().get(index).map(String::as_str)
    }

    /// Whether reading the values would not require decoding.
    pub fn is_loaded(&self) -> bool {
        match &self.storage {
            Storage::Owned(_) => true,
            Storage::Deferred(deferred) => deferred.loaded.get().is_some(),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.storage, Storage::Deferred(_))
    }

    /// Mutable, length-preserving access. Deferred storage becomes owned.
    pub fn values_mut(&mut self) -> &mut [String] {
        self.make_owned()
    }

    pub(crate) fn push(&mut self, value: String) {
        self.make_owned().push(value);
    }

    pub fn into_values(self) -> Vec<String> {
        match self.storage {
            Storage::Owned(values) => values,
            Storage::Deferred(deferred) => {
                deferred.load();
                deferred.loaded.into_inner().unwrap_or_default()
            }
        }
    }

    /// Drop decoded values of deferred storage; the spans are kept.
    pub fn clear_cache(&mut self) {
        if let Storage::Deferred(deferred) = &mut self.storage {
            deferred.loaded = OnceCell::new();
        }
    }

    fn make_owned(&mut self) -> &mut Vec<String> {
        if let Storage::Deferred(deferred) = &mut self.storage {
            deferred.load();
            let values = deferred.loaded.take().unwrap_or_default();
            self.storage = Storage::Owned(values);
        }
        match &mut self.storage {
            Storage::Owned(values) => values,
            Storage::Deferred(_) => unreachable!("storage converted to owned above"),
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.values() == other.values()
    }
}
