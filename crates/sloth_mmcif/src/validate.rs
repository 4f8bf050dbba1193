//! Registry of externally supplied category checks.
//!
//! The crate implements no validation rules. It only stores callbacks keyed
//! by category name (or an ordered pair of names) and invokes them on
//! request. Looking up an unregistered key is a no-op.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::category::Category;
use crate::error::{Error, ErrorKind, Result};

pub type CategoryCheck = Box<dyn Fn(&Category) -> Result<(), String> + Send + Sync>;
pub type CrossCheck = Box<dyn Fn(&Category, &Category) -> Result<(), String> + Send + Sync>;

/// Outcome of invoking the registry for a category or pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Validation {
    Passed,
    /// Nothing was registered for the key, so nothing ran.
    Unregistered,
}

#[derive(Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, CategoryCheck>,
    cross_checkers: HashMap<(String, String), CrossCheck>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_validator<F>(&mut self, category: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(&Category) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.insert(category.into(), Box::new(check));
        self
    }

    pub fn register_cross_checker<F>(
        &mut self,
        pair: (impl Into<String>, impl Into<String>),
        check: F,
    ) -> &mut Self
    where
        F: Fn(&Category, &Category) -> Result<(), String> + Send + Sync + 'static,
    {
        self.cross_checkers
            .insert((pair.0.into(), pair.1.into()), Box::new(check));
        self
    }

    pub fn has_validator(&self, category: &str) -> bool {
        self.validators.contains_key(category)
    }

    pub fn has_cross_checker(&self, first: &str, second: &str) -> bool {
        self.cross_checkers
            .contains_key(&(first.to_string(), second.to_string()))
    }

    /// Run the validator registered for `category.name()`.
    pub fn validate(&self, category: &Category) -> Result<Validation> {
        let Some(check) = self.validators.get(category.name()) else {
            return Ok(Validation::Unregistered);
        };
        debug!("validating category {}", category.name());
        check(category).map_err(|reason| {
            Error::new(
                ErrorKind::Validation,
                format!("category '{}' failed validation: {reason}", category.name()),
            )
        })?;
        Ok(Validation::Passed)
    }

    /// Run the cross-checker registered for `(first, second)`, in that order.
    pub fn cross_check(&self, first: &Category, second: &Category) -> Result<Validation> {
        let key = (first.name().to_string(), second.name().to_string());
        let Some(check) = self.cross_checkers.get(&key) else {
            return Ok(Validation::Unregistered);
        };
        debug!("cross-checking {} against {}", first.name(), second.name());
        check(first, second).map_err(|reason| {
            Error::new(
                ErrorKind::Validation,
                format!(
                    "categories '{}' and '{}' failed cross-check: {reason}",
                    first.name(),
                    second.name()
                ),
            )
        })?;
        Ok(Validation::Passed)
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field(
                "cross_checkers",
                &self.cross_checkers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
