// In-memory recipe source

use super::{RawRecipe, RecipeSource, SourceError, SourceResult};
use std::cell::RefCell;
use std::collections::HashMap;

/// Map-backed source. Counts fetches per package so callers can check
/// memoization.
#[derive(Debug, Default)]
pub struct MemorySource {
    recipes: HashMap<String, RawRecipe>,
    fetches: RefCell<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipe from its PKGBUILD text
    pub fn with_recipe(mut self, package: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(package, RawRecipe::from_text(text));
        self
    }

    /// Add a package that is part of another package
    pub fn with_alias(mut self, package: impl Into<String>, target: impl Into<String>) -> Self {
        let package = package.into();
        let target = target.into();
        let raw = RawRecipe::from_text(format!("{} is part of package {}\n", package, target));
        self.insert(package, raw);
        self
    }

    pub fn with_raw(mut self, package: impl Into<String>, raw: RawRecipe) -> Self {
        self.insert(package, raw);
        self
    }

    pub fn insert(&mut self, package: impl Into<String>, raw: RawRecipe) {
        self.recipes.insert(package.into(), raw);
    }

    /// How often `package` was fetched
    pub fn fetch_count(&self, package: &str) -> usize {
        self.fetches.borrow().get(package).copied().unwrap_or(0)
    }
}

impl RecipeSource for MemorySource {
    fn fetch(&self, package: &str) -> SourceResult<RawRecipe> {
        *self
            .fetches
            .borrow_mut()
            .entry(package.to_string())
            .or_insert(0) += 1;

        self.recipes
            .get(package)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(package.to_string()))
    }
}
