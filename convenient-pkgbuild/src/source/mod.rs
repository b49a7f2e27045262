//! Recipe sources
//!
//! A [`RecipeSource`] turns a package name into raw PKGBUILD text. Sources are
//! composable: [`CachedSource`] wraps any other source with an on-disk cache.
//!
//! - [`CommandSource`]: runs an external tool (`asp show <name>` by default)
//! - [`CachedSource`]: one `PKGBUILD_<name>` file per package in a directory
//! - [`DirectorySource`]: reads an exported ABS tree (`<root>/<name>/PKGBUILD`)
//! - [`MemorySource`]: in-memory map, mostly for tests

use regex::Regex;
use std::io;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

mod cache;
mod command;
mod directory;
mod memory;

pub use cache::{CacheConfig, CachedSource};
pub use command::{CommandSource, SourceConfig};
pub use directory::DirectorySource;
pub use memory::MemorySource;

static ALIAS_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"is part of package\s*([\w\-]+)").expect("static regex")
});

/// Errors produced while fetching a recipe
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Fetching {package} timed out after {timeout:?}")]
    Timeout { package: String, timeout: Duration },

    #[error("Fetching {package} failed ({status}): {stderr}")]
    Failed {
        package: String,
        status: String,
        stderr: String,
    },

    #[error("No recipe text returned for {0}")]
    Empty(String),

    #[error("No recipe found for {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Raw output of a recipe fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecipe {
    /// Unmodified recipe text
    pub text: String,
    /// Diagnostic output of the fetch (stderr for command sources)
    pub diagnostic: String,
    /// Package this one is part of, if the fetch reported a merge
    pub alias_target: Option<String>,
}

impl RawRecipe {
    /// Build a raw recipe from text, detecting an alias marker in it
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let alias_target = detect_alias(&text);
        Self {
            text,
            diagnostic: String::new(),
            alias_target,
        }
    }
}

/// Something that can produce recipe text for a package name
pub trait RecipeSource {
    fn fetch(&self, package: &str) -> SourceResult<RawRecipe>;
}

impl<S: RecipeSource + ?Sized> RecipeSource for &S {
    fn fetch(&self, package: &str) -> SourceResult<RawRecipe> {
        (**self).fetch(package)
    }
}

impl<S: RecipeSource + ?Sized> RecipeSource for Box<S> {
    fn fetch(&self, package: &str) -> SourceResult<RawRecipe> {
        (**self).fetch(package)
    }
}

/// Find the `... is part of package <name>` marker emitted for split packages.
///
/// Only the first non-empty line is checked: the marker replaces the recipe,
/// so the same words inside PKGBUILD content (a comment, `pkgdesc`) are not
/// a marker.
pub fn detect_alias(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| !line.trim().is_empty())
        .and_then(alias_in_line)
}

/// Find the marker on any line of diagnostic output
pub fn detect_alias_in_diagnostic(diagnostic: &str) -> Option<String> {
    diagnostic.lines().find_map(alias_in_line)
}

fn alias_in_line(line: &str) -> Option<String> {
    ALIAS_MARKER
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_alias() {
        let out = "==> libfoo is part of package foo-suite\n";
        assert_eq!(detect_alias(out).as_deref(), Some("foo-suite"));
        assert_eq!(detect_alias("pkgname=foo\n"), None);
        assert_eq!(detect_alias("\n\nlibfoo is part of package foo\n").as_deref(), Some("foo"));
    }

    #[test]
    fn test_marker_inside_recipe_is_not_alias() {
        let text = "pkgname=foo\n# this split is part of package upstream-suite historically\ndepends=(bar)\n";
        assert_eq!(detect_alias(text), None);
        assert!(RawRecipe::from_text(text).alias_target.is_none());

        let text = "pkgname=foo\npkgdesc=\"Tool that is part of package upstream\"\n";
        assert_eq!(detect_alias(text), None);
    }

    #[test]
    fn test_marker_anywhere_in_diagnostic() {
        let diagnostic = "warning: stale mirror\n==> libfoo is part of package foo-suite\n";
        assert_eq!(detect_alias_in_diagnostic(diagnostic).as_deref(), Some("foo-suite"));
        assert_eq!(detect_alias(diagnostic), None);
    }

    #[test]
    fn test_raw_recipe_from_text() {
        let raw = RawRecipe::from_text("pkgname=foo\ndepends=(bar)\n");
        assert!(raw.alias_target.is_none());
        assert!(raw.diagnostic.is_empty());
    }
}
