// Recipe source backed by an exported ABS / asp tree

use super::{RawRecipe, RecipeSource, SourceError, SourceResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `<root>/<package>/PKGBUILD`, or the `trunk/` layout used by older
/// svn-style exports.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, package: &str) -> [PathBuf; 2] {
        let dir = self.root.join(package);
        [dir.join("PKGBUILD"), dir.join("trunk").join("PKGBUILD")]
    }
}

impl RecipeSource for DirectorySource {
    fn fetch(&self, package: &str) -> SourceResult<RawRecipe> {
        // Reject names that would escape the tree
        if package.is_empty() || package.contains('/') || package.starts_with('.') {
            return Err(SourceError::NotFound(package.to_string()));
        }

        for path in self.candidates(package) {
            if path.is_file() {
                debug!("Reading {}", path.display());
                let text = fs::read_to_string(&path)?;
                return Ok(RawRecipe::from_text(text));
            }
        }

        Err(SourceError::NotFound(package.to_string()))
    }
}
