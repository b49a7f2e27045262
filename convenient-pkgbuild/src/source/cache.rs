// On-disk recipe cache
// One file per package, holding the raw fetched text

use super::{RawRecipe, RecipeSource, SourceResult, detect_alias};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CACHE_FILE_PREFIX: &str = "PKGBUILD_";

/// Where cached recipes live and whether the cache is used at all
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    pub enabled: bool,
}

impl CacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            enabled: true,
        }
    }

    /// `<user cache dir>/pkgmake/pkgbuild`, falling back to a relative path
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("pkgmake")
            .join("pkgbuild")
    }

    /// Cached package names, sorted
    pub fn entries(&self) -> std::io::Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry
                .file_name()
                .to_str()
                .and_then(|f| f.strip_prefix(CACHE_FILE_PREFIX))
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove every cached recipe, returning how many were removed
    pub fn clean(&self) -> std::io::Result<usize> {
        let names = self.entries()?;
        for name in &names {
            fs::remove_file(entry_path(&self.dir, name))?;
        }
        info!("Removed {} cached recipes from {}", names.len(), self.dir.display());
        Ok(names.len())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

/// Wraps a source with a directory of cached recipe texts.
///
/// Only successful fetches are written. The alias marker is re-detected from
/// cached text, so split packages resolve the same way offline.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    dir: PathBuf,
}

impl<S: RecipeSource> CachedSource<S> {
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Path of the cache file for a package
    pub fn entry_path(&self, package: &str) -> PathBuf {
        entry_path(&self.dir, package)
    }

    fn store(&self, package: &str, text: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(package);
        // Write to a temp file first so readers never see a partial recipe
        let temp_path = self.dir.join(format!(".{}{}.tmp", CACHE_FILE_PREFIX, package));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(text.as_bytes())?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

impl<S: RecipeSource> RecipeSource for CachedSource<S> {
    fn fetch(&self, package: &str) -> SourceResult<RawRecipe> {
        let path = self.entry_path(package);

        if path.is_file() {
            debug!("Cache hit for {}: {}", package, path.display());
            let text = fs::read_to_string(&path)?;
            return Ok(RawRecipe::from_text(text));
        }

        let raw = self.inner.fetch(package)?;

        // An alias reported only on stderr would be lost in the cached text
        if raw.alias_target.is_some() && detect_alias(&raw.text).is_none() {
            debug!("Not caching {}: alias marker only in diagnostics", package);
            return Ok(raw);
        }

        match self.store(package, &raw.text) {
            Ok(()) => debug!("Cached recipe for {} at {}", package, path.display()),
            Err(e) => warn!("Failed to cache recipe for {}: {}", package, e),
        }

        Ok(raw)
    }
}

fn entry_path(dir: &Path, package: &str) -> PathBuf {
    dir.join(format!("{}{}", CACHE_FILE_PREFIX, package))
}
