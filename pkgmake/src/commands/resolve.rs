//! Resolve command: dependency closure to Makefile

use convenient_pkgbuild::{
    CacheConfig, CachedSource, CommandSource, DirectorySource, OutputFormat, RecipeSource,
    Resolver, SourceConfig, render,
};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Options for one `pkgmake resolve` run
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub package: String,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub cache: CacheConfig,
    pub recipes_dir: Option<PathBuf>,
    pub source: SourceConfig,
}

impl ResolveOptions {
    #[allow(clippy::too_many_arguments)]
    pub fn from_args(
        package: String,
        output: Option<PathBuf>,
        format: OutputFormat,
        cache_dir: Option<PathBuf>,
        no_cache: bool,
        recipes_dir: Option<PathBuf>,
        fetch_command: &[String],
        timeout_secs: u64,
    ) -> Result<Self, String> {
        let timeout = Duration::from_secs(timeout_secs);
        let source = SourceConfig::from_command_line(fetch_command, timeout)
            .ok_or_else(|| "Fetch command must not be empty".to_string())?;

        let mut cache = cache_dir.map(CacheConfig::new).unwrap_or_default();
        cache.enabled = !no_cache;

        Ok(Self {
            package,
            output,
            format,
            cache,
            recipes_dir,
            source,
        })
    }

    /// Build the recipe source chain described by these options
    pub fn recipe_source(&self) -> Box<dyn RecipeSource> {
        if let Some(dir) = &self.recipes_dir {
            info!("Reading recipes from {}", dir.display());
            return Box::new(DirectorySource::new(dir));
        }

        let command = CommandSource::new(self.source.clone());
        if self.cache.enabled {
            info!("Using PKGBUILD cache at {}", self.cache.dir.display());
            Box::new(CachedSource::new(command, &self.cache.dir))
        } else {
            Box::new(command)
        }
    }
}

/// Resolve the package and write the rendered table.
///
/// Nothing is written unless resolution succeeds.
pub fn execute(options: &ResolveOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let source = options.recipe_source();
    let resolver = Resolver::new(source);

    info!("Resolving dependencies of {}", options.package);
    let table = resolver.resolve(&options.package)?;
    let rendered = render(&table, options.format)?;

    match &options.output {
        Some(path) => {
            write_atomically(path, &rendered)?;
            info!("Wrote {} rules to {}", table.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Write through a sibling temp file and rename into place
fn write_atomically(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    debug!("Writing {}", temp_path.display());
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
