//! PKGBUILD cache management commands

use convenient_pkgbuild::CacheConfig;

/// List cached packages
pub fn info(cache: &CacheConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!("Cache directory: {}", cache.dir.display());

    if !cache.dir.exists() {
        println!("No cache found. Run `pkgmake resolve` to populate it.");
        return Ok(());
    }

    let entries = cache.entries()?;
    println!("Cached PKGBUILDs: {}", entries.len());
    for name in entries {
        println!("  {}", name);
    }

    Ok(())
}

/// Remove all cached PKGBUILDs
pub fn clean(cache: &CacheConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let removed = cache.clean()?;
    println!("Removed {} cached PKGBUILDs from {}", removed, cache.dir.display());
    Ok(())
}
