//! pkgmake - PKGBUILD dependency closure to Makefile
//!
//! 1. Fetch PKGBUILDs (asp, an exported tree, or the local cache)
//! 2. Resolve the dependency closure (using convenient-pkgbuild)
//! 3. Emit Makefile rules for an external `make`

mod commands;

use clap::Parser;
use commands::resolve::ResolveOptions;
use commands::{CacheAction, Cli, Commands};
use convenient_pkgbuild::CacheConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pkgmake=debug,convenient_pkgbuild=debug"
    } else {
        "pkgmake=info,convenient_pkgbuild=info"
    };

    // Logs go to stderr; stdout may carry the generated Makefile
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Resolve {
            package,
            output,
            format,
            cache_dir,
            no_cache,
            recipes_dir,
            fetch_command,
            timeout,
        } => {
            let options = ResolveOptions::from_args(
                package,
                output,
                format,
                cache_dir,
                no_cache,
                recipes_dir,
                &fetch_command,
                timeout,
            )?;
            commands::resolve::execute(&options)
        }
        Commands::Cache { cache_dir, action } => {
            let cache = cache_dir.map(CacheConfig::new).unwrap_or_default();
            match action {
                CacheAction::Info => commands::cache::info(&cache),
                CacheAction::Clean => commands::cache::clean(&cache),
            }
        }
    }
}
