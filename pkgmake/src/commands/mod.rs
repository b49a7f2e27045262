//! pkgmake command-line interface
//!
//! - `resolve`: resolve a package's dependency closure and write a Makefile
//! - `cache`: inspect or clean the local PKGBUILD cache

use clap::{Parser, Subcommand};
use convenient_pkgbuild::OutputFormat;
use std::path::PathBuf;

pub mod cache;
pub mod resolve;

/// pkgmake - turn a PKGBUILD dependency closure into a Makefile
#[derive(Parser)]
#[command(name = "pkgmake")]
#[command(about = "Resolve PKGBUILD dependencies and emit a Makefile for the build order")]
#[command(version)]
pub struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a package and emit its dependency rules
    Resolve {
        /// Root package name
        package: String,

        /// Write output to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: makefile or json
        #[arg(short, long, default_value = "makefile")]
        format: OutputFormat,

        /// Directory holding cached PKGBUILDs
        #[arg(long, env = "PKGMAKE_CACHE_DIR")]
        cache_dir: Option<PathBuf>,

        /// Always fetch, never read or write the cache
        #[arg(long)]
        no_cache: bool,

        /// Read recipes from an exported tree (<dir>/<pkg>/PKGBUILD) instead of running a command
        #[arg(long, conflicts_with = "fetch_command")]
        recipes_dir: Option<PathBuf>,

        /// Command and arguments used to fetch a PKGBUILD; the package name is appended
        #[arg(long, num_args = 1.., allow_hyphen_values = true, default_values = ["asp", "show"])]
        fetch_command: Vec<String>,

        /// Seconds allowed for each fetch
        #[arg(long, env = "PKGMAKE_FETCH_TIMEOUT", default_value_t = 60)]
        timeout: u64,
    },

    /// Manage the PKGBUILD cache
    Cache {
        /// Directory holding cached PKGBUILDs
        #[arg(long, env = "PKGMAKE_CACHE_DIR", global = true)]
        cache_dir: Option<PathBuf>,

        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show cached packages
    Info,
    /// Remove every cached PKGBUILD
    Clean,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_args(args: &[&str]) -> Vec<String> {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Resolve { fetch_command, .. } => fetch_command,
            Commands::Cache { .. } => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_fetch_command_default() {
        assert_eq!(resolve_args(&["pkgmake", "resolve", "foo"]), vec!["asp", "show"]);
    }

    #[test]
    fn test_fetch_command_keeps_spaced_arguments() {
        let command = resolve_args(&[
            "pkgmake",
            "resolve",
            "foo",
            "--fetch-command",
            "sh",
            "-c",
            "cat \"/srv/abs trees/$0/PKGBUILD\"",
        ]);
        assert_eq!(command, vec!["sh", "-c", "cat \"/srv/abs trees/$0/PKGBUILD\""]);
    }
}
