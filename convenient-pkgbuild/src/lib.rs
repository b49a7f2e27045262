//! PKGBUILD dependency closure resolution
//!
//! Given a root package name, walks every package reachable through
//! `depends=(...)`, follows split-package aliases ("libfoo is part of package
//! foo") and backfills virtual names from `provides=(...)`. The result is a
//! [`DependencyTable`] that can be rendered as a Makefile for an external
//! `make` run.
//!
//! Pipeline: [`RecipeSource`] → [`normalize`] → [`fields`] → [`canonical`] /
//! [`expand`] → [`Resolver`] → [`makefile`].
//!
//! ```
//! use convenient_pkgbuild::{DepEntry, MemorySource, Resolver};
//!
//! let source = MemorySource::new()
//!     .with_recipe("root", "depends=(a 'b>=1.0')\n")
//!     .with_recipe("a", "pkgname=a\n")
//!     .with_recipe("b", "pkgname=b\nprovides=(z)\n");
//!
//! let table = Resolver::new(&source).resolve("root").unwrap();
//! assert_eq!(table.get("z"), Some(&DepEntry::ProvidedBy(vec!["b".to_string()])));
//!
//! let makefile = convenient_pkgbuild::makefile::emit(&table);
//! assert!(makefile.contains("z: b\n"));
//! ```

pub mod canonical;
pub mod expand;
pub mod fields;
pub mod makefile;
pub mod normalize;
pub mod recipe;
pub mod resolver;
pub mod source;
pub mod table;

pub use canonical::canonicalize;
pub use expand::{ExpandError, WordExpander};
pub use fields::{Field, extract_depends, extract_provides};
pub use makefile::{OutputFormat, emit, render};
pub use normalize::strip_comments;
pub use recipe::Recipe;
pub use resolver::{ResolveError, ResolveResult, Resolver, resolve};
pub use source::{
    CacheConfig, CachedSource, CommandSource, DirectorySource, MemorySource, RawRecipe,
    RecipeSource, SourceConfig, SourceError, SourceResult,
};
pub use table::{DepEntry, DependencyTable};
