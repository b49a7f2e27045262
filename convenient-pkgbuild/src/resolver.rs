// Dependency closure resolver
// Depth-first over an explicit stack, memoized on the dependency table

use crate::recipe::Recipe;
use crate::source::{RawRecipe, RecipeSource, SourceError};
use crate::table::DependencyTable;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a resolution run
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to fetch recipe for {package}: {source}")]
    Fetch {
        package: String,
        #[source]
        source: SourceError,
    },

    #[error("Alias cycle detected: {}", .chain.join(" -> "))]
    AliasCycle { chain: Vec<String> },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Tables owned by a single resolution run
#[derive(Debug, Default)]
struct Run {
    table: DependencyTable,
    provides: IndexMap<String, Vec<String>>,
}

impl Run {
    /// Turn collected `provides` into `ProvidedBy` entries
    fn process_provides(&mut self) {
        let Run { table, provides } = self;

        for (provider, items) in provides.iter() {
            for item in items {
                if item == provider {
                    warn!("{} lists itself in provides, ignoring", provider);
                    continue;
                }
                if table.add_provider(item, provider) {
                    debug!("{} is provided by {}", item, provider);
                } else {
                    debug!("{} keeps its own entry, not provided by {}", item, provider);
                }
            }
        }
    }
}

/// Resolves the transitive dependency closure of a package.
///
/// The resolver holds no state between runs: every call to
/// [`Resolver::resolve`] starts from empty tables, so it is a function of the
/// root name and the recipe source.
#[derive(Debug)]
pub struct Resolver<S> {
    source: S,
}

impl<S: RecipeSource> Resolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve `root` and every package reachable from it.
    ///
    /// Packages are discovered in depth-first preorder, each exactly once. The
    /// returned table is finalized: virtual names have been backfilled from
    /// the collected `provides` data.
    pub fn resolve(&self, root: &str) -> ResolveResult<DependencyTable> {
        let mut run = Run::default();
        let mut pending = vec![root.to_string()];

        while let Some(name) = pending.pop() {
            if run.table.contains(&name) {
                continue;
            }

            let depends = self.visit(&mut run, &name)?;

            // Reverse so the first dependency is visited first
            pending.extend(
                depends
                    .into_iter()
                    .rev()
                    .filter(|dep| !run.table.contains(dep)),
            );
        }

        run.process_provides();

        info!("Resolved {} entries for {}", run.table.len(), root);
        Ok(run.table)
    }

    /// Fetch `name`, follow its alias chain and record the final recipe.
    /// Returns the direct dependencies still to be visited.
    fn visit(&self, run: &mut Run, name: &str) -> ResolveResult<Vec<String>> {
        let mut current = name.to_string();
        let mut chain = vec![current.clone()];
        let mut raw = self.fetch(&current)?;

        while let Some(target) = raw.alias_target.take() {
            if chain.contains(&target) {
                chain.push(target);
                return Err(ResolveError::AliasCycle { chain });
            }

            info!("{} is part of {}, will build {}", current, target, target);
            run.table.insert_alias(&current, &target);

            if run.table.contains(&target) {
                debug!("{} already resolved", target);
                return Ok(Vec::new());
            }

            chain.push(target.clone());
            raw = self.fetch(&target)?;
            current = target;
        }

        let recipe = Recipe::parse(&current, &raw);
        info!("{} depends: {:?}", recipe.name, recipe.depends);

        run.table.insert_direct(&recipe.name, recipe.depends.clone());
        run.provides.insert(recipe.name, recipe.provides);

        Ok(recipe.depends)
    }

    fn fetch(&self, package: &str) -> ResolveResult<RawRecipe> {
        self.source
            .fetch(package)
            .map_err(|source| ResolveError::Fetch {
                package: package.to_string(),
                source,
            })
    }
}

/// Resolve `root` against `source` in one call
pub fn resolve<S: RecipeSource>(source: S, root: &str) -> ResolveResult<DependencyTable> {
    Resolver::new(source).resolve(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::table::DepEntry;
    use tracing_test::traced_test;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_diamond_visited_once() {
        let source = MemorySource::new()
            .with_recipe("root", "depends=(b c)\n")
            .with_recipe("b", "depends=(d)\n")
            .with_recipe("c", "depends=(d)\n")
            .with_recipe("d", "pkgname=d\n");

        let table = resolve(&source, "root").unwrap();

        assert_eq!(table.names().collect::<Vec<_>>(), vec!["root", "b", "d", "c"]);
        assert_eq!(source.fetch_count("d"), 1);
    }

    #[test]
    fn test_cycle_terminates() {
        let source = MemorySource::new()
            .with_recipe("a", "depends=(b)\n")
            .with_recipe("b", "depends=(a b)\n");

        let table = resolve(&source, "a").unwrap();

        assert_eq!(table.get("a"), Some(&DepEntry::Direct(names(&["b"]))));
        assert_eq!(table.get("b"), Some(&DepEntry::Direct(names(&["a", "b"]))));
        assert_eq!(source.fetch_count("a"), 1);
        assert_eq!(source.fetch_count("b"), 1);
    }

    #[test]
    #[traced_test]
    fn test_alias_collapse() {
        let source = MemorySource::new()
            .with_alias("a", "b")
            .with_recipe("b", "depends=(x)\n")
            .with_recipe("x", "pkgname=x\n");

        let table = resolve(&source, "a").unwrap();

        assert_eq!(table.get("a"), Some(&DepEntry::AliasOf("b".to_string())));
        assert_eq!(table.get("b"), Some(&DepEntry::Direct(names(&["x"]))));
        assert_eq!(table.get("x"), Some(&DepEntry::Direct(Vec::new())));
        assert!(logs_contain("a is part of b, will build b"));
        assert!(logs_contain("b depends: [\"x\"]"));
    }

    #[test]
    fn test_alias_chain_collapses_transitively() {
        let source = MemorySource::new()
            .with_alias("a", "b")
            .with_alias("b", "c")
            .with_recipe("c", "pkgname=c\n");

        let table = resolve(&source, "a").unwrap();

        assert_eq!(table.get("a"), Some(&DepEntry::AliasOf("b".to_string())));
        assert_eq!(table.get("b"), Some(&DepEntry::AliasOf("c".to_string())));
        assert_eq!(table.get("c"), Some(&DepEntry::Direct(Vec::new())));
    }

    #[test]
    fn test_alias_to_resolved_package_not_refetched() {
        let source = MemorySource::new()
            .with_recipe("root", "depends=(suite libpart)\n")
            .with_recipe("suite", "depends=(dep)\n")
            .with_recipe("dep", "pkgname=dep\n")
            .with_alias("libpart", "suite");

        let table = resolve(&source, "root").unwrap();

        assert_eq!(table.get("libpart"), Some(&DepEntry::AliasOf("suite".to_string())));
        assert_eq!(table.get("suite"), Some(&DepEntry::Direct(names(&["dep"]))));
        assert_eq!(source.fetch_count("suite"), 1);
    }

    #[test]
    fn test_marker_words_in_comment_keep_direct_entry() {
        let source = MemorySource::new()
            .with_recipe(
                "foo",
                "pkgname=foo\n# this split is part of package upstream-suite historically\ndepends=(bar)\n",
            )
            .with_recipe("bar", "pkgname=bar\n");

        let table = resolve(&source, "foo").unwrap();

        assert_eq!(table.get("foo"), Some(&DepEntry::Direct(names(&["bar"]))));
        assert!(!table.contains("upstream-suite"));
    }

    #[test]
    fn test_alias_cycle_is_error() {
        let source = MemorySource::new().with_alias("a", "b").with_alias("b", "a");

        match resolve(&source, "a") {
            Err(ResolveError::AliasCycle { chain }) => {
                assert_eq!(chain, names(&["a", "b", "a"]));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_recipe_aborts() {
        let source = MemorySource::new().with_recipe("root", "depends=(ghost)\n");

        match resolve(&source, "root") {
            Err(ResolveError::Fetch { package, .. }) => assert_eq!(package, "ghost"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_provides_precedence_and_accumulation() {
        let source = MemorySource::new()
            .with_recipe("root", "depends=(p q v)\n")
            .with_recipe("p", "provides=(v virt)\n")
            .with_recipe("q", "provides=('virt=2')\n")
            .with_recipe("v", "depends=(w)\n")
            .with_recipe("w", "pkgname=w\n");

        let table = resolve(&source, "root").unwrap();

        assert_eq!(table.get("v"), Some(&DepEntry::Direct(names(&["w"]))));
        assert_eq!(table.get("virt"), Some(&DepEntry::ProvidedBy(names(&["p", "q"]))));
    }

    #[test]
    #[traced_test]
    fn test_self_provides_ignored() {
        let source = MemorySource::new().with_recipe("solo", "pkgname=solo\nprovides=(solo)\n");

        let table = resolve(&source, "solo").unwrap();

        assert_eq!(table.get("solo"), Some(&DepEntry::Direct(Vec::new())));
        assert!(logs_contain("solo lists itself in provides"));
    }
}
