// Resolved dependency table
// Insertion-ordered so emitted output follows discovery order

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How a package name is satisfied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepEntry {
    /// A real package with its own recipe and direct dependencies
    Direct(Vec<String>),
    /// Part of another package's recipe
    AliasOf(String),
    /// Virtual name satisfied by any of these packages
    ProvidedBy(Vec<String>),
}

impl DepEntry {
    /// Names this entry points at (prerequisites in the emitted rule)
    pub fn targets(&self) -> &[String] {
        match self {
            DepEntry::Direct(deps) => deps.as_slice(),
            DepEntry::AliasOf(target) => std::slice::from_ref(target),
            DepEntry::ProvidedBy(providers) => providers.as_slice(),
        }
    }

    pub fn is_empty_direct(&self) -> bool {
        matches!(self, DepEntry::Direct(deps) if deps.is_empty())
    }
}

/// Package name to resolution entry, in discovery order.
///
/// Entries are written once: the insert methods never replace an existing
/// key. Provider backfill is the only mutation of existing entries and
/// happens after resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyTable {
    entries: IndexMap<String, DepEntry>,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&DepEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DepEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Record a package's direct dependencies. Returns false if the name was
    /// already present.
    pub fn insert_direct(&mut self, name: &str, deps: Vec<String>) -> bool {
        self.insert_new(name, DepEntry::Direct(deps))
    }

    /// Record that `name` is part of `target`
    pub fn insert_alias(&mut self, name: &str, target: &str) -> bool {
        self.insert_new(name, DepEntry::AliasOf(target.to_string()))
    }

    fn insert_new(&mut self, name: &str, entry: DepEntry) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), entry);
        true
    }

    /// Register `provider` as a provider of `item`.
    ///
    /// Absent names and empty `Direct` entries become `ProvidedBy`; existing
    /// `ProvidedBy` lists grow. Packages with real dependencies and aliases
    /// are left alone. Returns whether the table changed.
    pub(crate) fn add_provider(&mut self, item: &str, provider: &str) -> bool {
        if !self.entries.contains_key(item) {
            self.entries.insert(
                item.to_string(),
                DepEntry::ProvidedBy(vec![provider.to_string()]),
            );
            return true;
        }

        match self.entries.get_mut(item) {
            None => false,
            Some(entry) if entry.is_empty_direct() => {
                *entry = DepEntry::ProvidedBy(vec![provider.to_string()]);
                true
            }
            Some(DepEntry::ProvidedBy(providers)) => {
                if providers.iter().any(|p| p == provider) {
                    false
                } else {
                    providers.push(provider.to_string());
                    true
                }
            }
            Some(_) => false,
        }
    }
}

impl<'a> IntoIterator for &'a DependencyTable {
    type Item = (&'a String, &'a DepEntry);
    type IntoIter = indexmap::map::Iter<'a, String, DepEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_never_overwrites() {
        let mut table = DependencyTable::new();
        assert!(table.insert_direct("a", names(&["b"])));
        assert!(!table.insert_direct("a", Vec::new()));
        assert!(!table.insert_alias("a", "x"));
        assert_eq!(table.get("a"), Some(&DepEntry::Direct(names(&["b"]))));
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut table = DependencyTable::new();
        table.insert_direct("zeta", Vec::new());
        table.insert_direct("alpha", Vec::new());
        table.insert_alias("mid", "alpha");
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_add_provider_rules() {
        let mut table = DependencyTable::new();
        table.insert_direct("real", names(&["dep"]));
        table.insert_direct("empty", Vec::new());
        table.insert_alias("alias", "real");

        assert!(table.add_provider("virt", "p"));
        assert!(table.add_provider("virt", "q"));
        assert!(!table.add_provider("virt", "q"));
        assert!(table.add_provider("empty", "p"));
        assert!(!table.add_provider("real", "p"));
        assert!(!table.add_provider("alias", "p"));

        assert_eq!(table.get("virt"), Some(&DepEntry::ProvidedBy(names(&["p", "q"]))));
        assert_eq!(table.get("empty"), Some(&DepEntry::ProvidedBy(names(&["p"]))));
        assert_eq!(table.get("real"), Some(&DepEntry::Direct(names(&["dep"]))));
        assert_eq!(table.get("alias"), Some(&DepEntry::AliasOf("real".to_string())));
    }

    #[test]
    fn test_json_shape() {
        let mut table = DependencyTable::new();
        table.insert_direct("a", names(&["b"]));
        table.insert_alias("b", "c");
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"{"a":{"Direct":["b"]},"b":{"AliasOf":"c"}}"#);
    }
}
