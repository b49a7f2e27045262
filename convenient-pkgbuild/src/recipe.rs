// Parsed view of one fetched recipe

use crate::expand::WordExpander;
use crate::fields::{extract_depends, extract_provides, extract_variables};
use crate::normalize::strip_comments;
use crate::source::RawRecipe;

/// The facts the resolver needs from a PKGBUILD
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    /// Direct dependency names, constraints stripped
    pub depends: Vec<String>,
    /// Names this package provides, after word expansion
    pub provides: Vec<String>,
    /// Set when the package is part of another package
    pub alias_target: Option<String>,
}

impl Recipe {
    /// Parse recipe text fetched for `name`.
    ///
    /// Split-package markers win: an aliased recipe carries no dependency data.
    pub fn parse(name: impl Into<String>, raw: &RawRecipe) -> Self {
        let name = name.into();

        if let Some(target) = &raw.alias_target {
            return Self {
                name,
                alias_target: Some(target.clone()),
                ..Default::default()
            };
        }

        Self::from_text(name, &raw.text)
    }

    /// Parse PKGBUILD text that is known not to be an alias
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let content = strip_comments(text);
        let expander = WordExpander::new(extract_variables(&content));

        Self {
            name: name.into(),
            depends: extract_depends(&content),
            provides: extract_provides(&content, &expander),
            alias_target: None,
        }
    }
}
