// Field extraction from normalized PKGBUILD text
// Handles `depends=(...)`, `provides=(...)` and top-level scalar assignments

use crate::canonical::canonicalize;
use crate::expand::WordExpander;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

/// Permissive package atom: letters, digits and `-_.<>=+`
static DEPENDS_ATOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w\-.<>=+]+").expect("static regex")
});

/// Provides tokens are split on whitespace and quote boundaries
static PROVIDES_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\s'"]+"#).expect("static regex")
});

/// `name=value`, `name="value"` or `name='value'` at line start
static SCALAR_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^([A-Za-z_][A-Za-z0-9_]*)=(?:"([^"\n]*)"|'([^'\n]*)'|([^\s()'"]*))\s*$"#)
        .expect("static regex")
});

/// Recipe fields understood by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Depends,
    Provides,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Depends => "depends",
            Field::Provides => "provides",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return the body of the first `field=(...)` array declared at line start.
///
/// The body may span lines but cannot contain parentheses. `None` when the
/// field is absent.
pub fn array_body<'a>(content: &'a str, field: Field) -> Option<&'a str> {
    let pattern = format!(r"(?m)^{}=\(([^()]*)\)", regex::escape(field.as_str()));
    let re = Regex::new(&pattern).ok()?;
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Raw tokens of a field, before canonicalization
pub fn raw_tokens(content: &str, field: Field) -> Vec<String> {
    let Some(body) = array_body(content, field) else {
        return Vec::new();
    };

    let token_re = match field {
        Field::Depends => &*DEPENDS_ATOM,
        Field::Provides => &*PROVIDES_TOKEN,
    };

    token_re
        .find_iter(body)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Dependency names declared in `depends=(...)`, version constraints stripped
pub fn extract_depends(content: &str) -> Vec<String> {
    raw_tokens(content, Field::Depends)
        .iter()
        .map(|atom| canonicalize(atom))
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Names declared in `provides=(...)`.
///
/// Each token is word-expanded with the recipe's own scalar variables before
/// constraint stripping. Tokens the expander refuses are dropped.
pub fn extract_provides(content: &str, expander: &WordExpander) -> Vec<String> {
    let mut provides = Vec::new();

    for token in raw_tokens(content, Field::Provides) {
        let words = match expander.expand(&token) {
            Ok(words) => words,
            Err(e) => {
                warn!("Skipping provides entry {:?}: {}", token, e);
                continue;
            }
        };

        provides.extend(
            words
                .iter()
                .map(|word| canonicalize(word))
                .filter(|name| !name.is_empty())
                .map(String::from),
        );
    }

    provides
}

/// Top-level scalar assignments (`pkgname=foo`, `_py="python"`).
///
/// Array assignments and anything needing evaluation are skipped. Later
/// assignments override earlier ones, as in bash.
pub fn extract_variables(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for caps in SCALAR_ASSIGNMENT.captures_iter(content) {
        let name = &caps[1];
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
            .unwrap_or_default();
        vars.insert(name.to_string(), value.to_string());
    }

    vars
}
