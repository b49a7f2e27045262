//! Build-orchestration output
//!
//! Renders a [`DependencyTable`] as a Makefile: one rule per entry, package
//! names as targets, dependencies (or alias target, or providers) as
//! prerequisites. Recipes are informational `@echo` lines so the file can be
//! dry-run with plain `make`.

use crate::table::{DepEntry, DependencyTable};
use std::fmt::Write;

/// Output format for a resolved table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Makefile rules (default)
    #[default]
    Makefile,
    /// The table as JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "makefile" | "make" => Ok(OutputFormat::Makefile),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

/// Render the table in the requested format
pub fn render(table: &DependencyTable, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Makefile => Ok(emit(table)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(table)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Render every table entry as a Makefile rule, in table order
pub fn emit(table: &DependencyTable) -> String {
    let mut out = String::new();

    out.push_str("# Generated by pkgmake. Do not edit.\n");
    if !table.is_empty() {
        let targets: Vec<String> = table.names().map(escape).collect();
        let _ = writeln!(out, ".PHONY: {}", targets.join(" "));
    }

    for (name, entry) in table.iter() {
        out.push('\n');
        out.push_str(&rule(name, entry));
    }

    out
}

/// One rule block for a single entry
pub fn rule(name: &str, entry: &DepEntry) -> String {
    let target = escape(name);
    let prerequisites = entry
        .targets()
        .iter()
        .map(|n| escape(n))
        .collect::<Vec<_>>()
        .join(" ");

    let message = match entry {
        DepEntry::Direct(_) => format!("Will build target: {target}"),
        DepEntry::AliasOf(_) => format!("{target} is part of {prerequisites}"),
        DepEntry::ProvidedBy(_) => format!("{target} is provided by: {prerequisites}"),
    };

    let header = if prerequisites.is_empty() {
        format!("{target}:")
    } else {
        format!("{target}: {prerequisites}")
    };

    format!("{header}\n\t@echo \"{message}\"\n")
}

/// Make expands `$` in targets and recipes
fn escape(name: &str) -> String {
    name.replace('$', "$$")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rule_shapes() {
        assert_eq!(
            rule("root", &DepEntry::Direct(names(&["a", "b"]))),
            "root: a b\n\t@echo \"Will build target: root\"\n"
        );
        assert_eq!(
            rule("leaf", &DepEntry::Direct(Vec::new())),
            "leaf:\n\t@echo \"Will build target: leaf\"\n"
        );
        assert_eq!(
            rule("libfoo", &DepEntry::AliasOf("foo".to_string())),
            "libfoo: foo\n\t@echo \"libfoo is part of foo\"\n"
        );
        assert_eq!(
            rule("sh", &DepEntry::ProvidedBy(names(&["bash", "dash"]))),
            "sh: bash dash\n\t@echo \"sh is provided by: bash dash\"\n"
        );
    }

    #[test]
    fn test_emit_order_and_header() {
        let mut table = DependencyTable::new();
        table.insert_direct("root", names(&["a"]));
        table.insert_direct("a", Vec::new());

        let text = emit(&table);
        assert_eq!(
            text,
            "# Generated by pkgmake. Do not edit.\n\
             .PHONY: root a\n\
             \n\
             root: a\n\
             \t@echo \"Will build target: root\"\n\
             \n\
             a:\n\
             \t@echo \"Will build target: a\"\n"
        );
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(emit(&DependencyTable::new()), "# Generated by pkgmake. Do not edit.\n");
    }

    #[test]
    fn test_dollar_escaped() {
        assert_eq!(
            rule("a$b", &DepEntry::Direct(Vec::new())),
            "a$$b:\n\t@echo \"Will build target: a$$b\"\n"
        );
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("Makefile".parse::<OutputFormat>(), Ok(OutputFormat::Makefile));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
