// Package name canonicalization
// Version constraints are not resolved, only stripped

use tracing::debug;

const CONSTRAINT_OPERATORS: [char; 3] = ['<', '>', '='];

/// Strip a version constraint from a dependency atom.
///
/// `libfoo>=2.0` becomes `libfoo`, `bar=1:1.2-3` becomes `bar`. Atoms without an
/// operator are returned unchanged. An atom that starts with an operator
/// canonicalizes to the empty string, which callers treat as "no package".
pub fn canonicalize(atom: &str) -> &str {
    match atom.find(CONSTRAINT_OPERATORS) {
        Some(pos) => {
            let name = &atom[..pos];
            debug!(
                "{} includes version specification. Get package name: {}",
                atom, name
            );
            name
        }
        None => atom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_operators() {
        assert_eq!(canonicalize("libfoo>=2.0"), "libfoo");
        assert_eq!(canonicalize("glibc<3"), "glibc");
        assert_eq!(canonicalize("python=3.12"), "python");
        assert_eq!(canonicalize("sh<=>1"), "sh");
    }

    #[test]
    fn test_plain_name_unchanged() {
        assert_eq!(canonicalize("gcc-libs"), "gcc-libs");
        assert_eq!(canonicalize("libstdc++.so"), "libstdc++.so");
        assert_eq!(canonicalize("qt6-base"), "qt6-base");
    }

    #[test]
    fn test_leading_operator_is_empty() {
        assert_eq!(canonicalize(">=1.0"), "");
    }
}
