// Comment stripping for raw PKGBUILD text
// Keeps line structure intact so `^field=(` anchors still line up

/// Remove shell comments from recipe text.
///
/// A `#` opens a comment when it is outside quotes and either starts a line or
/// follows whitespace, mirroring how bash tokenizes. `${#var}` and `$#` are left
/// alone. The comment body is dropped up to (not including) the newline.
pub fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut in_comment = false;
    let mut prev: Option<char> = None;

    for c in content.chars() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
                out.push(c);
                prev = Some(c);
            }
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            prev = Some(c);
            continue;
        }

        match c {
            '\\' if !in_single => escaped = true,
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single
                && !in_double
                && prev.is_none_or(|p| p.is_whitespace() || p == '(' || p == ';') =>
            {
                in_comment = true;
                continue;
            }
            _ => {}
        }

        out.push(c);
        prev = Some(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_line_comment_removed() {
        let text = "# Maintainer: someone\npkgname=foo\n#depends=(bar)\n";
        let stripped = strip_comments(text);
        assert_eq!(stripped, "\npkgname=foo\n\n");
    }

    #[test]
    fn test_trailing_comment_inside_array() {
        let text = "depends=(a # needed at runtime\n  b)\n";
        assert_eq!(strip_comments(text), "depends=(a \n  b)\n");
    }

    #[test]
    fn test_hash_in_quotes_and_expansions_kept() {
        let text = "url=\"https://example.org/#top\"\nn=${#pkgname}\nsource=('foo#bar')\n";
        assert_eq!(strip_comments(text), text);
    }

    #[test]
    fn test_escaped_hash_kept() {
        let text = "pkgdesc=foo\\ \\#1\n";
        assert_eq!(strip_comments(text), text);
    }
}
