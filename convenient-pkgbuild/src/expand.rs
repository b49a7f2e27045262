// Restricted shell word expansion for PKGBUILD fragments
// Text substitution only: nothing here spawns a process

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while expanding a shell fragment
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("Command substitution is not supported: {0}")]
    CommandSubstitution(String),

    #[error("Unterminated {0} in: {1}")]
    Unterminated(&'static str, String),

    #[error("Unsupported parameter expansion: {0}")]
    Unsupported(String),
}

pub type ExpandResult<T> = Result<T, ExpandError>;

/// Expands parameters against a fixed variable table, removes quotes and
/// performs field splitting on unquoted expansion results.
///
/// Supported forms: `$var`, `${var}`, `${#var}`, the default/alternative
/// operators (`:-`, `-`, `:=`, `=`, `:+`, `+`), pattern removal (`#`, `##`,
/// `%`, `%%`), case modification (`^`, `^^`, `,`, `,,`) and substitution
/// (`/`, `//`, `/#`, `/%`). Patterns support `*`, `?` and bracket classes.
/// Assigning operators do not assign.
///
/// Unknown variables expand to the empty string, like bash with `set +u`.
/// `$(...)`, backticks and any other operator are rejected instead of being
/// guessed at.
#[derive(Debug, Clone, Default)]
pub struct WordExpander {
    variables: HashMap<String, String>,
}

impl WordExpander {
    pub fn new(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Expand one fragment into zero or more words
    pub fn expand(&self, fragment: &str) -> ExpandResult<Vec<String>> {
        let mut words = Vec::new();
        let mut current = String::new();
        // A quoted empty string ("") still yields a word
        let mut has_word = false;
        let mut chars = fragment.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        has_word = true;
                    }
                }
                '\'' => {
                    let mut closed = false;
                    for q in chars.by_ref() {
                        if q == '\'' {
                            closed = true;
                            break;
                        }
                        current.push(q);
                    }
                    if !closed {
                        return Err(ExpandError::Unterminated("single quote", fragment.to_string()));
                    }
                    has_word = true;
                }
                '"' => {
                    self.expand_double_quoted(&mut chars, &mut current, fragment)?;
                    has_word = true;
                }
                '`' => return Err(ExpandError::CommandSubstitution(fragment.to_string())),
                '$' => {
                    let value = self.expand_parameter(&mut chars, fragment)?;
                    // Unquoted expansion is subject to field splitting
                    let mut pieces = value.split_whitespace().peekable();
                    if value.starts_with(char::is_whitespace) && has_word {
                        words.push(std::mem::take(&mut current));
                        has_word = false;
                    }
                    while let Some(piece) = pieces.next() {
                        current.push_str(piece);
                        has_word = true;
                        if pieces.peek().is_some() {
                            words.push(std::mem::take(&mut current));
                        }
                    }
                    if value.ends_with(char::is_whitespace) && has_word {
                        words.push(std::mem::take(&mut current));
                        has_word = false;
                    }
                }
                c if c.is_whitespace() => {
                    if has_word {
                        words.push(std::mem::take(&mut current));
                        has_word = false;
                    }
                }
                c => {
                    current.push(c);
                    has_word = true;
                }
            }
        }

        if has_word {
            words.push(current);
        }

        Ok(words)
    }

    fn expand_double_quoted(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        current: &mut String,
        fragment: &str,
    ) -> ExpandResult<()> {
        while let Some(c) = chars.next() {
            match c {
                '"' => return Ok(()),
                '\\' => match chars.peek() {
                    Some(&next @ ('"' | '\\' | '$' | '`')) => {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                },
                '`' => return Err(ExpandError::CommandSubstitution(fragment.to_string())),
                '$' => {
                    let value = self.expand_parameter(chars, fragment)?;
                    current.push_str(&value);
                }
                c => current.push(c),
            }
        }
        Err(ExpandError::Unterminated("double quote", fragment.to_string()))
    }

    /// Expand the parameter following a `$`
    fn expand_parameter(
        &self,
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        fragment: &str,
    ) -> ExpandResult<String> {
        match chars.peek() {
            Some('(') => Err(ExpandError::CommandSubstitution(fragment.to_string())),
            Some('{') => {
                chars.next();
                let mut body = String::new();
                let mut depth = 1;
                for c in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                return self.expand_braced(&body, fragment);
                            }
                        }
                        _ => {}
                    }
                    body.push(c);
                }
                Err(ExpandError::Unterminated("parameter expansion", fragment.to_string()))
            }
            Some(c) if c.is_ascii_alphabetic() || *c == '_' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Ok(self.lookup(&name).to_string())
            }
            // A lone `$` stays literal
            _ => Ok("$".to_string()),
        }
    }

    fn expand_braced(&self, body: &str, fragment: &str) -> ExpandResult<String> {
        // `${#name}` is the length of the value
        if let Some(name) = body.strip_prefix('#') {
            if !name.is_empty() && name.chars().all(is_name_char) {
                return Ok(self.lookup(name).chars().count().to_string());
            }
        }

        let name_len = body.find(|c: char| !is_name_char(c)).unwrap_or(body.len());
        let (name, op) = body.split_at(name_len);
        if name.is_empty() {
            return Err(ExpandError::Unsupported(format!("${{{}}}", body)));
        }
        let value = self.lookup(name);
        let is_set = self.variables.contains_key(name);

        if op.is_empty() {
            return Ok(value.to_string());
        }

        let expanded = if let Some(word) = op.strip_prefix(":-").or_else(|| op.strip_prefix(":=")) {
            if value.is_empty() {
                self.expand_inner(word, fragment)?
            } else {
                value.to_string()
            }
        } else if let Some(word) = op.strip_prefix(":+") {
            if value.is_empty() {
                String::new()
            } else {
                self.expand_inner(word, fragment)?
            }
        } else if let Some(word) = op.strip_prefix('-').or_else(|| op.strip_prefix('=')) {
            if is_set {
                value.to_string()
            } else {
                self.expand_inner(word, fragment)?
            }
        } else if let Some(word) = op.strip_prefix('+') {
            if is_set {
                self.expand_inner(word, fragment)?
            } else {
                String::new()
            }
        } else if let Some(pattern) = op.strip_prefix("##") {
            remove_prefix(value, &self.expand_inner(pattern, fragment)?, Match::Longest)
        } else if let Some(pattern) = op.strip_prefix('#') {
            remove_prefix(value, &self.expand_inner(pattern, fragment)?, Match::Shortest)
        } else if let Some(pattern) = op.strip_prefix("%%") {
            remove_suffix(value, &self.expand_inner(pattern, fragment)?, Match::Longest)
        } else if let Some(pattern) = op.strip_prefix('%') {
            remove_suffix(value, &self.expand_inner(pattern, fragment)?, Match::Shortest)
        } else if let Some(pattern) = op.strip_prefix("^^") {
            change_case(value, &self.expand_inner(pattern, fragment)?, Case::Upper, true)
        } else if let Some(pattern) = op.strip_prefix('^') {
            change_case(value, &self.expand_inner(pattern, fragment)?, Case::Upper, false)
        } else if let Some(pattern) = op.strip_prefix(",,") {
            change_case(value, &self.expand_inner(pattern, fragment)?, Case::Lower, true)
        } else if let Some(pattern) = op.strip_prefix(',') {
            change_case(value, &self.expand_inner(pattern, fragment)?, Case::Lower, false)
        } else if let Some(spec) = op.strip_prefix('/') {
            let (anchor, spec) = match spec.chars().next() {
                Some('/') => (Anchor::All, &spec[1..]),
                Some('#') => (Anchor::Start, &spec[1..]),
                Some('%') => (Anchor::End, &spec[1..]),
                _ => (Anchor::First, spec),
            };
            let (pattern, replacement) = split_substitution(spec);
            let pattern = self.expand_inner(pattern, fragment)?;
            let replacement = self.expand_inner(replacement, fragment)?;
            substitute(value, &pattern, &replacement, anchor)
        } else {
            return Err(ExpandError::Unsupported(format!("${{{}}}", body)));
        };

        Ok(expanded)
    }

    fn expand_inner(&self, text: &str, fragment: &str) -> ExpandResult<String> {
        let words = self.expand(text).map_err(|e| match e {
            ExpandError::CommandSubstitution(_) => {
                ExpandError::CommandSubstitution(fragment.to_string())
            }
            other => other,
        })?;
        Ok(words.join(" "))
    }

    fn lookup(&self, name: &str) -> &str {
        self.variables.get(name).map(|s| s.as_str()).unwrap_or("")
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    Shortest,
    Longest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    First,
    All,
    Start,
    End,
}

/// `${v#p}` / `${v##p}`
fn remove_prefix(value: &str, pattern: &str, mode: Match) -> String {
    let pat: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = value.chars().collect();
    let mut ends = 0..=text.len();
    let cut = match mode {
        Match::Shortest => ends.find(|&i| glob_match(&pat, &text[..i])),
        Match::Longest => ends.rev().find(|&i| glob_match(&pat, &text[..i])),
    };
    match cut {
        Some(i) => text[i..].iter().collect(),
        None => value.to_string(),
    }
}

/// `${v%p}` / `${v%%p}`
fn remove_suffix(value: &str, pattern: &str, mode: Match) -> String {
    let pat: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = value.chars().collect();
    let mut starts = 0..=text.len();
    let cut = match mode {
        Match::Shortest => starts.rev().find(|&i| glob_match(&pat, &text[i..])),
        Match::Longest => starts.find(|&i| glob_match(&pat, &text[i..])),
    };
    match cut {
        Some(i) => text[..i].iter().collect(),
        None => value.to_string(),
    }
}

/// `${v^^p}`, `${v^p}`, `${v,,p}`, `${v,p}`. An empty pattern matches every
/// character.
fn change_case(value: &str, pattern: &str, case: Case, all: bool) -> String {
    let pat: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (i, c) in value.chars().enumerate() {
        let selected = (all || i == 0) && (pat.is_empty() || glob_match(&pat, &[c]));
        if !selected {
            out.push(c);
            continue;
        }
        match case {
            Case::Upper => out.extend(c.to_uppercase()),
            Case::Lower => out.extend(c.to_lowercase()),
        }
    }

    out
}

/// Split `pattern/replacement` at the first unescaped `/`
fn split_substitution(spec: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in spec.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '/' if !escaped => return (&spec[..i], &spec[i + 1..]),
            _ => escaped = false,
        }
    }
    (spec, "")
}

/// `${v/p/r}` and its `//`, `/#`, `/%` forms. Matches are longest-first.
fn substitute(value: &str, pattern: &str, replacement: &str, anchor: Anchor) -> String {
    let pat: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = value.chars().collect();
    let n = text.len();

    if pat.is_empty() {
        return value.to_string();
    }

    match anchor {
        Anchor::Start => match (0..=n).rev().find(|&j| glob_match(&pat, &text[..j])) {
            Some(j) => format!("{}{}", replacement, text[j..].iter().collect::<String>()),
            None => value.to_string(),
        },
        Anchor::End => match (0..=n).find(|&i| glob_match(&pat, &text[i..])) {
            Some(i) => format!("{}{}", text[..i].iter().collect::<String>(), replacement),
            None => value.to_string(),
        },
        Anchor::First | Anchor::All => {
            let mut out = String::with_capacity(value.len());
            let mut replaced = false;
            let mut i = 0;
            while i < n {
                let end = if anchor == Anchor::All || !replaced {
                    (i + 1..=n).rev().find(|&j| glob_match(&pat, &text[i..j]))
                } else {
                    None
                };
                match end {
                    Some(j) => {
                        out.push_str(replacement);
                        replaced = true;
                        i = j;
                    }
                    None => {
                        out.push(text[i]);
                        i += 1;
                    }
                }
            }
            out
        }
    }
}

/// Shell pattern match against the whole of `text`: `*`, `?`, `[...]` and
/// backslash escapes
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|i| glob_match(rest, &text[i..])),
        Some(('?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some(('[', rest)) => match bracket_class(rest) {
            Some((class, negated, after)) => match text.split_first() {
                Some((c, text_rest)) => {
                    class_contains(class, *c) != negated && glob_match(after, text_rest)
                }
                None => false,
            },
            // No closing bracket: a literal `[`
            None => text.first() == Some(&'[') && glob_match(rest, &text[1..]),
        },
        Some(('\\', rest)) if !rest.is_empty() => {
            text.first() == Some(&rest[0]) && glob_match(&rest[1..], &text[1..])
        }
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}

/// Parse a bracket expression after its `[`. Returns the class members, the
/// negation flag and the pattern following the closing `]`.
fn bracket_class(pattern: &[char]) -> Option<(&[char], bool, &[char])> {
    let (negated, body) = match pattern.first() {
        Some('!' | '^') => (true, &pattern[1..]),
        _ => (false, pattern),
    };
    // A `]` right after the opening bracket is a member
    let close = body.iter().skip(1).position(|&c| c == ']')? + 1;
    Some((&body[..close], negated, &body[close + 1..]))
}

fn class_contains(class: &[char], c: char) -> bool {
    let mut i = 0;
    while i < class.len() {
        if i + 2 < class.len() && class[i + 1] == '-' {
            if class[i] <= c && c <= class[i + 2] {
                return true;
            }
            i += 3;
        } else {
            if class[i] == c {
                return true;
            }
            i += 1;
        }
    }
    false
}
