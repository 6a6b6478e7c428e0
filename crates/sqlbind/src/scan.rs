//! Lexical placeholder scanning.
//!
//! SQL arrives with `@name` placeholders and leaves with driver-native
//! positional markers. The scan is a single character-by-character pass
//! (quoting and escaping rule out a plain regex): `@` inside a
//! single-quoted literal is copied verbatim, `@@name` escapes to a literal
//! `@name`, and a bare `@` that starts no identifier is copied through
//! unchanged. The scanner is a pure function over its input, so concurrent
//! calls from any number of threads are safe by construction.

use std::fmt::Write;

/// Driver-native positional marker style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    /// `$1, $2, ...` as used by the Postgres wire protocol.
    #[default]
    Dollar,
    /// `?` as used by question-mark dialects (MySQL, SQLite).
    Question,
}

impl Marker {
    fn push(self, out: &mut String, index: usize) {
        match self {
            Marker::Dollar => {
                let _ = write!(out, "${}", index);
            }
            Marker::Question => out.push('?'),
        }
    }
}

/// Result of scanning a SQL string for placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSql {
    /// Input SQL with every recognized placeholder replaced by a marker,
    /// in left-to-right order.
    pub sql: String,
    /// One entry per emitted marker, in the same order, repeats preserved.
    pub names: Vec<String>,
}

/// Scan `sql` for `@identifier` placeholders and rewrite them to `marker`.
///
/// The pass is permissive: it recognizes placeholders lexically and copies
/// everything else through byte for byte. `names.len()` always equals the
/// number of markers emitted into the rewritten SQL.
pub fn scan_sql(sql: &str, marker: Marker) -> ParsedSql {
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut chars = sql.chars().peekable();
    let mut in_literal = false;

    while let Some(c) = chars.next() {
        if in_literal {
            out.push(c);
            if c == '\'' {
                in_literal = false;
            }
            continue;
        }

        match c {
            '\'' => {
                in_literal = true;
                out.push(c);
            }
            '@' => match chars.peek().copied() {
                // `@@name` is the escape for a literal `@name`.
                Some('@') => {
                    chars.next();
                    out.push('@');
                }
                Some(next) if is_ident_start(next) => {
                    let mut name = String::new();
                    while let Some(&next) = chars.peek() {
                        if !is_ident_char(next) {
                            break;
                        }
                        name.push(next);
                        chars.next();
                    }
                    names.push(name);
                    marker.push(&mut out, names.len());
                }
                // Not a placeholder; keep the `@`.
                _ => out.push('@'),
            },
            _ => out.push(c),
        }
    }

    ParsedSql { sql: out, names }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}
