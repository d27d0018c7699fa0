//! Literal and identifier escaping for PostgreSQL.
//!
//! The rules follow the conventions of `pg-format`:
//!
//! - `%L` ([`quote_literal`]): single-quoted, `'` doubled, and `E''` syntax
//!   with doubled backslashes when the text contains a backslash. A value
//!   built with [`SqlValue::ident`] is the exception: it renders as an
//!   identifier in any position, so `%L` with it emits a column name.
//! - `%I` ([`quote_ident`]): plain lower-case names that are not reserved words
//!   pass through; anything else is double-quoted with `"` doubled.
//! - `%s` ([`format_string`]): the value as plain text, no quoting.
//! - `%%`: a literal percent sign.
//!
//! Positional placeholders (`%2$L`) address arguments by 1-based index; a
//! sequential placeholder after a positional one continues from it.
//!
//! # Example
//! ```ignore
//! use medialib_sql::sql_fmt;
//!
//! let cond = sql_fmt!("%I = %L", "name", "O'Brien")?;
//! assert_eq!(cond, "name = 'O''Brien'");
//! # Ok::<(), medialib_sql::SqlError>(())
//! ```

use crate::error::{SqlError, SqlResult};
use crate::value::SqlValue;
use std::fmt::Write;

/// PostgreSQL reserved key words. Sorted for binary search.
const RESERVED: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "authorization",
    "binary",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "collation",
    "column",
    "concurrently",
    "constraint",
    "create",
    "cross",
    "current_catalog",
    "current_date",
    "current_role",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "fetch",
    "for",
    "foreign",
    "freeze",
    "from",
    "full",
    "grant",
    "group",
    "having",
    "ilike",
    "in",
    "initially",
    "inner",
    "intersect",
    "into",
    "is",
    "isnull",
    "join",
    "lateral",
    "leading",
    "left",
    "like",
    "limit",
    "localtime",
    "localtimestamp",
    "natural",
    "not",
    "notnull",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "outer",
    "overlaps",
    "placing",
    "primary",
    "references",
    "returning",
    "right",
    "select",
    "session_user",
    "similar",
    "some",
    "symmetric",
    "system_user",
    "table",
    "tablesample",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "verbose",
    "when",
    "where",
    "window",
    "with",
];

/// Is `word` (already lower-case) a PostgreSQL reserved key word?
pub fn is_reserved(word: &str) -> bool {
    RESERVED.binary_search(&word).is_ok()
}

fn is_plain_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_ascii_lowercase() || c.is_ascii_digit())
        && !is_reserved(name)
}

/// Quote a single identifier only when it needs it.
///
/// This never fails; callers that accept user input should reject empty names
/// first (see [`quote_ident`]).
pub fn quote_ident_str(name: &str) -> String {
    if is_plain_ident(name) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Format a value as an identifier (`%I`).
pub fn quote_ident(value: &SqlValue) -> SqlResult<String> {
    match value {
        SqlValue::Null => Err(SqlError::format("SQL identifier cannot be NULL")),
        SqlValue::Bool(true) => Ok("\"t\"".to_string()),
        SqlValue::Bool(false) => Ok("\"f\"".to_string()),
        SqlValue::Text(s) => {
            if s.is_empty() {
                return Err(SqlError::format("SQL identifier cannot be empty"));
            }
            if s.contains('\0') {
                return Err(SqlError::format(
                    "SQL identifier cannot contain NUL character",
                ));
            }
            Ok(quote_ident_str(s))
        }
        SqlValue::Bytes(_) => Err(SqlError::format("SQL identifier cannot be binary data")),
        SqlValue::Json(_) => Err(SqlError::format("SQL identifier cannot be a JSON value")),
        SqlValue::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if matches!(item, SqlValue::List(_)) {
                    return Err(SqlError::format(
                        "nested lists cannot be formatted as SQL identifiers",
                    ));
                }
                parts.push(quote_ident(item)?);
            }
            Ok(parts.join(","))
        }
        SqlValue::Ident(ident) => Ok(ident.to_sql()),
        other => Ok(quote_ident_str(&format_string(other))),
    }
}

/// Format a value as a literal (`%L`).
///
/// [`SqlValue::Ident`] is rendered as an identifier, not quoted as text.
pub fn quote_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(true) => "'t'".to_string(),
        SqlValue::Bool(false) => "'f'".to_string(),
        SqlValue::Bytes(bytes) => format!("E'\\\\x{}'", hex(bytes)),
        SqlValue::List(items) => items
            .iter()
            .map(|item| match item {
                SqlValue::List(_) => format!("({})", quote_literal(item)),
                other => quote_literal(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        SqlValue::Ident(ident) => ident.to_sql(),
        other => quote_text(&format_string(other)),
    }
}

/// Format a value as plain text (`%s`).
pub fn format_string(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Bool(true) => "t".to_string(),
        SqlValue::Bool(false) => "f".to_string(),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::Float(f) => float_text(*f),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Bytes(bytes) => format!("\\x{}", hex(bytes)),
        SqlValue::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S%.3f+00").to_string(),
        SqlValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        SqlValue::Uuid(u) => u.to_string(),
        SqlValue::Json(json) => json.to_string(),
        SqlValue::List(items) => items
            .iter()
            .map(|item| match item {
                SqlValue::List(_) => format!("({})", format_string(item)),
                other => format_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        SqlValue::Ident(ident) => ident.to_sql(),
    }
}

fn quote_text(text: &str) -> String {
    let mut has_backslash = false;
    let mut out = String::with_capacity(text.len() + 3);
    out.push('\'');
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => {
                has_backslash = true;
                out.push_str("\\\\");
            }
            c => out.push(c),
        }
    }
    out.push('\'');
    if has_backslash {
        out.insert(0, 'E');
    }
    out
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        f.to_string()
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[derive(Debug, Clone, Copy)]
enum Conversion {
    Literal,
    Ident,
    Str,
}

impl Conversion {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'L' => Some(Conversion::Literal),
            b'I' => Some(Conversion::Ident),
            b's' => Some(Conversion::Str),
            _ => None,
        }
    }
}

enum Spec {
    Percent,
    Arg {
        position: Option<usize>,
        conversion: Conversion,
        len: usize,
    },
}

/// Parse the placeholder that follows a `%`. `None` means "not a placeholder".
fn parse_spec(s: &str) -> Option<Spec> {
    let bytes = s.as_bytes();
    match *bytes.first()? {
        b'%' => Some(Spec::Percent),
        b @ (b'L' | b'I' | b's') => Some(Spec::Arg {
            position: None,
            conversion: Conversion::from_byte(b)?,
            len: 1,
        }),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if bytes.get(digits) != Some(&b'$') {
                return None;
            }
            let conversion = Conversion::from_byte(*bytes.get(digits + 1)?)?;
            let position = s[..digits].parse().ok()?;
            Some(Spec::Arg {
                position: Some(position),
                conversion,
                len: digits + 2,
            })
        }
        _ => None,
    }
}

/// Substitute `%L` / `%I` / `%s` placeholders in `template` with `args`.
///
/// Every placeholder must have an argument and every argument must be
/// referenced; otherwise a [`SqlError::Format`] is returned. A `%` that does
/// not start a placeholder is copied through unchanged.
pub fn format(template: &str, args: &[SqlValue]) -> SqlResult<String> {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut used = vec![false; args.len()];
    let mut next = 0usize;
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match parse_spec(after) {
            Some(Spec::Percent) => {
                out.push('%');
                rest = &after[1..];
            }
            Some(Spec::Arg {
                position,
                conversion,
                len,
            }) => {
                let idx = match position {
                    Some(0) => {
                        return Err(SqlError::format(
                            "argument positions start at 1, got %0$",
                        ));
                    }
                    Some(n) => n - 1,
                    None => next,
                };
                let arg = args.get(idx).ok_or_else(|| {
                    SqlError::format(format!(
                        "too few arguments: placeholder needs argument #{} but {} supplied",
                        idx + 1,
                        args.len()
                    ))
                })?;
                used[idx] = true;
                next = idx + 1;
                match conversion {
                    Conversion::Literal => out.push_str(&quote_literal(arg)),
                    Conversion::Ident => out.push_str(&quote_ident(arg)?),
                    Conversion::Str => out.push_str(&format_string(arg)),
                }
                rest = &after[len..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    if let Some(unused) = used.iter().position(|u| !u) {
        return Err(SqlError::format(format!(
            "too many arguments: argument #{} is never referenced ({} supplied)",
            unused + 1,
            args.len()
        )));
    }
    Ok(out)
}

/// Format a template with `%L` / `%I` / `%s` placeholders.
///
/// Each argument is converted with `SqlValue::from`. Evaluates to
/// `SqlResult<String>`.
///
/// ```ignore
/// let cond = medialib_sql::sql_fmt!("id = %L", 42)?;
/// assert_eq!(cond, "id = '42'");
/// ```
#[macro_export]
macro_rules! sql_fmt {
    ($template:expr $(, $arg:expr)* $(,)?) => {
        $crate::escape::format($template, &[$($crate::SqlValue::from($arg)),*])
    };
}
