//! SQL identifier handling.
//!
//! [`Ident`] represents a table or column name, optionally schema-qualified.
//! Parts written bare are quoted only when PostgreSQL would otherwise fold or
//! reject them (see [`crate::escape::quote_ident_str`]); parts written in
//! double quotes are always emitted quoted.
//!
//! # Example
//! ```ignore
//! use medialib_sql::Ident;
//!
//! assert_eq!(Ident::parse("media_center.video")?.to_sql(), "media_center.video");
//! assert_eq!(Ident::parse("VideoTag")?.to_sql(), r#""VideoTag""#);
//! assert_eq!(Ident::parse(r#"public."select""#)?.to_sql(), r#"public."select""#);
//! # Ok::<(), medialib_sql::SqlError>(())
//! ```

use crate::error::{SqlError, SqlResult};
use crate::escape::quote_ident_str;
use std::fmt;

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Written bare: emitted as-is when it is a plain lower-case name, quoted otherwise.
    Bare(String),
    /// Written in double quotes: always emitted quoted.
    Quoted(String),
}

impl IdentPart {
    /// The unescaped name of this part.
    pub fn name(&self) -> &str {
        match self {
            IdentPart::Bare(s) | IdentPart::Quoted(s) => s,
        }
    }
}

/// A SQL identifier (column, table, or schema-qualified name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    /// A single-part identifier. Dots are part of the name, not separators.
    pub fn new(name: &str) -> SqlResult<Self> {
        check_name(name)?;
        Ok(Self {
            parts: vec![IdentPart::Bare(name.to_string())],
        })
    }

    /// A single-part identifier that is always emitted quoted.
    pub fn quoted(name: &str) -> SqlResult<Self> {
        check_name(name)?;
        Ok(Self {
            parts: vec![IdentPart::Quoted(name.to_string())],
        })
    }

    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table`
    /// - Quoted: `"CamelCase"."UserTable"`
    /// - Mixed: `public."UserTable".id`
    pub fn parse(s: &str) -> SqlResult<Self> {
        if s.is_empty() {
            return Err(SqlError::construction("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(SqlError::construction(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(SqlError::construction("Trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(SqlError::construction(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            // "" inside a quoted part is an escaped quote
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                name.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(SqlError::construction("Unclosed quoted identifier"));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(SqlError::construction("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                if c == '"' {
                    return Err(SqlError::construction(format!(
                        "Unexpected '\"' inside identifier segment '{name}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(SqlError::construction("Empty identifier segment"));
            }
            parts.push(IdentPart::Bare(name));
        }

        if parts.is_empty() {
            return Err(SqlError::construction("Empty identifier"));
        }

        Ok(Self { parts })
    }

    /// The identifier parts, outermost (schema) first.
    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// The unescaped name of the last part (e.g. the table of `schema.table`).
    pub fn name(&self) -> &str {
        self.parts.last().map_or("", IdentPart::name)
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.parts.iter().map(|p| p.name().len() + 3).sum());
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Bare(s) => out.push_str(&quote_ident_str(s)),
                IdentPart::Quoted(s) => {
                    out.push('"');
                    for ch in s.chars() {
                        if ch == '"' {
                            out.push('"');
                        }
                        out.push(ch);
                    }
                    out.push('"');
                }
            }
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn check_name(name: &str) -> SqlResult<()> {
    if name.is_empty() {
        return Err(SqlError::construction("Identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(SqlError::construction(
            "Identifier cannot contain NUL character",
        ));
    }
    Ok(())
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> SqlResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> SqlResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> SqlResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> SqlResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> SqlResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> SqlResult<Ident> {
        Ident::parse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("video").unwrap();
        assert_eq!(ident.to_sql(), "video");
    }

    #[test]
    fn ident_dotted() {
        let ident = Ident::parse("media_center.video_tag").unwrap();
        assert_eq!(ident.to_sql(), "media_center.video_tag");
        assert_eq!(ident.name(), "video_tag");
    }

    #[test]
    fn ident_mixed_case_gets_quoted() {
        let ident = Ident::parse("VideoTag").unwrap();
        assert_eq!(ident.to_sql(), r#""VideoTag""#);
    }

    #[test]
    fn ident_reserved_word_gets_quoted() {
        let ident = Ident::parse("user.order").unwrap();
        assert_eq!(ident.to_sql(), r#""user"."order""#);
    }

    #[test]
    fn ident_quoted_with_escape() {
        let ident = Ident::parse(r#""has""quote""#).unwrap();
        assert_eq!(ident.to_sql(), r#""has""quote""#);
    }

    #[test]
    fn ident_mixed_quoted_bare() {
        let ident = Ident::parse(r#"public."UserTable".id"#).unwrap();
        assert_eq!(ident.to_sql(), r#"public."UserTable".id"#);
    }

    #[test]
    fn ident_with_space_is_quoted_not_rejected() {
        let ident = Ident::parse("my table").unwrap();
        assert_eq!(ident.to_sql(), r#""my table""#);
    }

    #[test]
    fn ident_new_keeps_dots_inside_name() {
        let ident = Ident::new("a.b").unwrap();
        assert_eq!(ident.to_sql(), r#""a.b""#);
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::new("").is_err());
    }

    #[test]
    fn ident_rejects_double_dot() {
        assert!(Ident::parse("schema..table").is_err());
    }

    #[test]
    fn ident_rejects_trailing_dot() {
        assert!(Ident::parse("schema.").is_err());
    }

    #[test]
    fn ident_rejects_unclosed_quote() {
        assert!(Ident::parse(r#""unclosed"#).is_err());
    }

    #[test]
    fn ident_rejects_nul() {
        assert!(Ident::parse("a\0b").unwrap_err().is_construction());
    }
}
