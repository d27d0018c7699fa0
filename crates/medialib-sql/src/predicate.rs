//! WHERE clause fragments and the AND/OR composer.
//!
//! A [`Predicate`] is either ready SQL text, a deferred producer of SQL text,
//! or absent. Callers build filters conditionally ("only filter by tag if tags
//! were supplied") and hand everything to [`combine_and`] / [`combine_or`],
//! which drop absent and empty entries without special-casing at each call
//! site.
//!
//! ```ignore
//! use medialib_sql::predicate::{self, combine_and};
//!
//! let title: Option<String> = None;
//! let where_sql = combine_and(&[
//!     predicate::like("v.title", title),
//!     predicate::eq("v.release_year", 1999),
//! ]);
//! assert_eq!(where_sql, "v.release_year = '1999'");
//! ```

use crate::error::SqlResult;
use crate::escape::{format_string, quote_literal};
use crate::stmt::Statement;
use crate::value::SqlValue;
use std::fmt;
use std::sync::Arc;

/// A single WHERE fragment.
#[derive(Clone, Default)]
pub enum Predicate {
    /// A complete boolean SQL expression.
    Literal(String),
    /// Evaluated each time the surrounding statement renders.
    Lazy(Arc<dyn Fn() -> String + Send + Sync>),
    /// Omitted from every group.
    #[default]
    Absent,
}

impl Predicate {
    /// A ready SQL expression, used verbatim.
    pub fn literal(sql: impl Into<String>) -> Self {
        Predicate::Literal(sql.into())
    }

    /// A deferred SQL expression.
    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Predicate::Lazy(Arc::new(f))
    }

    /// `true` only for [`Predicate::Absent`]; a literal may still render empty.
    pub fn is_absent(&self) -> bool {
        matches!(self, Predicate::Absent)
    }

    /// Evaluate the fragment. Absent or empty fragments yield `None`.
    pub fn resolve(&self) -> Option<String> {
        let sql = match self {
            Predicate::Literal(s) => s.clone(),
            Predicate::Lazy(f) => f(),
            Predicate::Absent => return None,
        };
        (!sql.trim().is_empty()).then_some(sql)
    }

    /// All of `fragments`, as one fragment. Absent when nothing survives.
    pub fn all<'a, I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = &'a Predicate>,
    {
        non_empty(combine_and(fragments))
    }

    /// Any of `fragments`, as one parenthesised fragment. Absent when nothing survives.
    pub fn any<'a, I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = &'a Predicate>,
    {
        non_empty(combine_or(fragments))
    }
}

fn non_empty(sql: String) -> Predicate {
    if sql.is_empty() {
        Predicate::Absent
    } else {
        Predicate::Literal(sql)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Predicate::Lazy(_) => f.debug_tuple("Lazy").field(&"<fn>").finish(),
            Predicate::Absent => f.write_str("Absent"),
        }
    }
}

impl From<&str> for Predicate {
    fn from(sql: &str) -> Self {
        Predicate::Literal(sql.to_string())
    }
}

impl From<String> for Predicate {
    fn from(sql: String) -> Self {
        Predicate::Literal(sql)
    }
}

impl From<&String> for Predicate {
    fn from(sql: &String) -> Self {
        Predicate::Literal(sql.clone())
    }
}

impl From<&Predicate> for Predicate {
    fn from(p: &Predicate) -> Self {
        p.clone()
    }
}

impl<T: Into<Predicate>> From<Option<T>> for Predicate {
    fn from(p: Option<T>) -> Self {
        p.map_or(Predicate::Absent, Into::into)
    }
}

fn resolved<'a, I>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Predicate>,
{
    fragments.into_iter().filter_map(Predicate::resolve).collect()
}

/// Join the surviving fragments with ` AND `. Empty when none survive.
pub fn combine_and<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a Predicate>,
{
    resolved(fragments).join(" AND ")
}

/// Join the surviving fragments with ` OR ` inside parentheses. Empty when none survive.
pub fn combine_or<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a Predicate>,
{
    let parts = resolved(fragments);
    if parts.is_empty() {
        return String::new();
    }
    format!("({})", parts.join(" OR "))
}

/// `field = <literal>`, or absent when `value` is `NULL`.
pub fn eq(field: &str, value: impl Into<SqlValue>) -> Predicate {
    let value = value.into();
    if value.is_null() {
        return Predicate::Absent;
    }
    Predicate::Literal(format!("{field} = {}", quote_literal(&value)))
}

/// `field LIKE '%value%'`, or absent when `value` is `NULL` or empty text.
pub fn like(field: &str, value: impl Into<SqlValue>) -> Predicate {
    let value = value.into();
    if value.is_blank() {
        return Predicate::Absent;
    }
    let pattern = SqlValue::Text(format!("%{}%", format_string(&value)));
    Predicate::Literal(format!("{field} LIKE {}", quote_literal(&pattern)))
}

/// `field IN (<literals>)`. An empty list is the always-false `1=0`.
pub fn in_list<I, V>(field: &str, values: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<SqlValue>,
{
    let values: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
    if values.is_empty() {
        return Predicate::Literal("1=0".to_string());
    }
    let list = quote_literal(&SqlValue::List(values));
    Predicate::Literal(format!("{field} IN ({list})"))
}

/// `EXISTS(<statement>)`, rendering the nested statement now.
pub fn exists(statement: &Statement) -> SqlResult<Predicate> {
    let sql = statement.render()?;
    Ok(Predicate::Literal(format!("EXISTS({sql})")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn all_absent_yields_empty() {
        let fragments = [Predicate::Absent, Predicate::from(""), Predicate::from(None::<String>)];
        assert_eq!(combine_and(&fragments), "");
        assert_eq!(combine_or(&fragments), "");
        let none: &[Predicate] = &[];
        assert_eq!(combine_and(none), "");
        assert_eq!(combine_or(none), "");
    }

    #[test]
    fn and_skips_absent_entries() {
        let fragments = [
            Predicate::from("a = 1"),
            Predicate::Absent,
            Predicate::from("b = 2"),
            Predicate::lazy(String::new),
        ];
        assert_eq!(combine_and(&fragments), "a = 1 AND b = 2");
    }

    #[test]
    fn or_wraps_in_parentheses() {
        let fragments = [Predicate::from("a = 1"), Predicate::from("b = 2")];
        assert_eq!(combine_or(&fragments), "(a = 1 OR b = 2)");
        assert_eq!(combine_or(&[Predicate::from("a = 1")]), "(a = 1)");
    }

    #[test]
    fn lazy_is_invoked_on_every_combine() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let p = Predicate::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            "x = 1".to_string()
        });
        assert_eq!(combine_and([&p]), "x = 1");
        assert_eq!(combine_and([&p]), "x = 1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn eq_omits_absent_value() {
        assert!(eq("v.release_year", None::<i32>).is_absent());
        assert_eq!(
            eq("v.release_year", 1999).resolve().as_deref(),
            Some("v.release_year = '1999'")
        );
    }

    #[test]
    fn like_wraps_value_before_escaping() {
        assert_eq!(
            like("v.title", "it's").resolve().as_deref(),
            Some("v.title LIKE '%it''s%'")
        );
        assert!(like("v.title", "").is_absent());
        assert!(like("v.title", None::<&str>).is_absent());
    }

    #[test]
    fn in_list_renders_literals() {
        assert_eq!(
            in_list("id", [1, 2, 3]).resolve().as_deref(),
            Some("id IN ('1','2','3')")
        );
        assert_eq!(
            in_list("id", Vec::<i32>::new()).resolve().as_deref(),
            Some("1=0")
        );
    }

    #[test]
    fn any_and_all_nest() {
        let group = Predicate::any(&[Predicate::from("a"), Predicate::from("b")]);
        let out = combine_and(&[Predicate::from("c"), group]);
        assert_eq!(out, "c AND (a OR b)");
        assert!(Predicate::all(&[Predicate::Absent]).is_absent());
    }

    #[test]
    fn exists_renders_nested_statement() {
        let sub = Statement::new(("relation_video_tag", "r"))
            .unwrap()
            .select(["id"])
            .and("r.video_id = v.id");
        let p = exists(&sub).unwrap();
        assert_eq!(
            p.resolve().as_deref(),
            Some("EXISTS(SELECT id FROM relation_video_tag AS r WHERE r.video_id = v.id)")
        );
    }
}
