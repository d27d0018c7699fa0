//! Statement builder for the fixed set of statement shapes the media library uses.
//!
//! A [`Statement`] is keyed to one table (with an optional alias) and
//! accumulates an operation kind, columns, predicates, pagination and rows.
//! Nothing is executed here: [`Statement::render`] turns the current state
//! into SQL text, and execution goes through [`crate::Executable`].
//!
//! # Safe defaults
//!
//! - DELETE and UPDATE refuse to render without a WHERE predicate.
//! - INSERT without rows fails unless [`EmptyInsertPolicy::Noop`] is chosen.
//! - A statement with no operation renders an inert no-op query.
//!
//! # Example
//!
//! ```ignore
//! use medialib_sql::{Column, Statement, predicate};
//!
//! let sql = Statement::new(("video", "v"))?
//!     .select([Column::new("v.id"), Column::aliased("v.release_year", "releaseDate")])
//!     .and(predicate::eq("v.release_year", 1999))
//!     .limit(20)
//!     .render()?;
//! assert_eq!(
//!     sql,
//!     r#"SELECT v.id, v.release_year AS "releaseDate" FROM video AS v WHERE v.release_year = '1999' LIMIT 20"#
//! );
//! # Ok::<(), medialib_sql::SqlError>(())
//! ```

mod record;
mod render;

pub use record::Record;
pub use render::NOOP_SQL;

use crate::error::{SqlError, SqlResult};
use crate::escape;
use crate::ident::{Ident, IntoIdent};
use crate::predicate::Predicate;
use crate::value::SqlValue;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// The operation a [`Statement`] renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Count,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Count => "count",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an INSERT with no rows renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyInsertPolicy {
    /// Fail with [`SqlError::EmptyInsert`].
    #[default]
    Error = 0,
    /// Render [`NOOP_SQL`].
    Noop = 1,
}

static PROCESS_EMPTY_INSERT: AtomicU8 = AtomicU8::new(EmptyInsertPolicy::Error as u8);

impl EmptyInsertPolicy {
    /// Set the policy that statements created from now on start with.
    pub fn set_process_default(policy: Self) {
        PROCESS_EMPTY_INSERT.store(policy as u8, Ordering::Relaxed);
    }

    /// The policy new statements start with ([`EmptyInsertPolicy::Error`] unless changed).
    pub fn process_default() -> Self {
        match PROCESS_EMPTY_INSERT.load(Ordering::Relaxed) {
            1 => EmptyInsertPolicy::Noop,
            _ => EmptyInsertPolicy::Error,
        }
    }
}

impl std::str::FromStr for EmptyInsertPolicy {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(EmptyInsertPolicy::Error),
            "noop" => Ok(EmptyInsertPolicy::Noop),
            other => Err(SqlError::Config(format!(
                "unknown empty insert policy '{other}' (expected 'error' or 'noop')"
            ))),
        }
    }
}

/// A projected column of a SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// A column reference or expression, rendered verbatim.
    Expr(String),
    /// `expr AS "alias"`.
    Aliased { expr: String, alias: String },
}

impl Column {
    pub fn new(expr: impl Into<String>) -> Self {
        Column::Expr(expr.into())
    }

    pub fn aliased(expr: impl Into<String>, alias: impl Into<String>) -> Self {
        Column::Aliased {
            expr: expr.into(),
            alias: alias.into(),
        }
    }

    pub(crate) fn to_sql(&self) -> String {
        match self {
            Column::Expr(expr) => expr.clone(),
            Column::Aliased { expr, alias } => {
                format!("{expr} AS \"{}\"", alias.replace('"', "\"\""))
            }
        }
    }
}

impl From<&str> for Column {
    fn from(expr: &str) -> Self {
        Column::new(expr)
    }
}

impl From<String> for Column {
    fn from(expr: String) -> Self {
        Column::Expr(expr)
    }
}

impl From<(&str, &str)> for Column {
    fn from((expr, alias): (&str, &str)) -> Self {
        Column::aliased(expr, alias)
    }
}

impl From<(String, String)> for Column {
    fn from((expr, alias): (String, String)) -> Self {
        Column::Aliased { expr, alias }
    }
}

/// Anything that names the target table of a [`Statement`].
///
/// Implemented for names (`"video"`, `"media_center.video"`), `(name, alias)`
/// pairs, [`Ident`], and `Option` of those (`None` is a missing name).
pub trait IntoTable {
    fn into_table(self) -> SqlResult<(Ident, Option<String>)>;
}

impl IntoTable for &str {
    fn into_table(self) -> SqlResult<(Ident, Option<String>)> {
        Ok((Ident::parse(self)?, None))
    }
}

impl IntoTable for String {
    fn into_table(self) -> SqlResult<(Ident, Option<String>)> {
        Ok((Ident::parse(&self)?, None))
    }
}

impl IntoTable for Ident {
    fn into_table(self) -> SqlResult<(Ident, Option<String>)> {
        Ok((self, None))
    }
}

impl<N: IntoIdent, A: Into<String>> IntoTable for (N, A) {
    fn into_table(self) -> SqlResult<(Ident, Option<String>)> {
        let (name, alias) = self;
        let alias = alias.into();
        if alias.is_empty() {
            return Err(SqlError::construction("table alias cannot be empty"));
        }
        Ok((name.into_ident()?, Some(alias)))
    }
}

impl<T: IntoTable> IntoTable for Option<T> {
    fn into_table(self) -> SqlResult<(Ident, Option<String>)> {
        self.ok_or_else(|| SqlError::construction("table name is required"))?
            .into_table()
    }
}

/// One SQL statement under construction.
///
/// Builder methods consume and return the statement; [`Statement::render`]
/// borrows it and can be called any number of times.
#[derive(Debug, Clone)]
pub struct Statement {
    table: Ident,
    alias: Option<String>,
    kind: Option<StatementKind>,
    /// SELECT projection
    columns: Vec<Column>,
    /// INSERT/UPDATE target columns
    targets: Vec<String>,
    /// INSERT/UPDATE rows, positional to `targets`
    rows: Vec<Vec<SqlValue>>,
    and_preds: Vec<Predicate>,
    or_preds: Vec<Predicate>,
    offset: Option<i64>,
    limit: Option<i64>,
    returning: Vec<String>,
    empty_insert: EmptyInsertPolicy,
}

impl Statement {
    /// Create a statement against `table`.
    ///
    /// Fails with [`SqlError::Construction`] when the name is empty or malformed.
    pub fn new(table: impl IntoTable) -> SqlResult<Self> {
        let (table, alias) = table.into_table()?;
        Ok(Self {
            table,
            alias,
            kind: None,
            columns: Vec::new(),
            targets: Vec::new(),
            rows: Vec::new(),
            and_preds: Vec::new(),
            or_preds: Vec::new(),
            offset: None,
            limit: None,
            returning: Vec::new(),
            empty_insert: EmptyInsertPolicy::process_default(),
        })
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn kind(&self) -> Option<StatementKind> {
        self.kind
    }

    // ==================== Operation ====================

    /// SELECT the given columns; no columns selects `*`.
    pub fn select<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.kind = Some(StatementKind::Select);
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// INSERT into the given columns; rows come from [`Statement::values`].
    pub fn insert<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = Some(StatementKind::Insert);
        self.targets = columns.into_iter().map(Into::into).collect();
        self
    }

    /// INSERT one row projected from `record`, skipping `NULL` values.
    pub fn insert_one(mut self, record: Record) -> Self {
        let (targets, row) = record.project();
        self.kind = Some(StatementKind::Insert);
        self.targets = targets;
        self.rows = vec![row];
        self
    }

    /// Append rows for INSERT. Arity is checked at render.
    pub fn values<I, R>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Vec<SqlValue>>,
    {
        self.rows.extend(rows.into_iter().map(Into::into));
        self
    }

    /// Append a single row for INSERT.
    pub fn value_row(mut self, row: impl Into<Vec<SqlValue>>) -> Self {
        self.rows.push(row.into());
        self
    }

    /// UPDATE the columns of `record`, skipping `NULL` values.
    ///
    /// Replaces any previously set target columns and rows.
    pub fn update(mut self, record: Record) -> Self {
        let (targets, row) = record.project();
        self.kind = Some(StatementKind::Update);
        self.targets = targets;
        self.rows = vec![row];
        self
    }

    pub fn delete(mut self) -> Self {
        self.kind = Some(StatementKind::Delete);
        self
    }

    pub fn count(mut self) -> Self {
        self.kind = Some(StatementKind::Count);
        self
    }

    // ==================== WHERE ====================

    /// AND a complete boolean expression (or a lazy/absent fragment).
    pub fn and(mut self, predicate: impl Into<Predicate>) -> Self {
        self.and_preds.push(predicate.into());
        self
    }

    /// Add a fragment to the OR group, which is ANDed with the rest as one unit.
    pub fn or(mut self, predicate: impl Into<Predicate>) -> Self {
        self.or_preds.push(predicate.into());
        self
    }

    /// AND `template` formatted with `args` (see [`crate::escape::format`]).
    pub fn and_fmt(self, template: &str, args: &[SqlValue]) -> SqlResult<Self> {
        let sql = escape::format(template, args)?;
        Ok(self.and(sql))
    }

    /// Add `template` formatted with `args` to the OR group.
    pub fn or_fmt(self, template: &str, args: &[SqlValue]) -> SqlResult<Self> {
        let sql = escape::format(template, args)?;
        Ok(self.or(sql))
    }

    /// AND every fragment that is not absent.
    pub fn and_all<I, P>(mut self, predicates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Predicate>,
    {
        self.and_preds.extend(
            predicates
                .into_iter()
                .map(Into::into)
                .filter(|p| !p.is_absent()),
        );
        self
    }

    // ==================== Pagination ====================

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set or clear OFFSET.
    pub fn offset_opt(mut self, offset: Option<i64>) -> Self {
        self.offset = offset;
        self
    }

    /// Set or clear LIMIT.
    pub fn limit_opt(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    // ==================== Options ====================

    pub fn on_empty_insert(mut self, policy: EmptyInsertPolicy) -> Self {
        self.empty_insert = policy;
        self
    }

    /// Extra RETURNING expressions for INSERT, after the inserted columns.
    pub fn returning<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.returning.extend(columns.into_iter().map(Into::into));
        self
    }
}
