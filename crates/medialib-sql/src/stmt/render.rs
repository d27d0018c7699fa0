use super::{EmptyInsertPolicy, Statement, StatementKind};
use crate::error::{SqlError, SqlResult};
use crate::escape::{quote_ident_str, quote_literal};
use crate::ident::Ident;
use crate::predicate::{Predicate, combine_and, combine_or};
use crate::value::SqlValue;

/// Inert query rendered for statements with nothing to do.
pub const NOOP_SQL: &str = "SELECT 1 WHERE false";

impl Statement {
    /// Render the statement to SQL text.
    ///
    /// Rendering does not change the statement, and lazy predicates are
    /// evaluated again on every call.
    pub fn render(&self) -> SqlResult<String> {
        match self.kind {
            None => Ok(NOOP_SQL.to_string()),
            Some(StatementKind::Select) => Ok(self.render_select()),
            Some(StatementKind::Count) => Ok(self.render_count()),
            Some(StatementKind::Insert) => self.render_insert(),
            Some(StatementKind::Update) => self.render_update(),
            Some(StatementKind::Delete) => self.render_delete(),
        }
    }

    /// The combined WHERE expression, without the keyword. Empty when unfiltered.
    ///
    /// The OR group is parenthesised and ANDed with the other predicates.
    pub fn where_sql(&self) -> String {
        let or_group = Predicate::from(combine_or(&self.or_preds));
        combine_and(self.and_preds.iter().chain(std::iter::once(&or_group)))
    }

    fn render_select(&self) -> String {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| c.to_sql())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut sql = format!("SELECT {columns} FROM ");
        self.push_from(&mut sql);
        self.push_where(&mut sql);
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    fn render_count(&self) -> String {
        let mut sql = String::from("SELECT count(1)::int AS count FROM ");
        self.push_from(&mut sql);
        self.push_where(&mut sql);
        sql
    }

    fn render_insert(&self) -> SqlResult<String> {
        for row in &self.rows {
            self.check_arity(row)?;
        }
        // Past the arity check, no columns means only empty rows (an all-NULL record).
        if self.rows.is_empty() || self.targets.is_empty() {
            return match self.empty_insert {
                EmptyInsertPolicy::Noop => Ok(NOOP_SQL.to_string()),
                EmptyInsertPolicy::Error => Err(SqlError::EmptyInsert {
                    table: self.table.to_sql(),
                }),
            };
        }

        let columns = self.quoted_targets()?;
        let tuples: Vec<String> = self
            .rows
            .iter()
            .map(|row| format!("({})", literal_list(row)))
            .collect();

        let mut returning = columns.clone();
        returning.extend(self.returning.iter().cloned());
        if !self.targets.iter().any(|t| t == "id") && !self.returning.iter().any(|r| r == "id") {
            returning.push("id".to_string());
        }

        Ok(format!(
            "INSERT INTO {} ({}) VALUES {} RETURNING {};",
            self.table.to_sql(),
            columns.join(","),
            tuples.join(","),
            returning.join(",")
        ))
    }

    fn render_update(&self) -> SqlResult<String> {
        let where_sql = self.require_where(StatementKind::Update)?;
        let row = match self.rows.as_slice() {
            [row] => row,
            [] => return Err(SqlError::construction("UPDATE requires a row of values")),
            _ => {
                return Err(SqlError::construction(
                    "UPDATE takes exactly one row of values",
                ));
            }
        };
        if self.targets.is_empty() {
            return Err(SqlError::construction(format!(
                "UPDATE on '{}' has no columns to set",
                self.table
            )));
        }
        self.check_arity(row)?;

        let assignments = self
            .quoted_targets()?
            .into_iter()
            .zip(row)
            .map(|(column, value)| format!("{column} = {}", quote_literal(value)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = String::from("UPDATE ");
        self.push_from(&mut sql);
        sql.push_str(&format!(" SET {assignments} WHERE {where_sql};"));
        Ok(sql)
    }

    fn render_delete(&self) -> SqlResult<String> {
        let where_sql = self.require_where(StatementKind::Delete)?;
        let mut sql = String::from("DELETE FROM ");
        self.push_from(&mut sql);
        sql.push_str(&format!(" WHERE {where_sql};"));
        Ok(sql)
    }

    fn push_from(&self, sql: &mut String) {
        self.table.write_sql(sql);
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(&quote_ident_str(alias));
        }
    }

    fn push_where(&self, sql: &mut String) {
        let where_sql = self.where_sql();
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
    }

    fn require_where(&self, kind: StatementKind) -> SqlResult<String> {
        let where_sql = self.where_sql();
        if where_sql.is_empty() {
            return Err(SqlError::MissingWhere {
                kind: kind.as_str(),
                table: self.table.to_sql(),
            });
        }
        Ok(where_sql)
    }

    fn quoted_targets(&self) -> SqlResult<Vec<String>> {
        self.targets
            .iter()
            .map(|t| Ident::new(t).map(|ident| ident.to_sql()))
            .collect()
    }

    fn check_arity(&self, row: &[SqlValue]) -> SqlResult<()> {
        if row.len() != self.targets.len() {
            return Err(SqlError::RowArity {
                table: self.table.to_sql(),
                expected: self.targets.len(),
                got: row.len(),
            });
        }
        Ok(())
    }
}

fn literal_list(row: &[SqlValue]) -> String {
    row.iter().map(quote_literal).collect::<Vec<_>>().join(",")
}
