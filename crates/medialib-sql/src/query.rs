//! Running rendered statements and hand-written SQL.

use crate::client::GenericClient;
use crate::error::SqlResult;
use crate::row::FromRow;
use crate::stmt::Statement;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Something that can be turned into SQL text and run on a [`GenericClient`].
///
/// Implemented by [`Statement`] (rendered, no bind parameters) and [`Query`]
/// (raw text with `$n` parameters).
pub trait Executable: Sync {
    /// The SQL text to send.
    fn to_sql(&self) -> SqlResult<String>;

    /// Bind parameters, positional to `$1, $2, ...`.
    fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        Vec::new()
    }

    /// Execute and return all rows.
    fn fetch_all(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<Vec<Row>>> + Send {
        async move {
            let sql = self.to_sql()?;
            let params = self.params_ref();
            log_statement(&sql, params.len());
            conn.query(&sql, &params).await
        }
    }

    /// Execute and return the first row; [`crate::SqlError::NotFound`] when empty.
    fn fetch_one(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<Row>> + Send {
        async move {
            let sql = self.to_sql()?;
            let params = self.params_ref();
            log_statement(&sql, params.len());
            conn.query_one(&sql, &params).await
        }
    }

    /// Execute and return the first row, if any.
    fn fetch_opt(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<Option<Row>>> + Send {
        async move {
            let sql = self.to_sql()?;
            let params = self.params_ref();
            log_statement(&sql, params.len());
            conn.query_opt(&sql, &params).await
        }
    }

    fn fetch_all_as<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<Vec<T>>> + Send {
        async move {
            let rows = self.fetch_all(conn).await?;
            rows.iter().map(T::from_row).collect()
        }
    }

    fn fetch_one_as<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<T>> + Send {
        async move {
            let row = self.fetch_one(conn).await?;
            T::from_row(&row)
        }
    }

    fn fetch_opt_as<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<Option<T>>> + Send {
        async move {
            let row = self.fetch_opt(conn).await?;
            row.as_ref().map(T::from_row).transpose()
        }
    }

    /// Execute and return the number of affected rows.
    fn execute(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = SqlResult<u64>> + Send {
        async move {
            let sql = self.to_sql()?;
            let params = self.params_ref();
            log_statement(&sql, params.len());
            conn.execute(&sql, &params).await
        }
    }
}

impl Executable for Statement {
    fn to_sql(&self) -> SqlResult<String> {
        self.render()
    }
}

/// Hand-written SQL with type-safe parameter binding.
///
/// # Example
///
/// ```ignore
/// use medialib_sql::{Executable, query};
///
/// let id: i32 = query("UPDATE video_tag SET name = $1 WHERE id = $2 RETURNING id")
///     .bind(name)
///     .bind(tag_id)
///     .fetch_one(&conn)
///     .await?
///     .get("id");
/// ```
pub struct Query {
    sql: String,
    params: Vec<Box<dyn ToSql + Sync + Send>>,
}

/// Create a new query with the given SQL
pub fn query(sql: impl Into<String>) -> Query {
    Query {
        sql: sql.into(),
        params: Vec::new(),
    }
}

impl Query {
    /// Bind the next `$n` parameter.
    pub fn bind<T: ToSql + Sync + Send + 'static>(mut self, value: T) -> Self {
        self.params.push(Box::new(value));
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

impl Executable for Query {
    fn to_sql(&self) -> SqlResult<String> {
        Ok(self.sql.clone())
    }

    fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref() as _).collect()
    }
}

#[inline]
fn log_statement(sql: &str, param_count: usize) {
    #[cfg(feature = "tracing")]
    tracing::debug!(target: "medialib.sql", sql, param_count, "executing statement");
    #[cfg(not(feature = "tracing"))]
    let _ = (sql, param_count);
}
