//! Pooled transactions: acquire a connection, BEGIN, run a unit of work, COMMIT or ROLLBACK.
//!
//! Every statement of the unit of work must go through the connection handed
//! to it; the pool may hand other requests different connections.
//!
//! # Example
//!
//! ```ignore
//! use medialib_sql::{Executable, Statement, run_transaction};
//!
//! let removed = run_transaction(&pool, move |tx| {
//!     Box::pin(async move {
//!         Statement::new("relation_video_tag")?
//!             .delete()
//!             .and_fmt("video_id = %L", &[id.into()])?
//!             .execute(tx)
//!             .await?;
//!         Statement::new("video")?
//!             .delete()
//!             .and_fmt("id = %L", &[id.into()])?
//!             .execute(tx)
//!             .await
//!     })
//! })
//! .await?;
//! ```

use crate::client::GenericClient;
use crate::error::{SqlError, SqlResult};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// A source of exclusive connection leases.
pub trait ConnectionPool: Send + Sync {
    type Connection: GenericClient;

    /// Take a connection out of the pool.
    fn acquire(&self) -> impl Future<Output = SqlResult<Self::Connection>> + Send;

    /// Return a healthy connection for reuse.
    fn release(&self, conn: Self::Connection) {
        drop(conn);
    }

    /// Drop a connection whose session state is unknown instead of reusing it.
    fn discard(&self, conn: Self::Connection);
}

/// Future returned by a unit of work, borrowing the leased connection.
pub type UnitOfWork<'c, T> = Pin<Box<dyn Future<Output = SqlResult<T>> + Send + 'c>>;

/// SQL transaction isolation levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Modes for the `BEGIN` statement. The default is a plain `BEGIN`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub isolation: Option<IsolationLevel>,
    pub read_only: bool,
    pub deferrable: bool,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation = Some(level);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = deferrable;
        self
    }

    /// The `BEGIN ...` statement for these options.
    pub fn begin_sql(&self) -> String {
        let mut modes = Vec::with_capacity(3);
        if let Some(level) = self.isolation {
            modes.push(format!("ISOLATION LEVEL {}", level.as_sql()));
        }
        if self.read_only {
            modes.push("READ ONLY".to_string());
        }
        if self.deferrable {
            modes.push("DEFERRABLE".to_string());
        }
        if modes.is_empty() {
            "BEGIN".to_string()
        } else {
            format!("BEGIN {}", modes.join(", "))
        }
    }
}

/// A connection lease with an open transaction.
///
/// Dropping the scope while the transaction is still open (early return,
/// panic, cancelled future) discards the connection instead of recycling it.
/// Otherwise the connection goes back to the pool.
pub struct TransactionScope<'p, P: ConnectionPool> {
    pool: &'p P,
    conn: Option<P::Connection>,
    open: bool,
}

impl<'p, P: ConnectionPool> TransactionScope<'p, P> {
    /// Acquire a connection and issue `BEGIN`.
    pub async fn begin(pool: &'p P) -> SqlResult<Self> {
        Self::begin_with(pool, TransactionOptions::default()).await
    }

    /// Acquire a connection and issue `BEGIN` with `options`.
    pub async fn begin_with(pool: &'p P, options: TransactionOptions) -> SqlResult<Self> {
        let conn = pool.acquire().await?;
        // Session state is unknown until BEGIN succeeds.
        let scope = Self {
            pool,
            conn: Some(conn),
            open: true,
        };
        let sql = options.begin_sql();
        scope.batch(&sql).await?;
        #[cfg(feature = "tracing")]
        tracing::debug!(target: "medialib.tx", begin = %sql, "transaction started");
        Ok(scope)
    }

    /// The leased connection. Run every statement of the transaction on it.
    pub fn connection(&self) -> SqlResult<&P::Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| SqlError::Connection("transaction scope has no connection".into()))
    }

    /// Issue `COMMIT`. On failure the transaction is rolled back.
    pub async fn commit(self) -> SqlResult<()> {
        self.finish(Ok(())).await
    }

    /// Issue `ROLLBACK`.
    pub async fn rollback(mut self) -> SqlResult<()> {
        self.batch("ROLLBACK").await?;
        self.open = false;
        Ok(())
    }

    /// Commit when `result` is `Ok`, roll back otherwise, and hand `result` back.
    ///
    /// A failing `COMMIT` is rolled back and its error returned. A failing
    /// `ROLLBACK` is logged and the connection discarded; the original error
    /// is still the one returned.
    pub async fn finish<T>(mut self, result: SqlResult<T>) -> SqlResult<T> {
        let error = match result {
            Ok(value) => {
                let committed = self.batch("COMMIT").await;
                match committed {
                    Ok(()) => {
                        self.open = false;
                        #[cfg(feature = "tracing")]
                        tracing::debug!(target: "medialib.tx", "transaction committed");
                        return Ok(value);
                    }
                    Err(commit_err) => commit_err,
                }
            }
            Err(error) => error,
        };

        #[cfg(feature = "tracing")]
        tracing::warn!(target: "medialib.tx", error = %error, "rolling back transaction");
        let rolled_back = self.batch("ROLLBACK").await;
        match rolled_back {
            Ok(()) => self.open = false,
            Err(_rollback_err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(
                    target: "medialib.tx",
                    error = %_rollback_err,
                    "rollback failed, discarding connection"
                );
            }
        }
        Err(error)
    }

    async fn batch(&self, sql: &str) -> SqlResult<()> {
        self.connection()?.batch_execute(sql).await
    }
}

impl<P: ConnectionPool> Drop for TransactionScope<'_, P> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if self.open {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                target: "medialib.tx",
                "transaction scope dropped while open, discarding connection"
            );
            self.pool.discard(conn);
        } else {
            self.pool.release(conn);
        }
    }
}

/// Run `unit` inside one transaction on one pooled connection.
///
/// Commits when `unit` succeeds; otherwise rolls back and returns the error
/// `unit` produced. The connection is released on every path.
pub async fn run_transaction<P, T, F>(pool: &P, unit: F) -> SqlResult<T>
where
    P: ConnectionPool,
    F: for<'c> FnOnce(&'c P::Connection) -> UnitOfWork<'c, T>,
{
    run_transaction_with(pool, TransactionOptions::default(), unit).await
}

/// [`run_transaction`] with explicit `BEGIN` options.
pub async fn run_transaction_with<P, T, F>(
    pool: &P,
    options: TransactionOptions,
    unit: F,
) -> SqlResult<T>
where
    P: ConnectionPool,
    F: for<'c> FnOnce(&'c P::Connection) -> UnitOfWork<'c, T>,
{
    let scope = TransactionScope::begin_with(pool, options).await?;
    let result = match scope.connection() {
        Ok(conn) => unit(conn).await,
        Err(e) => Err(e),
    };
    scope.finish(result).await
}

/// Runs the given block inside a pooled transaction.
///
/// - Acquires a connection from `$pool` and issues `BEGIN`.
/// - Binds the leased connection to `$tx` for the block.
/// - Commits on `Ok(_)`, rolls back on `Err(_)`.
///
/// The block must evaluate to `medialib_sql::SqlResult<T>`; so does the macro.
///
/// ```ignore
/// let id = medialib_sql::transaction!(&pool, tx, {
///     let row = Statement::new("video")?.insert_one(record).fetch_one(tx).await?;
///     Ok(row.get::<_, i32>("id"))
/// })?;
/// ```
#[macro_export]
macro_rules! transaction {
    ($pool:expr, $tx:ident, $body:block) => {{
        match $crate::transaction::TransactionScope::begin($pool).await {
            Ok(__medialib_scope) => {
                let __medialib_result = match __medialib_scope.connection() {
                    Ok($tx) => async { $body }.await,
                    Err(error) => Err(error),
                };
                __medialib_scope.finish(__medialib_result).await
            }
            Err(error) => Err(error),
        }
    }};
}
