//! # medialib-sql
//!
//! Escaped SQL statement building and pooled transactions for the media library.
//!
//! ## Features
//!
//! - **Escaping**: `%L` / `%I` / `%s` templates with PostgreSQL quoting rules
//! - **Composable WHERE**: fragments may be text, deferred or absent; absent ones vanish
//! - **Safe defaults**: DELETE and UPDATE require WHERE, empty INSERT is an error
//! - **Transaction-friendly**: pass the leased connection anywhere a `GenericClient` is expected
//!
//! ## Statements
//!
//! ```ignore
//! use medialib_sql::{Executable, Record, Statement, predicate};
//!
//! // SELECT
//! let tags = Statement::new("video_tag")?
//!     .select(["id", "name"])
//!     .and(predicate::like("name", filter.name.as_deref()))
//!     .fetch_all(&client)
//!     .await?;
//!
//! // INSERT ... RETURNING id
//! let row = Statement::new("video_tag")?
//!     .insert_one(Record::new().set("name", "drama"))
//!     .fetch_one(&client)
//!     .await?;
//!
//! // DELETE (refuses to render without a predicate)
//! Statement::new("video_tag")?
//!     .delete()
//!     .and_fmt("id = %L", &[tag_id.into()])?
//!     .execute(&client)
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod escape;
pub mod ident;
pub mod predicate;
pub mod query;
pub mod row;
pub mod stmt;
pub mod transaction;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

pub use client::GenericClient;
pub use config::DbConfig;
pub use error::{SqlError, SqlResult};
pub use escape::{format, quote_ident, quote_literal};
pub use ident::{Ident, IntoIdent};
pub use predicate::{Predicate, combine_and, combine_or};
pub use query::{Executable, Query, query};
pub use row::{FromRow, RowExt};
pub use stmt::{Column, EmptyInsertPolicy, NOOP_SQL, Record, Statement, StatementKind};
pub use transaction::{
    ConnectionPool, IsolationLevel, TransactionOptions, TransactionScope, UnitOfWork,
    run_transaction, run_transaction_with,
};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

// Re-export the driver types that appear in public signatures.
pub use tokio_postgres::Row;
pub use tokio_postgres::types::ToSql;
