//! In-memory client and pool that record the SQL they are sent.

use medialib_sql::{ConnectionPool, GenericClient, Row, SqlError, SqlResult, ToSql};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<String>>>;

/// Answers every query with no rows and every statement with `affected` rows.
pub(crate) struct RecordingClient {
    log: Log,
    affected: u64,
    fail_on: Option<&'static str>,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self {
            log: Log::default(),
            affected: 1,
            fail_on: None,
        }
    }
}

impl RecordingClient {
    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) -> SqlResult<()> {
        self.log.lock().unwrap().push(sql.to_string());
        if self.fail_on.is_some_and(|prefix| sql.starts_with(prefix)) {
            return Err(SqlError::Connection(format!("{sql} failed")));
        }
        Ok(())
    }
}

impl GenericClient for RecordingClient {
    async fn query(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> SqlResult<Vec<Row>> {
        self.record(sql)?;
        Ok(Vec::new())
    }

    async fn execute(&self, sql: &str, _params: &[&(dyn ToSql + Sync)]) -> SqlResult<u64> {
        self.record(sql)?;
        Ok(self.affected)
    }

    async fn batch_execute(&self, sql: &str) -> SqlResult<()> {
        self.record(sql)
    }
}

/// Hands out [`RecordingClient`]s sharing one log with the pool events.
#[derive(Default)]
pub(crate) struct RecordingPool {
    log: Log,
    affected: Option<u64>,
    fail_on: Option<&'static str>,
}

impl RecordingPool {
    /// Statements report `affected` rows instead of one.
    pub(crate) fn affecting(affected: u64) -> Self {
        Self {
            affected: Some(affected),
            ..Self::default()
        }
    }

    pub(crate) fn failing_on(prefix: &'static str) -> Self {
        Self {
            fail_on: Some(prefix),
            ..Self::default()
        }
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, event: &str) {
        self.log.lock().unwrap().push(event.to_string());
    }
}

impl ConnectionPool for RecordingPool {
    type Connection = RecordingClient;

    async fn acquire(&self) -> SqlResult<RecordingClient> {
        self.push("acquire");
        Ok(RecordingClient {
            log: self.log.clone(),
            affected: self.affected.unwrap_or(1),
            fail_on: self.fail_on,
        })
    }

    fn release(&self, _conn: RecordingClient) {
        self.push("release");
    }

    fn discard(&self, _conn: RecordingClient) {
        self.push("discard");
    }
}
