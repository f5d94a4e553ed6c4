//! `Queryable` adapter over a single `rusqlite` connection owned by a worker thread.

mod config;
mod query;
mod worker;

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::error::SqlExecutorError;
use crate::queryable::{DisconnectListener, DisconnectNotifier, Queryable};
use crate::results::ResultSet;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use query::{build_result_set, execute_script};

use worker::SqliteWorker;

/// `SQLite` adapter. `connect` opens the database and starts a dedicated worker thread;
/// `disconnect` stops it. Statements are delimited by `;`.
pub struct SqliteQueryable {
    options: SqliteOptions,
    worker: Mutex<Option<Arc<SqliteWorker>>>,
    notifier: DisconnectNotifier,
}

impl SqliteQueryable {
    #[must_use]
    pub fn new(options: SqliteOptions) -> Self {
        Self {
            options,
            worker: Mutex::new(None),
            notifier: DisconnectNotifier::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.options
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<SqliteWorker>>> {
        match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn current_worker(&self) -> Option<Arc<SqliteWorker>> {
        self.slot().clone()
    }

    /// Drop the worker if it is still `worker`, then tell listeners.
    fn mark_lost(&self, worker: &Arc<SqliteWorker>) {
        let lost = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(current) if Arc::ptr_eq(current, worker) => slot.take().is_some(),
                _ => false,
            }
        };
        if lost {
            self.notifier.notify();
        }
    }
}

#[async_trait]
impl Queryable for SqliteQueryable {
    async fn query(&self, sql: &str) -> Result<Vec<ResultSet>, SqlExecutorError> {
        let worker = self.current_worker().ok_or_else(|| {
            SqlExecutorError::ConnectionError("SQLite connection is not open".into())
        })?;
        match worker.execute_script(sql.to_string()).await {
            Ok(results) => Ok(results),
            Err(SqlExecutorError::ConnectionError(msg)) => {
                self.mark_lost(&worker);
                Err(SqlExecutorError::ConnectionError(msg))
            }
            Err(err) => Err(SqlExecutorError::ExecutionError(err.to_string())),
        }
    }

    async fn connect(&self) -> Result<bool, SqlExecutorError> {
        if self.is_connected() {
            return Ok(true);
        }
        let options = self.options.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&options))
            .await
            .map_err(|e| {
                SqlExecutorError::ConnectionError(format!("SQLite open task failed: {e}"))
            })??;
        let worker = SqliteWorker::spawn(conn, &self.options.db_path)?;
        *self.slot() = Some(Arc::new(worker));
        tracing::debug!(db_path = %self.options.db_path, "sqlite connection opened");
        Ok(true)
    }

    async fn disconnect(&self) -> Result<(), SqlExecutorError> {
        let worker = self.slot().take();
        if let Some(worker) = worker {
            worker.shutdown();
            tracing::debug!(db_path = %self.options.db_path, "sqlite connection closed");
            self.notifier.notify();
        }
        Ok(())
    }

    fn statement_delimiter(&self) -> &str {
        ";"
    }

    fn is_connected(&self) -> bool {
        self.slot().is_some()
    }

    fn on_disconnected(&self, listener: DisconnectListener) {
        self.notifier.attach(listener);
    }
}

fn open_connection(options: &SqliteOptions) -> Result<Connection, SqlExecutorError> {
    let conn = Connection::open(&options.db_path).map_err(|e| {
        SqlExecutorError::ConnectionError(format!(
            "failed to open SQLite database {}: {e}",
            options.db_path
        ))
    })?;
    if let Some(timeout) = options.busy_timeout() {
        conn.busy_timeout(timeout)?;
    }
    Ok(conn)
}
