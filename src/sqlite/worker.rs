mod channel;
mod dispatcher;

use std::sync::mpsc::{self, Sender};
use std::thread;

use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::error::SqlExecutorError;
use crate::results::ResultSet;

use channel::Command;
use dispatcher::run_sqlite_worker;

/// Handle to the thread that owns the `rusqlite::Connection`.
pub(super) struct SqliteWorker {
    sender: Sender<Command>,
}

impl SqliteWorker {
    pub(super) fn spawn(conn: Connection, label: &str) -> Result<Self, SqlExecutorError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        thread::Builder::new()
            .name(format!("sqlite-worker-{label}"))
            .spawn(move || run_sqlite_worker(conn, &receiver))
            .map_err(|err| {
                SqlExecutorError::ConnectionError(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;
        Ok(Self { sender })
    }

    fn send_command(&self, command: Command) -> Result<(), SqlExecutorError> {
        self.sender
            .send(command)
            .map_err(|_| connection_error("SQLite worker closed"))
    }

    pub(super) async fn execute_script(
        &self,
        query: String,
    ) -> Result<Vec<ResultSet>, SqlExecutorError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::ExecuteScript {
            query,
            respond_to: tx,
        })?;
        rx.await
            .map_err(|_| connection_error("SQLite worker dropped while executing script"))?
    }

    pub(super) fn shutdown(&self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn connection_error(message: &str) -> SqlExecutorError {
    SqlExecutorError::ConnectionError(message.into())
}
