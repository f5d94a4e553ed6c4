use std::sync::mpsc::Receiver;

use rusqlite::Connection;

use crate::sqlite::query::execute_script;

use super::channel::Command;

pub(super) fn run_sqlite_worker(conn: Connection, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::ExecuteScript { query, respond_to } => {
                let _ = respond_to.send(execute_script(&conn, &query));
            }
        }
    }
    if let Err((_, err)) = conn.close() {
        tracing::error!(error = %err, "failed to close SQLite connection");
    }
}
