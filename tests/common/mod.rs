#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sql_batch_executor::prelude::*;

/// In-memory `Queryable` that records what it was asked to run and replays scripted
/// responses. Without a script, every `;`-separated statement yields `affected(1)`.
#[derive(Default)]
pub struct ScriptedQueryable {
    connected: AtomicBool,
    failing_connects: AtomicUsize,
    pub connect_attempts: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub listeners: AtomicUsize,
    queries: Mutex<Vec<String>>,
    responses: Mutex<VecDeque<Result<Vec<ResultSet>, SqlExecutorError>>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    query_delay: Mutex<Duration>,
    notifier: DisconnectNotifier,
}

impl ScriptedQueryable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next `count` connect attempts fail.
    pub fn failing_connects(count: usize) -> Arc<Self> {
        let adapter = Self::default();
        adapter.failing_connects.store(count, Ordering::SeqCst);
        Arc::new(adapter)
    }

    pub fn push_response(&self, response: Result<Vec<ResultSet>, SqlExecutorError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn set_query_delay(&self, delay: Duration) {
        *self.query_delay.lock().unwrap() = delay;
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Simulate the link dropping underneath the executor.
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.notifier.notify();
    }

    pub fn attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Queryable for ScriptedQueryable {
    async fn query(&self, sql: &str) -> Result<Vec<ResultSet>, SqlExecutorError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.queries.lock().unwrap().push(sql.to_string());

        let delay = *self.query_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match scripted {
            Some(response) => response,
            None => Ok(sql.split(';').map(|_| ResultSet::affected(1)).collect()),
        }
    }

    async fn connect(&self) -> Result<bool, SqlExecutorError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_connects.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_connects.store(remaining - 1, Ordering::SeqCst);
            return Err(SqlExecutorError::ConnectionError("connection refused".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn disconnect(&self) -> Result<(), SqlExecutorError> {
        self.connected.store(false, Ordering::SeqCst);
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.notifier.notify();
        Ok(())
    }

    fn statement_delimiter(&self) -> &str {
        ";"
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn on_disconnected(&self, listener: DisconnectListener) {
        self.listeners.fetch_add(1, Ordering::SeqCst);
        self.notifier.attach(listener);
    }
}

/// Result set with the given columns and rows.
pub fn rows(columns: &[&str], values: Vec<Vec<RowValues>>) -> ResultSet {
    let mut rs = ResultSet::with_capacity(values.len());
    rs.set_column_names(Arc::new(columns.iter().map(|c| (*c).to_string()).collect()));
    for row in values {
        rs.add_row_values(row);
    }
    rs
}
