use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::SqlExecutorError;
use crate::results::ResultSet;

/// Callback fired when an adapter loses (or drops) its connection.
pub type DisconnectListener = Arc<dyn Fn() + Send + Sync>;

/// A single connection that can run raw query text.
///
/// `SqlExecutor` is the only caller of `connect`, `query` and `disconnect`, one job at a
/// time, so implementations do not need to guard against overlapping queries.
#[async_trait]
pub trait Queryable: Send + Sync {
    /// Run `sql` (possibly several statements joined by `statement_delimiter`) and return
    /// one `ResultSet` per statement, in statement order.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ExecutionError` (or a backend error) if the query fails.
    async fn query(&self, sql: &str) -> Result<Vec<ResultSet>, SqlExecutorError>;

    /// Attempt to establish the connection. `Ok(false)` means "not yet, try again".
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConnectionError` if the attempt fails.
    async fn connect(&self) -> Result<bool, SqlExecutorError>;

    /// Tear down the connection.
    ///
    /// # Errors
    /// Returns `SqlExecutorError` if shutting down the backend fails.
    async fn disconnect(&self) -> Result<(), SqlExecutorError>;

    /// Text placed between statements when batching them into one query.
    fn statement_delimiter(&self) -> &str;

    fn is_connected(&self) -> bool;

    /// Register an observer for disconnect events. Diagnostic only.
    fn on_disconnected(&self, listener: DisconnectListener);
}

/// Listener registry adapters can embed to implement `Queryable::on_disconnected`.
#[derive(Default)]
pub struct DisconnectNotifier {
    listeners: Mutex<Vec<DisconnectListener>>,
}

impl DisconnectNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, listener: DisconnectListener) {
        let mut listeners = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners.push(listener);
    }

    /// Invoke every registered listener.
    pub fn notify(&self) {
        // Snapshot so listeners may attach further listeners without deadlocking.
        let snapshot: Vec<DisconnectListener> = match self.listeners.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for listener in snapshot {
            listener();
        }
    }
}

impl std::fmt::Debug for DisconnectNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.listeners.lock().map(|l| l.len()).unwrap_or_default();
        f.debug_struct("DisconnectNotifier")
            .field("listeners", &count)
            .finish()
    }
}
