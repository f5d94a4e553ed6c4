use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::SqlExecutorError;
use crate::results::ResultSet;

/// One pending logical operation, as seen by `SqlExecutor`.
///
/// The executor reads `query` and `statement_count` while assembling a batch, then calls
/// `process` exactly once with the batch's full result-set collection and this
/// statement's starting offset.
pub trait Queueable: Send {
    /// SQL text for this statement. Rendered lazily, right before execution.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::BuildError` if the statement cannot produce valid SQL.
    fn query(&self) -> Result<String, SqlExecutorError>;

    /// Number of result sets `query` produces. Fixed for a given instance.
    fn statement_count(&self) -> usize;

    /// Consume `results[offset .. offset + statement_count)` and resolve the future.
    ///
    /// # Errors
    /// `AlreadyProcessed` on a second call, `ResultsExhausted` if the slice is short, or
    /// whatever the value conversion reports.
    fn process(&mut self, results: &[ResultSet], offset: usize) -> Result<(), SqlExecutorError>;

    /// Resolve a not-yet-processed future with `StatementAbandoned`. No-op once processed.
    fn abandon(&mut self, cause: &SqlExecutorError);
}

/// Builder-facing half of a statement: renders SQL and turns its result sets into a value.
pub trait Produce: Send + 'static {
    type Output: Send + 'static;

    /// # Errors
    /// Returns `SqlExecutorError::BuildError` if there is not enough data to render SQL.
    fn query(&self) -> Result<String, SqlExecutorError>;

    fn statement_count(&self) -> usize {
        1
    }

    /// Build the caller-visible value. `results` holds exactly `statement_count` sets.
    ///
    /// # Errors
    /// Returns `SqlExecutorError` if the result sets cannot be converted.
    fn produce(&self, results: &[ResultSet]) -> Result<Self::Output, SqlExecutorError>;

    /// Wrap this producer into a queueable statement plus the handle that resolves with
    /// its value.
    fn into_statement(self) -> (Statement<Self>, StatementHandle<Self::Output>)
    where
        Self: Sized,
    {
        Statement::new(self)
    }
}

type ResolveCallback<T> = Box<dyn FnOnce(&T) + Send>;
type Outcome<T> = Result<T, SqlExecutorError>;

/// A producer paired with the single-assignment channel its caller awaits.
pub struct Statement<P: Produce> {
    producer: P,
    sender: Option<oneshot::Sender<Outcome<P::Output>>>,
    on_resolved: Option<ResolveCallback<P::Output>>,
}

impl<P: Produce> Statement<P> {
    #[must_use]
    pub fn new(producer: P) -> (Self, StatementHandle<P::Output>) {
        let (tx, rx) = oneshot::channel();
        let statement = Self {
            producer,
            sender: Some(tx),
            on_resolved: None,
        };
        (statement, StatementHandle { receiver: rx })
    }

    /// Run `callback` with the produced value just before the handle resolves.
    #[must_use]
    pub fn on_resolved(mut self, callback: impl FnOnce(&P::Output) + Send + 'static) -> Self {
        self.on_resolved = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn producer(&self) -> &P {
        &self.producer
    }

    /// Box this statement for submission alongside statements of other types.
    #[must_use]
    pub fn boxed(self) -> Box<dyn Queueable> {
        Box::new(self)
    }
}

impl<P: Produce> Queueable for Statement<P> {
    fn query(&self) -> Result<String, SqlExecutorError> {
        self.producer.query()
    }

    fn statement_count(&self) -> usize {
        self.producer.statement_count()
    }

    fn process(&mut self, results: &[ResultSet], offset: usize) -> Result<(), SqlExecutorError> {
        if self.sender.is_none() {
            return Err(SqlExecutorError::AlreadyProcessed);
        }
        let end = offset.saturating_add(self.producer.statement_count());
        let slice = results
            .get(offset..end)
            .ok_or(SqlExecutorError::ResultsExhausted {
                offset: end,
                available: results.len(),
            })?;

        let value = self.producer.produce(slice)?;
        if let Some(callback) = self.on_resolved.take() {
            callback(&value);
        }
        if let Some(sender) = self.sender.take() {
            // The caller may have dropped its handle; the value is simply discarded then.
            let _ = sender.send(Ok(value));
        }
        Ok(())
    }

    fn abandon(&mut self, cause: &SqlExecutorError) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(Err(SqlExecutorError::StatementAbandoned(cause.to_string())));
        }
    }
}

/// Future resolving with a statement's value once its job demultiplexes it.
#[must_use = "a statement handle does nothing unless awaited"]
pub struct StatementHandle<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
}

impl<T> Future for StatementHandle<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(SqlExecutorError::StatementAbandoned(
                "statement dropped before it was processed".into(),
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}
