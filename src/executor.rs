//! Serialized, batching execution of queueable statements over one connection.

mod job;
mod options;
mod worker;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

use crate::error::SqlExecutorError;
use crate::queryable::Queryable;

pub use job::Submission;
pub use options::{ExecutorOptions, ExecutorOptionsBuilder, RetryPolicy};

use job::Job;
use worker::{Command, run_executor_worker};

/// FIFO job queue owning the single shared connection.
///
/// Each submission becomes one job. Jobs run strictly one at a time in submission
/// order: connect (retrying per [`RetryPolicy`]), send the batch as one query, then
/// hand each statement its slice of the returned result sets.
///
/// ```rust,no_run
/// # async fn demo(queryable: std::sync::Arc<dyn sql_batch_executor::prelude::Queryable>)
/// #     -> Result<(), sql_batch_executor::prelude::SqlExecutorError> {
/// use sql_batch_executor::prelude::*;
///
/// let executor = SqlExecutor::new(queryable, ExecutorOptions::default())?;
/// let (insert, inserted) =
///     Insert::from_row("users", &Record::new().with("id", 1).with("name", "ann"))?
///         .into_statement();
/// let (lookup, name) = Lookup::value("users", "name", "id=1").into_statement();
///
/// let job = executor.submit(vec![insert.boxed(), lookup.boxed()])?;
/// job.await?;
/// assert_eq!(inserted.await?.affected_rows, 1);
/// assert_eq!(name.await?, Some(RowValues::Text("ann".into())));
/// executor.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SqlExecutor {
    sender: mpsc::UnboundedSender<Command>,
    next_job_id: AtomicU64,
}

impl SqlExecutor {
    /// Spawn the worker task on the current tokio runtime.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` when called outside a tokio runtime.
    pub fn new(
        queryable: Arc<dyn Queryable>,
        options: ExecutorOptions,
    ) -> Result<Self, SqlExecutorError> {
        let handle = Handle::try_current().map_err(|e| {
            SqlExecutorError::ConfigError(format!("SqlExecutor requires a tokio runtime: {e}"))
        })?;

        queryable.on_disconnected(Arc::new(|| {
            tracing::warn!("SQL Executor disconnected");
        }));

        let (sender, receiver) = mpsc::unbounded_channel();
        handle.spawn(run_executor_worker(
            queryable,
            options.connect_retry,
            receiver,
        ));

        Ok(Self {
            sender,
            next_job_id: AtomicU64::new(1),
        })
    }

    /// Enqueue one statement or an ordered batch. Returns immediately.
    ///
    /// # Errors
    /// `EmptyBatch` for an empty list, `ExecutorClosed` if the worker has stopped.
    pub fn submit(&self, submission: impl Into<Submission>) -> Result<JobHandle, SqlExecutorError> {
        let submission = submission.into();
        if submission.is_empty() {
            return Err(SqlExecutorError::EmptyBatch);
        }
        let id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        tracing::debug!(job = id, statements = submission.len(), "sql job queued");
        self.sender
            .send(Command::Run(Job::new(id, submission, tx)))
            .map_err(|_| SqlExecutorError::ExecutorClosed)?;
        Ok(JobHandle { id, receiver: rx })
    }

    /// Disconnect the shared connection once every job submitted before this call has
    /// finished. Nothing is cancelled; a later submission reconnects.
    ///
    /// # Errors
    /// Propagates the adapter's disconnect error, or `ExecutorClosed` if the worker stopped.
    pub async fn close(&self) -> Result<(), SqlExecutorError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(Command::Close { respond_to: tx })
            .map_err(|_| SqlExecutorError::ExecutorClosed)?;
        rx.await.map_err(|_| SqlExecutorError::ExecutorClosed)?
    }
}

/// Completion of one submitted job, separate from its statements' own handles.
#[must_use = "a job handle does nothing unless awaited"]
pub struct JobHandle {
    id: u64,
    receiver: oneshot::Receiver<Result<(), SqlExecutorError>>,
}

impl JobHandle {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for JobHandle {
    type Output = Result<(), SqlExecutorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(SqlExecutorError::ExecutorClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}
