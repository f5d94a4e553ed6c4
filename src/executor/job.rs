use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::oneshot;

use crate::error::SqlExecutorError;
use crate::queryable::Queryable;
use crate::queueable::{Produce, Queueable, Statement};
use crate::results::ResultSet;

use super::options::RetryPolicy;

/// What one job executes: a single statement or an ordered batch sent as one query.
pub enum Submission {
    Single(Box<dyn Queueable>),
    Batch(Vec<Box<dyn Queueable>>),
}

impl Submission {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Submission::Single(_) => 1,
            Submission::Batch(items) => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total result sets the batch expects back.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        match self {
            Submission::Single(item) => item.statement_count(),
            Submission::Batch(items) => items.iter().map(|item| item.statement_count()).sum(),
        }
    }

    pub(crate) fn combined_query(&self, delimiter: &str) -> Result<String, SqlExecutorError> {
        match self {
            Submission::Single(item) => item.query(),
            Submission::Batch(items) => {
                let parts = items
                    .iter()
                    .map(|item| item.query())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(parts.join(delimiter))
            }
        }
    }

    pub(crate) fn demultiplex(&mut self, results: &[ResultSet]) -> Result<(), SqlExecutorError> {
        let items = match self {
            Submission::Single(item) => return item.process(results, 0),
            Submission::Batch(items) => items,
        };
        let mut offset = 0;
        for item in items.iter_mut() {
            if offset >= results.len() {
                return Err(SqlExecutorError::ResultsExhausted {
                    offset,
                    available: results.len(),
                });
            }
            tracing::trace!(offset, count = item.statement_count(), "demultiplexing statement");
            item.process(results, offset)?;
            offset += item.statement_count();
        }
        if offset < results.len() {
            tracing::debug!(
                consumed = offset,
                returned = results.len(),
                "batch left result sets unconsumed"
            );
        }
        Ok(())
    }

    fn abandon_pending(&mut self, cause: &SqlExecutorError) {
        match self {
            Submission::Single(item) => item.abandon(cause),
            Submission::Batch(items) => items.iter_mut().for_each(|item| item.abandon(cause)),
        }
    }
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submission")
            .field("statements", &self.len())
            .field("statement_count", &self.statement_count())
            .finish()
    }
}

impl From<Box<dyn Queueable>> for Submission {
    fn from(item: Box<dyn Queueable>) -> Self {
        Submission::Single(item)
    }
}

impl<P: Produce> From<Statement<P>> for Submission {
    fn from(statement: Statement<P>) -> Self {
        Submission::Single(Box::new(statement))
    }
}

impl From<Vec<Box<dyn Queueable>>> for Submission {
    fn from(items: Vec<Box<dyn Queueable>>) -> Self {
        Submission::Batch(items)
    }
}

impl FromIterator<Box<dyn Queueable>> for Submission {
    fn from_iter<I: IntoIterator<Item = Box<dyn Queueable>>>(iter: I) -> Self {
        Submission::Batch(iter.into_iter().collect())
    }
}

pub(crate) struct Job {
    id: u64,
    submission: Submission,
    respond_to: oneshot::Sender<Result<(), SqlExecutorError>>,
}

impl Job {
    pub(crate) fn new(
        id: u64,
        submission: Submission,
        respond_to: oneshot::Sender<Result<(), SqlExecutorError>>,
    ) -> Self {
        Self {
            id,
            submission,
            respond_to,
        }
    }

    /// Connect, execute, demultiplex, then resolve the job future. Statements left
    /// unprocessed by a failure are abandoned with the failure as cause.
    pub(crate) async fn run(mut self, queryable: &dyn Queryable, retry: &RetryPolicy) {
        let outcome = execute(queryable, &mut self.submission, retry, self.id).await;
        match &outcome {
            Ok(()) => tracing::debug!(job = self.id, "sql job completed"),
            Err(err) => {
                tracing::debug!(job = self.id, error = %err, "sql job failed");
                self.submission.abandon_pending(err);
            }
        }
        let _ = self.respond_to.send(outcome);
    }
}

async fn execute(
    queryable: &dyn Queryable,
    submission: &mut Submission,
    retry: &RetryPolicy,
    job: u64,
) -> Result<(), SqlExecutorError> {
    tracing::debug!(job, "sql job connecting");
    ensure_connected(queryable, retry).await?;

    let sql = submission.combined_query(queryable.statement_delimiter())?;
    tracing::debug!(job, statements = submission.len(), "sql job executing");
    let results = queryable.query(&sql).await?;

    tracing::debug!(job, result_sets = results.len(), "sql job demultiplexing");
    // Statement conversions and callbacks run on the worker; a panic fails this job only.
    catch_unwind(AssertUnwindSafe(|| submission.demultiplex(&results))).unwrap_or_else(|panic| {
        Err(SqlExecutorError::ExecutionError(format!(
            "statement panicked while processing results: {}",
            panic_message(panic.as_ref())
        )))
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

pub(crate) async fn ensure_connected(
    queryable: &dyn Queryable,
    retry: &RetryPolicy,
) -> Result<(), SqlExecutorError> {
    let mut attempts: u32 = 0;
    while !queryable.is_connected() {
        attempts = attempts.saturating_add(1);
        match queryable.connect().await {
            Ok(_) if queryable.is_connected() => break,
            Ok(_) => tracing::warn!(attempt = attempts, "sql connect attempt did not connect"),
            Err(err) => tracing::error!(attempt = attempts, error = %err, "sql connect attempt failed"),
        }
        if retry.exhausted(attempts) {
            return Err(SqlExecutorError::ConnectionError(format!(
                "gave up connecting after {attempts} attempts"
            )));
        }
        let backoff = retry.backoff();
        if backoff.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(backoff).await;
        }
    }
    Ok(())
}
