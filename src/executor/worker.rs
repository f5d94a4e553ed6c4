use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::error::SqlExecutorError;
use crate::queryable::Queryable;

use super::job::Job;
use super::options::RetryPolicy;

pub(super) enum Command {
    Run(Job),
    Close {
        respond_to: oneshot::Sender<Result<(), SqlExecutorError>>,
    },
}

/// Drains commands one at a time. This task is the only code touching the connection.
pub(super) async fn run_executor_worker(
    queryable: Arc<dyn Queryable>,
    retry: RetryPolicy,
    mut receiver: mpsc::UnboundedReceiver<Command>,
) {
    while let Some(command) = receiver.recv().await {
        match command {
            Command::Run(job) => job.run(queryable.as_ref(), &retry).await,
            Command::Close { respond_to } => {
                let _ = respond_to.send(queryable.disconnect().await);
            }
        }
    }
    tracing::debug!("sql executor worker stopped");
}
