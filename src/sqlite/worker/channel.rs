use tokio::sync::oneshot;

use crate::error::SqlExecutorError;
use crate::results::ResultSet;

pub(super) enum Command {
    ExecuteScript {
        query: String,
        respond_to: oneshot::Sender<Result<Vec<ResultSet>, SqlExecutorError>>,
    },
    Shutdown,
}
