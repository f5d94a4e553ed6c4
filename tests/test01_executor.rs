mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{ScriptedQueryable, rows};
use sql_batch_executor::prelude::*;

#[tokio::test]
async fn single_statement_resolves_from_its_own_result_set() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    adapter.push_response(Ok(vec![rows(
        &["name"],
        vec![vec![RowValues::Text("ann".into())]],
    )]));
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let (lookup, name) = Lookup::value("users", "name", "id=1").into_statement();
    executor.submit(lookup)?.await?;

    assert_eq!(name.await?, Some(RowValues::Text("ann".into())));
    assert_eq!(adapter.queries(), vec!["SELECT name FROM users WHERE id=1"]);
    assert_eq!(adapter.attempts(), 1);
    Ok(())
}

#[tokio::test]
async fn batch_is_one_query_and_each_statement_gets_its_slice() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    adapter.push_response(Ok(vec![
        ResultSet::affected(0),
        ResultSet::affected(0),
        ResultSet::affected(2),
        rows(
            &["a", "b"],
            vec![vec![RowValues::Int(1), RowValues::Text("y".into())]],
        ),
    ]));
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let (script, script_results) =
        RawStatement::with_count("CREATE TABLE t (a, b);DELETE FROM t", 2).into_statement();
    let first = Record::new().with("a", 1).with("b", "y");
    let second = Record::new().with("a", 2).with("b", "z");
    let (insert, inserted) = Insert::from_rows("t", [&first, &second])?.into_statement();
    let (lookup, found) = Lookup::values("t", ["a", "b"], "a=1").into_statement();

    let job = executor.submit(vec![script.boxed(), insert.boxed(), lookup.boxed()])?;
    job.await?;

    assert_eq!(
        adapter.queries(),
        vec![
            "CREATE TABLE t (a, b);DELETE FROM t;\
             INSERT INTO t (a,b) VALUES (1,'y'),(2,'z');\
             SELECT a,b FROM t WHERE a=1"
        ]
    );
    assert_eq!(script_results.await?.len(), 2);
    assert_eq!(inserted.await?, InsertResult { affected_rows: 2 });
    assert_eq!(
        found.await?,
        Some(vec![RowValues::Int(1), RowValues::Text("y".into())])
    );
    Ok(())
}

#[tokio::test]
async fn short_results_fail_the_job_with_results_exhausted() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    adapter.push_response(Ok(vec![ResultSet::affected(1)]));
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let row = Record::new().with("a", 1);
    let (first, first_done) = Insert::from_row("t", &row)?.into_statement();
    let (second, second_done) = Insert::from_row("t", &row)?.into_statement();
    let (third, third_done) = Insert::from_row("t", &row)?.into_statement();

    let outcome = executor
        .submit(vec![first.boxed(), second.boxed(), third.boxed()])?
        .await;

    match outcome {
        Err(SqlExecutorError::ResultsExhausted { offset, available }) => {
            assert_eq!(offset, 1);
            assert_eq!(available, 1);
        }
        other => panic!("expected ResultsExhausted, got {other:?}"),
    }
    assert_eq!(first_done.await?, InsertResult { affected_rows: 1 });
    assert!(matches!(
        second_done.await,
        Err(SqlExecutorError::StatementAbandoned(_))
    ));
    assert!(matches!(
        third_done.await,
        Err(SqlExecutorError::StatementAbandoned(_))
    ));
    Ok(())
}

#[tokio::test]
async fn jobs_run_in_submission_order_one_at_a_time() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    adapter.set_query_delay(Duration::from_millis(10));
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let resolved = Arc::new(Mutex::new(Vec::new()));
    let mut jobs = Vec::new();
    for i in 1..=3 {
        let order = resolved.clone();
        let (statement, _handle) = RawStatement::new(format!("SELECT {i}")).into_statement();
        let statement = statement.on_resolved(move |_| order.lock().unwrap().push(i));
        jobs.push(executor.submit(statement)?);
    }
    for job in jobs.into_iter().rev() {
        job.await?;
    }

    assert_eq!(adapter.queries(), vec!["SELECT 1", "SELECT 2", "SELECT 3"]);
    assert_eq!(*resolved.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(adapter.max_in_flight.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn connect_is_retried_until_it_succeeds() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::failing_connects(2);
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let (statement, handle) = RawStatement::new("SELECT 1").into_statement();
    executor.submit(statement)?.await?;
    handle.await?;

    assert_eq!(adapter.attempts(), 3);
    assert_eq!(adapter.queries().len(), 1);
    Ok(())
}

#[tokio::test]
async fn retry_limit_surfaces_connection_error() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::failing_connects(10);
    let executor = ExecutorOptions::builder()
        .max_connect_attempts(2)
        .connect_backoff(Duration::from_millis(1))
        .build(adapter.clone())?;

    let (statement, handle) = RawStatement::new("SELECT 1").into_statement();
    let outcome = executor.submit(statement)?.await;

    assert!(matches!(outcome, Err(SqlExecutorError::ConnectionError(_))));
    assert!(matches!(
        handle.await,
        Err(SqlExecutorError::StatementAbandoned(_))
    ));
    assert_eq!(adapter.attempts(), 2);
    assert!(adapter.queries().is_empty());
    Ok(())
}

#[tokio::test]
async fn build_error_fails_before_any_query() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let (lookup, looked_up) = Lookup::value("t", "a", "").into_statement();
    let (empty, _) = Insert::from_fields("t", ["a"]).into_statement();
    let outcome = executor.submit(vec![lookup.boxed(), empty.boxed()])?.await;

    assert!(matches!(outcome, Err(SqlExecutorError::BuildError(_))));
    assert!(matches!(
        looked_up.await,
        Err(SqlExecutorError::StatementAbandoned(_))
    ));
    assert!(adapter.queries().is_empty());
    Ok(())
}

#[tokio::test]
async fn execution_error_fails_only_its_own_job() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    adapter.push_response(Err(SqlExecutorError::ExecutionError("syntax error".into())));
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let (bad, bad_handle) = RawStatement::new("SELEC 1").into_statement();
    let (good, good_handle) = RawStatement::new("SELECT 1").into_statement();
    let bad_job = executor.submit(bad)?;
    let good_job = executor.submit(good)?;

    assert!(matches!(
        bad_job.await,
        Err(SqlExecutorError::ExecutionError(_))
    ));
    assert!(bad_handle.await.is_err());
    good_job.await?;
    assert_eq!(good_handle.await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_rejected_at_submission() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let outcome = executor.submit(Vec::<Box<dyn Queueable>>::new());
    assert!(matches!(outcome, Err(SqlExecutorError::EmptyBatch)));
    Ok(())
}

#[tokio::test]
async fn close_waits_for_earlier_jobs_and_later_jobs_reconnect() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    adapter.set_query_delay(Duration::from_millis(10));
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let (statement, handle) = RawStatement::new("SELECT 1").into_statement();
    let job = executor.submit(statement)?;
    executor.close().await?;

    assert_eq!(adapter.disconnects.load(Ordering::SeqCst), 1);
    assert!(!adapter.is_connected());
    job.await?;
    assert_eq!(handle.await?.len(), 1);

    let (again, _) = RawStatement::new("SELECT 2").into_statement();
    executor.submit(again)?.await?;
    assert_eq!(adapter.attempts(), 2);
    assert!(adapter.is_connected());
    Ok(())
}

#[tokio::test]
async fn panicking_callback_fails_only_its_own_job() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;

    let (doomed, doomed_handle) = RawStatement::new("SELECT 1").into_statement();
    let doomed = doomed.on_resolved(|_| panic!("callback blew up"));
    let (sibling, sibling_handle) = RawStatement::new("SELECT 2").into_statement();
    let failed = executor.submit(vec![doomed.boxed(), sibling.boxed()])?;

    match failed.await {
        Err(SqlExecutorError::ExecutionError(msg)) => assert!(msg.contains("callback blew up")),
        other => panic!("expected ExecutionError, got {other:?}"),
    }
    assert!(matches!(
        doomed_handle.await,
        Err(SqlExecutorError::StatementAbandoned(_))
    ));
    assert!(matches!(
        sibling_handle.await,
        Err(SqlExecutorError::StatementAbandoned(_))
    ));

    let (next, next_handle) = RawStatement::new("SELECT 3").into_statement();
    executor.submit(next)?.await?;
    assert_eq!(next_handle.await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn disconnect_notification_does_not_reconnect() -> Result<(), SqlExecutorError> {
    let adapter = ScriptedQueryable::new();
    let executor = SqlExecutor::new(adapter.clone(), ExecutorOptions::default())?;
    assert_eq!(adapter.listeners.load(Ordering::SeqCst), 1);

    let (first, _) = RawStatement::new("SELECT 1").into_statement();
    executor.submit(first)?.await?;
    assert_eq!(adapter.attempts(), 1);

    adapter.drop_connection();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(adapter.attempts(), 1);
    assert!(!adapter.is_connected());

    let (second, _) = RawStatement::new("SELECT 2").into_statement();
    executor.submit(second)?.await?;
    assert_eq!(adapter.attempts(), 2);
    assert!(adapter.is_connected());
    Ok(())
}

#[test]
fn executor_requires_a_runtime() {
    let adapter = ScriptedQueryable::new();
    let outcome = SqlExecutor::new(adapter, ExecutorOptions::default());
    assert!(matches!(outcome, Err(SqlExecutorError::ConfigError(_))));
}
