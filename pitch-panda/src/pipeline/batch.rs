//! Bounded parallel execution for per-item LLM calls

use anyhow::{anyhow, Result};
use futures::{stream::FuturesUnordered, Future, StreamExt};
use tokio::sync::Semaphore;

/// Context provided to each task in a batch
#[derive(Debug, Clone, Copy)]
pub struct TaskContext {
    /// Position of the item in the input (0-indexed)
    pub index: usize,
    /// Task number (1-indexed for display)
    pub task_number: usize,
    /// Total number of tasks in this batch
    pub total_tasks: usize,
}

/// Run `task_executor` over `items` with at most `concurrency` in flight.
///
/// Unlike a fail-fast batch, every item runs to completion: the result of
/// each task is returned next to its [`TaskContext`] and results come back
/// in input order. A `concurrency` of 0 is treated as 1.
///
/// Futures are polled on the calling task, so the executor may borrow from
/// the caller's stack.
pub async fn execute_batch<T, F, Fut, R>(
    items: Vec<T>,
    concurrency: usize,
    task_executor: F,
) -> Vec<(TaskContext, Result<R>)>
where
    F: Fn(T, TaskContext) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let total = items.len();
    let sem = Semaphore::new(concurrency.max(1));
    let sem = &sem;
    let executor = &task_executor;
    let mut tasks = FuturesUnordered::new();

    for (index, item) in items.into_iter().enumerate() {
        let ctx = TaskContext {
            index,
            task_number: index + 1,
            total_tasks: total,
        };

        tasks.push(async move {
            // Blocks while `concurrency` tasks are running
            let result = match sem.acquire().await {
                Ok(_permit) => executor(item, ctx).await,
                Err(_) => Err(anyhow!("Semaphore closed")),
            };
            (ctx, result)
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(outcome) = tasks.next().await {
        results.push(outcome);
    }
    results.sort_by_key(|(ctx, _)| ctx.index);

    results
}
