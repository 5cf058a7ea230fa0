//! Fixed-size worker pool with per-task failure isolation.

use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskFailure {
    pub organism: String,
    pub cause: String,
}

/// Tagged result of one organism task.
#[derive(Debug)]
pub struct TaskOutcome<R> {
    pub organism: String,
    pub result: Result<R, TaskFailure>,
}

/// Runs `task` for every item on a pool of `cores` threads. Errors and panics
/// become `TaskFailure`s; all outcomes are collected, in item order, before
/// returning.
pub fn run_isolated<T, R, L, F>(cores: usize, items: &[T], label: L, task: F) -> Result<Vec<TaskOutcome<R>>>
where
    T: Sync,
    R: Send,
    L: Fn(&T) -> String + Sync,
    F: Fn(&T) -> Result<R> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cores.max(1))
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build worker pool: {}", e))?;

    let outcomes = pool.install(|| {
        items
            .par_iter()
            .map(|item| {
                let organism = label(item);
                let result = match catch_unwind(AssertUnwindSafe(|| task(item))) {
                    Ok(Ok(report)) => Ok(report),
                    Ok(Err(err)) => Err(format!("{:#}", err)),
                    Err(panic) => Err(panic_message(panic.as_ref())),
                };
                let result = result.map_err(|cause| {
                    warn!(organism = %organism, cause = %cause, "organism task failed");
                    TaskFailure {
                        organism: organism.clone(),
                        cause,
                    }
                });
                TaskOutcome { organism, result }
            })
            .collect()
    });
    Ok(outcomes)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_failure_does_not_abort_the_batch() {
        let items = vec!["a", "bad", "c", "boom"];
        let outcomes = run_isolated(
            2,
            &items,
            |s| s.to_string(),
            |s| {
                if *s == "bad" {
                    anyhow::bail!("cannot read {}", s);
                }
                if *s == "boom" {
                    panic!("worker exploded");
                }
                Ok(s.len())
            },
        )
        .unwrap();
        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0].result.as_ref().ok(), Some(&1));
        let failure = outcomes[1].result.as_ref().unwrap_err();
        assert_eq!(failure.organism, "bad");
        assert!(failure.cause.contains("cannot read bad"));
        assert!(outcomes[3].result.as_ref().unwrap_err().cause.contains("exploded"));
        assert!(outcomes[2].result.is_ok());
    }
}
