//! Best-effort batch execution.
//!
//! Runs every task to completion and collects per-item outcomes; one
//! failing item never aborts its siblings. Callers report a summary
//! instead of raising on the first error.

use std::future::Future;

use futures::future::join_all;

/// Outcomes of a settled batch, in task order within each bucket.
#[derive(Debug)]
pub struct BatchOutcome<T, E> {
    pub succeeded: Vec<T>,
    pub failed: Vec<E>,
}

impl<T, E> BatchOutcome<T, E> {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Awaits every task and splits the results into successes and failures.
pub async fn settle_all<T, E, Fut>(tasks: Vec<Fut>) -> BatchOutcome<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    let results = join_all(tasks).await;

    let mut outcome = BatchOutcome {
        succeeded: Vec::new(),
        failed: Vec::new(),
    };
    for result in results {
        match result {
            Ok(value) => outcome.succeeded.push(value),
            Err(error) => outcome.failed.push(error),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn task(n: u32) -> Result<u32, String> {
        if n % 2 == 0 {
            Ok(n)
        } else {
            Err(format!("task {n} failed"))
        }
    }

    #[tokio::test]
    async fn test_settle_all_collects_both_buckets() {
        let outcome = settle_all(vec![task(0), task(1), task(2), task(3)]).await;

        assert_eq!(outcome.succeeded, vec![0, 2]);
        assert_eq!(outcome.failed, vec!["task 1 failed", "task 3 failed"]);
        assert_eq!(outcome.total(), 4);
        assert!(!outcome.all_succeeded());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        // A leading failure must not prevent later tasks from settling.
        let outcome = settle_all(vec![task(1), task(2), task(4)]).await;
        assert_eq!(outcome.succeeded, vec![2, 4]);
        assert_eq!(outcome.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let outcome: BatchOutcome<u32, String> =
            settle_all::<u32, String, std::future::Ready<Result<u32, String>>>(vec![]).await;
        assert!(outcome.all_succeeded());
        assert_eq!(outcome.total(), 0);
    }
}
