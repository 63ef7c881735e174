// src/batch.rs
use futures::future::join_all;
use std::future::Future;

use crate::errors::{SparrowError, SparrowResult};

/// Settled results of one concurrent batch, split by outcome.
#[derive(Debug)]
pub struct BatchOutcome<K, T> {
    pub succeeded: Vec<(K, T)>,
    pub failed: Vec<(K, SparrowError)>,
}

impl<K, T> BatchOutcome<K, T> {
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Runs every keyed task concurrently and waits until all of them settle.
///
/// A failing task never short-circuits the others.
pub async fn settle_all<K, T, I, F>(tasks: I) -> BatchOutcome<K, T>
where
    I: IntoIterator<Item = (K, F)>,
    F: Future<Output = SparrowResult<T>>,
{
    let settled = join_all(
        tasks
            .into_iter()
            .map(|(key, task)| async move { (key, task.await) }),
    )
    .await;

    let mut outcome = BatchOutcome {
        succeeded: Vec::new(),
        failed: Vec::new(),
    };
    for (key, result) in settled {
        match result {
            Ok(value) => outcome.succeeded.push((key, value)),
            Err(err) => outcome.failed.push((key, err)),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failures_do_not_block_the_batch() {
        let tasks = (0..5).map(|i| {
            (i, async move {
                // Later tasks finish first
                tokio::time::sleep(Duration::from_millis(10 * (5 - i) as u64)).await;
                if i == 2 {
                    Err(SparrowError::bad_request("two"))
                } else {
                    Ok(i * 10)
                }
            })
        });

        let outcome = settle_all(tasks).await;
        assert_eq!(outcome.len(), 5);
        assert_eq!(outcome.succeeded, vec![(0, 0), (1, 10), (3, 30), (4, 40)]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let outcome = settle_all(Vec::<(u8, std::future::Ready<SparrowResult<()>>)>::new()).await;
        assert!(outcome.is_empty());
    }

    #[tokio::test]
    async fn test_tasks_run_concurrently() {
        let started = std::time::Instant::now();
        let tasks = (0..10).map(|i| {
            (i, async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, SparrowError>(())
            })
        });

        settle_all(tasks).await;
        assert!(started.elapsed() < Duration::from_millis(400));
    }
}
