//! Settle-all join for independent fallible tasks.
//!
//! Unlike `try_join_all`, nothing short-circuits: every task runs to
//! completion and its outcome is reported next to the key it was launched
//! with, in launch order.

use futures::future::join_all;
use std::future::Future;

/// Outcome of one keyed task.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled<K, T, E> {
    pub key: K,
    pub outcome: Result<T, E>,
}

impl<K, T, E> Settled<K, T, E> {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Runs every task concurrently on the current task and collects all
/// outcomes.
pub async fn settle_all<K, T, E, Fut>(tasks: impl IntoIterator<Item = (K, Fut)>) -> Vec<Settled<K, T, E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    let (keys, futures): (Vec<K>, Vec<Fut>) = tasks.into_iter().unzip();
    join_all(futures)
        .await
        .into_iter()
        .zip(keys)
        .map(|(outcome, key)| Settled { key, outcome })
        .collect()
}

/// Counts `(succeeded, failed)` outcomes.
pub fn tally<K, T, E>(settled: &[Settled<K, T, E>]) -> (usize, usize) {
    let succeeded = settled.iter().filter(|task| task.is_ok()).count();
    (succeeded, settled.len() - succeeded)
}
