//! Bounded map over a batch of items

use super::dispatcher::BoundedDispatcher;
use futures::future::join_all;
use std::future::Future;
use std::num::NonZeroUsize;
use tokio::sync::oneshot;

/// Run `op` on every item through a [`BoundedDispatcher`] and wait for all of them.
///
/// Results come back in submission order. An item whose task died without
/// reporting counts as `false`.
pub async fn fan_out<T, F, Fut>(limit: NonZeroUsize, items: Vec<T>, op: F) -> Vec<bool>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    if items.is_empty() {
        return Vec::new();
    }

    let dispatcher = BoundedDispatcher::new(limit, move |(item, done): (T, oneshot::Sender<bool>)| {
        let work = op(item);
        async move {
            let _ = done.send(work.await);
        }
    });

    let waiters: Vec<_> = items
        .into_iter()
        .map(|item| {
            let (tx, rx) = oneshot::channel();
            dispatcher.submit((item, tx));
            rx
        })
        .collect();

    join_all(waiters)
        .await
        .into_iter()
        .map(|result| result.unwrap_or(false))
        .collect()
}
