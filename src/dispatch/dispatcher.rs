//! Admission-controlled task dispatcher

use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::future::Future;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

type TaskFn<A> = dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync;

struct QueueState<A> {
    pending: VecDeque<A>,
    in_flight: usize,
}

struct Inner<A> {
    limit: NonZeroUsize,
    task: Box<TaskFn<A>>,
    state: Mutex<QueueState<A>>,
}

/// Runs submitted work through a single task function, at most `limit` at a time.
///
/// `submit` never blocks and never rejects: work beyond the limit waits in a
/// FIFO queue. Completion of any task frees its slot and admits the oldest
/// waiting submission, including a task whose function or future panicked.
/// Task outcomes are the task function's own concern; callers that need
/// them pass a channel in `A`.
///
/// Must be used from within a tokio runtime.
pub struct BoundedDispatcher<A> {
    inner: Arc<Inner<A>>,
}

impl<A> Clone for BoundedDispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: Send + 'static> BoundedDispatcher<A> {
    /// Create a dispatcher running `task` with at most `limit` in flight
    pub fn new<F, Fut>(limit: NonZeroUsize, task: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                limit,
                task: Box::new(move |args| -> BoxFuture<'static, ()> { Box::pin(task(args)) }),
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    in_flight: 0,
                }),
            }),
        }
    }

    /// Queue one invocation and admit as much queued work as capacity allows
    pub fn submit(&self, args: A) {
        self.inner.lock().pending.push_back(args);
        Inner::admit(&self.inner);
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    #[cfg(test)]
    pub fn queued(&self) -> usize {
        self.inner.lock().pending.len()
    }
}

impl<A: Send + 'static> Inner<A> {
    fn lock(&self) -> MutexGuard<'_, QueueState<A>> {
        // Counters stay consistent even if a holder panicked
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(this: &Arc<Self>) {
        loop {
            // Dequeue order is FIFO; the task function runs outside the lock
            let args = {
                let mut state = this.lock();
                if state.in_flight >= this.limit.get() {
                    return;
                }
                let Some(args) = state.pending.pop_front() else {
                    return;
                };
                state.in_flight += 1;
                args
            };

            let task = match panic::catch_unwind(AssertUnwindSafe(|| (this.task)(args))) {
                Ok(task) => task,
                Err(_) => {
                    warn!("Dispatched task panicked before starting");
                    this.lock().in_flight -= 1;
                    continue;
                }
            };

            let inner = this.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::spawn(task).await {
                    warn!("Dispatched task aborted: {}", e);
                }
                inner.lock().in_flight -= 1;
                Inner::admit(&inner);
            });
        }
    }
}
