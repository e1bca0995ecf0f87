//! Shared work queue and visited set
//!
//! The frontier tracks every task that is queued or being processed. Runners call
//! [`Frontier::complete`] only after enqueuing a task's children, so the outstanding
//! count reaches zero exactly when no work is left anywhere.

use crate::crawler::task::RelayTask;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Notify;

/// FIFO of pending relay tasks
#[derive(Debug, Default)]
pub struct Frontier {
    queue: Mutex<VecDeque<RelayTask>>,
    outstanding: AtomicUsize,
    drained: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task and counts it as outstanding
    pub fn enqueue(&self, task: RelayTask) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(task);
    }

    /// Removes the oldest task; never blocks
    pub fn dequeue(&self) -> Option<RelayTask> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Tasks queued or still being processed
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Marks a dequeued task as finished
    pub fn complete(&self) {
        let previous = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match previous {
            Ok(1) => self.drained.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::warn!("Frontier completion without an outstanding task"),
        }
    }

    /// Waits until every enqueued task has completed
    pub async fn wait_until_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Register before checking so a completion in between is not missed
            notified.as_mut().enable();
            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Normalized addresses that have ever been scheduled
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the address; returns true only for the first caller
    pub fn mark_if_absent(&self, normalized: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalized.to_string())
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(normalized)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
