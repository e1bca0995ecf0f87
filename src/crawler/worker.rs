//! Crawl runners
//!
//! A runner repeatedly takes a relay from the frontier, loads it, stores what it
//! learned and schedules the relay's unseen neighbours. An empty frontier makes it
//! sleep for the poll interval; `signal_end` stops it at its next wake-up.

use crate::address::clean_name;
use crate::crawler::client::Probe;
use crate::crawler::facts::{
    detected_statements, neighbour_statements, relay_statements, user_statements,
};
use crate::crawler::frontier::{Frontier, VisitedSet};
use crate::crawler::task::RelayTask;
use crate::storage::{GraphStore, Statement};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Run state shared between a runner and the manager
#[derive(Debug)]
pub struct WorkerStatus {
    running: AtomicBool,
    idle: AtomicBool,
}

impl Default for WorkerStatus {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(true),
            idle: AtomicBool::new(true),
        }
    }
}

impl WorkerStatus {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.idle.load(Ordering::SeqCst)
    }

    /// Asks the runner to stop; takes effect at its next poll
    pub fn signal_end(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Sets the idle flag, returning the previous value
    fn set_idle(&self, idle: bool) -> bool {
        self.idle.swap(idle, Ordering::SeqCst)
    }
}

/// Behaviour switches shared by all runners
#[derive(Debug, Clone)]
pub struct CrawlPolicy {
    /// Record relay-list authors and the relays they use
    pub push_users: bool,
    pub poll_interval: Duration,
}

/// Counters aggregated across runners
#[derive(Debug, Default)]
pub struct CrawlCounters {
    pub processed: AtomicUsize,
    pub valid: AtomicUsize,
    pub rejected: AtomicUsize,
    pub enqueued: AtomicUsize,
    pub storage_failures: AtomicUsize,
}

/// Completes one dequeued task when dropped, also when the runner unwinds
struct Completion<'a>(&'a Frontier);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.complete();
    }
}

/// A crawl runner
pub struct Worker {
    id: usize,
    frontier: Arc<Frontier>,
    visited: Arc<VisitedSet>,
    store: Arc<dyn GraphStore>,
    probe: Probe,
    policy: CrawlPolicy,
    status: Arc<WorkerStatus>,
    counters: Arc<CrawlCounters>,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        frontier: Arc<Frontier>,
        visited: Arc<VisitedSet>,
        store: Arc<dyn GraphStore>,
        probe: Probe,
        policy: CrawlPolicy,
        status: Arc<WorkerStatus>,
        counters: Arc<CrawlCounters>,
    ) -> Self {
        Self {
            id,
            frontier,
            visited,
            store,
            probe,
            policy,
            status,
            counters,
        }
    }

    /// Processes relays until `signal_end` is observed
    pub async fn run(self) {
        tracing::debug!("Runner {} started", self.id);

        while self.status.is_running() {
            match self.frontier.dequeue() {
                Some(task) => {
                    let _completion = Completion(&self.frontier);
                    if self.status.set_idle(false) {
                        tracing::trace!("Runner {} active", self.id);
                    }
                    self.handle_relay(task).await;
                }
                None => {
                    if !self.status.set_idle(true) {
                        tracing::trace!("Runner {} idle", self.id);
                    }
                    tokio::time::sleep(self.policy.poll_interval).await;
                }
            }
        }

        tracing::debug!("Runner {} stopped", self.id);
    }

    /// Loads one relay, stores its facts and schedules its neighbours
    pub async fn handle_relay(&self, mut task: RelayTask) {
        tracing::debug!(
            "Runner {} loading {} (budget {})",
            self.id,
            task.address,
            task.recursion_budget
        );
        task.load(&self.probe).await;

        self.counters.processed.fetch_add(1, Ordering::Relaxed);
        if task.validation.is_valid() {
            self.counters.valid.fetch_add(1, Ordering::Relaxed);
        } else {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        }

        self.persist(&task.normalized, &relay_statements(&task));

        if task.recursion_budget == 0 || !task.validation.is_valid() {
            return;
        }

        tracing::info!("Found {} neighbours on {}", task.neighbors.len(), task.address);
        for address in &task.neighbors {
            self.schedule_neighbour(&task, address).await;
        }

        if self.policy.push_users {
            self.persist(&task.normalized, &user_statements(&task.peer_events));
        }
    }

    async fn schedule_neighbour(&self, parent: &RelayTask, address: &str) {
        let normalized = clean_name(address);
        if normalized.is_empty() || normalized == parent.normalized {
            return;
        }

        if !self.visited.mark_if_absent(&normalized) {
            self.persist(
                &normalized,
                &detected_statements(&parent.normalized, &normalized),
            );
            return;
        }

        let Some(mut child) = parent.child(address) else {
            return;
        };
        let valid = child.validate(self.probe.resolver.as_ref()).await;
        self.persist(
            &child.normalized,
            &neighbour_statements(&parent.normalized, &child),
        );

        if valid {
            self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
            self.frontier.enqueue(child);
        } else {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Executes statements, logging failures instead of stopping the runner
    fn persist(&self, relay: &str, statements: &[Statement]) {
        for statement in statements {
            if let Err(e) = self.store.execute(statement) {
                self.counters.storage_failures.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    "Runner {} failed to store facts for {}: {}",
                    self.id,
                    relay,
                    e
                );
            }
        }
    }
}
