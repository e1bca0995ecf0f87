//! Crawl manager - owns the shared state and the runner pool
//!
//! The manager:
//! - Merges the NIP nodes every relay can link to
//! - Seeds the frontier, one task per distinct seed address
//! - Starts a fixed pool of runners as tokio tasks
//! - Waits for the frontier to drain, then stops and joins the runners

use crate::address::clean_name;
use crate::config::CrawlerConfig;
use crate::crawler::client::Probe;
use crate::crawler::facts::nip_statements;
use crate::crawler::frontier::{Frontier, VisitedSet};
use crate::crawler::task::RelayTask;
use crate::crawler::worker::{CrawlCounters, CrawlPolicy, Worker, WorkerStatus};
use crate::storage::GraphStore;
use crate::MinerError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Summary of a finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Relays loaded by a runner
    pub relays_processed: usize,
    pub relays_valid: usize,
    /// Relays rejected at load or at the neighbour pre-screen
    pub relays_rejected: usize,
    pub neighbours_enqueued: usize,
    pub storage_failures: usize,
    pub addresses_seen: usize,
    pub runners: usize,
    pub elapsed: Duration,
}

/// Main crawl orchestration structure
pub struct Manager {
    config: CrawlerConfig,
    store: Arc<dyn GraphStore>,
    probe: Probe,
    frontier: Arc<Frontier>,
    visited: Arc<VisitedSet>,
}

impl Manager {
    /// Creates a new manager
    ///
    /// # Arguments
    ///
    /// * `config` - Recursion budget, pool size, and runner policy
    /// * `store` - Graph collaborator receiving every fact
    /// * `probe` - DNS and relay access used by the runners
    pub fn new(config: CrawlerConfig, store: Arc<dyn GraphStore>, probe: Probe) -> Self {
        Self {
            config,
            store,
            probe,
            frontier: Arc::new(Frontier::new()),
            visited: Arc::new(VisitedSet::new()),
        }
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn visited(&self) -> &Arc<VisitedSet> {
        &self.visited
    }

    /// Crawls the network reachable from `seeds`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The frontier drained and all runners stopped
    /// * `Err(MinerError)` - Seeding the store failed or a runner panicked
    pub async fn run(&self, seeds: &[String]) -> Result<CrawlReport, MinerError> {
        let started = Instant::now();

        for statement in nip_statements() {
            self.store.execute(&statement)?;
        }

        for seed in seeds {
            let normalized = clean_name(seed);
            if normalized.is_empty() {
                tracing::warn!("Skipping empty seed address '{}'", seed);
                continue;
            }
            if self.visited.mark_if_absent(&normalized) {
                self.frontier
                    .enqueue(RelayTask::seed(seed, self.config.max_recursion));
            } else {
                tracing::debug!("Duplicate seed {}", seed);
            }
        }

        tracing::info!(
            "Starting crawl: {} seeds, max recursion {}, {} runners",
            self.frontier.len(),
            self.config.max_recursion,
            self.config.max_runners
        );

        let counters = Arc::new(CrawlCounters::default());
        let policy = CrawlPolicy {
            push_users: self.config.push_users,
            poll_interval: self.config.poll_interval(),
        };

        let mut runners = Vec::with_capacity(self.config.max_runners);
        for id in 0..self.config.max_runners {
            let status = Arc::new(WorkerStatus::default());
            let worker = Worker::new(
                id,
                self.frontier.clone(),
                self.visited.clone(),
                self.store.clone(),
                self.probe.clone(),
                policy.clone(),
                status.clone(),
                counters.clone(),
            );
            runners.push((id, status, tokio::spawn(worker.run())));
        }

        self.frontier.wait_until_drained().await;
        tracing::info!("Frontier drained, stopping runners");

        for (_, status, _) in &runners {
            status.signal_end();
        }

        for (id, _, handle) in runners {
            if let Err(e) = handle.await {
                return Err(MinerError::Worker {
                    id,
                    message: e.to_string(),
                });
            }
        }

        let report = CrawlReport {
            relays_processed: counters.processed.load(Ordering::SeqCst),
            relays_valid: counters.valid.load(Ordering::SeqCst),
            relays_rejected: counters.rejected.load(Ordering::SeqCst),
            neighbours_enqueued: counters.enqueued.load(Ordering::SeqCst),
            storage_failures: counters.storage_failures.load(Ordering::SeqCst),
            addresses_seen: self.visited.len(),
            runners: self.config.max_runners,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Crawl finished: {} relays processed ({} valid) in {:?}",
            report.relays_processed,
            report.relays_valid,
            report.elapsed
        );

        Ok(report)
    }
}
