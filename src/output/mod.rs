//! Output module for crawl reports and graph statistics
//!
//! This module handles:
//! - Printing the summary of a finished crawl
//! - Extracting and printing statistics from the relay graph

pub mod stats;

pub use stats::{load_statistics, print_statistics, GraphStatistics};

use crate::crawler::CrawlReport;

/// Prints the summary of a finished crawl to stdout
pub fn print_crawl_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");
    println!("  Relays processed: {}", report.relays_processed);
    println!("  Valid relays: {}", report.relays_valid);
    println!("  Rejected relays: {}", report.relays_rejected);
    println!("  Neighbours enqueued: {}", report.neighbours_enqueued);
    println!("  Addresses seen: {}", report.addresses_seen);
    println!("  Runners: {}", report.runners);
    println!("  Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    if report.storage_failures > 0 {
        println!("  Storage failures: {}", report.storage_failures);
    }
}
