// src/downloader/mod.rs

mod speed;
mod transfer;

pub use speed::{AverageSpeed, SpeedSnapshot, SpeedTracker, readable_filesize, readable_time};
pub use transfer::{DownloadProgress, Downloader, SpeedReport};

use crate::{symbols, ui};
use colored::*;
use log::info;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Run-wide counters plus the reasons behind every skip and failure.
#[derive(Clone, Default)]
pub struct DownloadManager {
    stats: Arc<Mutex<DownloadStats>>,
    skipped_downloads: Arc<Mutex<Vec<(String, String)>>>,
    failed_downloads: Arc<Mutex<Vec<(String, String)>>>,
}

impl DownloadManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.stats.lock().unwrap().downloaded += 1;
    }

    pub fn record_skip(&self, name: &str, reason: &str) {
        info!("Skipping '{}': {}", name, reason);
        self.stats.lock().unwrap().skipped += 1;
        self.skipped_downloads
            .lock()
            .unwrap()
            .push((name.to_string(), reason.to_string()));
    }

    pub fn record_failure(&self, name: &str, reason: &str) {
        info!("Failed '{}': {}", name, reason);
        self.stats.lock().unwrap().failed += 1;
        self.failed_downloads
            .lock()
            .unwrap()
            .push((name.to_string(), reason.to_string()));
    }

    pub fn get_stats(&self) -> DownloadStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn did_all_succeed(&self) -> bool {
        self.stats.lock().unwrap().failed == 0
    }

    pub fn print_report(&self, title: &str) {
        let stats = self.get_stats();
        let skipped = self.skipped_downloads.lock().unwrap();
        let failed = self.failed_downloads.lock().unwrap();
        info!(
            "Report for {}: downloaded={}, skipped={}, failed={}",
            title, stats.downloaded, stats.skipped, stats.failed
        );

        if !skipped.is_empty() {
            ui::print_sub_header(&format!("Skipped ({})", stats.skipped));
            print_grouped_report(&skipped, |s| s.cyan());
        }
        if !failed.is_empty() {
            ui::print_sub_header(&format!("Failed ({})", stats.failed));
            print_grouped_report(&failed, |s| s.red());
        }

        ui::print_header(&format!("{} is done for {}!", clap::crate_name!(), title));
        println!(
            "{} | {} | {}",
            format!("{} downloaded", stats.downloaded).green(),
            format!("{} skipped", stats.skipped).yellow(),
            format!("{} failed", stats.failed).red()
        );
        if stats.failed == 0 {
            println!("{} Nothing left to download.", *symbols::OK);
        } else {
            eprintln!(
                "{} {}",
                *symbols::ERROR,
                format!(
                    "{} download(s) failed! Re-run the command to retry, finished files are not downloaded again.",
                    stats.failed
                )
                .red()
            );
        }
    }
}

/// Names per reason, reasons in sorted order.
fn group_by_reason(items: &[(String, String)]) -> BTreeMap<&str, Vec<&str>> {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, reason) in items {
        grouped.entry(reason.as_str()).or_default().push(name.as_str());
    }
    grouped
}

fn print_grouped_report(items: &[(String, String)], color_fn: fn(ColoredString) -> ColoredString) {
    for (reason, names) in group_by_reason(items) {
        println!("  - {}", color_fn(format!("Reason: {}", reason).into()));
        for name in names {
            println!("    - {}", name);
        }
    }
}
