// src/ui.rs

use crate::{constants, downloader::DownloadProgress, symbols, utils::truncate_text};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::{cell::Cell, time::Duration};

pub fn print_header(title: &str) {
    println!("\n{}", "═".repeat(constants::UI_WIDTH));
    println!(" {}", title.cyan().bold());
    println!("{}", "═".repeat(constants::UI_WIDTH));
}

pub fn print_sub_header(title: &str) {
    println!("\n--- {} ---", title.bold());
}

pub fn info(message: &str) {
    println!("{} {}", *symbols::INFO, message);
}

pub fn warn(message: &str) {
    println!("{} {}", *symbols::WARN, message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{} {}", *symbols::ERROR, message.red());
}

pub fn skip(name: &str, reason: &str) {
    println!(
        "{} Skipping {}, {}",
        *symbols::SKIP,
        truncate_text(name, constants::UI_WIDTH).cyan(),
        reason
    );
}

pub fn download_start(name: &str, filename: &str) {
    println!(
        "{} Downloading {} to: {}",
        *symbols::DOWN,
        truncate_text(name, constants::UI_WIDTH).cyan(),
        filename.magenta()
    );
}

/// Per-file progress bar fed by the downloader's progress callback.
pub struct TransferBar {
    bar: ProgressBar,
    size_known: Cell<Option<bool>>,
}

impl TransferBar {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.enable_steady_tick(Duration::from_millis(250));
        Self {
            bar,
            size_known: Cell::new(None),
        }
    }

    fn apply_style(&self, size_known: bool) {
        if self.size_known.get() == Some(size_known) {
            return;
        }
        self.size_known.set(Some(size_known));
        let style = if size_known {
            ProgressStyle::with_template(
                "[{bar:10.yellow}] {percent:>3}% ({bytes} / {total_bytes}) {msg}",
            )
            .map(|s| s.progress_chars("#  "))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
        } else {
            // No percentage or ETA without a total.
            ProgressStyle::with_template("{spinner} {bytes} (size unavailable) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
        };
        self.bar.set_style(style);
    }

    pub fn update(&self, progress: &DownloadProgress) {
        self.apply_style(progress.total.is_some());
        if let Some(total) = progress.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(progress.transferred);
        let message = if progress.is_complete() {
            progress.speed.to_string().green().to_string()
        } else {
            progress.speed.to_string().magenta().to_string()
        };
        self.bar.set_message(message);
    }

    pub fn finish(self) {
        self.bar.finish();
    }

    pub fn abandon(self) {
        self.bar.abandon();
    }
}

impl Default for TransferBar {
    fn default() -> Self {
        Self::new()
    }
}
