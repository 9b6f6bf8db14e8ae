// src/downloader/transfer.rs

use super::speed::{AverageSpeed, SpeedSnapshot, SpeedTracker};
use crate::{client::ApiClient, error::*, symbols};
use colored::Colorize;
use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::{StatusCode, header};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// What the progress callback sees after every chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Bytes of the whole file on disk, resume offset included.
    pub transferred: u64,
    /// Declared size of the whole file, when the server told us.
    pub total: Option<u64>,
    pub speed: SpeedReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedReport {
    Current(SpeedSnapshot),
    Average(AverageSpeed),
}

impl DownloadProgress {
    /// Whole percent done; `None` when the total size is unknown.
    pub fn percent(&self) -> Option<u8> {
        self.total.filter(|t| *t > 0).map(|total| {
            ((self.transferred.min(total) as f64 / total as f64) * 100.0).floor() as u8
        })
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.speed, SpeedReport::Average(_))
    }
}

impl std::fmt::Display for SpeedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedReport::Current(s) => s.fmt(f),
            SpeedReport::Average(a) => a.fmt(f),
        }
    }
}

/// Streams assets to disk, appending so that an interrupted file can always be resumed.
#[derive(Clone)]
pub struct Downloader {
    client: Arc<ApiClient>,
    cancellation_token: Arc<AtomicBool>,
}

impl Downloader {
    pub fn new(client: Arc<ApiClient>, cancellation_token: Arc<AtomicBool>) -> Self {
        Self {
            client,
            cancellation_token,
        }
    }

    /// Downloads `url` into `target`, continuing from byte `resume_from` when given.
    ///
    /// Failures are reported and turned into `false`; the partial file is kept
    /// as it is so the next run can pick it up again.
    pub async fn download<F>(
        &self,
        url: &str,
        target: &Path,
        resume_from: Option<u64>,
        mut on_progress: F,
    ) -> bool
    where
        F: FnMut(&DownloadProgress),
    {
        match self.transfer(url, target, resume_from, &mut on_progress).await {
            Ok(average) => {
                info!("Downloaded '{}' ({})", target.display(), average);
                true
            }
            Err(e) => {
                error!("Download of '{}' failed: {}", target.display(), e);
                eprintln!("\n{} {}", *symbols::ERROR, e.to_string().red());
                false
            }
        }
    }

    async fn transfer(
        &self,
        url: &str,
        target: &Path,
        resume_from: Option<u64>,
        on_progress: &mut dyn FnMut(&DownloadProgress),
    ) -> AppResult<AverageSpeed> {
        let res = self.client.asset_request(url, resume_from)?.send().await?;
        let status = res.status();
        if status == StatusCode::RANGE_NOT_SATISFIABLE
            && let Some(offset) = resume_from
            && unsatisfied_range_total(&res) == Some(offset)
        {
            // The partial file already holds every byte.
            info!("'{}' is already complete ({} bytes)", target.display(), offset);
            let average = SpeedTracker::new().finalize();
            on_progress(&DownloadProgress {
                transferred: offset,
                total: Some(offset),
                speed: SpeedReport::Average(average),
            });
            return Ok(average);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = body.trim().chars().take(200).collect::<String>();
            return Err(AppError::Request {
                message: if message.is_empty() {
                    status.canonical_reason().unwrap_or("download refused").to_string()
                } else {
                    message
                },
                status: status.as_u16(),
            });
        }

        let offset = match resume_from {
            Some(offset) if status == StatusCode::PARTIAL_CONTENT => offset,
            Some(offset) => {
                warn!(
                    "Server ignored the range request from byte {}, restarting '{}' from the beginning",
                    offset,
                    target.display()
                );
                0
            }
            None => 0,
        };
        let total = declared_length(&res).map(|len| len + offset);
        debug!(
            "Transfer of '{}': offset={}, total={:?}",
            target.display(),
            offset,
            total
        );

        // Only opened once the server said yes, so a refused request leaves the file alone.
        let mut file = if offset > 0 {
            OpenOptions::new().create(true).append(true).open(target)?
        } else {
            File::create(target)?
        };

        let mut tracker = SpeedTracker::new();
        let mut transferred = offset;
        let mut stream = res.bytes_stream();
        while let Some(chunk) = stream.next().await {
            if self.cancellation_token.load(Ordering::Relaxed) {
                file.flush()?;
                return Err(AppError::UserInterrupt);
            }
            let chunk = chunk.map_err(|e| AppError::Download(e.to_string()))?;
            file.write_all(&chunk)?;
            transferred += chunk.len() as u64;
            let snapshot = tracker.sample(transferred, total);
            on_progress(&DownloadProgress {
                transferred,
                total,
                speed: SpeedReport::Current(snapshot),
            });
        }
        file.flush()?;

        if let Some(total) = total
            && transferred < total
        {
            return Err(AppError::Download(format!(
                "connection closed after {} of {} bytes",
                transferred, total
            )));
        }

        let average = tracker.finalize();
        on_progress(&DownloadProgress {
            transferred,
            total: Some(total.unwrap_or(transferred)),
            speed: SpeedReport::Average(average),
        });
        Ok(average)
    }
}

/// Full size from a 416 answer's `Content-Range: bytes */<size>`.
fn unsatisfied_range_total(res: &reqwest::Response) -> Option<u64> {
    res.headers()
        .get(header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().strip_prefix("bytes */"))
        .and_then(|v| v.parse::<u64>().ok())
}

/// Body length of this response; with a range request that is only the remainder.
fn declared_length(res: &reqwest::Response) -> Option<u64> {
    res.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}
