// src/downloader/speed.rs

use std::{collections::VecDeque, fmt, time::Duration};
use tokio::time::Instant;

/// Width of the window used for the instantaneous speed.
const WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    transferred: u64,
}

/// Turns a stream of (transferred, total) readings into speed and ETA figures.
#[derive(Debug, Default)]
pub struct SpeedTracker {
    first: Option<Sample>,
    history: VecDeque<Sample>,
}

/// Instantaneous speed, renders as "X/s, about Y remaining".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedSnapshot {
    pub bytes_per_second: u64,
    /// `None` whenever the estimate is not well-defined (no rate yet, unknown total).
    pub seconds_remaining: Option<u64>,
}

/// Whole-session average, renders as "avg. X/s in Y".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageSpeed {
    pub bytes_per_second: u64,
    pub elapsed: Duration,
}

impl SpeedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, transferred: u64, total: Option<u64>) -> SpeedSnapshot {
        self.sample_at(Instant::now(), transferred, total)
    }

    pub fn sample_at(&mut self, at: Instant, transferred: u64, total: Option<u64>) -> SpeedSnapshot {
        let sample = Sample { at, transferred };
        self.first.get_or_insert(sample);

        while let Some(oldest) = self.history.front() {
            if at.saturating_duration_since(oldest.at) > WINDOW {
                self.history.pop_front();
            } else {
                break;
            }
        }
        self.history.push_back(sample);

        let oldest = self.history.front().map_or(transferred, |s| s.transferred);
        let bytes_per_second =
            (transferred.saturating_sub(oldest) as f64 / WINDOW.as_secs_f64()).round() as u64;

        let seconds_remaining = match total {
            Some(total) if bytes_per_second > 0 && self.history.len() >= 2 => {
                let left = total.saturating_sub(transferred) as f64;
                Some((left / bytes_per_second as f64).round() as u64)
            }
            _ => None,
        };

        SpeedSnapshot {
            bytes_per_second,
            seconds_remaining,
        }
    }

    pub fn finalize(&self) -> AverageSpeed {
        let (Some(first), Some(last)) = (self.first, self.history.back()) else {
            return AverageSpeed {
                bytes_per_second: 0,
                elapsed: Duration::ZERO,
            };
        };
        let elapsed = last.at.saturating_duration_since(first.at);
        let bytes_per_second = if elapsed.as_secs_f64() > 0.0 {
            (last.transferred.saturating_sub(first.transferred) as f64 / elapsed.as_secs_f64())
                .round() as u64
        } else {
            0
        };
        AverageSpeed {
            bytes_per_second,
            elapsed,
        }
    }
}

impl fmt::Display for SpeedSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remaining = match self.seconds_remaining {
            Some(seconds) => readable_time(seconds),
            None => "unknown time".to_string(),
        };
        write!(
            f,
            "{}/s, about {} remaining",
            readable_filesize(self.bytes_per_second),
            remaining
        )
    }
}

impl fmt::Display for AverageSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "avg. {}/s in {}",
            readable_filesize(self.bytes_per_second),
            readable_time(self.elapsed.as_secs())
        )
    }
}

pub fn readable_filesize(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

pub fn readable_time(total_seconds: u64) -> String {
    fn plural(n: u64, unit: &str) -> String {
        format!("{} {}{}", n, unit, if n == 1 { "" } else { "s" })
    }
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        if minutes > 0 {
            return format!("{}, {}", plural(hours, "hour"), plural(minutes, "minute"));
        }
        return plural(hours, "hour");
    }
    if minutes > 0 {
        if seconds > 0 {
            return format!("{}, {}", plural(minutes, "minute"), plural(seconds, "second"));
        }
        return plural(minutes, "minute");
    }
    plural(seconds, "second")
}
