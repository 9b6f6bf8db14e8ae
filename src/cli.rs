// src/cli.rs

use crate::constants;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum, command, crate_version};
use std::path::PathBuf;

/// Log level for the log file
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Video quality tiers, lowest first
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Quality {
    Low,
    High,
    Hd,
    /// The hd file, upgraded to an unlisted higher bitrate when one exists
    Highest,
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Quality::Low => "low",
            Quality::High => "high",
            Quality::Hd => "hd",
            Quality::Highest => "highest",
        };
        f.write_str(name)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date formatted as YYYY-MM-DD", value))
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    arg_required_else_help = true,
    disable_help_flag = true,
    disable_version_flag = true,
)]
#[command(group(
    clap::ArgGroup::new("mode")
        .required(true)
        .args(&["show", "video_id"]),
))]
pub struct Cli {
    // --- Mode ---
    /// Giant Bomb show name, every episode of the show is downloaded
    #[arg(long, help_heading = "Mode")]
    pub show: Option<String>,
    /// Download a single video by its id
    #[arg(long, alias = "video_id", value_name = "ID", help_heading = "Mode")]
    pub video_id: Option<String>,

    // --- Options ---
    #[arg(long, alias = "api_key", value_name = "KEY", help = constants::HELP_API_KEY, help_heading = "Options")]
    pub api_key: Option<String>,
    /// Directory where shows are saved, a subdirectory is created for each show
    #[arg(short, long, value_name = "DIR", default_value_os_t = PathBuf::from("."), help_heading = "Options")]
    pub dir: PathBuf,
    /// Video quality to download, a lower quality is used when it is not available
    #[arg(short, long, value_enum, default_value_t = Quality::Highest, help_heading = "Options")]
    pub quality: Quality,
    /// Skip videos published before this date (YYYY-MM-DD)
    #[arg(long, alias = "from_date", value_name = "DATE", value_parser = parse_date, help_heading = "Options")]
    pub from_date: Option<NaiveDate>,
    /// Skip videos published after this date (YYYY-MM-DD)
    #[arg(long, alias = "to_date", value_name = "DATE", value_parser = parse_date, help_heading = "Options")]
    pub to_date: Option<NaiveDate>,
    /// Also download the thumbnail image of every video
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub video_images: bool,
    /// Write an mp3tag.txt export of the show's videos
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub mp3tag: bool,
    /// Do not write a metadata JSON file next to each video
    #[arg(long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub no_metadata: bool,

    // --- General ---
    /// Output extra logging, may be useful for troubleshooting
    #[arg(long, action = clap::ArgAction::SetTrue, global = true, help_heading = "General")]
    pub debug: bool,
    /// Print help
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// Print version
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (hidden) log file level
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}

impl Cli {
    /// `--debug` is shorthand for `--log-level debug`, unless a finer level was asked for.
    pub fn effective_log_level(&self) -> LogLevel {
        if self.debug && matches!(self.log_level, LogLevel::Off | LogLevel::Error | LogLevel::Warn | LogLevel::Info) {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_underscore_aliases() {
        let cli = Cli::parse_from([
            "gb-show-dl",
            "--show",
            "Quick Look",
            "--api_key",
            "abc",
            "--from_date",
            "2014-01-31",
        ]);
        assert_eq!(cli.api_key.as_deref(), Some("abc"));
        assert_eq!(cli.from_date, NaiveDate::from_ymd_opt(2014, 1, 31));
        assert_eq!(cli.quality, Quality::Highest);
    }

    #[test]
    fn test_rejects_bad_dates_and_missing_mode() {
        assert!(Cli::try_parse_from(["gb-show-dl", "--show", "x", "--to-date", "31/01/2014"]).is_err());
        assert!(Cli::try_parse_from(["gb-show-dl", "--dir", "."]).is_err());
    }

    #[test]
    fn test_debug_raises_log_level() {
        let cli = Cli::parse_from(["gb-show-dl", "--video-id", "42", "--debug"]);
        assert_eq!(cli.effective_log_level(), LogLevel::Debug);
        let cli = Cli::parse_from(["gb-show-dl", "--video-id", "42", "--debug", "--log-level", "trace"]);
        assert_eq!(cli.effective_log_level(), LogLevel::Trace);
    }
}
