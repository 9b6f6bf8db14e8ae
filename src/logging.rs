// src/logging.rs

use crate::{cli::LogLevel, config::api_key::get_config_dir, constants};
use log::warn;
use std::env;

/// Sends `log` records to `~/.gb-show-dl/app.log`. Console output never goes through here.
pub fn setup_logging(level: LogLevel) {
    let filter = match level {
        LogLevel::Off => return,
        LogLevel::Error => log::LevelFilter::Error,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Trace => log::LevelFilter::Trace,
    };
    let app_name = clap::crate_name!();

    let log_file_path = match get_config_dir() {
        Ok(dir) => dir.join(constants::LOG_FILE_NAME),
        Err(_) => {
            eprintln!("Warning: no home directory, logging to the temp directory.");
            env::temp_dir().join(app_name).join(constants::LOG_FILE_NAME)
        }
    };

    if let Some(dir) = log_file_path.parent()
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("Warning: could not create log directory {:?}: {}", dir, e);
    }

    let file_appender = match fern::log_file(&log_file_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "Warning: could not open log file {:?}: {}. Trying a fallback file.",
                log_file_path, e
            );
            let fallback_path = env::temp_dir().join(format!(
                "{}-{}",
                app_name,
                constants::LOG_FALLBACK_FILE_NAME
            ));
            match fern::log_file(&fallback_path) {
                Ok(file) => {
                    warn!("Logging to fallback file {:?}", fallback_path);
                    file
                }
                Err(e) => {
                    eprintln!(
                        "Error: could not open fallback log file {:?}: {}. Logging is disabled.",
                        fallback_path, e
                    );
                    return;
                }
            }
        }
    };

    let result = fern::Dispatch::new()
        .level(filter)
        // HTTP internals are noisy below warn.
        .level_for("hyper_util", log::LevelFilter::Warn)
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("rustls", log::LevelFilter::Warn)
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{:<5}] [{}:{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        .chain(file_appender)
        .apply();

    if let Err(e) = result {
        eprintln!("Warning: logging setup failed: {}", e);
    }
}
