// src/lib.rs

pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod quality;
pub mod sidecar;
pub mod symbols;
pub mod ui;
pub mod utils;
mod workflows;

use crate::{
    catalog::Catalog,
    cli::Cli,
    client::ApiClient,
    config::AppConfig,
    downloader::{DownloadManager, DownloadStats, Downloader},
    error::{AppError, AppResult},
};
use colored::*;
use log::{debug, info};
use std::sync::{Arc, atomic::AtomicBool};

/// Everything a run needs, cloned cheaply into each workflow.
#[derive(Clone)]
pub struct DownloadJobContext {
    pub manager: DownloadManager,
    pub config: Arc<AppConfig>,
    pub catalog: Catalog,
    pub downloader: Downloader,
    pub args: Arc<Cli>,
    pub cancellation_token: Arc<AtomicBool>,
}

impl DownloadJobContext {
    pub fn new(
        config: Arc<AppConfig>,
        api_key: &str,
        args: Arc<Cli>,
        cancellation_token: Arc<AtomicBool>,
    ) -> AppResult<Self> {
        let client = Arc::new(ApiClient::new(config.clone(), api_key)?);
        Ok(Self {
            manager: DownloadManager::new(),
            config,
            catalog: Catalog::new(client.clone()),
            downloader: Downloader::new(client, cancellation_token.clone()),
            args,
            cancellation_token,
        })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token
            .load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Library entry point, called by `main.rs`.
pub async fn run_from_cli(
    args: Arc<Cli>,
    cancellation_token: Arc<AtomicBool>,
) -> AppResult<DownloadStats> {
    debug!("CLI arguments: {:?}", args);
    println!(
        "{} {} {}",
        "💣",
        clap::crate_name!().cyan(),
        clap::crate_version!().green()
    );

    if !args.dir.is_dir() {
        return Err(AppError::UserInputError(format!(
            "Directory {} not found",
            args.dir.display()
        )));
    }

    let (api_key, source) = config::api_key::resolve_api_key(args.api_key.as_deref());
    let Some(api_key) = api_key else {
        return Err(AppError::UserInputError(format!(
            "No API key given. Pass --api-key, set {} or add \"api_key\" to the config file. Get a key at {}",
            constants::API_KEY_ENV,
            constants::api::API_KEY_PAGE
        )));
    };
    info!("API key loaded from {}", source);

    let config = Arc::new(AppConfig::new()?);
    debug!("Loaded config: {:?}", config);

    let context = DownloadJobContext::new(config, &api_key, args.clone(), cancellation_token)?;

    if let Some(show) = &args.show {
        workflows::run_show(&context, show).await?;
    } else if let Some(id) = &args.video_id {
        workflows::run_video(&context, id).await?;
    }

    if context.is_cancelled() {
        return Err(AppError::UserInterrupt);
    }
    Ok(context.manager.get_stats())
}

pub use workflows::{run_show, run_video};
