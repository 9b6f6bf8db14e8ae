// src/main.rs

use clap::{CommandFactory, FromArgMatches};
use colored::*;
use gb_show_dl::{cli::Cli, error::AppError, logging, run_from_cli};
use std::{
    env,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    {
        colored::control::set_virtual_terminal(true).ok();
    }

    let cancellation_token = Arc::new(AtomicBool::new(false));
    let token = cancellation_token.clone();
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            if token.swap(true, Ordering::SeqCst) {
                println!("\n{} Interrupted again, quitting now.", "[!]".yellow());
                std::process::exit(130);
            }
            println!(
                "\n{} Stopping after the current step. Press Ctrl+C again to quit immediately.",
                "[!]".yellow()
            );
        }
    });

    let bin_name = env::var("CARGO_BIN_NAME").unwrap_or_else(|_| clap::crate_name!().to_string());
    let after_help = format!(
        "Examples:\n  # Download a whole show\n  {bin} --show \"Quick Look\" --api-key <KEY> -d ~/Videos\n\n  # Only the 2014 episodes, in hd\n  {bin} --show \"Unprofessional Fridays\" -q hd --from-date 2014-01-01 --to-date 2014-12-31\n\n  # A single video by id\n  {bin} --video-id 2300-9782",
        bin = bin_name
    );
    let cmd = Cli::command().after_help(after_help);
    let args = match Cli::from_arg_matches(&cmd.get_matches()) {
        Ok(args) => Arc::new(args),
        Err(e) => e.exit(),
    };

    logging::setup_logging(args.effective_log_level());
    log::info!("{} {} starting", clap::crate_name!(), clap::crate_version!());

    match run_from_cli(args, cancellation_token).await {
        Ok(stats) if stats.failed > 0 => std::process::exit(1),
        Ok(_) => {}
        Err(AppError::UserInterrupt) => {
            log::warn!("Run interrupted by the user");
            std::process::exit(130);
        }
        Err(e) => {
            log::error!("Fatal: {}", e);
            eprintln!("\n{} {}", "[X]".red(), e.to_string().red());
            if matches!(e.status(), Some(401) | Some(403)) {
                eprintln!(
                    "{} The API refused the key. Check it at {}",
                    "[!]".yellow(),
                    gb_show_dl::constants::api::API_KEY_PAGE
                );
            }
            std::process::exit(1);
        }
    }
}
