//! coachline - terminal client for the coaching session service

mod app;
mod cli;
mod format;
mod shell;
mod views;

use std::io;

use anyhow::Result;
use clap::Parser;
use coachline_core::Config;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::app::{describe_error, watch_session, App};
use crate::cli::{Cli, Command};

fn init_tracing() {
    // RUST_LOG controls the level, e.g. RUST_LOG=coachline_core=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {:#}", e);
        Config::default()
    });
    cli.apply(&mut config);
    config.validate()?;

    let mut app = App::new(config)?;
    let _watcher = watch_session(app.session());

    match cli.command {
        None | Some(Command::Shell) => shell::run(&mut app).await,
        Some(command) => {
            if !matches!(command, Command::Login { .. } | Command::Logout) {
                if let Err(e) = app.login_from_env().await {
                    eprintln!("error: {}", describe_error(&e));
                    std::process::exit(1);
                }
            }
            match app.run(command).await {
                Ok(outcome) => {
                    shell::print_outcome(&outcome);
                    Ok(())
                }
                Err(e) => {
                    eprintln!("error: {}", describe_error(&e));
                    std::process::exit(1);
                }
            }
        }
    }
}
