//! Mantle CLI
//!
//! Renders layered deployment manifests and drives the director and the
//! credential store with a session discovered from the environment root.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;
use mantle_core::DirectorAction;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let ctx = Context::load(&cli)?;

    let log_file = if cli.no_log_file {
        None
    } else {
        ctx.log_file()
    };
    logging::init(cli.verbose, log_file.as_deref())?;
    tracing::debug!(root = %ctx.layout.root().display(), command = ?cli.command, "Starting");

    ctx.install_signal_handler()?;
    execute_command(&ctx, cli.command)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<i32> {
    match cmd {
        Commands::Interpolate { set, render } => commands::run_interpolate(ctx, set, &render),
        Commands::Deploy { render } => {
            commands::run_apply(ctx, DirectorAction::CreateOrUpdate, &render)
        }
        Commands::Destroy { render } => commands::run_apply(ctx, DirectorAction::Delete, &render),
        Commands::CloudConfig { vars } => commands::run_cloud_config(ctx, vars),
        Commands::RuntimeConfig { name, vars } => {
            commands::run_runtime_config(ctx, name.as_deref(), vars)
        }
        Commands::Status { json } => commands::run_status(ctx, json),
        Commands::Session { reveal } => commands::run_session(ctx, reveal),
        Commands::Login => commands::run_login(ctx),
    }
}
