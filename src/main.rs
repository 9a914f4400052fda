#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

mod aws;
mod cache;
mod cli;
mod client;
mod config;
mod error;
mod openam;
mod prompt;
mod refresh;
mod renewal;
mod roles;
mod saml;

use std::process;

use clap::Parser;
use crossterm::style::Stylize;
use log::LevelFilter;

use cli::{Cli, Commands};
use error::AuthResult;

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn setup_logging(verbosity: u8) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for("amplis_auth", level_for(verbosity))
        .chain(std::io::stderr())
        .apply()?;

    Ok(())
}

fn execute(cli: &Cli) -> AuthResult<()> {
    let cfg = config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Status) => refresh::status(&cfg),
        Some(Commands::Login) | None => refresh::command(
            &cfg,
            &refresh::Options {
                force: cli.force,
                username: cli.username.clone(),
            },
        ),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("could not set up logging: {}", e);
    }

    if let Err(e) = execute(&cli) {
        eprintln!("\n{}\n", e.to_string().red());
        process::exit(e.exit_code());
    }
}
