mod cli;
mod commands;
mod config;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, ConfigCommand};
use log::LevelFilter;
use std::io;

/// Flags shared by every subcommand
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config_override: Option<String>,
}

/// `--quiet` keeps errors only; each `-v` lowers the floor one level from warn
fn log_filter(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_filter(cli.verbose, cli.quiet))
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_override: cli.config,
    };

    match cli.command {
        Command::Plan(args) => commands::plan::run(&ctx, &args),
        Command::ReadPod(args) => commands::pod::read(&ctx, &args),
        Command::Expand(args) => commands::pod::expand(&args),
        Command::Config(cmd) => match cmd {
            ConfigCommand::Show => commands::config::show(&ctx),
            ConfigCommand::Path => commands::config::path(&ctx),
        },
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "skyform", &mut io::stdout());
            Ok(())
        }
    }
}
