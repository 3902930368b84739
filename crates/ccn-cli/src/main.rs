use std::io;
use std::process::ExitCode;

use ccn_cli::{Cli, Config, app, logging};
use ccn_core::TerminalSession;
use clap::Parser;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout; anything else is a usage error.
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Health check: no event, no config, no stdin.
    let Some(event) = cli.event.as_deref() else {
        println!("ok");
        return ExitCode::SUCCESS;
    };

    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ccnotify: failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config, cli.verbose);
    tracing::debug!(?config, "loaded configuration");

    let session = TerminalSession::parse(std::env::var(&config.session_env).ok().as_deref());
    match app::run(event, &config, session, io::stdin().lock()) {
        Ok(outcome) => {
            tracing::debug!(?outcome, "event handled");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
