//! Registrador: command-line interface for Registro
//!
//! ## Usage
//!
//! ```bash
//! registrador resolve "start_{key1}_end" --var key1=val1
//! registrador add "logs/{test-name-sanitized}" --extension log --text "..." --test-name "Login"
//! registrador check logs/Login.log
//! registrador config
//! ```

use clap::Parser;
use registrador::{handlers, logging, Cli, CliResult, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    logging::init_tracing(Verbosity::from_flags(cli.quiet, cli.verbose));

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    handlers::run(&cli, &mut out)
}
