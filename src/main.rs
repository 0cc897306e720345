//! MODISNRT CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse the config path, run
//! the pipeline, and exit with status 0 on success or 1 on any failure.
//! For programmatic use, prefer the library API (`modisnrt::Pipeline`).

use std::process::ExitCode;

use clap::Parser;

mod cli;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
