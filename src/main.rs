use std::process::ExitCode;

use clap::Parser;

use trashctl::cli::Cli;
use trashctl::logging;
use trashctl::ops;
use trashctl::prompt::TerminalPrompter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if logging::init(logging::level_from_str(&cli.log)).is_err() {
        eprintln!("trashctl: logger already set");
    }

    match ops::run(&cli, &TerminalPrompter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("trashctl: {e:#}");
            ExitCode::FAILURE
        }
    }
}
