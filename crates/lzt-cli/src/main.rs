//! Level-Zero device conformance runner.

use clap::Parser;
use console::style;
use lzt_cli::cli::Cli;
use lzt_cli::commands;
use lzt_cli::exit::{EXIT_ENVIRONMENT, EXIT_SUCCESS, EXIT_USAGE};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version also arrive here
            std::process::exit(if err.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };

    let code = commands::execute(cli).unwrap_or_else(|e| {
        eprintln!("{} {e:#}", style("error:").red().bold());
        EXIT_ENVIRONMENT
    });
    std::process::exit(code);
}
