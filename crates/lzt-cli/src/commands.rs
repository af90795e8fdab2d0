//! Subcommand implementations. Each returns the process exit code.

use crate::cli::{Cli, Command, RunArgs};
use crate::exit::{EXIT_ENVIRONMENT, EXIT_SUCCESS, run_exit_code};
use crate::logging::setup_logging;
use anyhow::{Context, Result};
use console::style;
use lzt_conformance::{
    CaseFilter, HarnessConfig, Inventory, ReportFormat, Runner, registry, report,
};
use lzt_level_zero::{DeviceApi, FakeTopology};
use std::path::Path;
use tracing::{error, info};

pub fn execute(cli: Cli) -> Result<i32> {
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err}", style("error:").red().bold());
            return Ok(EXIT_ENVIRONMENT);
        }
    };
    setup_logging(&config.logging)?;

    let command = cli.command.unwrap_or(Command::Run(RunArgs::default()));
    let result = match command {
        Command::Run(_) => run(&config),
        Command::List => list(),
        Command::Devices { .. } => devices(&config),
        Command::Capture { output } => capture(&config, output.as_deref()),
    };

    result.or_else(|e| {
        error!(error = %format!("{e:#}"), "command failed");
        eprintln!("{} {e:#}", style("error:").red().bold());
        Ok(EXIT_ENVIRONMENT)
    })
}

fn open(config: &HarnessConfig) -> Result<Box<dyn DeviceApi>> {
    config
        .backend
        .open()
        .with_context(|| format!("failed to open the {} backend", config.backend.kind))
}

fn run(config: &HarnessConfig) -> Result<i32> {
    let api = open(config)?;
    let mut runner =
        Runner::new(config.check_options()).with_strict_skips(config.run.strict_skips);
    if let Some(filter) = &config.run.filter {
        runner = runner.with_filter(CaseFilter::parse(filter));
    }
    let summary = runner.run(api.as_ref());
    match config.output.format {
        ReportFormat::Text => print!("{}", report::render_text(&summary, console::colors_enabled())),
        ReportFormat::Json => {
            println!("{}", report::render_json(&summary).context("failed to serialize report")?)
        }
    }
    Ok(run_exit_code(&summary))
}

fn list() -> Result<i32> {
    let width = registry().iter().map(|c| c.full_name().len()).max().unwrap_or(0);
    for case in registry() {
        println!("{:width$}  {}", case.full_name(), case.description);
    }
    Ok(EXIT_SUCCESS)
}

fn devices(config: &HarnessConfig) -> Result<i32> {
    let api = open(config)?;
    let inventory = Inventory::collect(api.as_ref()).context("failed to enumerate devices")?;
    match config.output.format {
        ReportFormat::Text => print!("{}", inventory.render_text()),
        ReportFormat::Json => println!("{}", inventory.render_json()?),
    }
    Ok(EXIT_SUCCESS)
}

fn capture(config: &HarnessConfig, output: Option<&Path>) -> Result<i32> {
    let api = open(config)?;
    let topology = FakeTopology::capture(api.as_ref()).context("failed to capture topology")?;
    let text = topology.to_toml_string()?;
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), drivers = topology.drivers.len(), "topology captured");
        }
        None => print!("{text}"),
    }
    Ok(EXIT_SUCCESS)
}
