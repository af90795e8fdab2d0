//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use lzt_conformance::{
    BackendKind, ConfigError, FlagComparison, HarnessConfig, LogFormat, ReportFormat,
};
use std::path::PathBuf;

/// Level-Zero device enumeration and property conformance runner
#[derive(Debug, Parser)]
#[command(name = "lzt-device")]
#[command(version)]
#[command(long_about = r#"
Runs conformance cases against the Level-Zero device query API: device
enumeration, per-device property queries, peer access, sub-devices, and
consistency between devices that share a SKU.

Examples:
  # Run every case against the system loader
  lzt-device run

  # Only the SKU consistency cases, as JSON
  lzt-device run --filter 'sku_consistency.*' --format json

  # Replay a recorded topology
  lzt-device capture -o system.toml
  lzt-device --topology system.toml run
"#)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Device backend (loader, fake)
    #[arg(long, value_name = "KIND", global = true, value_parser = str::parse::<BackendKind>)]
    pub backend: Option<BackendKind>,

    /// Fake topology file; implies --backend fake
    #[arg(long, value_name = "PATH", global = true)]
    pub topology: Option<PathBuf>,

    /// Level-Zero loader library to open instead of the platform default
    #[arg(long, value_name = "PATH", global = true)]
    pub loader_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, value_name = "FORMAT", global = true, value_parser = str::parse::<LogFormat>)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run conformance cases (default)
    Run(RunArgs),

    /// List registered cases
    List,

    /// Show drivers, devices, sub-devices, and SKU groups
    Devices {
        /// Output format (text, json)
        #[arg(long, value_name = "FORMAT", value_parser = str::parse::<ReportFormat>)]
        format: Option<ReportFormat>,
    },

    /// Record the current system as a fake topology
    Capture {
        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Comma-separated case patterns; `*` wildcards, leading `-` excludes
    #[arg(short, long, value_name = "PATTERNS")]
    pub filter: Option<String>,

    /// Report format (text, json)
    #[arg(long, value_name = "FORMAT", value_parser = str::parse::<ReportFormat>)]
    pub format: Option<ReportFormat>,

    /// Treat skipped cases as failures
    #[arg(long)]
    pub strict_skips: bool,

    /// How the on-demand paging flag is compared (or, masked)
    #[arg(long, value_name = "MODE", value_parser = str::parse::<FlagComparison>)]
    pub flag_comparison: Option<FlagComparison>,
}

impl Cli {
    /// Defaults, config file, environment, then these flags.
    pub fn resolve_config(&self) -> Result<HarnessConfig, ConfigError> {
        let mut config = HarnessConfig::load_with_precedence(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut HarnessConfig) {
        if let Some(kind) = self.backend {
            config.backend.kind = kind;
        }
        if let Some(path) = &self.topology {
            config.backend.topology = Some(path.clone());
            if self.backend.is_none() {
                config.backend.kind = BackendKind::Fake;
            }
        }
        if let Some(path) = &self.loader_path {
            config.backend.loader_path = Some(path.clone());
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        match &self.command {
            Some(Command::Run(args)) => {
                if let Some(filter) = &args.filter {
                    config.run.filter = Some(filter.clone());
                }
                if let Some(format) = args.format {
                    config.output.format = format;
                }
                if args.strict_skips {
                    config.run.strict_skips = true;
                }
                if let Some(mode) = args.flag_comparison {
                    config.run.flag_comparison = mode;
                }
            }
            Some(Command::Devices { format: Some(format) }) => config.output.format = *format,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn topology_implies_the_fake_backend() {
        let cli = Cli::parse_from(["lzt-device", "--topology", "t.toml", "run", "--strict-skips"]);
        let mut config = HarnessConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.backend.kind, BackendKind::Fake);
        assert!(config.run.strict_skips);
    }

    #[test]
    fn run_flags_override_config() {
        let cli = Cli::parse_from([
            "lzt-device",
            "run",
            "--filter",
            "p2p.*",
            "--format",
            "json",
            "--flag-comparison",
            "masked",
        ]);
        let mut config = HarnessConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.run.filter.as_deref(), Some("p2p.*"));
        assert_eq!(config.output.format, ReportFormat::Json);
        assert_eq!(config.run.flag_comparison, FlagComparison::Masked);
    }

    #[test]
    fn unknown_enum_values_are_usage_errors() {
        assert!(Cli::try_parse_from(["lzt-device", "--backend", "cuda"]).is_err());
        assert!(Cli::try_parse_from(["lzt-device", "run", "--format", "xml"]).is_err());
    }
}
