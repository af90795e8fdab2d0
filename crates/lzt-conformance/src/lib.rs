//! `lzt-conformance`: Level-Zero device conformance cases and their runner.
//!
//! Cases query devices through [`lzt_level_zero::DeviceApi`] and record
//! failures through a [`Checker`]. Each case ends in one of three
//! [`Outcome`]s: passed, skipped (the system cannot exercise it), or failed.
//!
//! ```no_run
//! use lzt_conformance::{CheckOptions, Runner, report};
//! use lzt_level_zero::LoaderApi;
//!
//! let api = LoaderApi::load()?;
//! let summary = Runner::new(CheckOptions::default()).run(&api);
//! print!("{}", report::render_text(&summary, false));
//! # Ok::<(), lzt_level_zero::LevelZeroError>(())
//! ```

pub mod cases;
pub mod check;
pub mod config;
pub mod consistency;
pub mod context;
pub mod error;
pub mod inventory;
pub mod outcome;
pub mod report;
pub mod runner;
pub mod sku;

pub use cases::{Case, registry};
pub use check::Checker;
pub use config::{BackendConfig, BackendKind, HarnessConfig, LogFormat, ReportFormat};
pub use context::{CaseContext, CheckOptions, FlagComparison};
pub use error::{CaseError, ConfigError, HarnessError};
pub use inventory::Inventory;
pub use outcome::{CaseReport, Failure, Outcome};
pub use runner::{CaseFilter, RunSummary, Runner};
pub use sku::{SkuError, SkuGroup, SkuGroups, SkuKey};
