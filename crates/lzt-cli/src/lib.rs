//! `lzt-device` command-line runner.
//!
//! This library exposes the binary's modules for testing.

pub mod cli;
pub mod commands;
pub mod exit;
pub mod logging;
