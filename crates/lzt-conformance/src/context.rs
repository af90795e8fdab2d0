//! What a running case can see: the facade, its options, and its checker.

use crate::check::Checker;
use crate::error::CaseError;
use lzt_level_zero::{DeviceApi, DevicePropertyFlags};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// How a single device property flag is compared across a SKU group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagComparison {
    /// `(a | F) == (b | F)`. Matches the established suite; note that this
    /// ignores `F` itself and compares every other bit.
    #[default]
    Or,
    /// `(a & F) == (b & F)`: only `F` is compared.
    Masked,
}

impl FlagComparison {
    /// The two values to compare for `flag`.
    pub fn project(
        self,
        a: DevicePropertyFlags,
        b: DevicePropertyFlags,
        flag: DevicePropertyFlags,
    ) -> (u32, u32) {
        match self {
            Self::Or => ((a | flag).bits(), (b | flag).bits()),
            Self::Masked => ((a & flag).bits(), (b & flag).bits()),
        }
    }
}

impl FromStr for FlagComparison {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "or" => Ok(Self::Or),
            "masked" => Ok(Self::Masked),
            other => Err(format!("unknown flag comparison '{other}'. Expected one of: or, masked")),
        }
    }
}

impl fmt::Display for FlagComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or => write!(f, "or"),
            Self::Masked => write!(f, "masked"),
        }
    }
}

/// Knobs shared by every case in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub flag_comparison: FlagComparison,
    /// Devices required system-wide before multi-device cases run.
    pub min_devices: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self { flag_comparison: FlagComparison::Or, min_devices: 2 }
    }
}

pub struct CaseContext<'a> {
    pub api: &'a dyn DeviceApi,
    pub options: &'a CheckOptions,
    pub check: Checker,
}

impl<'a> CaseContext<'a> {
    pub fn new(api: &'a dyn DeviceApi, options: &'a CheckOptions) -> Self {
        Self { api, options, check: Checker::new() }
    }

    /// Skip unless the system has at least `min_devices` root devices.
    pub fn require_multi_device(&self) -> Result<(), CaseError> {
        let found = self.api.total_device_count()?;
        if found < self.options.min_devices {
            warn!(found, required = self.options.min_devices, "multiple devices do not exist");
            return Err(CaseError::Skip(format!(
                "multiple devices do not exist ({found} found, {} required)",
                self.options.min_devices
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F: DevicePropertyFlags = DevicePropertyFlags::ONDEMANDPAGING;

    #[test]
    fn or_projection_ignores_the_flag_itself() {
        let a = DevicePropertyFlags::INTEGRATED | F;
        let b = DevicePropertyFlags::INTEGRATED;
        let (x, y) = FlagComparison::Or.project(a, b, F);
        assert_eq!(x, y);
    }

    #[test]
    fn or_projection_sees_other_bits() {
        let a = DevicePropertyFlags::ECC;
        let b = DevicePropertyFlags::empty();
        let (x, y) = FlagComparison::Or.project(a, b, F);
        assert_ne!(x, y);
    }

    #[test]
    fn masked_projection_compares_only_the_flag() {
        let (x, y) = FlagComparison::Masked.project(DevicePropertyFlags::ECC | F, F, F);
        assert_eq!(x, y);
        let (x, y) = FlagComparison::Masked.project(F, DevicePropertyFlags::empty(), F);
        assert_ne!(x, y);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("MASKED".parse::<FlagComparison>().unwrap(), FlagComparison::Masked);
        assert!("and".parse::<FlagComparison>().is_err());
    }
}
