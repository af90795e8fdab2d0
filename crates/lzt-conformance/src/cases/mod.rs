//! The registered conformance cases.
//!
//! Cases are grouped into suites; a case's full name is `suite.case`. The
//! registry order is the run order.

mod enumeration;
mod peer;
mod properties;
mod sku_consistency;
mod sub_devices;

use crate::context::CaseContext;
use crate::error::CaseError;
use lzt_level_zero::{DeviceHandle, DriverHandle};
use std::fmt;
use std::sync::LazyLock;

/// Body of a case. Soft failures go to `ctx.check`; an `Err` ends the case.
pub type CaseFn = fn(&mut CaseContext<'_>) -> Result<(), CaseError>;

#[derive(Clone, Copy)]
pub struct Case {
    pub suite: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub run: CaseFn,
}

impl Case {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.suite, self.name)
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case").field("name", &self.full_name()).finish_non_exhaustive()
    }
}

static REGISTRY: LazyLock<Box<[Case]>> = LazyLock::new(|| {
    [
        enumeration::CASES,
        properties::CASES,
        peer::CASES,
        sku_consistency::CASES,
        sub_devices::CASES,
    ]
    .concat()
    .into_boxed_slice()
});

/// Every case, in run order.
pub fn registry() -> &'static [Case] {
    &REGISTRY
}

/// Root devices of the first driver. Both the driver and at least one device
/// are hard preconditions.
fn first_driver_devices(ctx: &CaseContext<'_>) -> Result<(DriverHandle, Vec<DeviceHandle>), CaseError> {
    let drivers = ctx.api.drivers()?;
    ctx.check.require_gt("driver count", drivers.len(), 0)?;
    let driver = drivers[0];
    let devices = ctx.api.devices(driver)?;
    ctx.check.require_gt("device count", devices.len(), 0)?;
    Ok((driver, devices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn full_names_are_unique() {
        let names: HashSet<String> = registry().iter().map(Case::full_name).collect();
        assert_eq!(names.len(), registry().len());
    }

    #[test]
    fn every_case_is_described() {
        for case in registry() {
            assert!(!case.description.is_empty(), "{} has no description", case.full_name());
            assert!(!case.suite.contains('.') && !case.name.contains('.'));
        }
    }

    #[test]
    fn enumeration_runs_first() {
        assert_eq!(registry()[0].full_name(), "device_get.count");
    }
}
