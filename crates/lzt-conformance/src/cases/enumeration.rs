use super::{Case, first_driver_devices};
use crate::context::CaseContext;
use crate::error::CaseError;
use tracing::debug;

pub(super) const CASES: &[Case] = &[
    Case {
        suite: "device_get",
        name: "count",
        description: "the device count query succeeds on the first driver",
        run: count,
    },
    Case {
        suite: "device_get",
        name: "handles_not_null",
        description: "every enumerated device handle is non-null",
        run: handles_not_null,
    },
];

fn count(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let drivers = ctx.api.drivers()?;
    ctx.check.require_gt("driver count", drivers.len(), 0)?;
    let count = ctx.api.device_count(drivers[0])?;
    debug!(driver = %drivers[0], count, "device count");
    Ok(())
}

fn handles_not_null(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (driver, devices) = first_driver_devices(ctx)?;
    let count = ctx.api.device_count(driver)?;
    ctx.check.expect_eq("fetched device count", count as usize, devices.len());
    for (i, device) in devices.iter().enumerate() {
        ctx.check.expect_false(format!("device[{i}] handle is null"), device.is_null());
    }
    Ok(())
}
