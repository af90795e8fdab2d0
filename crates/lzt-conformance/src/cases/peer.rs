//! Peer-to-peer queries between the first two devices of one driver.

use super::Case;
use crate::context::CaseContext;
use crate::error::CaseError;
use lzt_level_zero::{DeviceHandle, flag_names};
use tracing::{debug, warn};

pub(super) const CASES: &[Case] = &[
    Case {
        suite: "p2p",
        name: "properties",
        description: "peer properties can be queried between two devices of one driver",
        run: properties,
    },
    Case {
        suite: "p2p",
        name: "can_access_symmetric",
        description: "peer access between two devices of one driver is symmetric",
        run: can_access_symmetric,
    },
];

/// First two devices of the first driver exposing at least two.
fn device_pair(ctx: &CaseContext<'_>) -> Result<(DeviceHandle, DeviceHandle), CaseError> {
    ctx.require_multi_device()?;
    for driver in ctx.api.drivers()? {
        let devices = ctx.api.devices(driver)?;
        if let [first, second, ..] = devices[..] {
            return Ok((first, second));
        }
    }
    warn!("devices are spread across drivers; no driver exposes two");
    Err(CaseError::Skip("no single driver exposes two devices".to_string()))
}

fn properties(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (d0, d1) = device_pair(ctx)?;
    let p2p = ctx.api.p2p_properties(d0, d1)?;
    debug!(from = %d0, to = %d1, flags = %flag_names(&p2p.flags), "p2p properties");
    Ok(())
}

fn can_access_symmetric(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (d0, d1) = device_pair(ctx)?;
    let forward = ctx.api.can_access_peer(d0, d1)?;
    let backward = ctx.api.can_access_peer(d1, d0)?;
    debug!(%d0, %d1, forward, backward, "peer access");
    ctx.check.expect_eq(format!("can_access({d0}, {d1}) == can_access({d1}, {d0})"), forward, backward);
    Ok(())
}
