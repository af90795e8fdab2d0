//! Devices sharing a SKU report the same capabilities.

use super::Case;
use crate::consistency;
use crate::context::CaseContext;
use crate::error::CaseError;
use crate::sku::{SkuGroup, SkuGroups};
use tracing::debug;

pub(super) const CASES: &[Case] = &[
    Case {
        suite: "sku_consistency",
        name: "general",
        description: "same-SKU devices match on general properties and differ in UUID",
        run: general,
    },
    Case {
        suite: "sku_consistency",
        name: "compute",
        description: "same-SKU devices match on compute properties",
        run: compute,
    },
    Case {
        suite: "sku_consistency",
        name: "memory",
        description: "same-SKU devices match on memory bank properties",
        run: memory,
    },
    Case {
        suite: "sku_consistency",
        name: "memory_access",
        description: "same-SKU devices match on memory access capabilities",
        run: memory_access,
    },
    Case {
        suite: "sku_consistency",
        name: "cache",
        description: "same-SKU devices match on cache properties",
        run: cache,
    },
    Case {
        suite: "sku_consistency",
        name: "peer_access",
        description: "same-SKU devices access themselves and each other symmetrically",
        run: peer_access,
    },
    Case {
        suite: "sku_consistency",
        name: "sub_device_count",
        description: "same-SKU devices expose the same number of sub-devices",
        run: sub_device_count,
    },
    Case {
        suite: "sku_consistency",
        name: "module",
        description: "same-SKU devices match on module properties",
        run: module,
    },
];

fn for_each_group(
    ctx: &mut CaseContext<'_>,
    check: fn(&mut CaseContext<'_>, &SkuGroup) -> Result<(), CaseError>,
) -> Result<(), CaseError> {
    ctx.require_multi_device()?;
    let groups = SkuGroups::collect::<CaseError>(ctx.api)?;
    for group in &groups {
        debug!(sku = %group.key, members = group.len(), "checking sku group");
        check(ctx, group)?;
    }
    Ok(())
}

fn general(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for_each_group(ctx, consistency::general)
}

fn compute(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for_each_group(ctx, consistency::compute)
}

fn memory(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for_each_group(ctx, consistency::memory)
}

fn memory_access(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for_each_group(ctx, consistency::memory_access)
}

fn cache(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for_each_group(ctx, consistency::cache)
}

fn peer_access(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for_each_group(ctx, consistency::peer_access)
}

fn sub_device_count(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for_each_group(ctx, consistency::sub_device_count)
}

fn module(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    for_each_group(ctx, consistency::module)
}
