//! Cross-device consistency within a SKU group.
//!
//! Each check compares every member of a group, the representative included,
//! against the representative. Capability fields must match; the UUID must
//! match only when a device is compared with itself.

use crate::context::CaseContext;
use crate::error::CaseError;
use crate::sku::SkuGroup;
use lzt_level_zero::{ComputeProperties, DeviceHandle, DevicePropertyFlags};
use tracing::debug;

fn label(group: &SkuGroup, device: DeviceHandle, field: &str) -> String {
    format!("[{} {}] {}", group.key, device, field)
}

/// Every compute maximum is positive and the sub-group size list is usable.
#[track_caller]
pub fn compute_limits(ctx: &mut CaseContext<'_>, device: DeviceHandle, props: &ComputeProperties) {
    let at = |field: &str| format!("[{device}] {field}");
    ctx.check.expect_gt(at("max_total_group_size"), props.max_total_group_size, 0);
    for (axis, (size, count)) in
        ["x", "y", "z"].iter().zip(props.max_group_size.iter().zip(&props.max_group_count))
    {
        ctx.check.expect_gt(at(&format!("max_group_size_{axis}")), *size, 0);
        ctx.check.expect_gt(at(&format!("max_group_count_{axis}")), *count, 0);
    }
    ctx.check.expect_gt(at("max_shared_local_memory"), props.max_shared_local_memory, 0);
    ctx.check.expect_gt(at("num_sub_group_sizes"), props.sub_group_sizes.len(), 0);
    for (i, size) in props.sub_group_sizes.iter().enumerate() {
        ctx.check.expect_gt(at(&format!("sub_group_sizes[{i}]")), *size, 0);
    }
}

pub fn general(ctx: &mut CaseContext<'_>, group: &SkuGroup) -> Result<(), CaseError> {
    let rep = ctx.api.device_properties(group.representative())?;
    let mode = ctx.options.flag_comparison;
    for (i, &device) in group.devices().iter().enumerate() {
        let props = ctx.api.device_properties(device)?;
        debug!(%device, name = %props.name, uuid = %props.uuid, "comparing device properties");
        let c = &mut ctx.check;
        c.expect_eq(label(group, device, "type"), rep.device_type, props.device_type);
        c.expect_eq(label(group, device, "vendor_id"), rep.vendor_id, props.vendor_id);
        c.expect_eq(label(group, device, "device_id"), rep.device_id, props.device_id);
        c.expect_eq(label(group, device, "core_clock_rate"), rep.core_clock_rate, props.core_clock_rate);
        c.expect_eq(
            label(group, device, "num_threads_per_eu"),
            rep.num_threads_per_eu,
            props.num_threads_per_eu,
        );
        c.expect_eq(
            label(group, device, "physical_eu_simd_width"),
            rep.physical_eu_simd_width,
            props.physical_eu_simd_width,
        );
        c.expect_eq(
            label(group, device, "num_eus_per_subslice"),
            rep.num_eus_per_subslice,
            props.num_eus_per_subslice,
        );
        c.expect_eq(
            label(group, device, "num_subslices_per_slice"),
            rep.num_subslices_per_slice,
            props.num_subslices_per_slice,
        );
        c.expect_eq(label(group, device, "num_slices"), rep.num_slices, props.num_slices);

        let (expected, actual) =
            mode.project(rep.flags, props.flags, DevicePropertyFlags::ONDEMANDPAGING);
        c.expect_eq(label(group, device, "flags (ONDEMANDPAGING)"), expected, actual);
        c.expect_false(
            label(group, device, "flags contain SUBDEVICE"),
            props.flags.contains(DevicePropertyFlags::SUBDEVICE),
        );

        if i == 0 {
            c.expect_eq(label(group, device, "uuid (self)"), rep.uuid, props.uuid);
        } else {
            c.expect_ne(label(group, device, "uuid"), rep.uuid, props.uuid);
        }
    }
    Ok(())
}

pub fn compute(ctx: &mut CaseContext<'_>, group: &SkuGroup) -> Result<(), CaseError> {
    let rep_device = group.representative();
    let rep = ctx.api.compute_properties(rep_device)?;
    compute_limits(ctx, rep_device, &rep);
    for &device in group.devices() {
        let props = ctx.api.compute_properties(device)?;
        let c = &mut ctx.check;
        c.expect_eq(
            label(group, device, "max_total_group_size"),
            rep.max_total_group_size,
            props.max_total_group_size,
        );
        c.expect_eq(label(group, device, "max_group_size"), rep.max_group_size, props.max_group_size);
        c.expect_eq(
            label(group, device, "max_group_count"),
            rep.max_group_count,
            props.max_group_count,
        );
        c.expect_eq(
            label(group, device, "max_shared_local_memory"),
            rep.max_shared_local_memory,
            props.max_shared_local_memory,
        );
        if c.expect_eq(
            label(group, device, "num_sub_group_sizes"),
            rep.sub_group_sizes.len(),
            props.sub_group_sizes.len(),
        ) {
            for (j, (a, b)) in rep.sub_group_sizes.iter().zip(&props.sub_group_sizes).enumerate() {
                c.expect_eq(label(group, device, &format!("sub_group_sizes[{j}]")), a, b);
            }
        }
    }
    Ok(())
}

pub fn memory(ctx: &mut CaseContext<'_>, group: &SkuGroup) -> Result<(), CaseError> {
    let rep_device = group.representative();
    let rep_count = ctx.api.memory_properties_count(rep_device)?;
    let rep = ctx.api.memory_properties(rep_device)?;
    for (j, bank) in rep.iter().enumerate() {
        let at = |field: &str| label(group, rep_device, &format!("memory[{j}].{field}"));
        ctx.check.expect_gt(at("max_clock_rate"), bank.max_clock_rate, 0);
        ctx.check.expect_gt(at("max_bus_width"), bank.max_bus_width, 0);
        ctx.check.expect_gt(at("total_size"), bank.total_size, 0);
    }
    for &device in group.devices() {
        let count = ctx.api.memory_properties_count(device)?;
        let banks = ctx.api.memory_properties(device)?;
        let c = &mut ctx.check;
        c.expect_eq(label(group, device, "fetched memory banks"), count as usize, banks.len());
        c.expect_eq(label(group, device, "memory bank count (count-only)"), rep_count, count);
        c.expect_eq(label(group, device, "memory bank count"), rep.len(), banks.len());
        for (j, (a, b)) in rep.iter().zip(&banks).enumerate() {
            let at = |field: &str| label(group, device, &format!("memory[{j}].{field}"));
            c.expect_eq(at("max_clock_rate"), a.max_clock_rate, b.max_clock_rate);
            c.expect_eq(at("max_bus_width"), a.max_bus_width, b.max_bus_width);
            c.expect_eq(at("total_size"), a.total_size, b.total_size);
        }
    }
    Ok(())
}

pub fn memory_access(ctx: &mut CaseContext<'_>, group: &SkuGroup) -> Result<(), CaseError> {
    let rep = ctx.api.memory_access_properties(group.representative())?;
    for &device in group.devices() {
        let props = ctx.api.memory_access_properties(device)?;
        let c = &mut ctx.check;
        c.expect_eq(label(group, device, "host_alloc"), rep.host_alloc, props.host_alloc);
        c.expect_eq(label(group, device, "device_alloc"), rep.device_alloc, props.device_alloc);
        c.expect_eq(
            label(group, device, "shared_single_device_alloc"),
            rep.shared_single_device_alloc,
            props.shared_single_device_alloc,
        );
        c.expect_eq(
            label(group, device, "shared_cross_device_alloc"),
            rep.shared_cross_device_alloc,
            props.shared_cross_device_alloc,
        );
        c.expect_eq(
            label(group, device, "shared_system_alloc"),
            rep.shared_system_alloc,
            props.shared_system_alloc,
        );
    }
    Ok(())
}

pub fn cache(ctx: &mut CaseContext<'_>, group: &SkuGroup) -> Result<(), CaseError> {
    let rep = ctx.api.cache_properties(group.representative())?;
    for &device in group.devices() {
        let caches = ctx.api.cache_properties(device)?;
        ctx.check.require_eq(label(group, device, "cache count"), rep.len(), caches.len())?;
        for (j, (a, b)) in rep.iter().zip(&caches).enumerate() {
            let c = &mut ctx.check;
            c.expect_eq(label(group, device, &format!("cache[{j}].flags")), a.flags, b.flags);
            c.expect_eq(
                label(group, device, &format!("cache[{j}].cache_size")),
                a.cache_size,
                b.cache_size,
            );
        }
    }
    Ok(())
}

pub fn peer_access(ctx: &mut CaseContext<'_>, group: &SkuGroup) -> Result<(), CaseError> {
    let rep = group.representative();
    let self_access = ctx.api.can_access_peer(rep, rep)?;
    ctx.check.expect_true(label(group, rep, "can access itself"), self_access);
    for &device in group.devices() {
        let p2p = ctx.api.p2p_properties(rep, device)?;
        debug!(from = %rep, to = %device, flags = ?p2p.flags, "p2p properties");
        let forward = ctx.api.can_access_peer(rep, device)?;
        let backward = ctx.api.can_access_peer(device, rep)?;
        ctx.check.expect_eq(label(group, device, "peer access symmetric"), forward, backward);
    }
    Ok(())
}

pub fn sub_device_count(ctx: &mut CaseContext<'_>, group: &SkuGroup) -> Result<(), CaseError> {
    let rep = ctx.api.sub_device_count(group.representative())?;
    for &device in group.devices() {
        let count = ctx.api.sub_device_count(device)?;
        ctx.check.expect_eq(label(group, device, "sub-device count"), rep, count);
    }
    Ok(())
}

pub fn module(ctx: &mut CaseContext<'_>, group: &SkuGroup) -> Result<(), CaseError> {
    let rep = ctx.api.module_properties(group.representative())?;
    for &device in group.devices() {
        let props = ctx.api.module_properties(device)?;
        let c = &mut ctx.check;
        c.expect_eq(label(group, device, "spirv_version"), rep.spirv_version, props.spirv_version);
        c.expect_eq(
            label(group, device, "native_kernel_uuid"),
            rep.native_kernel_uuid.as_bytes(),
            props.native_kernel_uuid.as_bytes(),
        );
        c.expect_eq(label(group, device, "fp16 flags"), rep.fp16, props.fp16);
        c.expect_eq(label(group, device, "fp32 flags"), rep.fp32, props.fp32);
        c.expect_eq(label(group, device, "fp64 flags"), rep.fp64, props.fp64);
        c.expect_eq(
            label(group, device, "max_arguments_size"),
            rep.max_arguments_size,
            props.max_arguments_size,
        );
        c.expect_eq(
            label(group, device, "printf_buffer_size"),
            rep.printf_buffer_size,
            props.printf_buffer_size,
        );
    }
    Ok(())
}
