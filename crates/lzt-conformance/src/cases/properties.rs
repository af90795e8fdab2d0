//! Per-device property queries on the first driver.

use super::{Case, first_driver_devices};
use crate::consistency::compute_limits;
use crate::context::CaseContext;
use crate::error::CaseError;
use lzt_level_zero::{DeviceType, flag_names};
use tracing::debug;

pub(super) const CASES: &[Case] = &[
    Case {
        suite: "device_properties",
        name: "type_is_gpu",
        description: "every device reports device type GPU",
        run: type_is_gpu,
    },
    Case {
        suite: "compute_properties",
        name: "valid",
        description: "compute maxima are positive and sub-group sizes are listed",
        run: compute_valid,
    },
    Case {
        suite: "memory_properties",
        name: "count",
        description: "the memory bank count query succeeds",
        run: memory_count,
    },
    Case {
        suite: "memory_properties",
        name: "valid",
        description: "memory banks match their count and report bus width and size",
        run: memory_valid,
    },
    Case {
        suite: "external_memory_properties",
        name: "query",
        description: "external memory properties can be queried",
        run: external_memory_query,
    },
    Case {
        suite: "memory_access_properties",
        name: "query",
        description: "memory access properties can be queried",
        run: memory_access_query,
    },
    Case {
        suite: "cache_properties",
        name: "query",
        description: "cache properties can be queried",
        run: cache_query,
    },
    Case {
        suite: "image_properties",
        name: "query",
        description: "image properties can be queried",
        run: image_query,
    },
    Case {
        suite: "module_properties",
        name: "query",
        description: "module properties can be queried",
        run: module_query,
    },
];

fn type_is_gpu(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let props = ctx.api.device_properties(device)?;
        debug!(%device, name = %props.name, vendor_id = props.vendor_id, device_id = props.device_id, "device properties");
        ctx.check.expect_eq(format!("[{device}] type"), DeviceType::Gpu, props.device_type);
    }
    Ok(())
}

fn compute_valid(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let props = ctx.api.compute_properties(device)?;
        compute_limits(ctx, device, &props);
    }
    Ok(())
}

fn memory_count(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let count = ctx.api.memory_properties_count(device)?;
        debug!(%device, count, "memory bank count");
    }
    Ok(())
}

fn memory_valid(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let count = ctx.api.memory_properties_count(device)?;
        ctx.check.require_gt(format!("[{device}] memory bank count"), count, 0)?;
        let banks = ctx.api.memory_properties(device)?;
        ctx.check.expect_eq(format!("[{device}] fetched memory banks"), count as usize, banks.len());
        for (j, bank) in banks.iter().enumerate() {
            debug!(%device, bank = j, name = %bank.name, total_size = bank.total_size, "memory bank");
            ctx.check.expect_gt(format!("[{device}] memory[{j}].max_bus_width"), bank.max_bus_width, 0);
            ctx.check.expect_gt(format!("[{device}] memory[{j}].total_size"), bank.total_size, 0);
        }
    }
    Ok(())
}

fn external_memory_query(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let props = ctx.api.external_memory_properties(device)?;
        debug!(
            %device,
            alloc_import = %flag_names(&props.memory_allocation_import_types),
            alloc_export = %flag_names(&props.memory_allocation_export_types),
            image_import = %flag_names(&props.image_import_types),
            image_export = %flag_names(&props.image_export_types),
            "external memory properties"
        );
    }
    Ok(())
}

fn memory_access_query(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let props = ctx.api.memory_access_properties(device)?;
        debug!(%device, host = %flag_names(&props.host_alloc), device_alloc = %flag_names(&props.device_alloc), "memory access properties");
    }
    Ok(())
}

fn cache_query(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let caches = ctx.api.cache_properties(device)?;
        debug!(%device, levels = caches.len(), "cache properties");
    }
    Ok(())
}

fn image_query(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let props = ctx.api.image_properties(device)?;
        debug!(%device, max_2d = props.max_image_dims_2d, samplers = props.max_samplers, "image properties");
    }
    Ok(())
}

fn module_query(ctx: &mut CaseContext<'_>) -> Result<(), CaseError> {
    let (_, devices) = first_driver_devices(ctx)?;
    for device in devices {
        let props = ctx.api.module_properties(device)?;
        debug!(
            %device,
            spirv = %props.spirv_version,
            native_kernel = %props.native_kernel_uuid,
            flags = %flag_names(&props.flags),
            fp16 = %flag_names(&props.fp16),
            fp32 = %flag_names(&props.fp32),
            fp64 = %flag_names(&props.fp64),
            max_arguments_size = props.max_arguments_size,
            printf_buffer_size = props.printf_buffer_size,
            "module properties"
        );
    }
    Ok(())
}
