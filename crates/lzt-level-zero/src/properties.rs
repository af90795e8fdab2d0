//! Typed device property records.
//!
//! Each record is an immutable snapshot of one `zeDeviceGet*Properties`
//! query. Capability flags are kept as `bitflags` sets that retain bits this
//! crate has no name for, so a comparison never hides driver-reported state.
//! `Default` values describe a plausible discrete GPU and exist for the fake
//! backend's topology files.

use crate::ffi::{self, ZE_MAX_DEVICE_UUID_SIZE, ZE_MAX_NATIVE_KERNEL_UUID_SIZE};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ── Handles ─────────────────────────────────────────────────────────────────

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Wrap a raw handle value.
            pub const fn from_raw(raw: usize) -> Self {
                Self(raw)
            }

            pub const fn as_raw(self) -> usize {
                self.0
            }

            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{:x}", self.0)
            }
        }
    };
}

opaque_handle!(
    /// Opaque driver handle (`ze_driver_handle_t`).
    DriverHandle
);
opaque_handle!(
    /// Opaque root- or sub-device handle (`ze_device_handle_t`).
    DeviceHandle
);

// ── Enums and flag sets ─────────────────────────────────────────────────────

/// Device type reported by Level Zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    #[default]
    Gpu,
    Cpu,
    Fpga,
    Mca,
    Vpu,
    /// A value outside the known enumeration.
    Other(u32),
}

impl DeviceType {
    pub const fn from_raw(raw: u32) -> Self {
        match raw {
            ffi::device_type::GPU => Self::Gpu,
            ffi::device_type::CPU => Self::Cpu,
            ffi::device_type::FPGA => Self::Fpga,
            ffi::device_type::MCA => Self::Mca,
            ffi::device_type::VPU => Self::Vpu,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu => write!(f, "GPU"),
            Self::Cpu => write!(f, "CPU"),
            Self::Fpga => write!(f, "FPGA"),
            Self::Mca => write!(f, "MCA"),
            Self::Vpu => write!(f, "VPU"),
            Self::Other(raw) => write!(f, "unknown({raw})"),
        }
    }
}

bitflags! {
    /// `ze_device_property_flags_t`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DevicePropertyFlags: u32 {
        const INTEGRATED = 1 << 0;
        const SUBDEVICE = 1 << 1;
        const ECC = 1 << 2;
        const ONDEMANDPAGING = 1 << 3;
        const _ = !0;
    }
}

bitflags! {
    /// `ze_memory_access_cap_flags_t`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MemoryAccessCapabilities: u32 {
        const RW = 1 << 0;
        const ATOMIC = 1 << 1;
        const CONCURRENT = 1 << 2;
        const CONCURRENT_ATOMIC = 1 << 3;
        const _ = !0;
    }
}

bitflags! {
    /// `ze_device_cache_property_flags_t`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CacheFlags: u32 {
        const USER_CONTROL = 1 << 0;
        const _ = !0;
    }
}

bitflags! {
    /// `ze_device_module_flags_t`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ModuleFlags: u32 {
        const FP16 = 1 << 0;
        const FP64 = 1 << 1;
        const INT64_ATOMICS = 1 << 2;
        const DP4A = 1 << 3;
        const _ = !0;
    }
}

bitflags! {
    /// `ze_device_fp_flags_t`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FpCapabilities: u32 {
        const DENORM = 1 << 0;
        const INF_NAN = 1 << 1;
        const ROUND_TO_NEAREST = 1 << 2;
        const ROUND_TO_ZERO = 1 << 3;
        const ROUND_TO_INF = 1 << 4;
        const FMA = 1 << 5;
        const ROUNDED_DIVIDE_SQRT = 1 << 6;
        const SOFT_FLOAT = 1 << 7;
        const _ = !0;
    }
}

bitflags! {
    /// `ze_external_memory_type_flags_t`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ExternalMemoryTypes: u32 {
        const OPAQUE_FD = 1 << 0;
        const DMA_BUF = 1 << 1;
        const _ = !0;
    }
}

bitflags! {
    /// `ze_device_p2p_property_flags_t`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct P2PFlags: u32 {
        const ACCESS = 1 << 0;
        const ATOMICS = 1 << 1;
        const _ = !0;
    }
}

/// Render a flag set as `A | B`, or `none` when empty. Bits without a name
/// are appended in hex, e.g. `A | 0x80000000`.
pub fn flag_names<F: bitflags::Flags<Bits = u32>>(flags: &F) -> String {
    let mut named = 0u32;
    let mut parts: Vec<String> = flags
        .iter_names()
        .map(|(name, flag)| {
            named |= flag.bits();
            name.to_string()
        })
        .collect();
    let rest = flags.bits() & !named;
    if rest != 0 {
        parts.push(format!("{rest:#x}"));
    }
    if parts.is_empty() { "none".to_string() } else { parts.join(" | ") }
}

/// Packed SPIR-V version, `(major << 16) | minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpirvVersion(pub u32);

impl SpirvVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self(((major as u32) << 16) | minor as u32)
    }

    pub const fn major(self) -> u32 {
        self.0 >> 16
    }

    pub const fn minor(self) -> u32 {
        self.0 & 0xffff
    }
}

impl Default for SpirvVersion {
    fn default() -> Self {
        Self::new(1, 2)
    }
}

impl fmt::Display for SpirvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major(), self.minor())
    }
}

// ── Records ─────────────────────────────────────────────────────────────────

/// `ze_device_properties_t`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProperties {
    pub device_type: DeviceType,
    pub vendor_id: u32,
    pub device_id: u32,
    pub flags: DevicePropertyFlags,
    pub subdevice_id: u32,
    pub core_clock_rate: u32,
    pub max_mem_alloc_size: u64,
    pub max_hardware_contexts: u32,
    pub max_command_queue_priority: u32,
    pub num_threads_per_eu: u32,
    pub physical_eu_simd_width: u32,
    pub num_eus_per_subslice: u32,
    pub num_subslices_per_slice: u32,
    pub num_slices: u32,
    pub timer_resolution: u64,
    pub timestamp_valid_bits: u32,
    pub kernel_timestamp_valid_bits: u32,
    pub uuid: Uuid,
    pub name: String,
}

impl Default for DeviceProperties {
    fn default() -> Self {
        Self {
            device_type: DeviceType::Gpu,
            vendor_id: 0x8086,
            device_id: 0x56a0,
            flags: DevicePropertyFlags::ONDEMANDPAGING,
            subdevice_id: 0,
            core_clock_rate: 2400,
            max_mem_alloc_size: 4 * 1024 * 1024 * 1024,
            max_hardware_contexts: 65536,
            max_command_queue_priority: 0,
            num_threads_per_eu: 8,
            physical_eu_simd_width: 8,
            num_eus_per_subslice: 16,
            num_subslices_per_slice: 4,
            num_slices: 8,
            timer_resolution: 83,
            timestamp_valid_bits: 36,
            kernel_timestamp_valid_bits: 32,
            uuid: Uuid::nil(),
            name: "Level-Zero GPU".to_string(),
        }
    }
}

impl From<&ffi::ZeDeviceProperties> for DeviceProperties {
    fn from(raw: &ffi::ZeDeviceProperties) -> Self {
        Self {
            device_type: DeviceType::from_raw(raw.device_type),
            vendor_id: raw.vendor_id,
            device_id: raw.device_id,
            flags: DevicePropertyFlags::from_bits_retain(raw.flags),
            subdevice_id: raw.subdevice_id,
            core_clock_rate: raw.core_clock_rate,
            max_mem_alloc_size: raw.max_mem_alloc_size,
            max_hardware_contexts: raw.max_hardware_contexts,
            max_command_queue_priority: raw.max_command_queue_priority,
            num_threads_per_eu: raw.num_threads_per_eu,
            physical_eu_simd_width: raw.physical_eu_simd_width,
            num_eus_per_subslice: raw.num_eus_per_subslice,
            num_subslices_per_slice: raw.num_subslices_per_slice,
            num_slices: raw.num_slices,
            timer_resolution: raw.timer_resolution,
            timestamp_valid_bits: raw.timestamp_valid_bits,
            kernel_timestamp_valid_bits: raw.kernel_timestamp_valid_bits,
            uuid: Uuid::from_bytes(raw.uuid),
            name: ffi::c_name(&raw.name),
        }
    }
}

/// `ze_device_compute_properties_t`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeProperties {
    pub max_total_group_size: u32,
    /// Per-axis maximum group size (x, y, z).
    pub max_group_size: [u32; 3],
    /// Per-axis maximum group count (x, y, z).
    pub max_group_count: [u32; 3],
    pub max_shared_local_memory: u32,
    pub sub_group_sizes: Vec<u32>,
}

impl Default for ComputeProperties {
    fn default() -> Self {
        Self {
            max_total_group_size: 1024,
            max_group_size: [1024, 1024, 1024],
            max_group_count: [u32::MAX, u32::MAX, u32::MAX],
            max_shared_local_memory: 64 * 1024,
            sub_group_sizes: vec![8, 16, 32],
        }
    }
}

impl From<&ffi::ZeDeviceComputeProperties> for ComputeProperties {
    fn from(raw: &ffi::ZeDeviceComputeProperties) -> Self {
        let n = (raw.num_sub_group_sizes as usize).min(raw.sub_group_sizes.len());
        Self {
            max_total_group_size: raw.max_total_group_size,
            max_group_size: [raw.max_group_size_x, raw.max_group_size_y, raw.max_group_size_z],
            max_group_count: [raw.max_group_count_x, raw.max_group_count_y, raw.max_group_count_z],
            max_shared_local_memory: raw.max_shared_local_memory,
            sub_group_sizes: raw.sub_group_sizes[..n].to_vec(),
        }
    }
}

/// One memory bank (`ze_device_memory_properties_t`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryProperties {
    pub name: String,
    pub max_clock_rate: u32,
    pub max_bus_width: u32,
    pub total_size: u64,
}

impl Default for MemoryProperties {
    fn default() -> Self {
        Self {
            name: "HBM".to_string(),
            max_clock_rate: 1600,
            max_bus_width: 64,
            total_size: 16 * 1024 * 1024 * 1024,
        }
    }
}

impl From<&ffi::ZeDeviceMemoryProperties> for MemoryProperties {
    fn from(raw: &ffi::ZeDeviceMemoryProperties) -> Self {
        Self {
            name: ffi::c_name(&raw.name),
            max_clock_rate: raw.max_clock_rate,
            max_bus_width: raw.max_bus_width,
            total_size: raw.total_size,
        }
    }
}

/// `ze_device_memory_access_properties_t`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryAccessProperties {
    pub host_alloc: MemoryAccessCapabilities,
    pub device_alloc: MemoryAccessCapabilities,
    pub shared_single_device_alloc: MemoryAccessCapabilities,
    pub shared_cross_device_alloc: MemoryAccessCapabilities,
    pub shared_system_alloc: MemoryAccessCapabilities,
}

impl Default for MemoryAccessProperties {
    fn default() -> Self {
        let full = MemoryAccessCapabilities::RW | MemoryAccessCapabilities::ATOMIC;
        Self {
            host_alloc: full,
            device_alloc: full,
            shared_single_device_alloc: full,
            shared_cross_device_alloc: MemoryAccessCapabilities::empty(),
            shared_system_alloc: MemoryAccessCapabilities::empty(),
        }
    }
}

impl From<&ffi::ZeDeviceMemoryAccessProperties> for MemoryAccessProperties {
    fn from(raw: &ffi::ZeDeviceMemoryAccessProperties) -> Self {
        Self {
            host_alloc: MemoryAccessCapabilities::from_bits_retain(raw.host_alloc_capabilities),
            device_alloc: MemoryAccessCapabilities::from_bits_retain(raw.device_alloc_capabilities),
            shared_single_device_alloc: MemoryAccessCapabilities::from_bits_retain(
                raw.shared_single_device_alloc_capabilities,
            ),
            shared_cross_device_alloc: MemoryAccessCapabilities::from_bits_retain(
                raw.shared_cross_device_alloc_capabilities,
            ),
            shared_system_alloc: MemoryAccessCapabilities::from_bits_retain(
                raw.shared_system_alloc_capabilities,
            ),
        }
    }
}

/// One cache level (`ze_device_cache_properties_t`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheProperties {
    pub flags: CacheFlags,
    pub cache_size: u64,
}

impl Default for CacheProperties {
    fn default() -> Self {
        Self { flags: CacheFlags::USER_CONTROL, cache_size: 16 * 1024 * 1024 }
    }
}

impl From<&ffi::ZeDeviceCacheProperties> for CacheProperties {
    fn from(raw: &ffi::ZeDeviceCacheProperties) -> Self {
        Self { flags: CacheFlags::from_bits_retain(raw.flags), cache_size: raw.cache_size as u64 }
    }
}

/// `ze_device_image_properties_t`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProperties {
    pub max_image_dims_1d: u32,
    pub max_image_dims_2d: u32,
    pub max_image_dims_3d: u32,
    pub max_image_buffer_size: u64,
    pub max_image_array_slices: u32,
    pub max_samplers: u32,
    pub max_read_image_args: u32,
    pub max_write_image_args: u32,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            max_image_dims_1d: 16384,
            max_image_dims_2d: 16384,
            max_image_dims_3d: 2048,
            max_image_buffer_size: 4 * 1024 * 1024 * 1024,
            max_image_array_slices: 2048,
            max_samplers: 16,
            max_read_image_args: 128,
            max_write_image_args: 128,
        }
    }
}

impl From<&ffi::ZeDeviceImageProperties> for ImageProperties {
    fn from(raw: &ffi::ZeDeviceImageProperties) -> Self {
        Self {
            max_image_dims_1d: raw.max_image_dims_1d,
            max_image_dims_2d: raw.max_image_dims_2d,
            max_image_dims_3d: raw.max_image_dims_3d,
            max_image_buffer_size: raw.max_image_buffer_size,
            max_image_array_slices: raw.max_image_array_slices,
            max_samplers: raw.max_samplers,
            max_read_image_args: raw.max_read_image_args,
            max_write_image_args: raw.max_write_image_args,
        }
    }
}

/// `ze_device_module_properties_t`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleProperties {
    pub spirv_version: SpirvVersion,
    pub flags: ModuleFlags,
    pub fp16: FpCapabilities,
    pub fp32: FpCapabilities,
    pub fp64: FpCapabilities,
    pub max_arguments_size: u32,
    pub printf_buffer_size: u32,
    /// Identifies the native binary format kernels must be compiled to.
    pub native_kernel_uuid: Uuid,
}

impl Default for ModuleProperties {
    fn default() -> Self {
        let fp = FpCapabilities::DENORM
            | FpCapabilities::INF_NAN
            | FpCapabilities::ROUND_TO_NEAREST
            | FpCapabilities::ROUND_TO_ZERO
            | FpCapabilities::ROUND_TO_INF
            | FpCapabilities::FMA;
        Self {
            spirv_version: SpirvVersion::default(),
            flags: ModuleFlags::FP16 | ModuleFlags::INT64_ATOMICS | ModuleFlags::DP4A,
            fp16: fp,
            fp32: fp | FpCapabilities::ROUNDED_DIVIDE_SQRT,
            fp64: FpCapabilities::empty(),
            max_arguments_size: 2048,
            printf_buffer_size: 4 * 1024 * 1024,
            native_kernel_uuid: Uuid::nil(),
        }
    }
}

impl From<&ffi::ZeDeviceModuleProperties> for ModuleProperties {
    fn from(raw: &ffi::ZeDeviceModuleProperties) -> Self {
        Self {
            spirv_version: SpirvVersion(raw.spirv_version_supported),
            flags: ModuleFlags::from_bits_retain(raw.flags),
            fp16: FpCapabilities::from_bits_retain(raw.fp16_flags),
            fp32: FpCapabilities::from_bits_retain(raw.fp32_flags),
            fp64: FpCapabilities::from_bits_retain(raw.fp64_flags),
            max_arguments_size: raw.max_arguments_size,
            printf_buffer_size: raw.printf_buffer_size,
            native_kernel_uuid: Uuid::from_bytes(raw.native_kernel_supported),
        }
    }
}

/// `ze_device_external_memory_properties_t`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalMemoryProperties {
    pub memory_allocation_import_types: ExternalMemoryTypes,
    pub memory_allocation_export_types: ExternalMemoryTypes,
    pub image_import_types: ExternalMemoryTypes,
    pub image_export_types: ExternalMemoryTypes,
}

impl From<&ffi::ZeDeviceExternalMemoryProperties> for ExternalMemoryProperties {
    fn from(raw: &ffi::ZeDeviceExternalMemoryProperties) -> Self {
        Self {
            memory_allocation_import_types: ExternalMemoryTypes::from_bits_retain(
                raw.memory_allocation_import_types,
            ),
            memory_allocation_export_types: ExternalMemoryTypes::from_bits_retain(
                raw.memory_allocation_export_types,
            ),
            image_import_types: ExternalMemoryTypes::from_bits_retain(raw.image_import_types),
            image_export_types: ExternalMemoryTypes::from_bits_retain(raw.image_export_types),
        }
    }
}

/// `ze_device_p2p_properties_t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct P2PProperties {
    pub flags: P2PFlags,
}

impl From<&ffi::ZeDeviceP2PProperties> for P2PProperties {
    fn from(raw: &ffi::ZeDeviceP2PProperties) -> Self {
        Self { flags: P2PFlags::from_bits_retain(raw.flags) }
    }
}

const _: () = assert!(ZE_MAX_DEVICE_UUID_SIZE == 16 && ZE_MAX_NATIVE_KERNEL_UUID_SIZE == 16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spirv_version_packs_major_minor() {
        let v = SpirvVersion::new(1, 4);
        assert_eq!(v.0, 0x0001_0004);
        assert_eq!((v.major(), v.minor()), (1, 4));
        assert_eq!(v.to_string(), "1.4");
    }

    #[test]
    fn unknown_device_type_is_preserved() {
        assert_eq!(DeviceType::from_raw(1), DeviceType::Gpu);
        assert_eq!(DeviceType::from_raw(42), DeviceType::Other(42));
        assert_eq!(DeviceType::Other(42).to_string(), "unknown(42)");
    }

    #[test]
    fn flags_keep_unknown_bits() {
        let flags = DevicePropertyFlags::from_bits_retain(0x8000_0001);
        assert!(flags.contains(DevicePropertyFlags::INTEGRATED));
        assert_eq!(flags.bits(), 0x8000_0001);
    }

    #[test]
    fn flag_names_render() {
        assert_eq!(flag_names(&FpCapabilities::empty()), "none");
        assert_eq!(flag_names(&(FpCapabilities::DENORM | FpCapabilities::FMA)), "DENORM | FMA");
        assert_eq!(flag_names(&P2PFlags::from_bits_retain(0x8000_0000)), "0x80000000");
        assert_eq!(
            flag_names(&(CacheFlags::USER_CONTROL | CacheFlags::from_bits_retain(0x30))),
            "USER_CONTROL | 0x30"
        );
    }

    #[test]
    fn compute_from_raw_truncates_to_count() {
        let mut raw = ffi::ZeDeviceComputeProperties::new();
        raw.num_sub_group_sizes = 2;
        raw.sub_group_sizes[..3].copy_from_slice(&[8, 16, 32]);
        assert_eq!(ComputeProperties::from(&raw).sub_group_sizes, vec![8, 16]);

        raw.num_sub_group_sizes = 99;
        assert_eq!(ComputeProperties::from(&raw).sub_group_sizes.len(), 8);
    }

    #[test]
    fn device_properties_from_raw() {
        let mut raw = ffi::ZeDeviceProperties::new();
        raw.device_type = ffi::device_type::GPU;
        raw.vendor_id = 0x8086;
        raw.flags = (DevicePropertyFlags::SUBDEVICE | DevicePropertyFlags::ECC).bits();
        raw.uuid = [7; 16];
        let props = DeviceProperties::from(&raw);
        assert_eq!(props.device_type, DeviceType::Gpu);
        assert_eq!(props.vendor_id, 0x8086);
        assert!(props.flags.contains(DevicePropertyFlags::SUBDEVICE));
        assert_eq!(props.uuid.as_bytes(), &[7; 16]);
        assert!(props.name.is_empty());
    }

    #[test]
    fn handles_display_as_hex() {
        assert_eq!(DeviceHandle::from_raw(0x1a).to_string(), "0x1a");
        assert!(DriverHandle::from_raw(0).is_null());
    }
}
