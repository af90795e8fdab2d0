//! Raw Level-Zero ABI: result codes, handle types, `#[repr(C)]` property
//! structs, and the function-pointer signatures resolved by the loader.
//!
//! Layouts follow `ze_api.h` (API 1.x). Every property struct starts with an
//! `stype`/`pNext` header; callers must set `stype` before passing the struct
//! to the driver, which the `new()` constructors do.

use std::ffi::{c_char, c_void};
use std::fmt;

/// `ze_driver_handle_t`
pub type ZeDriverHandle = *mut c_void;
/// `ze_device_handle_t`
pub type ZeDeviceHandle = *mut c_void;
/// `ze_bool_t`
pub type ZeBool = u8;

pub const ZE_MAX_DEVICE_NAME: usize = 256;
pub const ZE_MAX_DEVICE_UUID_SIZE: usize = 16;
pub const ZE_MAX_NATIVE_KERNEL_UUID_SIZE: usize = 16;
pub const ZE_SUBGROUPSIZE_COUNT: usize = 8;

/// `ze_result_t`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ZeResult(pub u32);

impl ZeResult {
    pub const SUCCESS: Self = Self(0);
    pub const NOT_READY: Self = Self(1);
    pub const ERROR_DEVICE_LOST: Self = Self(0x7000_0001);
    pub const ERROR_OUT_OF_HOST_MEMORY: Self = Self(0x7000_0002);
    pub const ERROR_OUT_OF_DEVICE_MEMORY: Self = Self(0x7000_0003);
    pub const ERROR_UNINITIALIZED: Self = Self(0x7800_0001);
    pub const ERROR_UNSUPPORTED_VERSION: Self = Self(0x7800_0002);
    pub const ERROR_UNSUPPORTED_FEATURE: Self = Self(0x7800_0003);
    pub const ERROR_INVALID_ARGUMENT: Self = Self(0x7800_0004);
    pub const ERROR_INVALID_NULL_HANDLE: Self = Self(0x7800_0005);
    pub const ERROR_HANDLE_OBJECT_IN_USE: Self = Self(0x7800_0006);
    pub const ERROR_INVALID_NULL_POINTER: Self = Self(0x7800_0007);
    pub const ERROR_INVALID_SIZE: Self = Self(0x7800_0008);
    pub const ERROR_UNSUPPORTED_SIZE: Self = Self(0x7800_0009);
    pub const ERROR_INVALID_ENUMERATION: Self = Self(0x7800_000c);
    pub const ERROR_UNKNOWN: Self = Self(0x7fff_fffe);

    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Symbolic name, or `None` for codes this crate does not know.
    pub const fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::SUCCESS => "ZE_RESULT_SUCCESS",
            Self::NOT_READY => "ZE_RESULT_NOT_READY",
            Self::ERROR_DEVICE_LOST => "ZE_RESULT_ERROR_DEVICE_LOST",
            Self::ERROR_OUT_OF_HOST_MEMORY => "ZE_RESULT_ERROR_OUT_OF_HOST_MEMORY",
            Self::ERROR_OUT_OF_DEVICE_MEMORY => "ZE_RESULT_ERROR_OUT_OF_DEVICE_MEMORY",
            Self::ERROR_UNINITIALIZED => "ZE_RESULT_ERROR_UNINITIALIZED",
            Self::ERROR_UNSUPPORTED_VERSION => "ZE_RESULT_ERROR_UNSUPPORTED_VERSION",
            Self::ERROR_UNSUPPORTED_FEATURE => "ZE_RESULT_ERROR_UNSUPPORTED_FEATURE",
            Self::ERROR_INVALID_ARGUMENT => "ZE_RESULT_ERROR_INVALID_ARGUMENT",
            Self::ERROR_INVALID_NULL_HANDLE => "ZE_RESULT_ERROR_INVALID_NULL_HANDLE",
            Self::ERROR_HANDLE_OBJECT_IN_USE => "ZE_RESULT_ERROR_HANDLE_OBJECT_IN_USE",
            Self::ERROR_INVALID_NULL_POINTER => "ZE_RESULT_ERROR_INVALID_NULL_POINTER",
            Self::ERROR_INVALID_SIZE => "ZE_RESULT_ERROR_INVALID_SIZE",
            Self::ERROR_UNSUPPORTED_SIZE => "ZE_RESULT_ERROR_UNSUPPORTED_SIZE",
            Self::ERROR_INVALID_ENUMERATION => "ZE_RESULT_ERROR_INVALID_ENUMERATION",
            Self::ERROR_UNKNOWN => "ZE_RESULT_ERROR_UNKNOWN",
            _ => return None,
        })
    }
}

impl fmt::Display for ZeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} (0x{:08x})", self.0),
            None => write!(f, "0x{:08x}", self.0),
        }
    }
}

impl fmt::Debug for ZeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// `ze_structure_type_t` values for the structs used here.
pub mod stype {
    pub const DEVICE_PROPERTIES: u32 = 0x3;
    pub const DEVICE_COMPUTE_PROPERTIES: u32 = 0x4;
    pub const DEVICE_MODULE_PROPERTIES: u32 = 0x5;
    pub const DEVICE_MEMORY_PROPERTIES: u32 = 0x7;
    pub const DEVICE_MEMORY_ACCESS_PROPERTIES: u32 = 0x8;
    pub const DEVICE_CACHE_PROPERTIES: u32 = 0x9;
    pub const DEVICE_IMAGE_PROPERTIES: u32 = 0xa;
    pub const DEVICE_P2P_PROPERTIES: u32 = 0xb;
    pub const DEVICE_EXTERNAL_MEMORY_PROPERTIES: u32 = 0xc;
}

/// `ze_device_type_t` values.
pub mod device_type {
    pub const GPU: u32 = 1;
    pub const CPU: u32 = 2;
    pub const FPGA: u32 = 3;
    pub const MCA: u32 = 4;
    pub const VPU: u32 = 5;
}

macro_rules! zeroed_with_stype {
    ($ty:ident, $stype:expr) => {
        impl $ty {
            /// Zero-initialised struct with `stype` set and `pNext` null.
            pub fn new() -> Self {
                // SAFETY: every field is an integer, a byte/char array, or a raw
                // pointer, all of which are valid when zeroed.
                let mut raw: Self = unsafe { std::mem::zeroed() };
                raw.stype = $stype;
                raw.p_next = std::ptr::null_mut();
                raw
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// `ze_device_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub device_type: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub flags: u32,
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
    pub uuid: [u8; ZE_MAX_DEVICE_UUID_SIZE],
    pub name: [c_char; ZE_MAX_DEVICE_NAME],
}
zeroed_with_stype!(ZeDeviceProperties, stype::DEVICE_PROPERTIES);

/// `ze_device_compute_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceComputeProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub max_total_group_size: u32,
    pub max_group_size_x: u32,
    pub max_group_size_y: u32,
    pub max_group_size_z: u32,
    pub max_group_count_x: u32,
    pub max_group_count_y: u32,
    pub max_group_count_z: u32,
    pub max_shared_local_memory: u32,
    pub num_sub_group_sizes: u32,
    pub sub_group_sizes: [u32; ZE_SUBGROUPSIZE_COUNT],
}
zeroed_with_stype!(ZeDeviceComputeProperties, stype::DEVICE_COMPUTE_PROPERTIES);

/// `ze_device_module_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceModuleProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub spirv_version_supported: u32,
    pub flags: u32,
    pub fp16_flags: u32,
    pub fp32_flags: u32,
    pub fp64_flags: u32,
    pub max_arguments_size: u32,
    pub printf_buffer_size: u32,
    pub native_kernel_supported: [u8; ZE_MAX_NATIVE_KERNEL_UUID_SIZE],
}
zeroed_with_stype!(ZeDeviceModuleProperties, stype::DEVICE_MODULE_PROPERTIES);

/// `ze_device_memory_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceMemoryProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub flags: u32,
    pub max_clock_rate: u32,
    pub max_bus_width: u32,
    pub total_size: u64,
    pub name: [c_char; ZE_MAX_DEVICE_NAME],
}
zeroed_with_stype!(ZeDeviceMemoryProperties, stype::DEVICE_MEMORY_PROPERTIES);

/// `ze_device_memory_access_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceMemoryAccessProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub host_alloc_capabilities: u32,
    pub device_alloc_capabilities: u32,
    pub shared_single_device_alloc_capabilities: u32,
    pub shared_cross_device_alloc_capabilities: u32,
    pub shared_system_alloc_capabilities: u32,
}
zeroed_with_stype!(ZeDeviceMemoryAccessProperties, stype::DEVICE_MEMORY_ACCESS_PROPERTIES);

/// `ze_device_cache_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceCacheProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub flags: u32,
    pub cache_size: usize,
}
zeroed_with_stype!(ZeDeviceCacheProperties, stype::DEVICE_CACHE_PROPERTIES);

/// `ze_device_image_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceImageProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub max_image_dims_1d: u32,
    pub max_image_dims_2d: u32,
    pub max_image_dims_3d: u32,
    pub max_image_buffer_size: u64,
    pub max_image_array_slices: u32,
    pub max_samplers: u32,
    pub max_read_image_args: u32,
    pub max_write_image_args: u32,
}
zeroed_with_stype!(ZeDeviceImageProperties, stype::DEVICE_IMAGE_PROPERTIES);

/// `ze_device_external_memory_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceExternalMemoryProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub memory_allocation_import_types: u32,
    pub memory_allocation_export_types: u32,
    pub image_import_types: u32,
    pub image_export_types: u32,
}
zeroed_with_stype!(ZeDeviceExternalMemoryProperties, stype::DEVICE_EXTERNAL_MEMORY_PROPERTIES);

/// `ze_device_p2p_properties_t`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct ZeDeviceP2PProperties {
    pub stype: u32,
    pub p_next: *mut c_void,
    pub flags: u32,
}
zeroed_with_stype!(ZeDeviceP2PProperties, stype::DEVICE_P2P_PROPERTIES);

// ── Entry points ────────────────────────────────────────────────────────────

pub type ZeInitFn = unsafe extern "C" fn(flags: u32) -> ZeResult;
pub type ZeDriverGetFn = unsafe extern "C" fn(count: *mut u32, drivers: *mut ZeDriverHandle) -> ZeResult;
pub type ZeDeviceGetFn = unsafe extern "C" fn(
    driver: ZeDriverHandle,
    count: *mut u32,
    devices: *mut ZeDeviceHandle,
) -> ZeResult;
pub type ZeDeviceGetSubDevicesFn = unsafe extern "C" fn(
    device: ZeDeviceHandle,
    count: *mut u32,
    sub_devices: *mut ZeDeviceHandle,
) -> ZeResult;
pub type ZeDeviceGetPropertiesFn =
    unsafe extern "C" fn(device: ZeDeviceHandle, props: *mut ZeDeviceProperties) -> ZeResult;
pub type ZeDeviceGetComputePropertiesFn =
    unsafe extern "C" fn(device: ZeDeviceHandle, props: *mut ZeDeviceComputeProperties) -> ZeResult;
pub type ZeDeviceGetModulePropertiesFn =
    unsafe extern "C" fn(device: ZeDeviceHandle, props: *mut ZeDeviceModuleProperties) -> ZeResult;
pub type ZeDeviceGetMemoryPropertiesFn = unsafe extern "C" fn(
    device: ZeDeviceHandle,
    count: *mut u32,
    props: *mut ZeDeviceMemoryProperties,
) -> ZeResult;
pub type ZeDeviceGetMemoryAccessPropertiesFn = unsafe extern "C" fn(
    device: ZeDeviceHandle,
    props: *mut ZeDeviceMemoryAccessProperties,
) -> ZeResult;
pub type ZeDeviceGetCachePropertiesFn = unsafe extern "C" fn(
    device: ZeDeviceHandle,
    count: *mut u32,
    props: *mut ZeDeviceCacheProperties,
) -> ZeResult;
pub type ZeDeviceGetImagePropertiesFn =
    unsafe extern "C" fn(device: ZeDeviceHandle, props: *mut ZeDeviceImageProperties) -> ZeResult;
pub type ZeDeviceGetExternalMemoryPropertiesFn = unsafe extern "C" fn(
    device: ZeDeviceHandle,
    props: *mut ZeDeviceExternalMemoryProperties,
) -> ZeResult;
pub type ZeDeviceGetP2PPropertiesFn = unsafe extern "C" fn(
    device: ZeDeviceHandle,
    peer: ZeDeviceHandle,
    props: *mut ZeDeviceP2PProperties,
) -> ZeResult;
pub type ZeDeviceCanAccessPeerFn = unsafe extern "C" fn(
    device: ZeDeviceHandle,
    peer: ZeDeviceHandle,
    value: *mut ZeBool,
) -> ZeResult;

/// Decode a NUL-terminated `char[N]` field.
pub fn c_name(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_display_includes_name_and_code() {
        let s = ZeResult::ERROR_DEVICE_LOST.to_string();
        assert!(s.contains("ZE_RESULT_ERROR_DEVICE_LOST"), "{s}");
        assert!(s.contains("0x70000001"), "{s}");
    }

    #[test]
    fn unknown_result_is_hex_only() {
        assert_eq!(ZeResult(0x1234).to_string(), "0x00001234");
        assert!(ZeResult(0x1234).name().is_none());
    }

    #[test]
    fn new_sets_stype_and_null_next() {
        let props = ZeDeviceProperties::new();
        assert_eq!(props.stype, stype::DEVICE_PROPERTIES);
        assert!(props.p_next.is_null());
        assert_eq!(ZeDeviceP2PProperties::new().stype, stype::DEVICE_P2P_PROPERTIES);
    }

    #[test]
    fn c_name_stops_at_nul() {
        let mut raw = [0 as c_char; 16];
        for (dst, src) in raw.iter_mut().zip(b"Arc A770\0junk") {
            *dst = *src as c_char;
        }
        assert_eq!(c_name(&raw), "Arc A770");
    }

    #[test]
    fn header_layout_matches_c() {
        // stype (4) + padding (4) + pNext (8) on 64-bit targets.
        #[cfg(target_pointer_width = "64")]
        {
            assert_eq!(std::mem::offset_of!(ZeDeviceProperties, device_type), 16);
            assert_eq!(std::mem::size_of::<ZeDeviceP2PProperties>(), 24);
            assert_eq!(std::mem::size_of::<ZeDeviceCacheProperties>(), 32);
        }
    }
}
