//! Level-Zero loader backend via dynamic loading.
//!
//! Resolves the `ze*` device query entry points from the system loader
//! library at runtime, so the harness builds without the Level-Zero SDK and
//! reports a missing runtime as an ordinary error.

use crate::api::DeviceApi;
use crate::error::{LevelZeroError, Result, check};
use crate::ffi::{self, ZeDeviceHandle, ZeDriverHandle};
use crate::properties::{
    CacheProperties, ComputeProperties, DeviceHandle, DeviceProperties, DriverHandle,
    ExternalMemoryProperties, ImageProperties, MemoryAccessProperties, MemoryProperties,
    ModuleProperties, P2PProperties,
};
use libloading::Library;
use std::path::Path;
use tracing::{debug, info};

/// Library names tried, in order, by [`LoaderApi::load`].
#[cfg(target_os = "windows")]
pub const LOADER_CANDIDATES: &[&str] = &["ze_loader.dll"];
#[cfg(not(target_os = "windows"))]
pub const LOADER_CANDIDATES: &[&str] = &["libze_loader.so.1", "libze_loader.so"];

struct ZeFunctions {
    driver_get: ffi::ZeDriverGetFn,
    device_get: ffi::ZeDeviceGetFn,
    device_get_sub_devices: ffi::ZeDeviceGetSubDevicesFn,
    device_get_properties: ffi::ZeDeviceGetPropertiesFn,
    device_get_compute_properties: ffi::ZeDeviceGetComputePropertiesFn,
    device_get_module_properties: ffi::ZeDeviceGetModulePropertiesFn,
    device_get_memory_properties: ffi::ZeDeviceGetMemoryPropertiesFn,
    device_get_memory_access_properties: ffi::ZeDeviceGetMemoryAccessPropertiesFn,
    device_get_cache_properties: ffi::ZeDeviceGetCachePropertiesFn,
    device_get_image_properties: ffi::ZeDeviceGetImagePropertiesFn,
    device_get_external_memory_properties: ffi::ZeDeviceGetExternalMemoryPropertiesFn,
    device_get_p2p_properties: ffi::ZeDeviceGetP2PPropertiesFn,
    device_can_access_peer: ffi::ZeDeviceCanAccessPeerFn,
}

/// Copy a function pointer out of `lib`.
///
/// # Safety
/// `T` must be the exact signature of the exported symbol.
unsafe fn symbol<T: Copy>(lib: &Library, name: &'static str) -> Result<T> {
    let mut cname = Vec::with_capacity(name.len() + 1);
    cname.extend_from_slice(name.as_bytes());
    cname.push(0);
    // SAFETY: forwarded to the caller.
    let sym = unsafe { lib.get::<T>(&cname) }
        .map_err(|e| LevelZeroError::SymbolNotFound { name: name.to_string(), reason: e.to_string() })?;
    Ok(*sym)
}

impl ZeFunctions {
    /// # Safety
    /// `lib` must be a Level-Zero loader exporting the 1.x ABI.
    unsafe fn resolve(lib: &Library) -> Result<Self> {
        // SAFETY: signatures in `ffi` match `ze_api.h`.
        unsafe {
            Ok(Self {
                driver_get: symbol(lib, "zeDriverGet")?,
                device_get: symbol(lib, "zeDeviceGet")?,
                device_get_sub_devices: symbol(lib, "zeDeviceGetSubDevices")?,
                device_get_properties: symbol(lib, "zeDeviceGetProperties")?,
                device_get_compute_properties: symbol(lib, "zeDeviceGetComputeProperties")?,
                device_get_module_properties: symbol(lib, "zeDeviceGetModuleProperties")?,
                device_get_memory_properties: symbol(lib, "zeDeviceGetMemoryProperties")?,
                device_get_memory_access_properties: symbol(
                    lib,
                    "zeDeviceGetMemoryAccessProperties",
                )?,
                device_get_cache_properties: symbol(lib, "zeDeviceGetCacheProperties")?,
                device_get_image_properties: symbol(lib, "zeDeviceGetImageProperties")?,
                device_get_external_memory_properties: symbol(
                    lib,
                    "zeDeviceGetExternalMemoryProperties",
                )?,
                device_get_p2p_properties: symbol(lib, "zeDeviceGetP2PProperties")?,
                device_can_access_peer: symbol(lib, "zeDeviceCanAccessPeer")?,
            })
        }
    }
}

/// [`DeviceApi`] backed by the system Level-Zero loader.
pub struct LoaderApi {
    fns: ZeFunctions,
    // Keeps the resolved function pointers valid; dropped last.
    _lib: Library,
}

impl std::fmt::Debug for LoaderApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderApi").finish_non_exhaustive()
    }
}

impl LoaderApi {
    /// Load the first loader library found in [`LOADER_CANDIDATES`] and
    /// initialise the driver stack.
    pub fn load() -> Result<Self> {
        let mut tried = Vec::new();
        for name in LOADER_CANDIDATES {
            // SAFETY: loading a shared library runs its initialisers; the
            // Level-Zero loader has no unsound ones.
            match unsafe { Library::new(name) } {
                Ok(lib) => {
                    info!(library = name, "Level-Zero loader found");
                    return Self::from_library(lib);
                }
                Err(e) => {
                    debug!(library = name, error = %e, "Level-Zero loader candidate not loadable");
                    tried.push(format!("{name}: {e}"));
                }
            }
        }
        Err(LevelZeroError::RuntimeNotFound(tried.join("; ")))
    }

    /// Load the loader library at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        // SAFETY: see `load`.
        let lib = unsafe { Library::new(path) }
            .map_err(|e| LevelZeroError::RuntimeNotFound(format!("{}: {e}", path.display())))?;
        info!(library = %path.display(), "Level-Zero loader found");
        Self::from_library(lib)
    }

    fn from_library(lib: Library) -> Result<Self> {
        // SAFETY: the library was located under a Level-Zero loader name.
        let init: ffi::ZeInitFn = unsafe { symbol(&lib, "zeInit")? };
        let fns = unsafe { ZeFunctions::resolve(&lib)? };
        // SAFETY: zeInit takes flags by value; 0 selects all driver types.
        check("zeInit", unsafe { init(0) })?;
        debug!("zeInit succeeded");
        Ok(Self { fns, _lib: lib })
    }
}

fn raw_device(handle: DeviceHandle) -> ZeDeviceHandle {
    handle.as_raw() as ZeDeviceHandle
}

fn raw_driver(handle: DriverHandle) -> ZeDriverHandle {
    handle.as_raw() as ZeDriverHandle
}

/// Run a count-then-fill query: ask for the count with a null buffer, then
/// fill a buffer of that size. The second call may lower the count.
fn count_then_fill<T: Clone>(
    call: &'static str,
    empty: T,
    mut query: impl FnMut(*mut u32, *mut T) -> ffi::ZeResult,
) -> Result<Vec<T>> {
    let mut count = 0u32;
    check(call, query(&mut count, std::ptr::null_mut()))?;
    if count == 0 {
        return Ok(Vec::new());
    }
    let mut items = vec![empty; count as usize];
    check(call, query(&mut count, items.as_mut_ptr()))?;
    items.truncate(count as usize);
    Ok(items)
}

fn count_only<T>(
    call: &'static str,
    mut query: impl FnMut(*mut u32, *mut T) -> ffi::ZeResult,
) -> Result<u32> {
    let mut count = 0u32;
    check(call, query(&mut count, std::ptr::null_mut()))?;
    Ok(count)
}

// SAFETY (applies to every `unsafe` block below): function pointers were
// resolved from the loader with matching signatures, struct arguments are
// initialised with their `stype`, and count/buffer pairs are sized together.
impl DeviceApi for LoaderApi {
    fn backend_name(&self) -> &'static str {
        "loader"
    }

    fn drivers(&self) -> Result<Vec<DriverHandle>> {
        let raw = count_then_fill::<ZeDriverHandle>("zeDriverGet", std::ptr::null_mut(), |count, out| unsafe {
            (self.fns.driver_get)(count, out)
        })?;
        Ok(raw.into_iter().map(|h| DriverHandle::from_raw(h as usize)).collect())
    }

    fn device_count(&self, driver: DriverHandle) -> Result<u32> {
        count_only::<ZeDeviceHandle>("zeDeviceGet", |count, out| unsafe {
            (self.fns.device_get)(raw_driver(driver), count, out)
        })
    }

    fn devices(&self, driver: DriverHandle) -> Result<Vec<DeviceHandle>> {
        let raw = count_then_fill::<ZeDeviceHandle>("zeDeviceGet", std::ptr::null_mut(), |count, out| unsafe {
            (self.fns.device_get)(raw_driver(driver), count, out)
        })?;
        Ok(raw.into_iter().map(|h| DeviceHandle::from_raw(h as usize)).collect())
    }

    fn sub_device_count(&self, device: DeviceHandle) -> Result<u32> {
        count_only::<ZeDeviceHandle>("zeDeviceGetSubDevices", |count, out| unsafe {
            (self.fns.device_get_sub_devices)(raw_device(device), count, out)
        })
    }

    fn sub_devices(&self, device: DeviceHandle) -> Result<Vec<DeviceHandle>> {
        let raw =
            count_then_fill::<ZeDeviceHandle>("zeDeviceGetSubDevices", std::ptr::null_mut(), |count, out| unsafe {
                (self.fns.device_get_sub_devices)(raw_device(device), count, out)
            })?;
        Ok(raw.into_iter().map(|h| DeviceHandle::from_raw(h as usize)).collect())
    }

    fn device_properties(&self, device: DeviceHandle) -> Result<DeviceProperties> {
        let mut raw = ffi::ZeDeviceProperties::new();
        check("zeDeviceGetProperties", unsafe {
            (self.fns.device_get_properties)(raw_device(device), &mut raw)
        })?;
        Ok(DeviceProperties::from(&raw))
    }

    fn compute_properties(&self, device: DeviceHandle) -> Result<ComputeProperties> {
        let mut raw = ffi::ZeDeviceComputeProperties::new();
        check("zeDeviceGetComputeProperties", unsafe {
            (self.fns.device_get_compute_properties)(raw_device(device), &mut raw)
        })?;
        Ok(ComputeProperties::from(&raw))
    }

    fn module_properties(&self, device: DeviceHandle) -> Result<ModuleProperties> {
        let mut raw = ffi::ZeDeviceModuleProperties::new();
        check("zeDeviceGetModuleProperties", unsafe {
            (self.fns.device_get_module_properties)(raw_device(device), &mut raw)
        })?;
        Ok(ModuleProperties::from(&raw))
    }

    fn memory_properties_count(&self, device: DeviceHandle) -> Result<u32> {
        count_only::<ffi::ZeDeviceMemoryProperties>("zeDeviceGetMemoryProperties", |count, out| unsafe {
            (self.fns.device_get_memory_properties)(raw_device(device), count, out)
        })
    }

    fn memory_properties(&self, device: DeviceHandle) -> Result<Vec<MemoryProperties>> {
        let raw = count_then_fill(
            "zeDeviceGetMemoryProperties",
            ffi::ZeDeviceMemoryProperties::new(),
            |count, out| unsafe {
                (self.fns.device_get_memory_properties)(raw_device(device), count, out)
            },
        )?;
        Ok(raw.iter().map(MemoryProperties::from).collect())
    }

    fn memory_access_properties(&self, device: DeviceHandle) -> Result<MemoryAccessProperties> {
        let mut raw = ffi::ZeDeviceMemoryAccessProperties::new();
        check("zeDeviceGetMemoryAccessProperties", unsafe {
            (self.fns.device_get_memory_access_properties)(raw_device(device), &mut raw)
        })?;
        Ok(MemoryAccessProperties::from(&raw))
    }

    fn cache_properties(&self, device: DeviceHandle) -> Result<Vec<CacheProperties>> {
        let raw = count_then_fill(
            "zeDeviceGetCacheProperties",
            ffi::ZeDeviceCacheProperties::new(),
            |count, out| unsafe {
                (self.fns.device_get_cache_properties)(raw_device(device), count, out)
            },
        )?;
        Ok(raw.iter().map(CacheProperties::from).collect())
    }

    fn image_properties(&self, device: DeviceHandle) -> Result<ImageProperties> {
        let mut raw = ffi::ZeDeviceImageProperties::new();
        check("zeDeviceGetImageProperties", unsafe {
            (self.fns.device_get_image_properties)(raw_device(device), &mut raw)
        })?;
        Ok(ImageProperties::from(&raw))
    }

    fn external_memory_properties(
        &self,
        device: DeviceHandle,
    ) -> Result<ExternalMemoryProperties> {
        let mut raw = ffi::ZeDeviceExternalMemoryProperties::new();
        check("zeDeviceGetExternalMemoryProperties", unsafe {
            (self.fns.device_get_external_memory_properties)(raw_device(device), &mut raw)
        })?;
        Ok(ExternalMemoryProperties::from(&raw))
    }

    fn p2p_properties(&self, device: DeviceHandle, peer: DeviceHandle) -> Result<P2PProperties> {
        let mut raw = ffi::ZeDeviceP2PProperties::new();
        check("zeDeviceGetP2PProperties", unsafe {
            (self.fns.device_get_p2p_properties)(raw_device(device), raw_device(peer), &mut raw)
        })?;
        Ok(P2PProperties::from(&raw))
    }

    fn can_access_peer(&self, device: DeviceHandle, peer: DeviceHandle) -> Result<bool> {
        let mut value: ffi::ZeBool = 0;
        check("zeDeviceCanAccessPeer", unsafe {
            (self.fns.device_can_access_peer)(raw_device(device), raw_device(peer), &mut value)
        })?;
        Ok(value != 0)
    }
}
