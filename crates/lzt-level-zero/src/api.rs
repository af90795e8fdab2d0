//! The device/driver query facade.
//!
//! [`DeviceApi`] mirrors the Level-Zero device query surface one method per
//! entry point. List-shaped queries follow the count-then-fill convention of
//! the C API, so the count-only half is exposed separately where conformance
//! checks need to compare the two.

use crate::error::Result;
use crate::properties::{
    CacheProperties, ComputeProperties, DeviceHandle, DeviceProperties, DriverHandle,
    ExternalMemoryProperties, ImageProperties, MemoryAccessProperties, MemoryProperties,
    ModuleProperties, P2PProperties,
};

/// Synchronous, side-effect-free device queries.
pub trait DeviceApi {
    /// Short backend name for logs and reports.
    fn backend_name(&self) -> &'static str;

    fn drivers(&self) -> Result<Vec<DriverHandle>>;

    /// Count-only half of [`DeviceApi::devices`].
    fn device_count(&self, driver: DriverHandle) -> Result<u32>;

    fn devices(&self, driver: DriverHandle) -> Result<Vec<DeviceHandle>>;

    /// Count-only half of [`DeviceApi::sub_devices`].
    fn sub_device_count(&self, device: DeviceHandle) -> Result<u32>;

    fn sub_devices(&self, device: DeviceHandle) -> Result<Vec<DeviceHandle>>;

    fn device_properties(&self, device: DeviceHandle) -> Result<DeviceProperties>;

    fn compute_properties(&self, device: DeviceHandle) -> Result<ComputeProperties>;

    fn module_properties(&self, device: DeviceHandle) -> Result<ModuleProperties>;

    /// Count-only half of [`DeviceApi::memory_properties`].
    fn memory_properties_count(&self, device: DeviceHandle) -> Result<u32>;

    fn memory_properties(&self, device: DeviceHandle) -> Result<Vec<MemoryProperties>>;

    fn memory_access_properties(&self, device: DeviceHandle) -> Result<MemoryAccessProperties>;

    fn cache_properties(&self, device: DeviceHandle) -> Result<Vec<CacheProperties>>;

    fn image_properties(&self, device: DeviceHandle) -> Result<ImageProperties>;

    fn external_memory_properties(&self, device: DeviceHandle)
    -> Result<ExternalMemoryProperties>;

    fn p2p_properties(&self, device: DeviceHandle, peer: DeviceHandle) -> Result<P2PProperties>;

    fn can_access_peer(&self, device: DeviceHandle, peer: DeviceHandle) -> Result<bool>;

    /// First driver, if any.
    fn default_driver(&self) -> Result<Option<DriverHandle>> {
        Ok(self.drivers()?.into_iter().next())
    }

    /// Root devices of every driver, in driver then enumeration order.
    fn all_devices(&self) -> Result<Vec<DeviceHandle>> {
        let mut all = Vec::new();
        for driver in self.drivers()? {
            all.extend(self.devices(driver)?);
        }
        Ok(all)
    }

    /// Number of root devices across every driver.
    fn total_device_count(&self) -> Result<usize> {
        let mut total = 0usize;
        for driver in self.drivers()? {
            total += self.device_count(driver)? as usize;
        }
        Ok(total)
    }
}
