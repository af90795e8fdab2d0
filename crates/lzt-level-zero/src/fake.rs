//! In-memory [`DeviceApi`] backend.
//!
//! A [`FakeTopology`] describes drivers, their root devices, and each
//! device's sub-devices together with every property record the facade can
//! return. Topologies are written in TOML or built in code, and can inject
//! the faults a conformance run must catch: failing queries, a memory-bank
//! count that disagrees with the fetched list, null handles, and asymmetric
//! or missing peer access.
//!
//! ```
//! use lzt_level_zero::{DeviceApi, FakeApi, FakeDevice, FakeTopology};
//!
//! let api = FakeApi::new(FakeTopology::single_driver([
//!     FakeDevice::gpu(0x8086, 0x56a0),
//!     FakeDevice::gpu(0x8086, 0x56a0),
//! ]));
//! assert_eq!(api.total_device_count().unwrap(), 2);
//! ```

use crate::api::DeviceApi;
use crate::error::{LevelZeroError, Result};
use crate::ffi::ZeResult;
use crate::properties::{
    CacheProperties, ComputeProperties, DeviceHandle, DeviceProperties, DevicePropertyFlags,
    DriverHandle, ExternalMemoryProperties, ImageProperties, MemoryAccessProperties,
    MemoryProperties, ModuleProperties, P2PFlags, P2PProperties,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

const DRIVER_HANDLE_BASE: usize = 0xd000;
const DEVICE_HANDLE_BASE: usize = 0x1_0000;

/// Prefix of UUIDs assigned to devices whose topology entry leaves it nil.
const DERIVED_UUID_PREFIX: u128 = 0x6c7a_7400_0000_0000_0000_0000_0000_0000;

/// Result code returned by injected query failures.
pub const INJECTED_FAILURE: ZeResult = ZeResult::ERROR_DEVICE_LOST;

/// Device-scoped queries that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FakeQuery {
    SubDevices,
    DeviceProperties,
    ComputeProperties,
    ModuleProperties,
    MemoryProperties,
    MemoryAccessProperties,
    CacheProperties,
    ImageProperties,
    ExternalMemoryProperties,
    P2pProperties,
    CanAccessPeer,
}

/// A whole fake system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FakeTopology {
    pub drivers: Vec<FakeDriver>,
    pub peer_access: PeerAccessRules,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FakeDriver {
    pub devices: Vec<FakeDevice>,
}

/// One device and everything the facade reports about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FakeDevice {
    pub properties: DeviceProperties,
    pub compute: ComputeProperties,
    pub module: ModuleProperties,
    pub memory: Vec<MemoryProperties>,
    pub memory_access: MemoryAccessProperties,
    pub cache: Vec<CacheProperties>,
    pub image: ImageProperties,
    pub external_memory: ExternalMemoryProperties,
    pub p2p: P2PProperties,
    /// Sub-devices; they get the SUBDEVICE flag and their position as
    /// `subdevice_id`.
    pub sub_devices: Vec<FakeDevice>,
    /// Count returned by the count-only memory query instead of
    /// `memory.len()`.
    pub reported_memory_count: Option<u32>,
    /// Queries that fail with [`INJECTED_FAILURE`].
    pub failing_queries: Vec<FakeQuery>,
    /// Enumerate this device as a null handle.
    pub null_handle: bool,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self {
            properties: DeviceProperties::default(),
            compute: ComputeProperties::default(),
            module: ModuleProperties::default(),
            memory: vec![MemoryProperties::default()],
            memory_access: MemoryAccessProperties::default(),
            cache: vec![CacheProperties::default()],
            image: ImageProperties::default(),
            external_memory: ExternalMemoryProperties::default(),
            p2p: P2PProperties { flags: P2PFlags::ACCESS },
            sub_devices: Vec::new(),
            reported_memory_count: None,
            failing_queries: Vec::new(),
            null_handle: false,
        }
    }
}

impl FakeDevice {
    /// A GPU with default properties and the given SKU.
    pub fn gpu(vendor_id: u32, device_id: u32) -> Self {
        let mut device = Self::default();
        device.properties.vendor_id = vendor_id;
        device.properties.device_id = device_id;
        device
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.properties.uuid = uuid;
        self
    }

    /// Add `count` sub-devices that copy this device's records.
    pub fn with_sub_devices(mut self, count: usize) -> Self {
        let mut template = self.clone();
        template.sub_devices.clear();
        template.properties.uuid = Uuid::nil();
        self.sub_devices = vec![template; count];
        self
    }

    pub fn failing(mut self, query: FakeQuery) -> Self {
        self.failing_queries.push(query);
        self
    }

    fn fails(&self, query: FakeQuery) -> bool {
        self.failing_queries.contains(&query)
    }
}

/// Peer-access policy between root devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerAccessRules {
    /// Answer for distinct devices with no matching `denied` entry.
    pub default_allowed: bool,
    /// Answer when a device is asked about itself.
    pub self_access: bool,
    /// Directed links reported as inaccessible.
    pub denied: Vec<PeerLink>,
}

impl Default for PeerAccessRules {
    fn default() -> Self {
        Self { default_allowed: true, self_access: true, denied: Vec::new() }
    }
}

/// A directed pair of root devices, by global enumeration position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerLink {
    pub from: usize,
    pub to: usize,
}

impl FakeTopology {
    /// One driver exposing `devices`.
    pub fn single_driver(devices: impl IntoIterator<Item = FakeDevice>) -> Self {
        Self {
            drivers: vec![FakeDriver { devices: devices.into_iter().collect() }],
            peer_access: PeerAccessRules::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| LevelZeroError::TopologyParse(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LevelZeroError::TopologyParse(e.to_string()))
    }

    /// Record everything `api` reports, so a system can be replayed through
    /// [`FakeApi`] without the hardware.
    pub fn capture(api: &dyn DeviceApi) -> Result<Self> {
        let mut topology = Self::default();
        let mut roots = Vec::new();
        for driver in api.drivers()? {
            let devices = api.devices(driver)?;
            let mut captured = Vec::with_capacity(devices.len());
            for &device in &devices {
                captured.push(capture_device(api, device)?);
            }
            roots.extend(devices);
            topology.drivers.push(FakeDriver { devices: captured });
        }
        for (from, &a) in roots.iter().enumerate() {
            for (to, &b) in roots.iter().enumerate() {
                let allowed = api.can_access_peer(a, b)?;
                if from == to {
                    topology.peer_access.self_access &= allowed;
                } else if !allowed {
                    topology.peer_access.denied.push(PeerLink { from, to });
                }
            }
        }
        Ok(topology)
    }
}

fn capture_device(api: &dyn DeviceApi, device: DeviceHandle) -> Result<FakeDevice> {
    let memory = api.memory_properties(device)?;
    let memory_count = api.memory_properties_count(device)?;
    let mut sub_devices = Vec::new();
    for sub in api.sub_devices(device)? {
        sub_devices.push(capture_device(api, sub)?);
    }
    Ok(FakeDevice {
        properties: api.device_properties(device)?,
        compute: api.compute_properties(device)?,
        module: api.module_properties(device)?,
        reported_memory_count: (memory_count as usize != memory.len()).then_some(memory_count),
        memory,
        memory_access: api.memory_access_properties(device)?,
        cache: api.cache_properties(device)?,
        image: api.image_properties(device)?,
        external_memory: api.external_memory_properties(device)?,
        p2p: api.p2p_properties(device, device)?,
        sub_devices,
        failing_queries: Vec::new(),
        null_handle: device.is_null(),
    })
}

#[derive(Debug)]
struct Node {
    device: FakeDevice,
    handle: DeviceHandle,
    children: Vec<usize>,
    /// Position among all root devices; `None` for sub-devices.
    root_ordinal: Option<usize>,
}

/// [`DeviceApi`] over a [`FakeTopology`].
#[derive(Debug)]
pub struct FakeApi {
    drivers: Vec<Vec<usize>>,
    nodes: Vec<Node>,
    peer_access: PeerAccessRules,
}

impl FakeApi {
    pub fn new(topology: FakeTopology) -> Self {
        let mut api =
            Self { drivers: Vec::new(), nodes: Vec::new(), peer_access: topology.peer_access };
        let mut root_ordinal = 0;
        for driver in topology.drivers {
            let mut roots = Vec::with_capacity(driver.devices.len());
            for device in driver.devices {
                roots.push(api.insert(device, Some(root_ordinal)));
                root_ordinal += 1;
            }
            api.drivers.push(roots);
        }
        debug!(drivers = api.drivers.len(), nodes = api.nodes.len(), "fake topology loaded");
        api
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(FakeTopology::from_path(path)?))
    }

    fn insert(&mut self, mut device: FakeDevice, root_ordinal: Option<usize>) -> usize {
        let index = self.nodes.len();
        if device.properties.uuid.is_nil() {
            device.properties.uuid = Uuid::from_u128(DERIVED_UUID_PREFIX | (index as u128 + 1));
        }
        let handle = if device.null_handle {
            DeviceHandle::from_raw(0)
        } else {
            DeviceHandle::from_raw(DEVICE_HANDLE_BASE + index)
        };
        let subs = std::mem::take(&mut device.sub_devices);
        self.nodes.push(Node { device, handle, children: Vec::new(), root_ordinal });

        let mut children = Vec::with_capacity(subs.len());
        for (position, mut sub) in subs.into_iter().enumerate() {
            sub.properties.flags |= DevicePropertyFlags::SUBDEVICE;
            sub.properties.subdevice_id = position as u32;
            children.push(self.insert(sub, None));
        }
        self.nodes[index].children = children;
        index
    }

    fn driver(&self, handle: DriverHandle) -> Result<&[usize]> {
        handle
            .as_raw()
            .checked_sub(DRIVER_HANDLE_BASE)
            .and_then(|i| self.drivers.get(i))
            .map(Vec::as_slice)
            .ok_or(LevelZeroError::InvalidHandle { kind: "driver", raw: handle.as_raw() })
    }

    fn node(&self, handle: DeviceHandle) -> Result<&Node> {
        handle
            .as_raw()
            .checked_sub(DEVICE_HANDLE_BASE)
            .and_then(|i| self.nodes.get(i))
            .ok_or(LevelZeroError::InvalidHandle { kind: "device", raw: handle.as_raw() })
    }

    fn query(&self, handle: DeviceHandle, query: FakeQuery, call: &'static str) -> Result<&Node> {
        let node = self.node(handle)?;
        if node.device.fails(query) {
            return Err(LevelZeroError::ApiError { call, result: INJECTED_FAILURE });
        }
        Ok(node)
    }

    fn handles(&self, indices: &[usize]) -> Vec<DeviceHandle> {
        indices.iter().map(|&i| self.nodes[i].handle).collect()
    }

    fn peer_allowed(&self, from: &Node, to: &Node) -> bool {
        if from.handle == to.handle {
            return self.peer_access.self_access;
        }
        match (from.root_ordinal, to.root_ordinal) {
            (Some(a), Some(b)) if self.peer_access.denied.contains(&PeerLink { from: a, to: b }) => {
                false
            }
            _ => self.peer_access.default_allowed,
        }
    }
}

impl DeviceApi for FakeApi {
    fn backend_name(&self) -> &'static str {
        "fake"
    }

    fn drivers(&self) -> Result<Vec<DriverHandle>> {
        Ok((0..self.drivers.len()).map(|i| DriverHandle::from_raw(DRIVER_HANDLE_BASE + i)).collect())
    }

    fn device_count(&self, driver: DriverHandle) -> Result<u32> {
        Ok(self.driver(driver)?.len() as u32)
    }

    fn devices(&self, driver: DriverHandle) -> Result<Vec<DeviceHandle>> {
        Ok(self.handles(self.driver(driver)?))
    }

    fn sub_device_count(&self, device: DeviceHandle) -> Result<u32> {
        let node = self.query(device, FakeQuery::SubDevices, "zeDeviceGetSubDevices")?;
        Ok(node.children.len() as u32)
    }

    fn sub_devices(&self, device: DeviceHandle) -> Result<Vec<DeviceHandle>> {
        let node = self.query(device, FakeQuery::SubDevices, "zeDeviceGetSubDevices")?;
        Ok(self.handles(&node.children))
    }

    fn device_properties(&self, device: DeviceHandle) -> Result<DeviceProperties> {
        let node = self.query(device, FakeQuery::DeviceProperties, "zeDeviceGetProperties")?;
        Ok(node.device.properties.clone())
    }

    fn compute_properties(&self, device: DeviceHandle) -> Result<ComputeProperties> {
        let node =
            self.query(device, FakeQuery::ComputeProperties, "zeDeviceGetComputeProperties")?;
        Ok(node.device.compute.clone())
    }

    fn module_properties(&self, device: DeviceHandle) -> Result<ModuleProperties> {
        let node = self.query(device, FakeQuery::ModuleProperties, "zeDeviceGetModuleProperties")?;
        Ok(node.device.module.clone())
    }

    fn memory_properties_count(&self, device: DeviceHandle) -> Result<u32> {
        let node = self.query(device, FakeQuery::MemoryProperties, "zeDeviceGetMemoryProperties")?;
        Ok(node.device.reported_memory_count.unwrap_or(node.device.memory.len() as u32))
    }

    fn memory_properties(&self, device: DeviceHandle) -> Result<Vec<MemoryProperties>> {
        let node = self.query(device, FakeQuery::MemoryProperties, "zeDeviceGetMemoryProperties")?;
        Ok(node.device.memory.clone())
    }

    fn memory_access_properties(&self, device: DeviceHandle) -> Result<MemoryAccessProperties> {
        let node = self.query(
            device,
            FakeQuery::MemoryAccessProperties,
            "zeDeviceGetMemoryAccessProperties",
        )?;
        Ok(node.device.memory_access.clone())
    }

    fn cache_properties(&self, device: DeviceHandle) -> Result<Vec<CacheProperties>> {
        let node = self.query(device, FakeQuery::CacheProperties, "zeDeviceGetCacheProperties")?;
        Ok(node.device.cache.clone())
    }

    fn image_properties(&self, device: DeviceHandle) -> Result<ImageProperties> {
        let node = self.query(device, FakeQuery::ImageProperties, "zeDeviceGetImageProperties")?;
        Ok(node.device.image.clone())
    }

    fn external_memory_properties(
        &self,
        device: DeviceHandle,
    ) -> Result<ExternalMemoryProperties> {
        let node = self.query(
            device,
            FakeQuery::ExternalMemoryProperties,
            "zeDeviceGetExternalMemoryProperties",
        )?;
        Ok(node.device.external_memory.clone())
    }

    fn p2p_properties(&self, device: DeviceHandle, peer: DeviceHandle) -> Result<P2PProperties> {
        let from = self.query(device, FakeQuery::P2pProperties, "zeDeviceGetP2PProperties")?;
        let to = self.node(peer)?;
        let mut props = from.device.p2p;
        if !self.peer_allowed(from, to) {
            props.flags.remove(P2PFlags::ACCESS | P2PFlags::ATOMICS);
        }
        Ok(props)
    }

    fn can_access_peer(&self, device: DeviceHandle, peer: DeviceHandle) -> Result<bool> {
        let from = self.query(device, FakeQuery::CanAccessPeer, "zeDeviceCanAccessPeer")?;
        let to = self.node(peer)?;
        Ok(self.peer_allowed(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_gpus() -> FakeApi {
        FakeApi::new(FakeTopology::single_driver([
            FakeDevice::gpu(0x8086, 0x56a0).with_sub_devices(2),
            FakeDevice::gpu(0x8086, 0x56a0),
        ]))
    }

    #[test]
    fn handles_are_distinct_and_resolvable() {
        let api = two_gpus();
        let driver = api.default_driver().unwrap().unwrap();
        let devices = api.devices(driver).unwrap();
        assert_eq!(devices.len(), 2);
        assert_ne!(devices[0], devices[1]);
        for device in devices {
            assert!(!device.is_null());
            api.device_properties(device).unwrap();
        }
    }

    #[test]
    fn nil_uuids_are_replaced_with_distinct_ones() {
        let api = two_gpus();
        let devices = api.all_devices().unwrap();
        let a = api.device_properties(devices[0]).unwrap().uuid;
        let b = api.device_properties(devices[1]).unwrap().uuid;
        assert!(!a.is_nil());
        assert_ne!(a, b);
    }

    #[test]
    fn sub_devices_are_flagged_and_numbered() {
        let api = two_gpus();
        let root = api.all_devices().unwrap()[0];
        let subs = api.sub_devices(root).unwrap();
        assert_eq!(api.sub_device_count(root).unwrap(), 2);
        for (i, sub) in subs.iter().enumerate() {
            let props = api.device_properties(*sub).unwrap();
            assert!(props.flags.contains(DevicePropertyFlags::SUBDEVICE));
            assert_eq!(props.subdevice_id, i as u32);
        }
        // Sub-devices are not root devices.
        assert_eq!(api.total_device_count().unwrap(), 2);
    }

    #[test]
    fn unknown_handles_are_rejected() {
        let api = two_gpus();
        let err = api.device_properties(DeviceHandle::from_raw(0xdead_beef)).unwrap_err();
        assert!(matches!(err, LevelZeroError::InvalidHandle { kind: "device", .. }));
        let err = api.devices(DriverHandle::from_raw(1)).unwrap_err();
        assert!(matches!(err, LevelZeroError::InvalidHandle { kind: "driver", .. }));
    }

    #[test]
    fn injected_failure_uses_device_lost() {
        let api = FakeApi::new(FakeTopology::single_driver([
            FakeDevice::gpu(1, 2).failing(FakeQuery::CacheProperties)
        ]));
        let device = api.all_devices().unwrap()[0];
        let err = api.cache_properties(device).unwrap_err();
        assert_eq!(err.result(), Some(INJECTED_FAILURE));
        assert!(api.compute_properties(device).is_ok());
    }

    #[test]
    fn reported_memory_count_overrides_count_only_query() {
        let mut device = FakeDevice::gpu(1, 2);
        device.reported_memory_count = Some(3);
        let api = FakeApi::new(FakeTopology::single_driver([device]));
        let handle = api.all_devices().unwrap()[0];
        assert_eq!(api.memory_properties_count(handle).unwrap(), 3);
        assert_eq!(api.memory_properties(handle).unwrap().len(), 1);
    }

    #[test]
    fn denied_links_are_directed() {
        let mut topology =
            FakeTopology::single_driver([FakeDevice::gpu(1, 2), FakeDevice::gpu(1, 2)]);
        topology.peer_access.denied.push(PeerLink { from: 0, to: 1 });
        let api = FakeApi::new(topology);
        let d = api.all_devices().unwrap();
        assert!(!api.can_access_peer(d[0], d[1]).unwrap());
        assert!(api.can_access_peer(d[1], d[0]).unwrap());
        assert!(api.can_access_peer(d[0], d[0]).unwrap());
        let p2p = api.p2p_properties(d[0], d[1]).unwrap();
        assert!(!p2p.flags.contains(P2PFlags::ACCESS));
    }

    #[test]
    fn null_handle_devices_cannot_be_queried() {
        let mut device = FakeDevice::gpu(1, 2);
        device.null_handle = true;
        let api = FakeApi::new(FakeTopology::single_driver([device]));
        let handles = api.all_devices().unwrap();
        assert!(handles[0].is_null());
        assert!(api.device_properties(handles[0]).is_err());
    }

    #[test]
    fn topology_parses_from_toml() {
        let text = r#"
            [peer_access]
            default_allowed = false

            [[drivers]]
            [[drivers.devices]]
            properties = { vendor_id = 0x8086, device_id = 0x0bd5, flags = "ONDEMANDPAGING" }
            compute = { sub_group_sizes = [16, 32] }
            reported_memory_count = 2
            failing_queries = ["image_properties"]

            [[drivers.devices.sub_devices]]
            [[drivers.devices.sub_devices]]

            [[drivers]]
            [[drivers.devices]]
            properties = { device_type = "cpu", uuid = "00000000-0000-0000-0000-000000000042" }
        "#;
        let topology = FakeTopology::from_toml_str(text).unwrap();
        assert_eq!(topology.drivers.len(), 2);
        assert!(!topology.peer_access.default_allowed);
        let first = &topology.drivers[0].devices[0];
        assert_eq!(first.properties.device_id, 0x0bd5);
        assert_eq!(first.compute.sub_group_sizes, vec![16, 32]);
        assert_eq!(first.sub_devices.len(), 2);
        assert_eq!(first.failing_queries, vec![FakeQuery::ImageProperties]);

        let api = FakeApi::new(topology);
        assert_eq!(api.total_device_count().unwrap(), 2);
        let cpu = api.all_devices().unwrap()[1];
        let props = api.device_properties(cpu).unwrap();
        assert_eq!(props.uuid, Uuid::from_u128(0x42));
    }

    #[test]
    fn capture_replays_the_same_system() {
        let mut original =
            FakeTopology::single_driver([FakeDevice::gpu(1, 2).with_sub_devices(1), FakeDevice::gpu(1, 3)]);
        original.peer_access.denied.push(PeerLink { from: 1, to: 0 });
        let source = FakeApi::new(original);

        let captured = FakeTopology::capture(&source).unwrap();
        let text = captured.to_toml_string().unwrap();
        let replay = FakeApi::new(FakeTopology::from_toml_str(&text).unwrap());

        let a = source.all_devices().unwrap();
        let b = replay.all_devices().unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(source.device_properties(*x).unwrap(), replay.device_properties(*y).unwrap());
            assert_eq!(source.sub_device_count(*x).unwrap(), replay.sub_device_count(*y).unwrap());
        }
        assert!(!replay.can_access_peer(b[1], b[0]).unwrap());
        assert!(replay.can_access_peer(b[0], b[1]).unwrap());
    }

    #[test]
    fn unknown_topology_keys_are_rejected() {
        let err = FakeTopology::from_toml_str("[[drivers]]\nbogus = 1\n").unwrap_err();
        assert!(matches!(err, LevelZeroError::TopologyParse(_)));
    }
}
