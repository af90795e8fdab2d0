//! Grouping devices by SKU.
//!
//! A SKU is a `(vendor_id, device_id)` pair. Devices sharing a SKU are
//! expected to report identical capabilities; see [`crate::consistency`].

use lzt_level_zero::{DeviceApi, DeviceHandle, DeviceType, LevelZeroError};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SkuKey {
    pub vendor_id: u32,
    pub device_id: u32,
}

impl SkuKey {
    pub const fn new(vendor_id: u32, device_id: u32) -> Self {
        Self { vendor_id, device_id }
    }
}

impl fmt::Display for SkuKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.device_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkuError {
    #[error("device {handle} already belongs to SKU group {existing}")]
    DuplicateHandle { handle: DeviceHandle, existing: SkuKey },
}

/// Devices sharing one SKU, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkuGroup {
    pub key: SkuKey,
    devices: Vec<DeviceHandle>,
}

impl SkuGroup {
    /// The first-enumerated member; every other member is compared to it.
    pub fn representative(&self) -> DeviceHandle {
        self.devices[0]
    }

    pub fn devices(&self) -> &[DeviceHandle] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Every GPU device partitioned by SKU. Groups keep first-appearance order.
#[derive(Debug, Default)]
pub struct SkuGroups {
    groups: Vec<SkuGroup>,
    index: HashMap<SkuKey, usize>,
    members: HashMap<DeviceHandle, SkuKey>,
}

impl SkuGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `handle` to the group for `(vendor_id, device_id)`, creating the
    /// group on first use. A handle may belong to one group only.
    pub fn add(&mut self, vendor_id: u32, device_id: u32, handle: DeviceHandle) -> Result<(), SkuError> {
        if let Some(&existing) = self.members.get(&handle) {
            return Err(SkuError::DuplicateHandle { handle, existing });
        }
        let key = SkuKey::new(vendor_id, device_id);
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.groups.push(SkuGroup { key, devices: Vec::new() });
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].devices.push(handle);
        self.members.insert(handle, key);
        Ok(())
    }

    /// Group every GPU root device of every driver.
    pub fn collect<E>(api: &dyn DeviceApi) -> Result<Self, E>
    where
        E: From<LevelZeroError> + From<SkuError>,
    {
        let mut groups = Self::new();
        for device in api.all_devices()? {
            let props = api.device_properties(device)?;
            if props.device_type != DeviceType::Gpu {
                debug!(%device, device_type = %props.device_type, "not grouped");
                continue;
            }
            groups.add(props.vendor_id, props.device_id, device)?;
        }
        debug!(groups = groups.len(), devices = groups.device_count(), "sku groups built");
        Ok(groups)
    }

    pub fn get(&self, key: SkuKey) -> Option<&SkuGroup> {
        self.index.get(&key).map(|&slot| &self.groups[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkuGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Devices across all groups.
    pub fn device_count(&self) -> usize {
        self.members.len()
    }
}

impl<'a> IntoIterator for &'a SkuGroups {
    type Item = &'a SkuGroup;
    type IntoIter = std::slice::Iter<'a, SkuGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaseError;
    use lzt_level_zero::{FakeApi, FakeDevice, FakeTopology};
    use proptest::prelude::*;

    fn h(raw: usize) -> DeviceHandle {
        DeviceHandle::from_raw(raw)
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let mut g = SkuGroups::new();
        g.add(0x8086, 0x56a0, h(1)).unwrap();
        g.add(0x8086, 0x0bd5, h(2)).unwrap();
        g.add(0x8086, 0x56a0, h(3)).unwrap();
        let keys: Vec<_> = g.iter().map(|grp| grp.key.to_string()).collect();
        assert_eq!(keys, ["8086:56a0", "8086:0bd5"]);
        let first = g.get(SkuKey::new(0x8086, 0x56a0)).unwrap();
        assert_eq!(first.devices(), &[h(1), h(3)]);
        assert_eq!(first.representative(), h(1));
        assert_eq!(g.device_count(), 3);
    }

    #[test]
    fn duplicate_handle_is_rejected() {
        let mut g = SkuGroups::new();
        g.add(1, 2, h(7)).unwrap();
        let err = g.add(3, 4, h(7)).unwrap_err();
        assert_eq!(err, SkuError::DuplicateHandle { handle: h(7), existing: SkuKey::new(1, 2) });
        assert_eq!(g.device_count(), 1);
        assert!(g.get(SkuKey::new(3, 4)).is_none());
    }

    #[test]
    fn collect_skips_non_gpu_devices() {
        let mut cpu = FakeDevice::gpu(0x8086, 0x1);
        cpu.properties.device_type = DeviceType::Cpu;
        let api = FakeApi::new(FakeTopology::single_driver([
            FakeDevice::gpu(0x8086, 0x56a0),
            cpu,
            FakeDevice::gpu(0x8086, 0x56a0),
        ]));
        let groups = SkuGroups::collect::<CaseError>(&api).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.device_count(), 2);
    }

    proptest! {
        #[test]
        fn every_device_lands_in_exactly_one_group(skus in prop::collection::vec((0u32..3, 0u32..3), 0..24)) {
            let mut g = SkuGroups::new();
            for (i, (vendor, device)) in skus.iter().enumerate() {
                g.add(*vendor, *device, h(i + 1)).unwrap();
            }
            let mut union: Vec<usize> = g.iter().flat_map(|grp| grp.devices().iter().map(|d| d.as_raw())).collect();
            union.sort_unstable();
            prop_assert_eq!(union, (1..=skus.len()).collect::<Vec<_>>());
            for grp in &g {
                prop_assert!(!grp.is_empty());
                for d in grp.devices() {
                    let (vendor, device) = skus[d.as_raw() - 1];
                    prop_assert_eq!(grp.key, SkuKey::new(vendor, device));
                }
                let raws: Vec<usize> = grp.devices().iter().map(|d| d.as_raw()).collect();
                prop_assert!(raws.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
