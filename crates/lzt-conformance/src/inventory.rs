//! Snapshot of what the backend enumerates, for the `devices` command.

use crate::error::HarnessError;
use crate::sku::{SkuKey, SkuGroups};
use lzt_level_zero::{DeviceApi, DeviceHandle, DeviceType, DriverHandle, flag_names};
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct DeviceEntry {
    pub handle: DeviceHandle,
    pub name: String,
    pub device_type: DeviceType,
    pub sku: SkuKey,
    pub uuid: Uuid,
    pub flags: String,
    pub sub_devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverEntry {
    pub handle: DriverHandle,
    pub devices: Vec<DeviceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkuEntry {
    pub sku: SkuKey,
    pub devices: Vec<DeviceHandle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Inventory {
    pub backend: String,
    pub drivers: Vec<DriverEntry>,
    pub sku_groups: Vec<SkuEntry>,
}

fn device_entry(api: &dyn DeviceApi, handle: DeviceHandle) -> Result<DeviceEntry, HarnessError> {
    let props = api.device_properties(handle)?;
    let sub_devices = api
        .sub_devices(handle)?
        .into_iter()
        .map(|sub| device_entry(api, sub))
        .collect::<Result<_, _>>()?;
    Ok(DeviceEntry {
        handle,
        name: props.name,
        device_type: props.device_type,
        sku: SkuKey::new(props.vendor_id, props.device_id),
        uuid: props.uuid,
        flags: flag_names(&props.flags),
        sub_devices,
    })
}

impl Inventory {
    pub fn collect(api: &dyn DeviceApi) -> Result<Self, HarnessError> {
        let mut drivers = Vec::new();
        for driver in api.drivers()? {
            let devices = api
                .devices(driver)?
                .into_iter()
                .map(|device| device_entry(api, device))
                .collect::<Result<_, _>>()?;
            drivers.push(DriverEntry { handle: driver, devices });
        }
        let sku_groups = SkuGroups::collect::<HarnessError>(api)?
            .iter()
            .map(|group| SkuEntry { sku: group.key, devices: group.devices().to_vec() })
            .collect();
        Ok(Self { backend: api.backend_name().to_string(), drivers, sku_groups })
    }

    pub fn device_count(&self) -> usize {
        self.drivers.iter().map(|d| d.devices.len()).sum()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "backend: {}", self.backend);
        for driver in &self.drivers {
            let _ = writeln!(out, "driver {} ({} devices)", driver.handle, driver.devices.len());
            for device in &driver.devices {
                write_device(&mut out, device, 1);
            }
        }
        let _ = writeln!(out, "sku groups:");
        for group in &self.sku_groups {
            let members: Vec<String> = group.devices.iter().map(ToString::to_string).collect();
            let _ = writeln!(out, "  {} x{}: {}", group.sku, group.devices.len(), members.join(", "));
        }
        out
    }

    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn write_device(out: &mut String, device: &DeviceEntry, depth: usize) {
    let _ = writeln!(
        out,
        "{:indent$}{} {} [{}] {} uuid={} flags={}",
        "",
        device.handle,
        device.name,
        device.device_type,
        device.sku,
        device.uuid,
        device.flags,
        indent = depth * 2,
    );
    for sub in &device.sub_devices {
        write_device(out, sub, depth + 1);
    }
}
