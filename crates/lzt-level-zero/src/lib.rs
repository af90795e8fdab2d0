//! `lzt-level-zero`: the Level-Zero device query facade.
//!
//! Conformance checks talk to the driver through [`DeviceApi`]. Two backends
//! implement it:
//!
//! | Backend      | Source                                  | Use                              |
//! |--------------|-----------------------------------------|----------------------------------|
//! | [`LoaderApi`] | system `ze_loader` via `libloading`    | real hardware                    |
//! | [`FakeApi`]   | in-memory [`FakeTopology`] (TOML/code) | harness tests, offline replays   |
//!
//! Property records are typed snapshots ([`DeviceProperties`],
//! [`ComputeProperties`], ...) converted from the raw `#[repr(C)]` structs in
//! [`ffi`].

pub mod api;
pub mod error;
pub mod fake;
pub mod ffi;
pub mod loader;
pub mod properties;

pub use api::DeviceApi;
pub use error::{LevelZeroError, Result};
pub use fake::{FakeApi, FakeDevice, FakeDriver, FakeQuery, FakeTopology, PeerAccessRules, PeerLink};
pub use ffi::ZeResult;
pub use loader::LoaderApi;
pub use properties::{
    CacheFlags, CacheProperties, ComputeProperties, DeviceHandle, DeviceProperties,
    DevicePropertyFlags, DeviceType, DriverHandle, ExternalMemoryProperties, ExternalMemoryTypes,
    FpCapabilities, ImageProperties, MemoryAccessCapabilities, MemoryAccessProperties,
    MemoryProperties, ModuleFlags, ModuleProperties, P2PFlags, P2PProperties, SpirvVersion,
    flag_names,
};
