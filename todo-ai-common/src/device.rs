//! Accelerator capability snapshot.

use serde::{Deserialize, Serialize};

/// Memory statistics for one accelerator device, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceMemory {
    pub total_bytes: u64,
    pub reserved_bytes: u64,
    pub allocated_bytes: u64,
}

/// One enumerated accelerator device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub index: u32,
    pub name: String,
    pub memory: DeviceMemory,
}

/// Immutable description of the acceleration hardware seen at startup.
///
/// `device_indices[i]`, `device_names[i]` and `device_memory[i]` describe the
/// same device, in ascending device-index order. Indices are the driver's and
/// need not be contiguous. When `accelerated` is false all sequences are
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    accelerated: bool,
    device_count: usize,
    device_indices: Vec<u32>,
    device_names: Vec<String>,
    device_memory: Vec<DeviceMemory>,
}

impl CapabilitySnapshot {
    /// Snapshot for an environment without acceleration.
    pub fn unaccelerated() -> Self {
        Self {
            accelerated: false,
            device_count: 0,
            device_indices: vec![],
            device_names: vec![],
            device_memory: vec![],
        }
    }

    /// Build a snapshot from enumerated devices.
    ///
    /// Devices are ordered by index. An empty list yields an unaccelerated
    /// snapshot.
    pub fn from_devices(mut devices: Vec<DeviceInfo>) -> Self {
        if devices.is_empty() {
            return Self::unaccelerated();
        }

        devices.sort_by_key(|d| d.index);
        let device_indices = devices.iter().map(|d| d.index).collect();
        let device_memory = devices.iter().map(|d| d.memory).collect();
        let device_names: Vec<String> = devices.into_iter().map(|d| d.name).collect();

        Self {
            accelerated: true,
            device_count: device_names.len(),
            device_indices,
            device_names,
            device_memory,
        }
    }

    pub fn accelerated(&self) -> bool {
        self.accelerated
    }

    pub fn device_count(&self) -> usize {
        self.device_count
    }

    pub fn device_indices(&self) -> &[u32] {
        &self.device_indices
    }

    /// Whether the device with driver index `index` was enumerated.
    pub fn has_device(&self, index: u32) -> bool {
        self.device_indices.contains(&index)
    }

    pub fn device_names(&self) -> &[String] {
        &self.device_names
    }

    pub fn device_memory(&self) -> &[DeviceMemory] {
        &self.device_memory
    }
}

impl Default for CapabilitySnapshot {
    fn default() -> Self {
        Self::unaccelerated()
    }
}
