//! Accelerator capability probe.
//!
//! Inspects the execution environment once at startup and produces the
//! immutable `CapabilitySnapshot` that the model registry and the health
//! endpoints read. Probing never fails: any driver or tooling error is
//! reported as "no acceleration available".

mod nvidia_smi;

pub use nvidia_smi::NvidiaSmi;

use todo_ai_common::{CapabilitySnapshot, DeviceInfo};

use crate::config::GpuConfig;

/// Errors raised while enumerating devices. Never escape `probe`.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to run {binary}: {message}")]
    Unavailable { binary: String, message: String },

    #[error("{binary} exited with {status}: {stderr}")]
    CommandFailed {
        binary: String,
        status: String,
        stderr: String,
    },

    #[error("unexpected device query output: {0}")]
    Parse(String),
}

/// Source of accelerator device information.
pub trait DeviceQuery: Send + Sync {
    /// Short name for log lines (e.g. "nvidia-smi").
    fn name(&self) -> &str;

    /// Enumerate devices. Order is not significant.
    fn devices(&self) -> Result<Vec<DeviceInfo>, ProbeError>;
}

/// Build a capability snapshot using `query`.
pub fn probe(query: &dyn DeviceQuery, config: &GpuConfig) -> CapabilitySnapshot {
    let snapshot = if !config.enabled {
        tracing::info!("GPU probing disabled by configuration");
        CapabilitySnapshot::unaccelerated()
    } else {
        match query.devices() {
            Ok(devices) => CapabilitySnapshot::from_devices(devices),
            Err(e) => {
                tracing::warn!("No GPU acceleration available ({}): {}", query.name(), e);
                CapabilitySnapshot::unaccelerated()
            }
        }
    };

    tracing::info!(
        accelerated = snapshot.accelerated(),
        device_count = snapshot.device_count(),
        devices = ?snapshot.device_names(),
        memory = ?snapshot.device_memory(),
        "GPU status"
    );

    snapshot
}

/// Probe the local machine with nvidia-smi.
pub fn probe_system(config: &GpuConfig) -> CapabilitySnapshot {
    probe(&NvidiaSmi::new(&config.smi_binary), config)
}
