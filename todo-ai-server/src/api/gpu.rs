//! GPU information endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use todo_ai_common::{CapabilitySnapshot, GpuDevice, GpuInfoResponse};

use crate::error::{Error, Result};
use crate::state::AppState;

/// Build the GPU router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/ai/gpu/info", get(gpu_info))
}

/// GET /api/ai/gpu/info - Device details from the startup snapshot.
async fn gpu_info(State(state): State<Arc<AppState>>) -> Result<Json<GpuInfoResponse>> {
    describe(&state.snapshot)
        .map(Json)
        .ok_or_else(|| Error::NotFound("No GPU available".to_string()))
}

fn describe(snapshot: &CapabilitySnapshot) -> Option<GpuInfoResponse> {
    if !snapshot.accelerated() {
        return None;
    }

    let devices: Vec<GpuDevice> = snapshot
        .device_indices()
        .iter()
        .zip(snapshot.device_names())
        .zip(snapshot.device_memory())
        .map(|((index, name), memory)| GpuDevice {
            index: *index,
            name: name.clone(),
            total_bytes: memory.total_bytes,
            reserved_bytes: memory.reserved_bytes,
            allocated_bytes: memory.allocated_bytes,
        })
        .collect();

    // The lowest-indexed device is the current one.
    let current = devices.first()?;

    Some(GpuInfoResponse {
        device_count: snapshot.device_count(),
        current_device: current.index,
        device_name: current.name.clone(),
        memory_allocated: current.allocated_bytes,
        memory_reserved: current.reserved_bytes,
        devices,
    })
}
