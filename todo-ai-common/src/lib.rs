//! Todo AI Common Types
//!
//! Shared types used by the AI server and its clients.

pub mod api;
pub mod capability;
pub mod device;

pub use api::{
    AiHealthResponse, EnhanceRequest, EnhanceResponse, EnhancementType, GenerateModel,
    GenerateOutput, GenerateRequest, GenerateResponse, GpuDevice, GpuInfoResponse,
    HealthResponse, Prediction, SentimentRequest, SentimentResponse, ServiceSummary,
};
pub use capability::{AccelerationMode, Capability, ModelStatus};
pub use device::{CapabilitySnapshot, DeviceInfo, DeviceMemory};
