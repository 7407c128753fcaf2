//! Model registry built once at startup.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use todo_ai_common::{AccelerationMode, Capability, CapabilitySnapshot, ModelStatus};

use super::{Device, ModelLoader, TextGenerator, TextPipeline};
use crate::config::{Config, PipelineConfig, HOSTED_PROJECT_ENV};
use crate::error::{Error, Result};

#[derive(Clone)]
enum Backend {
    Generator(Arc<dyn TextGenerator>),
    Pipeline(Arc<dyn TextPipeline>),
}

/// An acquired model, keyed by its capability.
#[derive(Clone)]
pub struct ModelHandle {
    capability: Capability,
    mode: AccelerationMode,
    backend: Backend,
}

impl ModelHandle {
    pub fn generator(
        capability: Capability,
        mode: AccelerationMode,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            capability,
            mode,
            backend: Backend::Generator(generator),
        }
    }

    pub fn pipeline(
        capability: Capability,
        mode: AccelerationMode,
        pipeline: Arc<dyn TextPipeline>,
    ) -> Self {
        Self {
            capability,
            mode,
            backend: Backend::Pipeline(pipeline),
        }
    }

    pub fn mode(&self) -> AccelerationMode {
        self.mode
    }

    pub fn as_generator(&self) -> Option<Arc<dyn TextGenerator>> {
        match &self.backend {
            Backend::Generator(g) => Some(g.clone()),
            Backend::Pipeline(_) => None,
        }
    }

    pub fn as_pipeline(&self) -> Option<Arc<dyn TextPipeline>> {
        match &self.backend {
            Backend::Pipeline(p) => Some(p.clone()),
            Backend::Generator(_) => None,
        }
    }
}

/// Registry of acquired models.
///
/// Built once before the server accepts requests and never modified
/// afterwards, so lookups need no locking. Capabilities that could not be
/// acquired are absent; their startup outcome is kept in `statuses`.
pub struct ModelRegistry {
    handles: HashMap<Capability, ModelHandle>,
    statuses: BTreeMap<Capability, ModelStatus>,
}

impl ModelRegistry {
    /// Registry with no models, all capabilities not configured.
    pub fn empty() -> Self {
        Self::from_handles(vec![])
    }

    /// Registry holding exactly `handles`. Other capabilities are reported
    /// as not configured.
    pub fn from_handles(handles: Vec<ModelHandle>) -> Self {
        let mut registry = Self {
            handles: HashMap::new(),
            statuses: Capability::ALL
                .into_iter()
                .map(|c| (c, ModelStatus::NotConfigured))
                .collect(),
        };
        for handle in handles {
            registry.insert(handle);
        }
        registry
    }

    /// Acquire every configured model.
    ///
    /// Never fails: a model that cannot be acquired is omitted and its
    /// failure logged. The hosted generator is attempted only when a
    /// project is configured. Each local pipeline is tried on the
    /// accelerator when one is available, then on the CPU.
    pub async fn build(
        snapshot: &CapabilitySnapshot,
        config: &Config,
        loader: &dyn ModelLoader,
    ) -> Self {
        let mut registry = Self::empty();

        match config.hosted.project() {
            Some(project) => match loader.load_generator(project, &config.hosted).await {
                Ok(generator) => {
                    tracing::info!(
                        "Loaded {} ({} {}) for project {}",
                        Capability::TextGenerator,
                        generator.backend_type(),
                        config.hosted.model,
                        project
                    );
                    registry.insert(ModelHandle::generator(
                        Capability::TextGenerator,
                        AccelerationMode::Unaccelerated,
                        generator,
                    ));
                }
                Err(e) => registry.record_failure(Capability::TextGenerator, e),
            },
            None => {
                tracing::warn!(
                    "{} not set; hosted text generation disabled",
                    HOSTED_PROJECT_ENV
                );
            }
        }

        for capability in Capability::PIPELINES {
            let Some(pipeline_config) = config.pipelines.get(capability) else {
                tracing::info!("No configuration for {} pipeline; skipping", capability);
                continue;
            };

            match acquire_pipeline(capability, pipeline_config, snapshot, loader).await {
                Ok(handle) => {
                    tracing::info!("Loaded {} pipeline ({:?})", capability, handle.mode());
                    registry.insert(handle);
                }
                Err(e) => registry.record_failure(capability, e),
            }
        }

        tracing::info!(
            "Model registry ready: {} of {} capabilities loaded",
            registry.len(),
            Capability::ALL.len()
        );

        registry
    }

    fn insert(&mut self, handle: ModelHandle) {
        self.statuses.insert(
            handle.capability,
            ModelStatus::Loaded { mode: handle.mode },
        );
        self.handles.insert(handle.capability, handle);
    }

    fn record_failure(&mut self, capability: Capability, error: Error) {
        tracing::error!(capability = %capability, "Failed to load model: {}", error);
        self.statuses.insert(
            capability,
            ModelStatus::Failed {
                message: error.to_string(),
            },
        );
    }

    pub fn get(&self, capability: Capability) -> Option<&ModelHandle> {
        self.handles.get(&capability)
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.handles.contains_key(&capability)
    }

    pub fn generator(&self, capability: Capability) -> Option<Arc<dyn TextGenerator>> {
        self.get(capability).and_then(ModelHandle::as_generator)
    }

    pub fn pipeline(&self, capability: Capability) -> Option<Arc<dyn TextPipeline>> {
        self.get(capability).and_then(ModelHandle::as_pipeline)
    }

    /// Loaded hosted models, in capability order.
    pub fn hosted_models(&self) -> Vec<Capability> {
        self.loaded().filter(|c| c.is_hosted()).collect()
    }

    /// Loaded local pipelines, in capability order.
    pub fn local_pipelines(&self) -> Vec<Capability> {
        self.loaded().filter(|c| !c.is_hosted()).collect()
    }

    fn loaded(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(|c| self.contains(*c))
    }

    /// Startup outcome of every capability.
    pub fn statuses(&self) -> &BTreeMap<Capability, ModelStatus> {
        &self.statuses
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Two-phase acquisition: accelerated (if available), then CPU.
async fn acquire_pipeline(
    capability: Capability,
    config: &PipelineConfig,
    snapshot: &CapabilitySnapshot,
    loader: &dyn ModelLoader,
) -> Result<ModelHandle> {
    if snapshot.accelerated() {
        let device = Device::Accelerated {
            ordinal: config.device,
        };

        if snapshot.has_device(config.device) {
            match loader.load_pipeline(capability, config, device).await {
                Ok(pipeline) => {
                    return Ok(ModelHandle::pipeline(capability, device.mode(), pipeline))
                }
                Err(e) => tracing::warn!(
                    "Failed to load {} on {}, falling back to CPU: {}",
                    capability,
                    device,
                    e
                ),
            }
        } else {
            tracing::warn!(
                "{} requested {} but present devices are {:?}, falling back to CPU",
                capability,
                device,
                snapshot.device_indices()
            );
        }
    }

    let pipeline = loader.load_pipeline(capability, config, Device::Cpu).await?;
    Ok(ModelHandle::pipeline(capability, Device::Cpu.mode(), pipeline))
}
