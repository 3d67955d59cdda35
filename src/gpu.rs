//! GPU device/queue bring-up.
//!
//! No module in this crate reaches for a global device handle; every subsystem is
//! constructed with an explicit [`GpuContext`] (see the Design Notes' "global
//! singleton pool" redesign flag in SPEC_FULL.md).

use std::sync::Arc;

use crate::error::{gpu_operation_error, AtlasEngineResult};

#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        }
    }

    /// Request a headless adapter/device pair. Used by the demo binary and by
    /// GPU-backed integration tests; returns `Ok(None)` rather than erroring when no
    /// adapter is available so callers can skip gracefully.
    pub async fn request() -> AtlasEngineResult<Option<Self>> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions::default())
            .await;

        let Some(adapter) = adapter else {
            log::warn!("[GpuContext] No compatible GPU adapter found");
            return Ok(None);
        };

        log::info!("[GpuContext] Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("atlas-engine device"),
                    required_features: wgpu::Features::INDIRECT_FIRST_INSTANCE,
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| gpu_operation_error("request_device", e))?;

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("[GpuContext] uncaptured wgpu error: {e}");
        }));

        Ok(Some(Self::new(device, queue)))
    }

    pub fn request_blocking() -> AtlasEngineResult<Option<Self>> {
        pollster::block_on(Self::request())
    }
}
