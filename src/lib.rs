//! GPU-driven indirect rendering of very large static-instanced scenes.
//!
//! The crate owns a fixed-capacity geometry atlas, per-instance buffers, an
//! indirect-draw table with a remap buffer, a compute culling pass, and the render
//! pass that consumes them (components C1-C6 in `SPEC_FULL.md`). Tileset parsing,
//! windowing/camera controls, object picking, Hi-Z occlusion/LOD, and persistence are
//! external collaborators, not part of this crate.

pub mod atlas;
pub mod config;
pub mod culling;
pub mod error;
pub mod gpu;
pub mod layout;
pub mod render;

pub use atlas::{BufferPool, MeshAtlasEntry};
pub use config::{AtlasConfig, DepthConvention};
pub use culling::{extract_frustum_planes, CullingDriver};
pub use error::{AtlasEngineResult, AtlasError, Phase};
pub use gpu::GpuContext;
pub use render::RenderDriver;

use layout::{CullingUniform, RenderUniform};

/// Aggregates the Buffer Pool, Culling Driver, and Render Driver behind the
/// ingest/finalize/per-frame API described in SPEC_FULL.md §6.
pub struct AtlasEngine {
    gpu: GpuContext,
    pool: BufferPool,
    culling: CullingDriver,
    render: RenderDriver,
    warned_not_finalized: std::cell::Cell<bool>,
}

impl AtlasEngine {
    /// Fails with [`AtlasError::ShaderCompilation`] if either driver's pipelines fail
    /// to build on this adapter (see `culling::driver`/`render::driver`).
    pub fn new(
        gpu: GpuContext,
        config: AtlasConfig,
        surface_format: wgpu::TextureFormat,
    ) -> AtlasEngineResult<Self> {
        let culling = CullingDriver::new(&gpu)?;
        let render = RenderDriver::new(&gpu, surface_format, config.depth_convention)?;
        let pool = BufferPool::new(gpu.clone(), config);

        Ok(Self {
            gpu,
            pool,
            culling,
            render,
            warned_not_finalized: std::cell::Cell::new(false),
        })
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    /// One-way `Loading -> Finalized` transition. Must complete before `render` does
    /// anything but no-op.
    pub fn finalize(&mut self) -> AtlasEngineResult<()> {
        self.pool.finalize()
    }

    /// Per-frame API (SPEC_FULL.md §6). A no-op if the pool is not `Finalized` or
    /// there is nothing to draw; the caller owns the color/depth attachments.
    pub fn render(
        &self,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        view_projection: glam::Mat4,
        camera_position: glam::Vec3,
        time_seconds: f32,
    ) {
        if self.pool.phase() != Phase::Finalized {
            if !self.warned_not_finalized.replace(true) {
                log::warn!("[AtlasEngine] render() called before finalize(); ignoring (further occurrences suppressed)");
            }
            return;
        }

        let total_instances = self.pool.total_instances();
        let draw_command_count = self.pool.draw_command_count();
        if total_instances == 0 || draw_command_count == 0 {
            return;
        }

        let culling_uniform = CullingUniform {
            planes: extract_frustum_planes(&view_projection),
            total_instances,
            draw_command_count,
            _pad: [0; 2],
        };
        self.culling.update_uniform(&self.gpu.queue, &culling_uniform);

        let render_uniform = RenderUniform {
            view_proj: view_projection.to_cols_array_2d(),
            camera_position: camera_position.to_array(),
            selected_id: 0,
            time_seconds,
            _pad: [0.0; 3],
        };
        self.render.update_uniform(&self.gpu.queue, &render_uniform);

        let cull_bind_group = self.culling.create_bind_group(&self.pool);
        let render_bind_group = self.render.create_bind_group(&self.pool);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("atlas frame encoder"),
            });

        self.culling
            .execute(&mut encoder, &cull_bind_group, total_instances, draw_command_count);

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("atlas render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.render.depth_convention().clear_value()),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.render.draw(&mut pass, &render_bind_group, &self.pool);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}
