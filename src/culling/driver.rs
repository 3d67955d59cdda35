//! Culling Driver (C5): uploads the per-frame culling uniform and dispatches
//! `resetCounts` then `cullInstances` on a shared command encoder.
//!
//! Grounded on `culling_pipeline.rs::{new, execute_culling}` (`catch_unwind` around
//! pipeline creation, one shared bind-group layout, `(n+63)/64` workgroup sizing) and
//! on `gpu_culling/frustum_culler.rs`'s separate-remap-buffer bind group shape, which
//! is the closer structural match to this spec's buffers. Unlike the teacher, pipeline
//! creation failure is surfaced to the caller as an error rather than silently
//! disabling culling: a library has no "disabled for this session" fallback to offer.

use std::sync::Arc;

use crate::atlas::BufferPool;
use crate::culling::error::CullingResult;
use crate::error::shader_compilation_error;
use crate::gpu::GpuContext;
use crate::layout::{bindings, layouts, usage, CullingUniform};

const WORKGROUP_SIZE: u32 = 64;

pub struct CullingDriver {
    device: Arc<wgpu::Device>,
    bind_group_layout: wgpu::BindGroupLayout,
    reset_pipeline: wgpu::ComputePipeline,
    cull_pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
}

impl CullingDriver {
    pub fn new(gpu: &GpuContext) -> CullingResult<Self> {
        let device = gpu.device.clone();

        let shader_source = include_str!("../shaders/cull.wgsl");
        log::debug!("[CullingDriver] loading cull shader ({} bytes)", shader_source.len());
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("atlas cull shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("atlas cull bind group layout"),
            entries: &[
                layouts::uniform_entry(bindings::cull::UNIFORM, wgpu::ShaderStages::COMPUTE),
                layouts::storage_entry(bindings::cull::INSTANCE_TRANSFORMS, true, wgpu::ShaderStages::COMPUTE),
                layouts::storage_entry(bindings::cull::INDIRECT_COMMANDS, false, wgpu::ShaderStages::COMPUTE),
                layouts::storage_entry(bindings::cull::REMAP, false, wgpu::ShaderStages::COMPUTE),
                layouts::storage_entry(bindings::cull::INSTANCE_DRAW_CMD_MAP, true, wgpu::ShaderStages::COMPUTE),
                layouts::storage_entry(bindings::cull::COMMAND_BASE_OFFSETS, true, wgpu::ShaderStages::COMPUTE),
                layouts::storage_entry(bindings::cull::MESH_BOUNDS, true, wgpu::ShaderStages::COMPUTE),
                layouts::storage_entry(bindings::cull::COMMAND_CAPACITIES, true, wgpu::ShaderStages::COMPUTE),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("atlas cull pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let reset_pipeline = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("atlas resetCounts pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: "resetCounts",
            })
        }))
        .map_err(|payload| shader_compilation_error("resetCounts", payload))?;
        log::info!("[CullingDriver] resetCounts pipeline created");

        let cull_pipeline = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("atlas cullInstances pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: "cullInstances",
            })
        }))
        .map_err(|payload| shader_compilation_error("cullInstances", payload))?;
        log::info!("[CullingDriver] cullInstances pipeline created");

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas culling uniform"),
            size: CullingUniform::SIZE,
            usage: usage::UNIFORM,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            bind_group_layout,
            reset_pipeline,
            cull_pipeline,
            uniform_buffer,
        })
    }

    pub fn update_uniform(&self, queue: &wgpu::Queue, uniform: &CullingUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniform));
    }

    pub fn create_bind_group(&self, pool: &BufferPool) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("atlas cull bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: bindings::cull::UNIFORM,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::cull::INSTANCE_TRANSFORMS,
                    resource: pool.transform_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::cull::INDIRECT_COMMANDS,
                    resource: pool.command_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::cull::REMAP,
                    resource: pool.remap_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::cull::INSTANCE_DRAW_CMD_MAP,
                    resource: pool.instance_draw_cmd_map_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::cull::COMMAND_BASE_OFFSETS,
                    resource: pool.command_base_offsets_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::cull::MESH_BOUNDS,
                    resource: pool.mesh_bounds_buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: bindings::cull::COMMAND_CAPACITIES,
                    resource: pool.command_capacities_buffer().as_entire_binding(),
                },
            ],
        })
    }

    /// Dispatches `resetCounts` then `cullInstances` on `encoder`. No explicit
    /// barrier is issued between them; the shared encoder gives the device submission
    /// order to enforce the storage-write-before-storage-read hazard.
    pub fn execute(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        bind_group: &wgpu::BindGroup,
        total_instances: u32,
        draw_command_count: u32,
    ) {
        if total_instances == 0 || draw_command_count == 0 {
            return;
        }

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("atlas resetCounts pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.reset_pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            let workgroups = (draw_command_count + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
            pass.dispatch_workgroups(workgroups, 1, 1);
        }

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("atlas cullInstances pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.cull_pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            let workgroups = (total_instances + WORKGROUP_SIZE - 1) / WORKGROUP_SIZE;
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
    }
}
