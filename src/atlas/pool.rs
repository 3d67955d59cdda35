//! Buffer Pool (C1): owns every persistent GPU buffer and the append/finalize state
//! machine.
//!
//! Grounded on `IndirectCommandBuffer`/`InstanceBuffer` from the teacher's
//! `gpu_driven` module (capacity + cursor fields, check-before-write append, direct
//! `queue.write_buffer` uploads of the appended region) generalized to the fixed set
//! of buffers this spec mandates, plus the one-way `Loading -> Finalized` state
//! machine and cross-chunk remap compaction neither teacher buffer type needed.

use crate::atlas::bounds::compute_bounding_sphere;
use crate::atlas::error::AtlasResult;
use crate::atlas::finalize::{finalize_segments, Segment};
use crate::config::AtlasConfig;
use crate::error::{AtlasError, Phase};
use crate::gpu::GpuContext;
use crate::layout::{
    calculations, usage, BoundingSphere, IndirectDrawCommand, InstanceIdentifier,
    InstanceTransform, Vertex,
};

/// Handle returned by [`BufferPool::append_mesh`]. `command_index == -1` denotes an
/// allocation failure (never produced by this implementation; `append_mesh` returns
/// `Err` instead, kept per spec §3 for collaborators that model it as a sentinel).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshAtlasEntry {
    pub command_index: i32,
    pub base_vertex: u32,
    pub first_index: u32,
    pub index_count: u32,
}

pub struct BufferPool {
    gpu: GpuContext,
    config: AtlasConfig,
    phase: Phase,

    vertex_buffer: wgpu::Buffer,
    vertex_cursor: u32,
    index_buffer: wgpu::Buffer,
    index_cursor: u32,

    transform_buffer: wgpu::Buffer,
    identifier_buffer: wgpu::Buffer,
    instance_cursor: u32,

    command_buffer: wgpu::Buffer,
    commands: Vec<IndirectDrawCommand>,

    remap_buffer: wgpu::Buffer,
    instance_draw_cmd_map_buffer: wgpu::Buffer,
    command_base_offsets_buffer: wgpu::Buffer,
    command_capacities_buffer: wgpu::Buffer,
    mesh_bounds_buffer: wgpu::Buffer,

    /// Reserved for collaborators (ghost effects, clash annotation). The core never
    /// reads or writes it.
    per_instance_state_buffer: wgpu::Buffer,

    pending_segments: Vec<Segment>,
}

impl BufferPool {
    pub fn new(gpu: GpuContext, config: AtlasConfig) -> Self {
        let device = &gpu.device;

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas vertex buffer"),
            size: calculations::vertex_buffer_size(config.capacity_vertices),
            usage: usage::VERTEX,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas index buffer"),
            size: calculations::index_buffer_size(config.capacity_indices),
            usage: usage::INDEX,
            mapped_at_creation: false,
        });
        let transform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas instance transform buffer"),
            size: calculations::transform_buffer_size(config.capacity_instances),
            usage: usage::STORAGE,
            mapped_at_creation: false,
        });
        let identifier_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas instance identifier buffer"),
            size: calculations::identifier_buffer_size(config.capacity_instances),
            usage: usage::STORAGE,
            mapped_at_creation: false,
        });
        let command_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas indirect command buffer"),
            size: calculations::command_buffer_size(config.max_commands),
            usage: usage::INDIRECT,
            mapped_at_creation: false,
        });
        let remap_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas remap buffer"),
            size: calculations::remap_buffer_size(config.capacity_instances),
            usage: usage::STORAGE_READ_WRITE,
            mapped_at_creation: false,
        });
        let instance_draw_cmd_map_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas instance->command map buffer"),
            size: calculations::remap_buffer_size(config.capacity_instances),
            usage: usage::STORAGE,
            mapped_at_creation: false,
        });
        let command_base_offsets_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas command base-offset buffer"),
            size: config.max_commands as u64 * 4,
            usage: usage::STORAGE,
            mapped_at_creation: false,
        });
        // Holds each command's finalized remap-region size. Unlike the live
        // `instance_count` counter the cull shader resets every frame, this is written
        // once by `finalize()` and never touched by the cull shader except to read it,
        // so it is a safe clamp source for the atomic slot bounds check.
        let command_capacities_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas command capacity buffer"),
            size: config.max_commands as u64 * 4,
            usage: usage::STORAGE,
            mapped_at_creation: false,
        });
        let mesh_bounds_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas mesh bounding-sphere buffer"),
            size: calculations::bounds_buffer_size(config.max_commands),
            usage: usage::STORAGE,
            mapped_at_creation: false,
        });
        let per_instance_state_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("atlas per-instance state buffer"),
            size: calculations::remap_buffer_size(config.capacity_instances),
            usage: usage::STORAGE,
            mapped_at_creation: false,
        });

        Self {
            gpu,
            config,
            phase: Phase::Loading,
            vertex_buffer,
            vertex_cursor: 0,
            index_buffer,
            index_cursor: 0,
            transform_buffer,
            identifier_buffer,
            instance_cursor: 0,
            command_buffer,
            commands: Vec::new(),
            remap_buffer,
            instance_draw_cmd_map_buffer,
            command_base_offsets_buffer,
            command_capacities_buffer,
            mesh_bounds_buffer,
            per_instance_state_buffer,
            pending_segments: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn draw_command_count(&self) -> u32 {
        self.commands.len() as u32
    }

    pub fn total_instances(&self) -> u32 {
        self.instance_cursor
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn transform_buffer(&self) -> &wgpu::Buffer {
        &self.transform_buffer
    }

    pub fn identifier_buffer(&self) -> &wgpu::Buffer {
        &self.identifier_buffer
    }

    pub fn command_buffer(&self) -> &wgpu::Buffer {
        &self.command_buffer
    }

    pub fn remap_buffer(&self) -> &wgpu::Buffer {
        &self.remap_buffer
    }

    pub fn instance_draw_cmd_map_buffer(&self) -> &wgpu::Buffer {
        &self.instance_draw_cmd_map_buffer
    }

    pub fn command_base_offsets_buffer(&self) -> &wgpu::Buffer {
        &self.command_base_offsets_buffer
    }

    pub fn command_capacities_buffer(&self) -> &wgpu::Buffer {
        &self.command_capacities_buffer
    }

    pub fn mesh_bounds_buffer(&self) -> &wgpu::Buffer {
        &self.mesh_bounds_buffer
    }

    /// Handle collaborators may write per-instance scalars into; the core never
    /// inspects its contents.
    pub fn per_instance_state_buffer(&self) -> &wgpu::Buffer {
        &self.per_instance_state_buffer
    }

    /// Appends a unique mesh into the shared vertex/index atlases and allocates an
    /// indirect-draw-command slot for it. See SPEC_FULL.md §4.1/§4.2.
    pub fn append_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> AtlasResult<MeshAtlasEntry> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(AtlasError::InvalidInput {
                operation: "append_mesh",
                reason: "vertices and indices must be non-empty".to_string(),
            });
        }

        let new_vertex_cursor = self.vertex_cursor + vertices.len() as u32;
        if new_vertex_cursor > self.config.capacity_vertices {
            return Err(AtlasError::CapacityExceeded {
                buffer: "vertex atlas",
                requested: new_vertex_cursor as u64,
                capacity: self.config.capacity_vertices as u64,
            });
        }
        let new_index_cursor = self.index_cursor + indices.len() as u32;
        if new_index_cursor > self.config.capacity_indices {
            return Err(AtlasError::CapacityExceeded {
                buffer: "index atlas",
                requested: new_index_cursor as u64,
                capacity: self.config.capacity_indices as u64,
            });
        }
        if self.commands.len() as u32 >= self.config.max_commands {
            return Err(AtlasError::CapacityExceeded {
                buffer: "indirect command table",
                requested: self.commands.len() as u64 + 1,
                capacity: self.config.max_commands as u64,
            });
        }

        let base_vertex = self.vertex_cursor;
        let first_index = self.index_cursor;
        let index_count = indices.len() as u32;
        let command_index = self.commands.len() as u32;

        self.gpu.queue.write_buffer(
            &self.vertex_buffer,
            base_vertex as u64 * Vertex::SIZE,
            bytemuck::cast_slice(vertices),
        );
        self.gpu.queue.write_buffer(
            &self.index_buffer,
            first_index as u64 * 4,
            bytemuck::cast_slice(indices),
        );

        let sphere = compute_bounding_sphere(vertices);
        self.gpu.queue.write_buffer(
            &self.mesh_bounds_buffer,
            command_index as u64 * std::mem::size_of::<BoundingSphere>() as u64,
            bytemuck::bytes_of(&sphere),
        );

        let command = IndirectDrawCommand::new(index_count, first_index, base_vertex);
        self.gpu.queue.write_buffer(
            &self.command_buffer,
            command_index as u64 * IndirectDrawCommand::SIZE,
            bytemuck::bytes_of(&command),
        );
        self.commands.push(command);

        self.vertex_cursor = new_vertex_cursor;
        self.index_cursor = new_index_cursor;

        log::debug!(
            "[BufferPool] appended mesh: command={} vertices={} indices={}",
            command_index,
            vertices.len(),
            indices.len()
        );

        Ok(MeshAtlasEntry {
            command_index: command_index as i32,
            base_vertex,
            first_index,
            index_count,
        })
    }

    /// Appends a batch of instance transforms + identifiers and returns the first
    /// absolute instance index. See SPEC_FULL.md §4.1/§4.3.
    pub fn append_instances(
        &mut self,
        transforms: &[InstanceTransform],
        ids: &[InstanceIdentifier],
    ) -> AtlasResult<u32> {
        if transforms.is_empty() || transforms.len() != ids.len() {
            return Err(AtlasError::InvalidInput {
                operation: "append_instances",
                reason: "transforms and ids must be non-empty and equal length".to_string(),
            });
        }

        let new_cursor = self.instance_cursor + transforms.len() as u32;
        if new_cursor > self.config.capacity_instances {
            return Err(AtlasError::CapacityExceeded {
                buffer: "instance buffers",
                requested: new_cursor as u64,
                capacity: self.config.capacity_instances as u64,
            });
        }

        let start_index = self.instance_cursor;
        self.gpu.queue.write_buffer(
            &self.transform_buffer,
            start_index as u64 * InstanceTransform::SIZE,
            bytemuck::cast_slice(transforms),
        );
        self.gpu.queue.write_buffer(
            &self.identifier_buffer,
            start_index as u64 * InstanceIdentifier::SIZE,
            bytemuck::cast_slice(ids),
        );

        self.instance_cursor = new_cursor;
        Ok(start_index)
    }

    /// Records a pending segment for later compaction by [`BufferPool::finalize`].
    pub fn record_command_instances(&mut self, command_index: u32, first_instance: u32, count: u32) {
        self.pending_segments.push(Segment {
            command_index,
            first_instance,
            count,
        });
    }

    /// One-way transition `Loading -> Finalized`. Compacts pending segments, writes
    /// the remap/map/offset tables, and updates each command's `instance_count`/
    /// `first_instance`. See SPEC_FULL.md §4.4.
    pub fn finalize(&mut self) -> AtlasResult<()> {
        if self.pending_segments.is_empty() {
            log::warn!("[BufferPool] finalize() called with no pending segments");
            return Err(AtlasError::FinalizeEmpty);
        }

        let layout = finalize_segments(
            &self.pending_segments,
            self.draw_command_count(),
            self.instance_cursor,
        );

        for (command_index, command) in self.commands.iter_mut().enumerate() {
            command.first_instance = layout.command_base_offsets[command_index];
            command.instance_count = layout.command_instance_counts[command_index];
        }

        self.gpu
            .queue
            .write_buffer(&self.command_buffer, 0, bytemuck::cast_slice(&self.commands));
        self.gpu
            .queue
            .write_buffer(&self.remap_buffer, 0, bytemuck::cast_slice(&layout.remap));
        self.gpu.queue.write_buffer(
            &self.instance_draw_cmd_map_buffer,
            0,
            bytemuck::cast_slice(&layout.instance_draw_cmd_map),
        );
        self.gpu.queue.write_buffer(
            &self.command_base_offsets_buffer,
            0,
            bytemuck::cast_slice(&layout.command_base_offsets),
        );
        self.gpu.queue.write_buffer(
            &self.command_capacities_buffer,
            0,
            bytemuck::cast_slice(&layout.command_instance_counts),
        );

        self.phase = Phase::Finalized;
        log::info!(
            "[BufferPool] finalized: {} commands, {} instances, {} remap entries",
            self.draw_command_count(),
            self.instance_cursor,
            layout.remap.len()
        );
        Ok(())
    }

    pub fn dispose(self) {
        log::info!("[BufferPool] disposed");
    }
}
