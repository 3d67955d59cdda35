//! Centralized GPU buffer layout definitions
//!
//! Single source of truth for every byte layout, binding index, and buffer
//! usage flag shared between host code and the WGSL kernels in `shaders/`.

use bytemuck::{Pod, Zeroable};
use wgpu::{VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

/// Mesh vertex: position + normal. Total size: 24 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    /// Vertex buffer layout for the render pipeline (stride 24, two `float32x3` attributes).
    pub fn layout() -> VertexBufferLayout<'static> {
        const ATTRIBUTES: &[VertexAttribute] = &[
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x3,
            },
            VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: VertexFormat::Float32x3,
            },
        ];

        VertexBufferLayout {
            array_stride: Self::SIZE,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRIBUTES,
        }
    }
}

/// Per-instance transform: a column-major 4x4 matrix. Total size: 64 bytes, 16-byte aligned.
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InstanceTransform {
    pub matrix: [[f32; 4]; 4],
}

impl InstanceTransform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn from_matrix(matrix: glam::Mat4) -> Self {
        Self {
            matrix: matrix.to_cols_array_2d(),
        }
    }

    pub fn to_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_cols_array_2d(&self.matrix)
    }
}

/// Per-instance identifier. Total size: 16 bytes; the padding exists only to hold the
/// 16-byte storage-buffer stride the shader expects, not for any data it carries.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct InstanceIdentifier {
    pub id: u32,
    pub _pad: [u32; 3],
}

impl InstanceIdentifier {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(id: u32) -> Self {
        Self { id, _pad: [0; 3] }
    }
}

/// Indexed indirect draw command. Total size: 20 bytes.
/// Matches wgpu's `DrawIndexedIndirect` layout exactly; `instance_count` is treated as
/// atomic by the cull shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct IndirectDrawCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: u32,
    pub first_instance: u32,
}

impl IndirectDrawCommand {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(index_count: u32, first_index: u32, base_vertex: u32) -> Self {
        Self {
            index_count,
            instance_count: 0,
            first_index,
            base_vertex,
            first_instance: 0,
        }
    }
}

/// A single remap-buffer entry. Total size: 4 bytes.
pub type RemapEntry = u32;

/// Local (model-space) bounding sphere for a mesh. Total size: 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct BoundingSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

/// Per-frame culling uniform. Total size: 112 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CullingUniform {
    /// Six world-space frustum planes; `dot(n, p) + d >= 0` means "inside".
    pub planes: [[f32; 4]; 6],
    pub total_instances: u32,
    pub draw_command_count: u32,
    pub _pad: [u32; 2],
}

impl CullingUniform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

/// Per-frame render uniform consumed by the vertex/fragment shaders.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RenderUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub selected_id: u32,
    pub time_seconds: f32,
    pub _pad: [f32; 3],
}

impl RenderUniform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;
}

/// Buffer binding indices, grouped per bind group so shader and host agree without
/// hardcoding numbers in either place.
pub mod bindings {
    /// Culling compute bind group (group 0).
    pub mod cull {
        pub const UNIFORM: u32 = 0;
        pub const INSTANCE_TRANSFORMS: u32 = 1;
        pub const INDIRECT_COMMANDS: u32 = 2;
        pub const REMAP: u32 = 3;
        pub const INSTANCE_DRAW_CMD_MAP: u32 = 4;
        pub const COMMAND_BASE_OFFSETS: u32 = 5;
        pub const MESH_BOUNDS: u32 = 6;
        pub const COMMAND_CAPACITIES: u32 = 7;
    }

    /// Render bind group (group 0).
    pub mod render {
        pub const UNIFORM: u32 = 0;
        pub const INSTANCE_TRANSFORMS: u32 = 1;
        pub const INSTANCE_IDENTIFIERS: u32 = 2;
        pub const REMAP: u32 = 3;
    }
}

/// Buffer usage patterns, named so call sites read as intent rather than flag soup.
pub mod usage {
    use wgpu::BufferUsages;

    pub const VERTEX: BufferUsages = BufferUsages::VERTEX.union(BufferUsages::COPY_DST);
    pub const INDEX: BufferUsages = BufferUsages::INDEX.union(BufferUsages::COPY_DST);
    pub const STORAGE: BufferUsages = BufferUsages::STORAGE.union(BufferUsages::COPY_DST);
    pub const STORAGE_READ_WRITE: BufferUsages = BufferUsages::STORAGE
        .union(BufferUsages::COPY_DST)
        .union(BufferUsages::COPY_SRC);
    pub const UNIFORM: BufferUsages = BufferUsages::UNIFORM.union(BufferUsages::COPY_DST);
    pub const INDIRECT: BufferUsages = BufferUsages::INDIRECT
        .union(BufferUsages::STORAGE)
        .union(BufferUsages::COPY_DST)
        .union(BufferUsages::COPY_SRC);
}

/// Size/offset helpers for the append-only pool buffers.
pub mod calculations {
    use super::*;

    #[inline]
    pub fn vertex_buffer_size(capacity_vertices: u32) -> u64 {
        capacity_vertices as u64 * Vertex::SIZE
    }

    #[inline]
    pub fn index_buffer_size(capacity_indices: u32) -> u64 {
        capacity_indices as u64 * 4
    }

    #[inline]
    pub fn transform_buffer_size(capacity_instances: u32) -> u64 {
        capacity_instances as u64 * InstanceTransform::SIZE
    }

    #[inline]
    pub fn identifier_buffer_size(capacity_instances: u32) -> u64 {
        capacity_instances as u64 * InstanceIdentifier::SIZE
    }

    #[inline]
    pub fn command_buffer_size(max_commands: u32) -> u64 {
        max_commands as u64 * IndirectDrawCommand::SIZE
    }

    #[inline]
    pub fn remap_buffer_size(capacity_instances: u32) -> u64 {
        capacity_instances as u64 * 4
    }

    #[inline]
    pub fn bounds_buffer_size(max_commands: u32) -> u64 {
        max_commands as u64 * std::mem::size_of::<BoundingSphere>() as u64
    }
}

/// Bind-group-layout-entry builders, one shape per access pattern, following the same
/// helper-function style as the rest of this module.
pub mod layouts {
    use wgpu::{BindGroupLayoutEntry, BindingType, BufferBindingType, ShaderStages};

    pub fn storage_entry(binding: u32, read_only: bool, visibility: ShaderStages) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }

    pub fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_sizes_match_spec() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(std::mem::size_of::<InstanceTransform>(), 64);
        assert_eq!(std::mem::size_of::<InstanceIdentifier>(), 16);
        assert_eq!(std::mem::size_of::<IndirectDrawCommand>(), 20);
        assert_eq!(std::mem::size_of::<BoundingSphere>(), 16);
        assert_eq!(std::mem::size_of::<CullingUniform>(), 112);
    }

    #[test]
    fn transform_round_trips_through_column_major_bytes() {
        let m = glam::Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let t = InstanceTransform::from_matrix(m);
        assert_eq!(t.to_matrix(), m);
    }
}
