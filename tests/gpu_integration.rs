//! GPU-backed integration tests: append/finalize bookkeeping, and a real cull-pass
//! dispatch with buffer readback to verify the WGSL frustum test against `BufferPool`
//! state (not just the pure host-side `culling::frustum` unit tests).
//!
//! Grounded on the teacher's `tests/gpu_compute_validation.rs::init_gpu` pattern:
//! request an adapter via `pollster::block_on`, skip gracefully (print + return)
//! rather than fail when none is available.

use atlas_engine::layout::{CullingUniform, IndirectDrawCommand, InstanceIdentifier, InstanceTransform, Vertex};
use atlas_engine::{extract_frustum_planes, AtlasConfig, BufferPool, CullingDriver, GpuContext};
use glam::{Mat4, Vec3};

fn init_gpu() -> Option<GpuContext> {
    match GpuContext::request_blocking() {
        Ok(Some(gpu)) => Some(gpu),
        Ok(None) => {
            println!("gpu_integration: no adapter available, skipping");
            None
        }
        Err(e) => {
            println!("gpu_integration: device request failed ({e}), skipping");
            None
        }
    }
}

fn quad_mesh() -> (Vec<Vertex>, Vec<u32>) {
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        Vertex::new([-1.0, -1.0, 0.0], n),
        Vertex::new([1.0, -1.0, 0.0], n),
        Vertex::new([1.0, 1.0, 0.0], n),
        Vertex::new([-1.0, 1.0, 0.0], n),
    ];
    let indices = vec![0, 1, 2, 2, 3, 0];
    (vertices, indices)
}

/// Copies `size` bytes out of a storage/indirect buffer via a `MAP_READ` staging
/// buffer, blocking on `device.poll` the way a synchronous readback must outside of
/// wgpu's async `map_async` callback.
fn read_buffer_sync(device: &wgpu::Device, queue: &wgpu::Queue, source: &wgpu::Buffer, size: u64) -> Vec<u8> {
    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("gpu_integration readback staging buffer"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("gpu_integration readback encoder"),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    rx.recv().expect("map_async never signalled").expect("buffer map failed");

    let data = slice.get_mapped_range().to_vec();
    drop(slice);
    staging.unmap();
    data
}

#[test]
fn append_finalize_produces_expected_counts() {
    let Some(gpu) = init_gpu() else { return };

    let config = AtlasConfig {
        capacity_vertices: 1_000,
        capacity_indices: 3_000,
        capacity_instances: 64,
        max_commands: 4,
        ..AtlasConfig::default()
    };
    let mut pool = BufferPool::new(gpu.clone(), config);

    let (vertices, indices) = quad_mesh();
    let entry = pool.append_mesh(&vertices, &indices).expect("append_mesh");

    let transforms = vec![
        InstanceTransform::from_matrix(Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0))),
        InstanceTransform::from_matrix(Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0))),
    ];
    let ids = vec![InstanceIdentifier::new(1), InstanceIdentifier::new(2)];

    let first_instance = pool.append_instances(&transforms, &ids).expect("append_instances");
    pool.record_command_instances(entry.command_index as u32, first_instance, 2);
    pool.finalize().expect("finalize");

    assert_eq!(pool.total_instances(), 2);
    assert_eq!(pool.draw_command_count(), 1);
}

#[test]
fn finalize_on_empty_pool_is_an_error_and_stays_in_loading() {
    let Some(gpu) = init_gpu() else { return };

    let config = AtlasConfig::default();
    let mut pool = BufferPool::new(gpu, config);

    let result = pool.finalize();
    assert!(result.is_err());
    assert_eq!(pool.phase(), atlas_engine::Phase::Loading);
}

#[test]
fn capacity_exceeded_is_reported_without_partial_state() {
    let Some(gpu) = init_gpu() else { return };

    let config = AtlasConfig {
        capacity_instances: 1,
        ..AtlasConfig::default()
    };
    let mut pool = BufferPool::new(gpu, config);

    let transforms = vec![
        InstanceTransform::from_matrix(Mat4::IDENTITY),
        InstanceTransform::from_matrix(Mat4::IDENTITY),
    ];
    let ids = vec![InstanceIdentifier::new(1), InstanceIdentifier::new(2)];

    let result = pool.append_instances(&transforms, &ids);
    assert!(result.is_err());
    assert_eq!(pool.total_instances(), 0);
}

/// S3: drives `CullingDriver::execute` against a real device and reads the indirect
/// command + remap buffers back, verifying the WGSL frustum test (not just the pure
/// `culling::frustum` host-side unit tests) keeps the in-front instance and drops the
/// instance behind the camera.
#[test]
fn cull_pass_on_real_device_keeps_only_instances_inside_the_frustum() {
    let Some(gpu) = init_gpu() else { return };

    let config = AtlasConfig {
        capacity_vertices: 1_000,
        capacity_indices: 3_000,
        capacity_instances: 64,
        max_commands: 4,
        ..AtlasConfig::default()
    };
    let mut pool = BufferPool::new(gpu.clone(), config);

    let (vertices, indices) = quad_mesh();
    let entry = pool.append_mesh(&vertices, &indices).expect("append_mesh");

    let transforms = vec![
        InstanceTransform::from_matrix(Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0))), // in front
        InstanceTransform::from_matrix(Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0))), // behind
    ];
    let ids = vec![InstanceIdentifier::new(1), InstanceIdentifier::new(2)];
    let first_instance = pool.append_instances(&transforms, &ids).expect("append_instances");
    pool.record_command_instances(entry.command_index as u32, first_instance, 2);
    pool.finalize().expect("finalize");

    let culling = match CullingDriver::new(&gpu) {
        Ok(driver) => driver,
        Err(e) => {
            println!("gpu_integration: cull pipeline unavailable on this adapter ({e}), skipping");
            return;
        }
    };

    let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
    let proj = Mat4::perspective_rh(90f32.to_radians(), 1.0, 0.1, 100.0);
    let view_proj = proj * view;
    let uniform = CullingUniform {
        planes: extract_frustum_planes(&view_proj),
        total_instances: pool.total_instances(),
        draw_command_count: pool.draw_command_count(),
        _pad: [0; 2],
    };
    culling.update_uniform(&gpu.queue, &uniform);

    let bind_group = culling.create_bind_group(&pool);
    let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("gpu_integration cull encoder"),
    });
    culling.execute(&mut encoder, &bind_group, pool.total_instances(), pool.draw_command_count());
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let command_bytes = read_buffer_sync(&gpu.device, &gpu.queue, pool.command_buffer(), IndirectDrawCommand::SIZE);
    let command: IndirectDrawCommand = *bytemuck::from_bytes(&command_bytes);
    assert_eq!(command.instance_count, 1, "only the in-front instance should survive culling");

    let remap_bytes = read_buffer_sync(&gpu.device, &gpu.queue, pool.remap_buffer(), 4);
    let surviving_instance: u32 = *bytemuck::from_bytes(&remap_bytes);
    assert_eq!(surviving_instance, first_instance, "the surviving slot should point at the in-front instance");
}
