//! Frustum plane extraction and the sphere/frustum test, kept pure so they are
//! unit-testable without a GPU device.
//!
//! Grounded on `culling_pipeline.rs::extract_frustum_planes` (Gribb/Hartmann
//! row3+-row0/1/2 construction over the matrix's column vectors), adapted to glam's
//! `Mat4` and to the spec's 1e-6 normalization-skip threshold (the teacher skips
//! normalization only when length is exactly zero).

use glam::{Mat4, Vec3, Vec4};

const NORMALIZE_EPSILON: f32 = 1e-6;

/// Six world-space frustum planes, `dot(n, p) + d >= 0` meaning "inside".
pub fn extract_frustum_planes(view_proj: &Mat4) -> [[f32; 4]; 6] {
    let x = view_proj.x_axis;
    let y = view_proj.y_axis;
    let z = view_proj.z_axis;
    let w = view_proj.w_axis;

    let mut planes = [
        w + x, // left
        w - x, // right
        w + y, // bottom
        w - y, // top
        z,     // near
        w - z, // far
    ];

    for plane in &mut planes {
        let normal_len = Vec3::new(plane.x, plane.y, plane.z).length();
        if normal_len >= NORMALIZE_EPSILON {
            *plane /= normal_len;
        }
    }

    planes.map(|p: Vec4| p.to_array())
}

/// True if a world-space bounding sphere intersects or lies inside every plane of the
/// frustum (i.e. survives culling).
pub fn sphere_in_frustum(planes: &[[f32; 4]; 6], center: Vec3, radius: f32) -> bool {
    for plane in planes {
        let n = Vec3::new(plane[0], plane[1], plane[2]);
        let d = plane[3];
        if n.dot(center) + d < -radius {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far)
    }

    fn view_proj_looking_down_z() -> Mat4 {
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);
        let proj = perspective(90.0, 1.0, 0.1, 100.0);
        proj * view
    }

    #[test]
    fn s3_instance_in_front_survives_instance_behind_does_not() {
        let vp = view_proj_looking_down_z();
        let planes = extract_frustum_planes(&vp);

        let in_front = Vec3::new(0.0, 0.0, -10.0);
        let behind = Vec3::new(0.0, 0.0, 10.0);

        assert!(sphere_in_frustum(&planes, in_front, 0.5));
        assert!(!sphere_in_frustum(&planes, behind, 0.5));
    }

    #[test]
    fn s4_large_sphere_behind_center_but_intersecting_every_plane_survives() {
        let vp = view_proj_looking_down_z();
        let planes = extract_frustum_planes(&vp);

        let behind_but_huge = Vec3::new(0.0, 0.0, 10.0);
        assert!(sphere_in_frustum(&planes, behind_but_huge, 50.0));
    }

    #[test]
    fn degenerate_matrix_does_not_divide_by_zero() {
        let degenerate = Mat4::ZERO;
        let planes = extract_frustum_planes(&degenerate);
        for p in &planes {
            assert!(p.iter().all(|c| c.is_finite()));
        }
    }
}
