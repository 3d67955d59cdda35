//! Atlas Writer: local bounding-sphere computation for a newly appended mesh.
//!
//! Deliberately overestimates for unevenly distributed vertices; a tighter bound
//! (e.g. Ritter's algorithm) is explicitly optional and not implemented here.

use crate::layout::{BoundingSphere, Vertex};
use glam::Vec3;

pub fn compute_bounding_sphere(vertices: &[Vertex]) -> BoundingSphere {
    debug_assert!(!vertices.is_empty());

    let mut centroid = Vec3::ZERO;
    for v in vertices {
        centroid += Vec3::from(v.position);
    }
    centroid /= vertices.len() as f32;

    let mut radius = 0.0f32;
    for v in vertices {
        let d = Vec3::from(v.position).distance(centroid);
        if d > radius {
            radius = d;
        }
    }

    BoundingSphere {
        center: centroid.to_array(),
        radius,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(p: [f32; 3]) -> Vertex {
        Vertex::new(p, [0.0, 1.0, 0.0])
    }

    #[test]
    fn centroid_and_radius_of_a_cross_shape() {
        let verts = [
            v([-1.0, 0.0, 0.0]),
            v([1.0, 0.0, 0.0]),
            v([0.0, 1.0, 0.0]),
            v([0.0, -1.0, 0.0]),
        ];
        let sphere = compute_bounding_sphere(&verts);
        assert!((sphere.center[0]).abs() < 1e-6);
        assert!((sphere.center[1]).abs() < 1e-6);
        assert!((sphere.center[2]).abs() < 1e-6);
        assert!((sphere.radius - 1.0).abs() < 1e-6);
    }

    #[test]
    fn single_vertex_has_zero_radius() {
        let verts = [v([5.0, 5.0, 5.0])];
        let sphere = compute_bounding_sphere(&verts);
        assert_eq!(sphere.center, [5.0, 5.0, 5.0]);
        assert_eq!(sphere.radius, 0.0);
    }
}
