//! Culling Driver (C5): frustum extraction and the compute cull pass.

pub mod driver;
pub mod error;
pub mod frustum;

pub use driver::CullingDriver;
pub use error::CullingResult;
pub use frustum::{extract_frustum_planes, sphere_in_frustum};
