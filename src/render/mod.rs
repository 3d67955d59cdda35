//! Render Driver (C6): pipeline setup and the per-frame indirect draw loop.

pub mod driver;
pub mod error;

pub use driver::{RenderDriver, DEPTH_FORMAT};
pub use error::RenderResult;
