//! Buffer Pool, Atlas Writer, Instance Ingest, and Finalizer (C1-C4).

pub mod bounds;
pub mod error;
pub mod finalize;
pub mod pool;

pub use error::AtlasResult;
pub use finalize::Segment;
pub use pool::{BufferPool, MeshAtlasEntry};
