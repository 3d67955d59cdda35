//! Culling subsystem error alias, mirroring `atlas::error`.

use crate::error::AtlasEngineResult;

pub type CullingResult<T> = AtlasEngineResult<T>;
