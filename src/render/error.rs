//! Render subsystem error alias, mirroring `atlas::error`.

use crate::error::AtlasEngineResult;

pub type RenderResult<T> = AtlasEngineResult<T>;
