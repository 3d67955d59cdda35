//! Atlas subsystem error alias, following the same thin-alias pattern the renderer
//! subsystem uses over the crate-wide error type.

use crate::error::AtlasEngineResult;

pub type AtlasResult<T> = AtlasEngineResult<T>;
