//! Crate-wide error type.
//!
//! Subsystems (`atlas`, `culling`, `render`) each expose a thin `Result` alias over
//! this enum rather than defining their own error types, mirroring how the renderer
//! subsystem wraps a single engine-wide error.

use thiserror::Error;

pub type AtlasEngineResult<T> = Result<T, AtlasError>;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("capacity exceeded for {buffer}: requested {requested}, capacity {capacity}")]
    CapacityExceeded {
        buffer: &'static str,
        requested: u64,
        capacity: u64,
    },

    #[error("finalize() called with no pending instance segments")]
    FinalizeEmpty,

    #[error("operation requires phase {expected:?}, pool is in phase {actual:?}")]
    PhaseViolation { expected: Phase, actual: Phase },

    #[error("GPU device lost: {message}")]
    DeviceLost { message: String },

    #[error("invalid input to {operation}: {reason}")]
    InvalidInput {
        operation: &'static str,
        reason: String,
    },

    #[error("failed to create {stage} pipeline: {message}")]
    ShaderCompilation {
        stage: &'static str,
        message: String,
    },

    #[error("{component}: {error}")]
    SystemError { component: String, error: String },
}

/// Load-phase of a [`crate::atlas::BufferPool`]. See the pool's module docs for the
/// one-way transition rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Finalized,
}

pub fn gpu_operation_error(operation: &str, error: impl std::fmt::Display) -> AtlasError {
    AtlasError::SystemError {
        component: operation.to_string(),
        error: error.to_string(),
    }
}

/// Converts a caught `device.create_*_pipeline` panic into a [`AtlasError::ShaderCompilation`].
/// wgpu reports pipeline-creation failures (bad entry point, invalid WGSL) as a panic
/// through the device's error scope, not a `Result`, so `catch_unwind` is the only way
/// a caller can turn one into something other than a process abort.
pub fn shader_compilation_error(stage: &'static str, payload: Box<dyn std::any::Any + Send>) -> AtlasError {
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "pipeline creation panicked".to_string());
    AtlasError::ShaderCompilation { stage, message }
}
