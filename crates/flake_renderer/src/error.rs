//! Error type shared by the render entry points.

use flake_core::SceneError;
use thiserror::Error;

/// Errors that can occur while setting up or running a render.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("Invalid worker count {0}: must be at least 1")]
    InvalidWorkers(usize),

    #[error("Invalid block divisor {0}: must be at least 1")]
    InvalidBlockDivisor(u32),

    #[error("Output buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Failed to allocate {bytes} byte image")]
    Allocation { bytes: usize },

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Worker rendering block {block} panicked")]
    WorkerPanicked { block: usize },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type RenderResult<T> = Result<T, RenderError>;
