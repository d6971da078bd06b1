//! Error types for matrix-mul operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("collective error: {0}")]
    Collective(#[from] collective::Error),

    #[error("invalid matrix dimension {0:?}: expected a positive integer")]
    InvalidDimension(String),

    #[error("invalid schedule type {0:?}. Use: static, dynamic, or guided")]
    InvalidSchedulePolicy(String),

    #[error("invalid chunk size {0:?}: expected a positive integer")]
    InvalidChunkSize(String),

    #[error("invalid thread count {0:?}: expected a positive integer")]
    InvalidThreadCount(String),

    #[error("invalid worker count {0:?}: expected a positive integer")]
    InvalidWorkerCount(String),

    #[error("rank {rank} is outside a group of {workers} workers")]
    RankOutOfRange { rank: usize, workers: usize },

    #[error("invalid launch environment: {name}={value:?}: {reason}")]
    InvalidLaunchEnv {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("failed to allocate {0} matrix elements")]
    AllocationFailure(usize),

    #[error("buffer shape mismatch: expected {expected} elements, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("compute task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
