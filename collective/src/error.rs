//! Error types for collective operations.

use thiserror::Error;

use crate::frame::Kind;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("coordinator at {addr} unreachable after {attempts} attempts")]
    Unreachable { addr: String, attempts: usize },

    #[error("expected {expected:?} frame, got {got:?}")]
    UnexpectedFrame { expected: Kind, got: Kind },

    #[error("unknown frame kind {0}")]
    UnknownKind(i32),

    #[error("expected frame from rank {expected}, got rank {got}")]
    RankMismatch { expected: usize, got: usize },

    #[error("payload length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("rank {rank} is outside a group of {size}")]
    UnknownRank { rank: usize, size: usize },

    #[error("rank {0} joined twice")]
    DuplicateRank(usize),

    #[error("rank {0} does not fit in a frame header")]
    RankTooLarge(usize),

    #[error("cannot allocate a buffer of {0} elements")]
    AllocationFailure(usize),

    #[error("frame of {0} bytes exceeds the frame size limit")]
    FrameTooLarge(usize),

    #[error("group must have at least one rank")]
    EmptyGroup,

    #[error("scatter counts cover {counts} ranks, group has {size}")]
    CountMismatch { counts: usize, size: usize },

    #[error("scatter on the coordinator requires a source buffer")]
    MissingScatterData,
}
