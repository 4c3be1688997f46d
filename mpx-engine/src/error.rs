//! Error types for mpx-engine
//!
//! Defines engine-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for mpx-engine
#[derive(Error, Debug)]
pub enum Error {
    /// Command submitted to an engine that has been torn down for good
    #[error("Engine disposed")]
    EngineDisposed,

    /// Opening a media source failed
    #[error("Open error: {0}")]
    Open(String),

    /// Demux container errors (seek, dispose)
    #[error("Container error: {0}")]
    Container(String),

    /// Block buffer errors
    #[error("Block buffer error: {0}")]
    BlockBuffer(String),

    /// Background worker start/stop errors
    #[error("Worker error: {0}")]
    Worker(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid command argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Command lane stopped before the command completed
    #[error("Command queue closed")]
    QueueClosed,

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from shared MPX code
    #[error(transparent)]
    Common(#[from] mpx_common::Error),
}

/// Convenience Result type using mpx-engine Error
pub type Result<T> = std::result::Result<T, Error>;
