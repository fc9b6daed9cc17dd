//! Central error handling for environment map generation
//!
//! Provides a unified EnvmapError enum with consistent categorization
//! across input decoding, geometry validation, and container output.

/// Centralized error type for all environment map operations
#[derive(thiserror::Error, Debug)]
pub enum EnvmapError {
    /// Level topology the output geometry cannot carry (ripmaps).
    /// Raised before any output resource is created.
    #[error("Unsupported topology: {0}")]
    UnsupportedTopology(String),

    #[error("Create error: {0}")]
    Create(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Read error: {0}")]
    Read(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EnvmapError {
    /// Convenience constructors for common error types
    pub fn topology<T: ToString>(msg: T) -> Self {
        EnvmapError::UnsupportedTopology(msg.to_string())
    }

    pub fn create<T: ToString>(msg: T) -> Self {
        EnvmapError::Create(msg.to_string())
    }

    pub fn write<T: ToString>(msg: T) -> Self {
        EnvmapError::Write(msg.to_string())
    }

    pub fn read<T: ToString>(msg: T) -> Self {
        EnvmapError::Read(msg.to_string())
    }

    pub fn invalid<T: ToString>(msg: T) -> Self {
        EnvmapError::Invalid(msg.to_string())
    }
}

/// Result type alias for environment map operations
pub type EnvmapResult<T> = Result<T, EnvmapError>;
