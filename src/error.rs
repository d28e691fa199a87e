//! Central error handling for the bake pipeline.

/// Error type for all bake operations
#[derive(thiserror::Error, Debug)]
pub enum BakeError {
    #[error("Invalid bake parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid spectrum: {0}")]
    InvalidSpectrum(String),

    #[error("Wave field evaluation failed: {0}")]
    Evaluator(String),

    #[error("GPU device error: {0}")]
    Device(String),

    #[error("Readback error: {0}")]
    Readback(String),

    #[error("Dataset persistence failed: {0}")]
    Persistence(#[from] std::io::Error),
}

impl BakeError {
    /// Convenience constructors for common error types
    pub fn invalid_params<T: ToString>(msg: T) -> Self {
        BakeError::InvalidParams(msg.to_string())
    }

    pub fn invalid_spectrum<T: ToString>(msg: T) -> Self {
        BakeError::InvalidSpectrum(msg.to_string())
    }

    pub fn evaluator<T: ToString>(msg: T) -> Self {
        BakeError::Evaluator(msg.to_string())
    }

    pub fn device<T: ToString>(msg: T) -> Self {
        BakeError::Device(msg.to_string())
    }

    pub fn readback<T: ToString>(msg: T) -> Self {
        BakeError::Readback(msg.to_string())
    }
}

/// Result type alias for bake operations
pub type BakeResult<T> = Result<T, BakeError>;
