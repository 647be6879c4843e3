/// Convenience result type used across animtool.
pub type AnimResult<T> = Result<T, AnimError>;

/// Top-level error taxonomy used by the pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum AnimError {
    /// Unreadable input, unrecognized format or malformed textual arguments.
    #[error("input error: {0}")]
    Input(String),

    /// The source stream could not be decoded or violates the frame contract.
    #[error("decode error: {0}")]
    Decode(String),

    /// Quantization, bitstream assembly or export failures.
    #[error("encode error: {0}")]
    Encode(String),

    /// Option combinations that cannot produce any output.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnimError {
    /// Build an [`AnimError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build an [`AnimError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build an [`AnimError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build an [`AnimError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
