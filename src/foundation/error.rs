/// Crate-wide result alias.
pub type KenBurnsResult<T> = Result<T, KenBurnsError>;

/// Errors produced while synthesizing a camera-motion video.
#[derive(thiserror::Error, Debug)]
pub enum KenBurnsError {
    /// Missing or undecodable source image, malformed motion fields, bad timing values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The crop window implied by a scale would be smaller than one pixel.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// The requested container encoder is not present on this host.
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// The request would exceed the configured frame buffer ceiling.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// The request was cancelled or ran past its deadline.
    #[error("synthesis cancelled: {0}")]
    Cancelled(String),

    /// Any other synthesis failure (encoder I/O, encoder process exit status).
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KenBurnsError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn degenerate_geometry(msg: impl Into<String>) -> Self {
        Self::DegenerateGeometry(msg.into())
    }

    pub fn encoder_unavailable(msg: impl Into<String>) -> Self {
        Self::EncoderUnavailable(msg.into())
    }

    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }
}
