//! Error types for the wireframe pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a page into a wireframe
#[derive(Error, Debug)]
pub enum Error {
    /// The request itself is unusable (missing or malformed URL)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failed to load a URL
    #[error("Failed to load URL: {0}")]
    LoadError(String),

    /// The rendering collaborator failed (crash, bad session, selector missing)
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The in-page capture returned something we could not use
    #[error("Extraction failed: {0}")]
    ExtractionError(String),

    /// The generation service could not be reached or answered with an error
    #[error("Generation failed: {0}")]
    GenerationError(String),

    /// The accessibility collaborator failed
    #[error("Accessibility check failed: {0}")]
    AccessibilityError(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP-equivalent status for this error: 400 for input problems, 500 otherwise.
    pub fn status(&self) -> u16 {
        match self {
            Error::InvalidInput(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(feature = "cdp")]
/// `headless_chrome` reports through `anyhow`; keep the context chain.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(format!("{:#}", err))
    }
}
