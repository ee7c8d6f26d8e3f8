//! Error types for the compositing engine
//!
//! Everything the engine can fail with crosses the API boundary as an
//! `EngineError` value; the engine never panics on bad input.

use thiserror::Error;

/// Errors surfaced to the host
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Zero or non-finite dimensions, an unusable zoom factor, or a
    /// rotation that is not a multiple of 90 degrees. Indicates a caller
    /// bug rather than a user-recoverable condition.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// The supplied bytes could not be decoded as an image. Recoverable;
    /// the scene is left exactly as it was before the load attempt.
    #[error("image load failed: {0}")]
    ImageLoad(String),

    /// Export or a main-image mutation was requested before any main
    /// image finished loading.
    #[error("no image loaded")]
    NoImageLoaded,

    /// A replacement main-image decode is still in flight; the command
    /// would otherwise apply to the image about to be discarded.
    #[error("main image load in flight")]
    LoadInFlight,

    /// Encoding the composited buffer failed.
    #[error("export failed: {0}")]
    Export(String),
}
