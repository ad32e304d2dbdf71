//! Error types for the engine.
//!
//! A single error enum covers every failure kind the engine can raise.
//! Each variant carries a stable `SSE-XXX` code so callers can match on
//! the code rather than the message text.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by engine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A vector presented to the HNSW index did not have dimension `D` (SSE-001).
    #[error("[SSE-001] vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// An id already present in the HNSW graph was inserted again (SSE-002).
    ///
    /// The engine catches this internally during `add` so re-importing an
    /// export is idempotent; it only escapes to a caller who drives the
    /// HNSW index directly.
    #[error("[SSE-002] duplicate id '{0}' in HNSW index")]
    DuplicateId(String),

    /// `use` was called with a Power name already present in the registry (SSE-003).
    #[error("[SSE-003] a Power named '{0}' is already registered")]
    DuplicatePower(String),

    /// A `beforeAdd`/`afterAdd`/`beforeSearch`/`afterSearch`/`onDelete`/`onClear`
    /// hook returned an error, aborting the triggering operation (SSE-004).
    #[error("[SSE-004] Power '{power}' hook '{hook}' failed: {source}")]
    Hook {
        /// Name of the Power whose hook failed.
        power: String,
        /// Which hook failed (e.g. "beforeAdd").
        hook: &'static str,
        /// Underlying failure.
        #[source]
        source: anyhow::Error,
    },

    /// The embedder failed to produce vectors for the given input (SSE-005).
    #[error("[SSE-005] embedder failed: {0}")]
    Embedder(#[source] anyhow::Error),

    /// A fusion weight or parameter was outside its valid range (SSE-006).
    #[error("[SSE-006] invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable explanation.
        message: String,
    },
}

impl Error {
    /// Returns the stable error code (e.g. `"SSE-001"`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DimensionMismatch { .. } => "SSE-001",
            Self::DuplicateId(_) => "SSE-002",
            Self::DuplicatePower(_) => "SSE-003",
            Self::Hook { .. } => "SSE-004",
            Self::Embedder(_) => "SSE-005",
            Self::InvalidParameter { .. } => "SSE-006",
        }
    }
}
