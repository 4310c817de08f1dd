//! Error taxonomy for the validation engine.
//!
//! Containment policy: errors local to one pull request or one repository
//! inside a larger batch are logged and counted, never propagated; errors
//! that prevent a whole scope from being enumerated surface to the batch
//! caller. No automatic retries — throttling exists to avoid rate-limit
//! errors, not to recover from them.

/// Opaque failure reported by an external collaborator.
///
/// Boundary implementations wrap whatever their transport produces; the
/// engine maps these into [`EngineError`] variants at the call site.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct BoundaryError(pub String);

impl BoundaryError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required identifying field (repo/owner/org, document) is missing.
    /// Fails fast, before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Entity resolution or enumeration failed; the dependent batch is
    /// abandoned for that scope only.
    #[error("upstream lookup failed: {0}")]
    UpstreamLookup(String),

    /// The document-check call failed for a single pull request. That
    /// PR's status update is skipped; siblings in the batch proceed.
    #[error("document check failed for PR #{number}: {reason}")]
    CheckBoundary { number: u64, reason: String },

    /// Duplicate signature rejection, surfaced verbatim to the caller.
    #[error("signature rejected: {0}")]
    SignatureConflict(String),
}
