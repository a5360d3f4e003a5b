//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// No stable machine identifier could be read on this host.
    #[error("no stable machine identifier available on this host")]
    FingerprintUnavailable,

    /// Fingerprint input was empty after trimming.
    #[error("fingerprint must not be empty")]
    EmptyFingerprint,

    /// Candidate key does not normalize to 20 hex characters.
    #[error("license key format not recognized")]
    MalformedKey,

    /// Reading or writing the activation record failed.
    #[error("activation record i/o failed: {0}")]
    Persistence(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
