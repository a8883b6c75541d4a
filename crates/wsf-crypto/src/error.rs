//! Error type for cryptographic operations.

use thiserror::Error;

/// Result alias for this crate.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Error type for cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid key format.
    #[error("invalid key format: {0}")]
    InvalidKey(String),

    /// Invalid or unparseable certificate.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Private key does not belong to the certificate it was paired with.
    #[error("private key does not match certificate public key")]
    KeyMismatch,

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// PEM input had no block with the expected label.
    #[error("no PEM block labelled '{0}'")]
    MissingPemBlock(String),
}
