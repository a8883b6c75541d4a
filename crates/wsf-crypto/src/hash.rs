//! SHA-2 digests.

use aws_lc_rs::digest;

/// Digest algorithms accepted for XML-DSig references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// Computes a digest of the input data.
#[must_use]
pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    let alg = match algorithm {
        HashAlgorithm::Sha256 => &digest::SHA256,
        HashAlgorithm::Sha384 => &digest::SHA384,
        HashAlgorithm::Sha512 => &digest::SHA512,
    };

    digest::digest(alg, data).as_ref().to_vec()
}

/// Computes a SHA-256 digest.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    digest(HashAlgorithm::Sha256, data)
}

/// Computes a SHA-384 digest.
#[must_use]
pub fn sha384(data: &[u8]) -> Vec<u8> {
    digest(HashAlgorithm::Sha384, data)
}

/// Computes a SHA-512 digest.
#[must_use]
pub fn sha512(data: &[u8]) -> Vec<u8> {
    digest(HashAlgorithm::Sha512, data)
}
