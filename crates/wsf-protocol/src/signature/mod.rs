//! XML Signature support for tokens and metadata.
//!
//! - [`SigningCredential`], [`KeySet`], [`KeyRing`] - signing material and
//!   its atomically swapped snapshot
//! - [`XmlSigner`] - enveloped RSA signatures over exclusive-C14N output
//! - [`XmlSignatureValidator`] - verification against trusted certificates
//!
//! Only RSA PKCS#1 v1.5 with SHA-2 is offered. SHA-1 is rejected on both
//! the signing and verifying side.

mod credential;
mod signer;
mod validator;

pub use credential::*;
pub use signer::*;
pub use validator::*;

use std::str::FromStr;

use wsf_crypto::{HashAlgorithm, RsaAlgorithm};

use crate::types::{digest_algorithms, signature_algorithms};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256.
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
}

impl SignatureAlgorithm {
    /// Returns the XML-DSig URI for this algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
        }
    }

    /// Parses an algorithm from its XML-DSig URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            _ => None,
        }
    }

    /// The RSA primitive backing this algorithm.
    #[must_use]
    pub const fn rsa(&self) -> RsaAlgorithm {
        match self {
            Self::RsaSha256 => RsaAlgorithm::Rs256,
            Self::RsaSha384 => RsaAlgorithm::Rs384,
            Self::RsaSha512 => RsaAlgorithm::Rs512,
        }
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = String;

    /// Accepts the URI or a short name such as `rsa-sha256` or `RS256`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(alg) = Self::from_uri(s) {
            return Ok(alg);
        }
        match s.to_ascii_lowercase().as_str() {
            "rsa-sha256" | "rs256" => Ok(Self::RsaSha256),
            "rsa-sha384" | "rs384" => Ok(Self::RsaSha384),
            "rsa-sha512" | "rs512" => Ok(Self::RsaSha512),
            _ => Err(format!("unsupported signature algorithm: {s}")),
        }
    }
}

/// Digest algorithm selection for signature references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestAlgorithm {
    /// SHA-256.
    #[default]
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the XML-DSig URI for this algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Sha256 => digest_algorithms::SHA256,
            Self::Sha384 => digest_algorithms::SHA384,
            Self::Sha512 => digest_algorithms::SHA512,
        }
    }

    /// Parses an algorithm from its XML-DSig URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            digest_algorithms::SHA256 => Some(Self::Sha256),
            digest_algorithms::SHA384 => Some(Self::Sha384),
            digest_algorithms::SHA512 => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Computes the digest of `data`.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let hash = match self {
            Self::Sha256 => HashAlgorithm::Sha256,
            Self::Sha384 => HashAlgorithm::Sha384,
            Self::Sha512 => HashAlgorithm::Sha512,
        };
        wsf_crypto::digest(hash, data)
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    /// Accepts the URI or a short name such as `sha256`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(alg) = Self::from_uri(s) {
            return Ok(alg);
        }
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(format!("unsupported digest algorithm: {s}")),
        }
    }
}
