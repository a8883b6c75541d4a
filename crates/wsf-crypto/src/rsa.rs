//! RSA PKCS#1 v1.5 signing and verification.

use std::fmt;

use aws_lc_rs::{
    rand::SystemRandom,
    signature::{self, KeyPair, RsaKeyPair, UnparsedPublicKey},
};

use crate::error::{CryptoError, CryptoResult};
use crate::hash::HashAlgorithm;

/// RSA signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-256.
    Rs256,
    /// RSA PKCS#1 v1.5 with SHA-384.
    Rs384,
    /// RSA PKCS#1 v1.5 with SHA-512.
    Rs512,
}

impl RsaAlgorithm {
    /// Returns the hash the algorithm signs over.
    #[must_use]
    pub const fn hash(self) -> HashAlgorithm {
        match self {
            Self::Rs256 => HashAlgorithm::Sha256,
            Self::Rs384 => HashAlgorithm::Sha384,
            Self::Rs512 => HashAlgorithm::Sha512,
        }
    }
}

/// An RSA private key parsed once and reused for every signature.
pub struct RsaSigningKey {
    key_pair: RsaKeyPair,
}

impl RsaSigningKey {
    /// Parses a DER-encoded private key, PKCS#8 or PKCS#1.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if neither encoding parses.
    pub fn from_der(key_der: &[u8]) -> CryptoResult<Self> {
        let key_pair = RsaKeyPair::from_pkcs8(key_der)
            .or_else(|_| RsaKeyPair::from_der(key_der))
            .map_err(|e| CryptoError::InvalidKey(format!("invalid RSA key: {e}")))?;
        Ok(Self { key_pair })
    }

    /// Parses a PEM-encoded private key (`PRIVATE KEY` or `RSA PRIVATE KEY`).
    ///
    /// # Errors
    ///
    /// Returns an error if no key block is present or the key does not parse.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let der = crate::pem::pem_to_der(pem, "PRIVATE KEY")
            .or_else(|| crate::pem::pem_to_der(pem, "RSA PRIVATE KEY"))
            .ok_or_else(|| CryptoError::MissingPemBlock("PRIVATE KEY".to_string()))?;
        Self::from_der(&der)
    }

    /// Signs `data` with the given algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Signing`] if the underlying operation fails.
    pub fn sign(&self, data: &[u8], algorithm: RsaAlgorithm) -> CryptoResult<Vec<u8>> {
        let padding = match algorithm {
            RsaAlgorithm::Rs256 => &signature::RSA_PKCS1_SHA256,
            RsaAlgorithm::Rs384 => &signature::RSA_PKCS1_SHA384,
            RsaAlgorithm::Rs512 => &signature::RSA_PKCS1_SHA512,
        };

        let rng = SystemRandom::new();
        let mut sig = vec![0u8; self.key_pair.public_modulus_len()];
        self.key_pair
            .sign(padding, &rng, data, &mut sig)
            .map_err(|e| CryptoError::Signing(format!("RSA signing failed: {e}")))?;

        Ok(sig)
    }

    /// The public key as a DER `RSAPublicKey` (PKCS#1).
    #[must_use]
    pub fn public_key_der(&self) -> Vec<u8> {
        self.key_pair.public_key().as_ref().to_vec()
    }

    /// Modulus size in bits.
    #[must_use]
    pub fn modulus_bits(&self) -> usize {
        self.key_pair.public_modulus_len() * 8
    }
}

impl fmt::Debug for RsaSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaSigningKey")
            .field("modulus_bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

/// Verifies an RSA PKCS#1 v1.5 signature.
///
/// `public_key_der` is a DER `RSAPublicKey`, as returned by
/// [`certificate_public_key`](crate::x509::certificate_public_key).
/// Returns `false` for a bad signature rather than an error.
#[must_use]
pub fn rsa_verify(public_key_der: &[u8], data: &[u8], sig: &[u8], algorithm: RsaAlgorithm) -> bool {
    let verification_alg: &'static dyn signature::VerificationAlgorithm = match algorithm {
        RsaAlgorithm::Rs256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        RsaAlgorithm::Rs384 => &signature::RSA_PKCS1_2048_8192_SHA384,
        RsaAlgorithm::Rs512 => &signature::RSA_PKCS1_2048_8192_SHA512,
    };

    UnparsedPublicKey::new(verification_alg, public_key_der)
        .verify(data, sig)
        .is_ok()
}
