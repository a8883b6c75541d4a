//! Signing credentials and the rotatable key ring.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use parking_lot::RwLock;
use wsf_crypto::{certificate_public_key, certificate_subject, pem_to_der, sha256, RsaSigningKey};

use crate::error::{WsFedError, WsFedResult};

use super::SignatureAlgorithm;

/// An RSA private key paired with the X.509 certificate that publishes it.
pub struct SigningCredential {
    key: RsaSigningKey,
    certificate_der: Vec<u8>,
    thumbprint: String,
}

impl SigningCredential {
    /// Pairs a key with its certificate.
    ///
    /// # Errors
    ///
    /// Fails if the certificate cannot be parsed or does not carry the
    /// key's public half.
    pub fn new(key: RsaSigningKey, certificate_der: Vec<u8>) -> WsFedResult<Self> {
        let certified = certificate_public_key(&certificate_der)?;
        if certified != key.public_key_der() {
            return Err(wsf_crypto::CryptoError::KeyMismatch.into());
        }
        let thumbprint = hex::encode(sha256(&certificate_der));
        Ok(Self {
            key,
            certificate_der,
            thumbprint,
        })
    }

    /// Loads a credential from a PEM private key (PKCS#8 or PKCS#1) and a
    /// PEM certificate.
    ///
    /// # Errors
    ///
    /// Fails if either block is missing or the pair does not match.
    pub fn from_pem(key_pem: &str, certificate_pem: &str) -> WsFedResult<Self> {
        let key = RsaSigningKey::from_pem(key_pem)?;
        Self::new(key, certificate_der_from_pem(certificate_pem)?)
    }

    /// DER certificate.
    #[must_use]
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    /// Base64 certificate as carried in `X509Certificate` elements.
    #[must_use]
    pub fn certificate_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.certificate_der)
    }

    /// Hex SHA-256 thumbprint of the certificate.
    #[must_use]
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Certificate subject, for logging.
    #[must_use]
    pub fn subject(&self) -> String {
        certificate_subject(&self.certificate_der).unwrap_or_default()
    }

    /// Signs `data`.
    ///
    /// # Errors
    ///
    /// Propagates failures from the RSA primitive.
    pub fn sign(&self, data: &[u8], algorithm: SignatureAlgorithm) -> WsFedResult<Vec<u8>> {
        Ok(self.key.sign(data, algorithm.rsa())?)
    }
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredential")
            .field("thumbprint", &self.thumbprint)
            .field("modulus_bits", &self.key.modulus_bits())
            .finish_non_exhaustive()
    }
}

/// The active signing credential and every certificate published in
/// metadata.
///
/// The active certificate is always published and always listed first.
#[derive(Debug)]
pub struct KeySet {
    active: SigningCredential,
    published: Vec<Vec<u8>>,
}

impl KeySet {
    /// Creates a key set that publishes only the active certificate.
    #[must_use]
    pub fn new(active: SigningCredential) -> Self {
        let published = vec![active.certificate_der.clone()];
        Self { active, published }
    }

    /// Also publishes `certificate_der`, typically the next or previous key
    /// during a rollover.
    #[must_use]
    pub fn with_published(mut self, certificate_der: Vec<u8>) -> Self {
        if !self.published.contains(&certificate_der) {
            self.published.push(certificate_der);
        }
        self
    }

    /// The credential used to sign.
    #[must_use]
    pub fn active(&self) -> &SigningCredential {
        &self.active
    }

    /// DER certificates advertised in metadata, active first.
    #[must_use]
    pub fn published_certificates(&self) -> &[Vec<u8>] {
        &self.published
    }
}

/// A swappable [`KeySet`].
///
/// Readers take an `Arc` snapshot and sign without holding the lock, so a
/// rotation never tears an in-flight response: each response is produced
/// entirely with either the old or the new set.
#[derive(Debug, Default)]
pub struct KeyRing {
    current: RwLock<Option<Arc<KeySet>>>,
}

impl KeyRing {
    /// Creates a ring holding `keys`.
    #[must_use]
    pub fn new(keys: KeySet) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(keys))),
        }
    }

    /// Creates a ring with no credential configured.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The current key set, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<KeySet>> {
        self.current.read().clone()
    }

    /// Installs `keys` and returns the set it replaced.
    pub fn rotate(&self, keys: KeySet) -> Option<Arc<KeySet>> {
        let next = Arc::new(keys);
        tracing::info!(
            thumbprint = %next.active().thumbprint(),
            published = next.published_certificates().len(),
            "Signing key set rotated"
        );
        self.current.write().replace(next)
    }

    /// Removes the key set. Issuance fails until a new set is installed.
    pub fn clear(&self) -> Option<Arc<KeySet>> {
        self.current.write().take()
    }
}

/// Decodes the first `CERTIFICATE` block of a PEM document.
///
/// # Errors
///
/// Returns [`WsFedError::Configuration`] if there is no such block or the
/// certificate does not parse.
pub fn certificate_der_from_pem(pem: &str) -> WsFedResult<Vec<u8>> {
    let der = pem_to_der(pem, "CERTIFICATE")
        .ok_or_else(|| WsFedError::Configuration("no CERTIFICATE block".to_string()))?;
    certificate_public_key(&der)?;
    Ok(der)
}
