//! X.509 certificate helpers.

use x509_parser::prelude::*;

use crate::error::{CryptoError, CryptoResult};

/// Returns the certificate's RSA public key as a DER `RSAPublicKey`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidCertificate`] if the certificate does not
/// parse.
pub fn certificate_public_key(cert_der: &[u8]) -> CryptoResult<Vec<u8>> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| CryptoError::InvalidCertificate(format!("failed to parse certificate: {e}")))?;

    Ok(cert.public_key().subject_public_key.data.to_vec())
}

/// Returns the certificate subject as an RFC 4514 string.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidCertificate`] if the certificate does not
/// parse.
pub fn certificate_subject(cert_der: &[u8]) -> CryptoResult<String> {
    let (_, cert) = X509Certificate::from_der(cert_der)
        .map_err(|e| CryptoError::InvalidCertificate(format!("failed to parse certificate: {e}")))?;

    Ok(cert.subject().to_string())
}
