//! Enveloped XML signature verification.
//!
//! Used to check our own output in tests and by callers that want to verify
//! a token or metadata document against published certificates.

use base64::Engine;

use crate::error::{WsFedError, WsFedResult};
use crate::types::transforms;
use crate::xml::{canonicalize, element_attribute, element_text, C14nTarget};

use super::{DigestAlgorithm, KeySet, SignatureAlgorithm};

/// Facts about a signature that verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSignature {
    /// `ID` of the signed element.
    pub reference_id: String,
    /// Signature algorithm used.
    pub signature_algorithm: SignatureAlgorithm,
    /// Reference digest algorithm used.
    pub digest_algorithm: DigestAlgorithm,
    /// DER certificate that verified the signature.
    pub certificate_der: Vec<u8>,
}

/// Verifies enveloped signatures against a fixed set of trusted
/// certificates.
#[derive(Debug, Clone)]
pub struct XmlSignatureValidator {
    trusted_certificates: Vec<Vec<u8>>,
}

impl XmlSignatureValidator {
    /// Creates a validator trusting the given DER certificates.
    #[must_use]
    pub fn new(trusted_certificates: Vec<Vec<u8>>) -> Self {
        Self {
            trusted_certificates,
        }
    }

    /// Creates a validator trusting every certificate a key set publishes.
    #[must_use]
    pub fn from_key_set(keys: &KeySet) -> Self {
        Self::new(keys.published_certificates().to_vec())
    }

    /// Verifies the first `ds:Signature` in `xml`.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::Signature`] when the signature is absent, uses
    /// an unsupported algorithm, embeds an untrusted certificate, or does
    /// not verify.
    pub fn validate(&self, xml: &str) -> WsFedResult<VerifiedSignature> {
        let b64 = base64::engine::general_purpose::STANDARD;
        let signature = canonicalize(xml, C14nTarget::FirstNamed("Signature"), false)?;

        let required_attr = |element: &str, attribute: &str| -> WsFedResult<String> {
            element_attribute(&signature, element, attribute)?.ok_or_else(|| {
                WsFedError::Signature(format!("missing {element}/@{attribute}"))
            })
        };
        let required_text = |element: &str| -> WsFedResult<String> {
            element_text(&signature, element)?
                .map(|t| t.split_whitespace().collect::<String>())
                .ok_or_else(|| WsFedError::Signature(format!("missing {element}")))
        };

        let c14n = required_attr("CanonicalizationMethod", "Algorithm")?;
        if c14n != transforms::EXCLUSIVE_C14N {
            return Err(WsFedError::Signature(format!(
                "unsupported canonicalization: {c14n}"
            )));
        }

        let signature_uri = required_attr("SignatureMethod", "Algorithm")?;
        let signature_algorithm = SignatureAlgorithm::from_uri(&signature_uri).ok_or_else(|| {
            WsFedError::Signature(format!("unsupported signature algorithm: {signature_uri}"))
        })?;

        let digest_uri = required_attr("DigestMethod", "Algorithm")?;
        let digest_algorithm = DigestAlgorithm::from_uri(&digest_uri).ok_or_else(|| {
            WsFedError::Signature(format!("unsupported digest algorithm: {digest_uri}"))
        })?;

        let reference_uri = required_attr("Reference", "URI")?;
        let reference_id = reference_uri
            .strip_prefix('#')
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                WsFedError::Signature(format!("unsupported reference: {reference_uri}"))
            })?
            .to_string();

        let certificate_der = b64.decode(required_text("X509Certificate")?)?;
        if !self.trusted_certificates.contains(&certificate_der) {
            return Err(WsFedError::Signature(
                "signing certificate is not trusted".to_string(),
            ));
        }

        let expected_digest = b64.decode(required_text("DigestValue")?)?;
        let referenced = canonicalize(xml, C14nTarget::Id(&reference_id), true)?;
        if digest_algorithm.digest(referenced.as_bytes()) != expected_digest {
            return Err(WsFedError::Signature("digest mismatch".to_string()));
        }

        let signature_value = b64.decode(required_text("SignatureValue")?)?;
        let signed_info = canonicalize(xml, C14nTarget::FirstNamed("SignedInfo"), false)?;
        let public_key = wsf_crypto::certificate_public_key(&certificate_der)?;
        if !wsf_crypto::rsa_verify(
            &public_key,
            signed_info.as_bytes(),
            &signature_value,
            signature_algorithm.rsa(),
        ) {
            return Err(WsFedError::Signature(
                "signature value does not verify".to_string(),
            ));
        }

        Ok(VerifiedSignature {
            reference_id,
            signature_algorithm,
            digest_algorithm,
            certificate_der,
        })
    }
}
