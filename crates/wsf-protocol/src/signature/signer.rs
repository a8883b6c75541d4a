//! Enveloped XML signature creation.

use base64::Engine;

use crate::error::WsFedResult;
use crate::types::{transforms, XMLDSIG_NS};
use crate::xml::{canonicalize, C14nTarget, UnsignedXml, XmlWriter};

use super::{DigestAlgorithm, SignatureAlgorithm, SigningCredential};

/// Signs documents with one credential.
///
/// The signature is enveloped, references its parent by `ID`, and is
/// computed over exclusive-C14N output so whitespace and namespace
/// placement in transit do not break verification.
#[derive(Debug, Clone, Copy)]
pub struct XmlSigner<'a> {
    credential: &'a SigningCredential,
    signature_algorithm: SignatureAlgorithm,
    digest_algorithm: DigestAlgorithm,
}

impl<'a> XmlSigner<'a> {
    /// Creates a signer using RSA-SHA256 and SHA-256.
    #[must_use]
    pub fn new(credential: &'a SigningCredential) -> Self {
        Self {
            credential,
            signature_algorithm: SignatureAlgorithm::default(),
            digest_algorithm: DigestAlgorithm::default(),
        }
    }

    /// Overrides the algorithms.
    #[must_use]
    pub const fn with_algorithms(
        mut self,
        signature_algorithm: SignatureAlgorithm,
        digest_algorithm: DigestAlgorithm,
    ) -> Self {
        self.signature_algorithm = signature_algorithm;
        self.digest_algorithm = digest_algorithm;
        self
    }

    /// Signs `unsigned` and returns the document with the `ds:Signature`
    /// element inserted at its marked position.
    ///
    /// # Errors
    ///
    /// Fails if the referenced element cannot be canonicalized or the RSA
    /// operation fails.
    pub fn sign(&self, unsigned: &UnsignedXml) -> WsFedResult<String> {
        let b64 = base64::engine::general_purpose::STANDARD;

        let canonical = canonicalize(&unsigned.xml, C14nTarget::Id(&unsigned.reference_id), true)?;
        let digest = self.digest_algorithm.digest(canonical.as_bytes());

        let signed_info = self.signed_info(&unsigned.reference_id, &b64.encode(digest));

        // Canonicalize SignedInfo as it will appear inside ds:Signature.
        let wrapped = format!(r#"<ds:Signature xmlns:ds="{XMLDSIG_NS}">{signed_info}</ds:Signature>"#);
        let canonical_signed_info = canonicalize(&wrapped, C14nTarget::FirstNamed("SignedInfo"), false)?;

        let signature_value = self
            .credential
            .sign(canonical_signed_info.as_bytes(), self.signature_algorithm)?;

        let mut w = XmlWriter::new();
        w.start("ds:Signature", &[("xmlns:ds", XMLDSIG_NS)])
            .raw(&signed_info)
            .element("ds:SignatureValue", &[], &b64.encode(signature_value))
            .start("ds:KeyInfo", &[])
            .start("ds:X509Data", &[])
            .element("ds:X509Certificate", &[], &self.credential.certificate_base64());
        let signature = w.finish();

        let mut signed = String::with_capacity(unsigned.xml.len() + signature.len());
        signed.push_str(&unsigned.xml[..unsigned.signature_at]);
        signed.push_str(&signature);
        signed.push_str(&unsigned.xml[unsigned.signature_at..]);

        tracing::debug!(
            reference = %unsigned.reference_id,
            thumbprint = %self.credential.thumbprint(),
            algorithm = self.signature_algorithm.uri(),
            "Signed XML document"
        );

        Ok(signed)
    }

    fn signed_info(&self, reference_id: &str, digest_b64: &str) -> String {
        let uri = format!("#{reference_id}");
        let mut w = XmlWriter::new();
        w.start("ds:SignedInfo", &[])
            .empty("ds:CanonicalizationMethod", &[("Algorithm", transforms::EXCLUSIVE_C14N)])
            .empty("ds:SignatureMethod", &[("Algorithm", self.signature_algorithm.uri())])
            .start("ds:Reference", &[("URI", uri.as_str())])
            .start("ds:Transforms", &[])
            .empty("ds:Transform", &[("Algorithm", transforms::ENVELOPED_SIGNATURE)])
            .empty("ds:Transform", &[("Algorithm", transforms::EXCLUSIVE_C14N)])
            .end()
            .empty("ds:DigestMethod", &[("Algorithm", self.digest_algorithm.uri())])
            .element("ds:DigestValue", &[], digest_b64);
        w.finish()
    }
}
