//! SAML 1.1 and SAML 2.0 assertion serialization.

use crate::error::WsFedResult;
use crate::types::{authentication_methods, confirmation_methods, SAML11_NS, SAML2_NS};
use crate::xml::{UnsignedXml, XmlWriter};

use super::{format_instant, SecurityToken};

impl SecurityToken {
    /// `saml:Assertion` (SAML 1.1). The signature is the last child.
    pub(super) fn saml11_assertion(&self) -> WsFedResult<UnsignedXml> {
        let issued = format_instant(self.issued_at);
        let expires = format_instant(self.expires_at);

        let mut w = XmlWriter::new();
        w.start(
            "saml:Assertion",
            &[
                ("xmlns:saml", SAML11_NS),
                ("MajorVersion", "1"),
                ("MinorVersion", "1"),
                ("AssertionID", self.id.as_str()),
                ("Issuer", self.issuer.as_str()),
                ("IssueInstant", issued.as_str()),
            ],
        );

        w.start(
            "saml:Conditions",
            &[("NotBefore", issued.as_str()), ("NotOnOrAfter", expires.as_str())],
        )
        .start("saml:AudienceRestrictionCondition", &[])
        .element("saml:Audience", &[], &self.audience)
        .end()
        .end();

        if !self.attributes.is_empty() {
            w.start("saml:AttributeStatement", &[]);
            self.saml11_subject(&mut w);
            for attribute in &self.attributes {
                let (namespace, name) = split_claim_type(&attribute.claim_type);
                w.start(
                    "saml:Attribute",
                    &[("AttributeName", name), ("AttributeNamespace", namespace)],
                );
                for value in &attribute.values {
                    w.element("saml:AttributeValue", &[], value);
                }
                w.end();
            }
            w.end();
        }

        let instant = format_instant(self.authentication_instant);
        w.start(
            "saml:AuthenticationStatement",
            &[
                ("AuthenticationMethod", self.saml11_authentication_method()),
                ("AuthenticationInstant", instant.as_str()),
            ],
        );
        self.saml11_subject(&mut w);
        w.end();

        w.mark_signature();
        w.finish_unsigned(self.id.clone())
    }

    fn saml11_subject(&self, w: &mut XmlWriter) {
        w.start("saml:Subject", &[])
            .element(
                "saml:NameIdentifier",
                &[("Format", self.name_identifier_format.as_str())],
                &self.name_identifier,
            )
            .start("saml:SubjectConfirmation", &[])
            .element("saml:ConfirmationMethod", &[], confirmation_methods::SAML11_BEARER)
            .end()
            .end();
    }

    fn saml11_authentication_method(&self) -> &str {
        match self.authentication_method.as_deref() {
            Some(uri) if uri.contains(':') => uri,
            Some("pwd" | "password") => authentication_methods::SAML11_PASSWORD,
            _ => authentication_methods::SAML11_UNSPECIFIED,
        }
    }

    /// `saml2:Assertion` (SAML 2.0). The signature follows `Issuer`.
    pub(super) fn saml2_assertion(&self) -> WsFedResult<UnsignedXml> {
        let issued = format_instant(self.issued_at);
        let expires = format_instant(self.expires_at);

        let mut w = XmlWriter::new();
        w.start(
            "saml2:Assertion",
            &[
                ("xmlns:saml2", SAML2_NS),
                ("ID", self.id.as_str()),
                ("IssueInstant", issued.as_str()),
                ("Version", "2.0"),
            ],
        )
        .element("saml2:Issuer", &[], &self.issuer)
        .mark_signature();

        w.start("saml2:Subject", &[])
            .element(
                "saml2:NameID",
                &[("Format", self.name_identifier_format.as_str())],
                &self.name_identifier,
            )
            .start(
                "saml2:SubjectConfirmation",
                &[("Method", confirmation_methods::SAML2_BEARER)],
            )
            .empty(
                "saml2:SubjectConfirmationData",
                &[("NotOnOrAfter", expires.as_str()), ("Recipient", self.recipient.as_str())],
            )
            .end()
            .end();

        w.start(
            "saml2:Conditions",
            &[("NotBefore", issued.as_str()), ("NotOnOrAfter", expires.as_str())],
        )
        .start("saml2:AudienceRestriction", &[])
        .element("saml2:Audience", &[], &self.audience)
        .end()
        .end();

        if !self.attributes.is_empty() {
            w.start("saml2:AttributeStatement", &[]);
            for attribute in &self.attributes {
                w.start("saml2:Attribute", &[("Name", attribute.claim_type.as_str())]);
                for value in &attribute.values {
                    w.element("saml2:AttributeValue", &[], value);
                }
                w.end();
            }
            w.end();
        }

        let instant = format_instant(self.authentication_instant);
        w.start("saml2:AuthnStatement", &[("AuthnInstant", instant.as_str())])
            .start("saml2:AuthnContext", &[])
            .element(
                "saml2:AuthnContextClassRef",
                &[],
                self.saml2_authentication_context(),
            )
            .end()
            .end();

        w.finish_unsigned(self.id.clone())
    }

    fn saml2_authentication_context(&self) -> &str {
        match self.authentication_method.as_deref() {
            Some(uri) if uri.contains(':') => uri,
            Some("pwd" | "password") => authentication_methods::SAML2_PASSWORD_PROTECTED_TRANSPORT,
            _ => authentication_methods::SAML2_UNSPECIFIED,
        }
    }
}

/// Splits a claim type URI into SAML 1.1 `AttributeNamespace` and
/// `AttributeName` at the last `/` (or `:` for URNs).
fn split_claim_type(claim_type: &str) -> (&str, &str) {
    claim_type
        .rsplit_once('/')
        .or_else(|| claim_type.rsplit_once(':'))
        .unwrap_or(("", claim_type))
}
