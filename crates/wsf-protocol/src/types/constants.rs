//! WS-Federation constants and URIs.
//!
//! Message types, query parameter names, namespaces, token types and the
//! WS-* claim type URIs understood by WIF/OWIN relying parties.

/// Default passive requestor endpoint path.
pub const WSFED_ENDPOINT_PATH: &str = "/wsfederation";

/// Conventional ADFS-style metadata path.
pub const FEDERATION_METADATA_PATH: &str = "/FederationMetadata/2007-06/FederationMetadata.xml";

// ============================================================================
// Message types and parameters
// ============================================================================

/// Values of the `wa` message type discriminator.
pub mod actions {
    /// Sign-in request and sign-in response.
    pub const SIGN_IN: &str = "wsignin1.0";
    /// Sign-out request.
    pub const SIGN_OUT: &str = "wsignout1.0";
    /// Sign-out cleanup request sent by a federation partner.
    pub const SIGN_OUT_CLEANUP: &str = "wsignoutcleanup1.0";
}

/// Query and form parameter names.
pub mod params {
    /// Message type.
    pub const WA: &str = "wa";
    /// Relying party realm.
    pub const WTREALM: &str = "wtrealm";
    /// Reply URL.
    pub const WREPLY: &str = "wreply";
    /// Opaque relying party context.
    pub const WCTX: &str = "wctx";
    /// Freshness requirement in minutes.
    pub const WFRESH: &str = "wfresh";
    /// Requestor's current time.
    pub const WCT: &str = "wct";
    /// Sign-in result (the token response).
    pub const WRESULT: &str = "wresult";
}

// ============================================================================
// Namespaces
// ============================================================================

/// SAML 2.0 metadata namespace URI.
pub const METADATA_NS: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

/// WS-Federation namespace URI.
pub const FED_NS: &str = "http://docs.oasis-open.org/wsfed/federation/200706";

/// WS-Federation authorization namespace URI.
pub const AUTH_NS: &str = "http://docs.oasis-open.org/wsfed/authorization/200706";

/// WS-Addressing namespace URI.
pub const WSA_NS: &str = "http://www.w3.org/2005/08/addressing";

/// WS-Trust (February 2005) namespace URI.
pub const WSTRUST_NS: &str = "http://schemas.xmlsoap.org/ws/2005/02/trust";

/// WS-Policy namespace URI.
pub const WSP_NS: &str = "http://schemas.xmlsoap.org/ws/2004/09/policy";

/// WS-Security utility namespace URI.
pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// XSI namespace URI.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML Digital Signature namespace URI.
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// SAML 1.1 assertion namespace URI.
pub const SAML11_NS: &str = "urn:oasis:names:tc:SAML:1.0:assertion";

/// SAML 2.0 assertion namespace URI.
pub const SAML2_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

// ============================================================================
// WS-Trust
// ============================================================================

/// WS-Trust issue request type.
pub const REQUEST_TYPE_ISSUE: &str = "http://schemas.xmlsoap.org/ws/2005/02/trust/Issue";

/// Bearer key type (no proof key).
pub const KEY_TYPE_BEARER: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/NoProofKey";

/// Token type URIs from the WSS SAML token profile 1.1.
pub mod token_types {
    /// SAML 1.1 assertion.
    pub const SAML11: &str =
        "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.1#SAMLV1.1";
    /// SAML 2.0 assertion.
    pub const SAML2: &str =
        "http://docs.oasis-open.org/wss/oasis-wss-saml-token-profile-1.1#SAMLV2.0";
}

// ============================================================================
// SAML assertion vocabulary
// ============================================================================

/// Name identifier formats.
pub mod name_id_formats {
    /// Unspecified format.
    pub const UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";
    /// Email address.
    pub const EMAIL: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";
    /// Persistent pseudonym.
    pub const PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";
    /// Transient identifier.
    pub const TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";
}

/// Bearer subject confirmation methods.
pub mod confirmation_methods {
    /// SAML 1.1 bearer.
    pub const SAML11_BEARER: &str = "urn:oasis:names:tc:SAML:1.0:cm:bearer";
    /// SAML 2.0 bearer.
    pub const SAML2_BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";
}

/// Authentication method and context class URIs.
pub mod authentication_methods {
    /// SAML 1.1 password authentication.
    pub const SAML11_PASSWORD: &str = "urn:oasis:names:tc:SAML:1.0:am:password";
    /// SAML 1.1 unspecified authentication.
    pub const SAML11_UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.0:am:unspecified";
    /// SAML 2.0 password over protected transport.
    pub const SAML2_PASSWORD_PROTECTED_TRANSPORT: &str =
        "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport";
    /// SAML 2.0 unspecified context class.
    pub const SAML2_UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:2.0:ac:classes:unspecified";
}

/// WS-* claim type URIs.
pub mod claim_types {
    /// Name identifier.
    pub const NAME_IDENTIFIER: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
    /// Display name.
    pub const NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
    /// Email address.
    pub const EMAIL: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress";
    /// Given name.
    pub const GIVEN_NAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname";
    /// Surname.
    pub const SURNAME: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname";
    /// Date of birth.
    pub const DATE_OF_BIRTH: &str =
        "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/dateofbirth";
    /// Web page.
    pub const WEBPAGE: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/webpage";
    /// Gender.
    pub const GENDER: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/gender";
    /// User principal name.
    pub const UPN: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/upn";
    /// Role.
    pub const ROLE: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";
}

/// Identity provider (OIDC-style) claim types mapped by default.
pub mod idp_claim_types {
    /// Subject.
    pub const SUBJECT: &str = "sub";
    /// Display name.
    pub const NAME: &str = "name";
    /// Email.
    pub const EMAIL: &str = "email";
    /// Given name.
    pub const GIVEN_NAME: &str = "given_name";
    /// Family name.
    pub const FAMILY_NAME: &str = "family_name";
    /// Birth date.
    pub const BIRTHDATE: &str = "birthdate";
    /// Website.
    pub const WEBSITE: &str = "website";
    /// Gender.
    pub const GENDER: &str = "gender";
    /// Role.
    pub const ROLE: &str = "role";
}

/// Default claim mapping from identity provider claim types to WS-* claim
/// types, as `(idp type, output type, display name)`.
pub const DEFAULT_CLAIM_MAPPING: &[(&str, &str, &str)] = &[
    (idp_claim_types::NAME, claim_types::NAME, "Name"),
    (idp_claim_types::SUBJECT, claim_types::NAME_IDENTIFIER, "Name ID"),
    (idp_claim_types::EMAIL, claim_types::EMAIL, "E-Mail Address"),
    (idp_claim_types::GIVEN_NAME, claim_types::GIVEN_NAME, "Given Name"),
    (idp_claim_types::FAMILY_NAME, claim_types::SURNAME, "Surname"),
    (idp_claim_types::BIRTHDATE, claim_types::DATE_OF_BIRTH, "Date of Birth"),
    (idp_claim_types::WEBSITE, claim_types::WEBPAGE, "Web Page"),
    (idp_claim_types::GENDER, claim_types::GENDER, "Gender"),
    (idp_claim_types::ROLE, claim_types::ROLE, "Role"),
];

// ============================================================================
// XML-DSig algorithm URIs
// ============================================================================

/// Signature algorithm URIs.
pub mod signature_algorithms {
    /// RSA with SHA-256.
    pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
    /// RSA with SHA-384.
    pub const RSA_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384";
    /// RSA with SHA-512.
    pub const RSA_SHA512: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512";
}

/// Digest algorithm URIs.
pub mod digest_algorithms {
    /// SHA-256.
    pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
    /// SHA-384.
    pub const SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#sha384";
    /// SHA-512.
    pub const SHA512: &str = "http://www.w3.org/2001/04/xmlenc#sha512";
}

/// Canonicalization and transform URIs.
pub mod transforms {
    /// Exclusive XML canonicalization without comments.
    pub const EXCLUSIVE_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
    /// Enveloped signature transform.
    pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
}
