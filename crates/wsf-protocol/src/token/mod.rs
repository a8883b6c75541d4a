//! Security token issuance.
//!
//! - [`SecurityToken`] - the assertion content, independent of format
//! - [`TokenResponseBuilder`] - claim mapping, signing and the
//!   `RequestSecurityTokenResponse` envelope
//! - [`TokenResponse`] - the signed result, renderable as the auto-post form

mod assertion;
mod builder;
mod rstr;

pub use builder::*;
pub use rstr::request_security_token_response;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::WsFedResult;
use crate::types::TokenType;
use crate::xml::UnsignedXml;

/// One output attribute with all of its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAttribute {
    /// Output claim type URI.
    pub claim_type: String,
    /// Values in the order they were found on the session.
    pub values: Vec<String>,
}

/// Format-independent content of an issued assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityToken {
    /// Assertion identifier, also the signature reference.
    pub id: String,
    /// Assertion format.
    pub token_type: TokenType,
    /// Issuer name.
    pub issuer: String,
    /// Audience (the relying party realm).
    pub audience: String,
    /// Where the token is delivered.
    pub recipient: String,
    /// Subject name identifier.
    pub name_identifier: String,
    /// Name identifier format URI.
    pub name_identifier_format: String,
    /// Mapped claims.
    pub attributes: Vec<TokenAttribute>,
    /// Issue instant; also the start of validity.
    pub issued_at: DateTime<Utc>,
    /// End of validity (exclusive).
    pub expires_at: DateTime<Utc>,
    /// When the subject authenticated.
    pub authentication_instant: DateTime<Utc>,
    /// How the subject authenticated, as reported by the session.
    pub authentication_method: Option<String>,
}

impl SecurityToken {
    /// Serializes the assertion with its signature position marked.
    ///
    /// # Errors
    ///
    /// Fails only if the serializer loses its signature mark.
    pub fn to_unsigned_xml(&self) -> WsFedResult<UnsignedXml> {
        match self.token_type {
            TokenType::Saml11 => self.saml11_assertion(),
            TokenType::Saml2 => self.saml2_assertion(),
        }
    }
}

/// Formats an instant as `xs:dateTime` in UTC with millisecond precision.
#[must_use]
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
