//! WS-Federation error types.
//!
//! Every failure of the bridge maps to one error kind. Kinds are what the
//! caller sees; the detail strings are for logs only and are never rendered
//! into responses.

use thiserror::Error;

/// Result type for WS-Federation operations.
pub type WsFedResult<T> = Result<T, WsFedError>;

/// WS-Federation protocol errors.
#[derive(Debug, Error)]
pub enum WsFedError {
    /// `wa` is missing or is not a message type this endpoint handles.
    #[error("invalid message type")]
    InvalidMessageType,

    /// `wtrealm` does not name a registered relying party.
    #[error("unknown realm: {0}")]
    UnknownRealm(String),

    /// `wreply` is not allowed for the resolved relying party.
    #[error("reply URL not allowed: {0}")]
    InvalidReplyUrl(String),

    /// No `wreply` and the relying party has no default reply URL.
    #[error("no reply URL supplied and none configured for realm {0}")]
    MissingReplyUrl(String),

    /// The query string could not be parsed or a parameter is malformed.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// No active signing credential is configured.
    #[error("no active signing credential")]
    SigningCredentialUnavailable,

    /// The relying party requires token encryption, which is not offered.
    #[error("token encryption required by realm {0} is not supported")]
    TokenEncryptionUnsupported(String),

    /// Signature creation or verification failed.
    #[error("signature error: {0}")]
    Signature(String),

    /// XML could not be parsed or canonicalized.
    #[error("XML error: {0}")]
    Xml(String),

    /// Invalid relying party or credential configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An external collaborator (store, session layer) failed.
    #[error("provider error: {0}")]
    Provider(String),
}

impl WsFedError {
    /// Stable name of the error kind, safe to show to the caller.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidMessageType => "InvalidMessageType",
            Self::UnknownRealm(_) => "UnknownRealm",
            Self::InvalidReplyUrl(_) => "InvalidReplyUrl",
            Self::MissingReplyUrl(_) => "MissingReplyUrl",
            Self::MalformedRequest(_) => "MalformedRequest",
            Self::SigningCredentialUnavailable => "SigningCredentialUnavailable",
            Self::TokenEncryptionUnsupported(_) => "TokenEncryptionUnsupported",
            Self::Signature(_) => "SignatureError",
            Self::Xml(_) => "XmlError",
            Self::Configuration(_) => "ConfigurationError",
            Self::Provider(_) => "ProviderError",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidMessageType
            | Self::UnknownRealm(_)
            | Self::InvalidReplyUrl(_)
            | Self::MissingReplyUrl(_)
            | Self::MalformedRequest(_) => 400,
            _ => 500,
        }
    }

    /// True for errors that indicate operator misconfiguration rather than a
    /// bad request.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SigningCredentialUnavailable
                | Self::TokenEncryptionUnsupported(_)
                | Self::Configuration(_)
        )
    }
}

impl From<quick_xml::Error> for WsFedError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for WsFedError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<wsf_crypto::CryptoError> for WsFedError {
    fn from(err: wsf_crypto::CryptoError) -> Self {
        Self::Signature(err.to_string())
    }
}

impl From<base64::DecodeError> for WsFedError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Signature(format!("base64 decode error: {err}"))
    }
}
