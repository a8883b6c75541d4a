//! Token response construction.

use chrono::{DateTime, Utc};

use crate::bindings::HttpPostBinding;
use crate::error::{WsFedError, WsFedResult};
use crate::signature::{KeySet, XmlSigner};
use crate::types::{claim_types, AuthenticatedSession, RelyingParty};

use super::{request_security_token_response, SecurityToken, TokenAttribute};

/// A signed sign-in response ready to be posted to the relying party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// Where the form posts to.
    pub reply_url: String,
    /// The `RequestSecurityTokenResponse` document (`wresult`).
    pub wresult: String,
    /// `wctx`, echoed unchanged.
    pub context: Option<String>,
    /// ID of the embedded assertion.
    pub token_id: String,
    /// End of the token's validity.
    pub expires_at: DateTime<Utc>,
}

impl TokenResponse {
    /// Renders the auto-post form.
    #[must_use]
    pub fn to_html(&self) -> String {
        HttpPostBinding::encode_sign_in_response(&self.wresult, &self.reply_url, self.context.as_deref())
    }
}

/// Builds signed token responses for one issuer.
#[derive(Debug, Clone)]
pub struct TokenResponseBuilder {
    issuer: String,
}

impl TokenResponseBuilder {
    /// Creates a builder issuing as `issuer`.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// Describes the token that would be issued, without signing it.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::TokenEncryptionUnsupported`] if the relying
    /// party demands encryption.
    pub fn security_token(
        &self,
        session: &AuthenticatedSession,
        rp: &RelyingParty,
        reply_url: &str,
        now: DateTime<Utc>,
    ) -> WsFedResult<SecurityToken> {
        if rp.encryption_required() {
            return Err(WsFedError::TokenEncryptionUnsupported(rp.realm().to_string()));
        }

        let attributes = map_claims(session, rp);
        let name_identifier = attributes
            .iter()
            .find(|a| a.claim_type == claim_types::NAME_IDENTIFIER)
            .and_then(|a| a.values.first().cloned())
            .unwrap_or_else(|| session.subject_id.clone());

        let expires_at = now.checked_add_signed(rp.token_lifetime()).ok_or_else(|| {
            WsFedError::Configuration(format!("token lifetime for {} is out of range", rp.realm()))
        })?;

        Ok(SecurityToken {
            id: format!("_{}", uuid::Uuid::new_v4()),
            token_type: rp.token_type(),
            issuer: self.issuer.clone(),
            audience: rp.realm().to_string(),
            recipient: reply_url.to_string(),
            name_identifier,
            name_identifier_format: rp.name_identifier_format().to_string(),
            attributes,
            issued_at: now,
            expires_at,
            authentication_instant: session.authentication_time,
            authentication_method: session.authentication_method.clone(),
        })
    }

    /// Issues a signed token for `session` and wraps it for `reply_url`.
    ///
    /// All signing uses the active credential of `keys`, a snapshot taken
    /// by the caller.
    ///
    /// # Errors
    ///
    /// - [`WsFedError::TokenEncryptionUnsupported`] if the relying party
    ///   demands encryption
    /// - [`WsFedError::Signature`] if signing fails
    pub fn build(
        &self,
        session: &AuthenticatedSession,
        rp: &RelyingParty,
        reply_url: &str,
        context: Option<&str>,
        now: DateTime<Utc>,
        keys: &KeySet,
    ) -> WsFedResult<TokenResponse> {
        let token = self.security_token(session, rp, reply_url, now)?;

        let signed = XmlSigner::new(keys.active())
            .with_algorithms(rp.signature_algorithm(), rp.digest_algorithm())
            .sign(&token.to_unsigned_xml()?)?;

        let wresult = request_security_token_response(
            &signed,
            rp.realm(),
            token.token_type,
            token.issued_at,
            token.expires_at,
        );

        tracing::info!(
            realm = %rp.realm(),
            subject = %session.subject_id,
            token_id = %token.id,
            token_type = ?token.token_type,
            "Issued WS-Federation token"
        );

        Ok(TokenResponse {
            reply_url: reply_url.to_string(),
            wresult,
            context: context.map(String::from),
            token_id: token.id,
            expires_at: token.expires_at,
        })
    }
}

/// Maps session claims through the relying party's claim mapping.
///
/// Unmapped claim types are dropped. Values that map to the same output
/// type are grouped into one attribute in first-seen order.
fn map_claims(session: &AuthenticatedSession, rp: &RelyingParty) -> Vec<TokenAttribute> {
    let mut attributes: Vec<TokenAttribute> = Vec::new();

    for claim in &session.claims {
        let Some(output_type) = rp.claim_mapping().get(&claim.claim_type) else {
            continue;
        };
        match attributes.iter_mut().find(|a| &a.claim_type == output_type) {
            Some(existing) => existing.values.push(claim.value.clone()),
            None => attributes.push(TokenAttribute {
                claim_type: output_type.clone(),
                values: vec![claim.value.clone()],
            }),
        }
    }

    attributes
}
