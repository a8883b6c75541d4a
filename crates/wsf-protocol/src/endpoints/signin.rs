//! Sign-in endpoint (`wa=wsignin1.0`).
//!
//! Validates the realm and reply URL, then either sends the browser to the
//! login page with the request carried in `returnUrl`, or issues a signed
//! token and posts it to the relying party.

use axum::{
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

use crate::bindings::{login_redirect_location, sign_in_return_path};
use crate::error::{WsFedError, WsFedResult};
use crate::resolver::RelyingPartyResolver;
use crate::token::{format_instant, TokenResponse, TokenResponseBuilder};
use crate::types::{params, AuthenticatedSession, Freshness, SignInRequest, WsFedMessage, WSFED_ENDPOINT_PATH};

use super::response::{error_response, found, no_store_html};
use super::state::WsFedState;

/// Why the browser must visit the login page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReason {
    /// The request carries no session.
    NoSession,
    /// A session exists but does not satisfy `wfresh`.
    StaleAuthentication,
}

/// Whether the caller's session can satisfy a sign-in request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInState {
    /// The subject must (re-)authenticate first.
    AwaitingAuthentication {
        /// Why.
        reason: LoginReason,
    },
    /// The session satisfies the request.
    Authenticated(AuthenticatedSession),
}

impl SignInState {
    /// Classifies `session` against the request's freshness requirement.
    ///
    /// `wfresh=0` needs an authentication strictly after `wct` (or `now`
    /// when the request has no `wct`). `wfresh=N` needs one within the
    /// last N minutes.
    #[must_use]
    pub fn classify(
        session: Option<AuthenticatedSession>,
        request: &SignInRequest,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(session) = session else {
            return Self::AwaitingAuthentication {
                reason: LoginReason::NoSession,
            };
        };

        let fresh = match request.freshness {
            Freshness::Any => true,
            Freshness::ForceReauthentication => {
                session.authentication_time > request.current_time.unwrap_or(now)
            }
            Freshness::MaxAge(max_age) => session.authentication_time >= now - max_age,
        };

        if fresh {
            Self::Authenticated(session)
        } else {
            Self::AwaitingAuthentication {
                reason: LoginReason::StaleAuthentication,
            }
        }
    }
}

/// Action to take after processing a sign-in request.
#[derive(Debug)]
pub enum SignInAction {
    /// Send the browser to the login page.
    RedirectToLogin {
        /// The complete `Location` value.
        location: String,
        /// True when the session layer was told to force a new login.
        fresh_required: bool,
    },
    /// Post a signed token to the relying party.
    IssueToken(TokenResponse),
}

/// Handles a parsed sign-in message.
pub async fn sign_in(
    state: &WsFedState,
    headers: &HeaderMap,
    raw_query: &str,
    message: &WsFedMessage,
) -> Response {
    match process_sign_in(state, headers, raw_query, message, Utc::now()).await {
        Ok(SignInAction::RedirectToLogin { location, .. }) => found(&location, None),
        Ok(SignInAction::IssueToken(token)) => no_store_html(token.to_html()),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Processes a sign-in request and returns the action to take.
///
/// Realm and reply URL are validated before the session is consulted, so
/// an invalid request never reaches the login page.
///
/// # Errors
///
/// - [`WsFedError::MalformedRequest`] / [`WsFedError::InvalidMessageType`]
///   for an unusable message
/// - [`WsFedError::UnknownRealm`], [`WsFedError::InvalidReplyUrl`],
///   [`WsFedError::MissingReplyUrl`] for a request the relying party
///   registration does not allow
/// - [`WsFedError::TokenEncryptionUnsupported`] if the relying party
///   demands encryption
/// - [`WsFedError::SigningCredentialUnavailable`] if a token is due but no
///   key is configured
pub async fn process_sign_in(
    state: &WsFedState,
    headers: &HeaderMap,
    raw_query: &str,
    message: &WsFedMessage,
    now: DateTime<Utc>,
) -> WsFedResult<SignInAction> {
    let request = SignInRequest::from_message(message)?;

    let resolver = RelyingPartyResolver::new(state.relying_parties.clone());
    let rp = resolver.resolve(&request.realm).await?;
    let reply_url = RelyingPartyResolver::reply_url(&rp, request.reply_url.as_deref())?;

    if rp.encryption_required() {
        return Err(WsFedError::TokenEncryptionUnsupported(rp.realm().to_string()));
    }

    let session = state.sessions.current_session(headers).await?;

    match SignInState::classify(session, &request, now) {
        SignInState::AwaitingAuthentication { reason } => {
            let fresh_required = reason == LoginReason::StaleAuthentication;
            if fresh_required {
                state.sessions.require_fresh_authentication(headers).await?;
            }

            let mut query = raw_query.to_string();
            if request.freshness == Freshness::ForceReauthentication
                && request.current_time.is_none()
            {
                // Pin the request time so the replayed request accepts the
                // login that follows. An empty `wct=` is replaced.
                query = without_param(raw_query, params::WCT);
                query.push_str(&format!(
                    "&{}={}",
                    params::WCT,
                    urlencoding::encode(&format_instant(now))
                ));
            }

            let location = login_redirect_location(
                &state.config.login_path,
                &sign_in_return_path(WSFED_ENDPOINT_PATH, &query),
            );

            tracing::info!(
                realm = %rp.realm(),
                ?reason,
                "Sign-in requires authentication"
            );

            Ok(SignInAction::RedirectToLogin {
                location,
                fresh_required,
            })
        }
        SignInState::Authenticated(session) => {
            let keys = state.key_snapshot().await.inspect_err(|e| {
                tracing::error!(error = %e, realm = %rp.realm(), "Cannot issue token");
            })?;

            let response = TokenResponseBuilder::new(state.config.issuer.clone()).build(
                &session,
                &rp,
                &reply_url,
                request.context.as_deref(),
                now,
                &keys,
            )?;

            Ok(SignInAction::IssueToken(response))
        }
    }
}

/// Drops every `name=...` pair from a raw query, keeping the rest in order.
fn without_param(raw_query: &str, name: &str) -> String {
    raw_query
        .split('&')
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            !key.is_empty() && key != name
        })
        .collect::<Vec<_>>()
        .join("&")
}
