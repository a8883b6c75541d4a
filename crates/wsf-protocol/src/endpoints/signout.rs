//! Sign-out endpoint (`wa=wsignout1.0`, `wa=wsignoutcleanup1.0`).

use axum::{
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};

use crate::error::{WsFedError, WsFedResult};
use crate::resolver::RelyingPartyResolver;
use crate::types::{SignOutRequest, WsFedMessage};

use super::response::{error_response, redirect};
use super::state::WsFedState;

/// Action to take after processing a sign-out request.
#[derive(Debug)]
pub struct SignOutAction {
    /// Where the browser goes once the session is ended.
    pub location: HeaderValue,
    /// Cookie that clears session state on the user agent.
    pub set_cookie: Option<HeaderValue>,
}

/// Handles a parsed sign-out message.
pub async fn sign_out(state: &WsFedState, headers: &HeaderMap, message: &WsFedMessage) -> Response {
    match process_sign_out(state, headers, message).await {
        Ok(action) => redirect(action.location, action.set_cookie),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Ends the caller's session and picks the post-logout location.
///
/// `wreply` is honoured only when `wtrealm` names a relying party that
/// allows it and it is usable as a `Location` header. The reply URL is
/// checked before the session is touched, so a rejected request leaves the
/// session intact.
///
/// # Errors
///
/// - [`WsFedError::UnknownRealm`] if `wtrealm` is not registered
/// - [`WsFedError::InvalidReplyUrl`] if `wreply` is not allowed, is not a
///   valid header value, or is given without a realm to validate it against
pub async fn process_sign_out(
    state: &WsFedState,
    headers: &HeaderMap,
    message: &WsFedMessage,
) -> WsFedResult<SignOutAction> {
    let request = SignOutRequest::from_message(message)?;

    let location = match (&request.realm, &request.reply_url) {
        (Some(realm), reply_url) => {
            let rp = RelyingPartyResolver::new(state.relying_parties.clone())
                .resolve(realm)
                .await?;
            match reply_url {
                Some(url) if rp.is_reply_url_allowed(url) => url.clone(),
                Some(url) => return Err(WsFedError::InvalidReplyUrl(url.clone())),
                None => state.config.post_logout_redirect.clone(),
            }
        }
        (None, Some(url)) => return Err(WsFedError::InvalidReplyUrl(url.clone())),
        (None, None) => state.config.post_logout_redirect.clone(),
    };

    // Checked before the session ends so the clearing cookie is never lost.
    let location = HeaderValue::from_str(&location)
        .map_err(|_| WsFedError::InvalidReplyUrl(location.clone()))?;

    let set_cookie = state.sessions.sign_out(headers).await?;

    tracing::info!(
        realm = request.realm.as_deref().unwrap_or("-"),
        cleanup = request.cleanup,
        "Signed out"
    );

    Ok(SignOutAction {
        location,
        set_cookie,
    })
}
