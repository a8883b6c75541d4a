//! Login return URL encoding.
//!
//! When a sign-in request arrives without a session, the browser is sent to
//! the login page with the original request carried in `returnUrl`. The
//! request's path and raw query are percent-encoded once more so that the
//! login layer's single decode yields them back byte for byte.

use crate::error::{WsFedError, WsFedResult};

/// Name of the login page parameter carrying the return descriptor.
pub const RETURN_URL_PARAM: &str = "returnUrl";

/// Percent-encodes every byte outside `A-Z a-z 0-9 - _ . ~`.
///
/// Existing escapes are encoded again, so `%3A` becomes `%253A`.
#[must_use]
pub fn encode_return_url(path_and_query: &str) -> String {
    urlencoding::encode(path_and_query).into_owned()
}

/// Exact inverse of [`encode_return_url`].
///
/// # Errors
///
/// Returns [`WsFedError::MalformedRequest`] if the decoded bytes are not
/// UTF-8.
pub fn decode_return_url(encoded: &str) -> WsFedResult<String> {
    urlencoding::decode(encoded)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| WsFedError::MalformedRequest(format!("return URL is not UTF-8: {e}")))
}

/// Builds the return descriptor for a sign-in request: the endpoint path
/// followed by the query exactly as it was received.
#[must_use]
pub fn sign_in_return_path(endpoint_path: &str, raw_query: &str) -> String {
    if raw_query.is_empty() {
        endpoint_path.to_string()
    } else {
        format!("{endpoint_path}?{raw_query}")
    }
}

/// Composes the login redirect `Location`: `<login_path>?returnUrl=<encoded>`.
///
/// A login path that already has a query gets the parameter appended.
#[must_use]
pub fn login_redirect_location(login_path: &str, return_path: &str) -> String {
    let separator = if login_path.contains('?') { '&' } else { '?' };
    format!(
        "{login_path}{separator}{RETURN_URL_PARAM}={}",
        encode_return_url(return_path)
    )
}
