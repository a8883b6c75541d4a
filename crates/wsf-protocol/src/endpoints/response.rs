//! Shared HTTP responses for the WS-Federation endpoints.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::bindings::html_escape;
use crate::error::WsFedError;

/// Renders an error page naming only the error kind.
///
/// The detail string is logged, never rendered: it may carry realms or
/// reply URLs supplied by the caller.
pub fn error_response(err: &WsFedError) -> (StatusCode, Html<String>) {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if err.is_fatal() {
        tracing::error!(kind = err.kind(), error = %err, "WS-Federation request failed");
    } else {
        tracing::warn!(kind = err.kind(), error = %err, "WS-Federation request rejected");
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><title>WS-Federation Error</title></head>
<body>
<h1>WS-Federation Error</h1>
<p>{}</p>
</body>
</html>"#,
        html_escape(err.kind())
    );
    (status, Html(html))
}

/// A `302 Found` to `location` that user agents must not cache.
pub fn found(location: &str, set_cookie: Option<HeaderValue>) -> Response {
    let Ok(location) = HeaderValue::from_str(location) else {
        return error_response(&WsFedError::MalformedRequest(
            "redirect location is not a valid header value".to_string(),
        ))
        .into_response();
    };
    redirect(location, set_cookie)
}

/// A `302 Found` to an already validated `location`.
pub fn redirect(location: HeaderValue, set_cookie: Option<HeaderValue>) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, location);
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if let Some(cookie) = set_cookie {
        headers.append(header::SET_COOKIE, cookie);
    }
    response
}

/// A `200 OK` HTML page that user agents must not cache.
pub fn no_store_html(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store")],
        Html(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_page_shows_kind_only() {
        let (status, Html(body)) = error_response(&WsFedError::UnknownRealm("urn:secret".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("UnknownRealm"));
        assert!(!body.contains("urn:secret"));
    }

    #[test]
    fn found_sets_location_and_no_store() {
        let response = found("/account/login?returnUrl=%2F", None);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/account/login?returnUrl=%2F");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn found_carries_cookie() {
        let cookie = HeaderValue::from_static("wsf_session=; Max-Age=0; Path=/");
        let response = found("/", Some(cookie));
        assert_eq!(response.headers()[header::SET_COOKIE], "wsf_session=; Max-Age=0; Path=/");
    }
}
