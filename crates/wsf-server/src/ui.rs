//! Login UI handlers.
//!
//! This module provides the development login page. The sign-in request
//! arrives here as `returnUrl`, decoded once by the query extractor, and is
//! replayed after a successful login.

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;

use wsf_protocol::endpoints::found;

use crate::state::AppState;

/// Authentication method recorded for password logins.
pub const PASSWORD_METHOD: &str = "pwd";

/// Login page template.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    /// Issuer name shown in the heading.
    pub issuer: String,
    /// Form action URL.
    pub action_url: String,
    /// Where to continue after login.
    pub return_url: String,
    /// Username to prefill after a failed attempt.
    pub username: String,
    /// Error message to display.
    pub error: Option<String>,
}

/// Error page template.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    /// Error code.
    pub error: String,
    /// Error description.
    pub error_description: Option<String>,
}

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Request to continue with after login.
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

/// Form data for login submission.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
    /// Request to continue with after login.
    #[serde(rename = "returnUrl", default)]
    pub return_url: Option<String>,
}

/// Shows the login page, or skips it when the caller already has a
/// reusable session.
pub async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
) -> Response {
    let return_url = local_return_url(query.return_url.as_deref());

    if state.providers.sessions.can_skip_login(&headers) {
        tracing::debug!("Reusing existing session");
        return found(return_url, None);
    }

    render_login(&state, return_url, String::new(), None)
}

/// Handles login form submission.
pub async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let return_url = local_return_url(form.return_url.as_deref());

    let Some(user) = state.providers.users.authenticate(&form.username, &form.password) else {
        tracing::debug!(username = %form.username, "Authentication failed");
        return render_login(
            &state,
            return_url,
            form.username,
            Some("Invalid username or password".to_string()),
        );
    };

    let subject = user.subject_id.clone();
    match state.providers.sessions.create(&headers, user, PASSWORD_METHOD) {
        Ok(cookie) => {
            tracing::info!(%subject, "User logged in");
            found(return_url, Some(cookie))
        }
        Err(e) => {
            tracing::error!("Session creation error: {}", e);
            render_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                Some("Session creation failed"),
            )
        }
    }
}

/// Accepts only same-origin paths as a post-login destination.
#[must_use]
pub fn local_return_url(candidate: Option<&str>) -> &str {
    match candidate {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\") => {
            url
        }
        _ => "/",
    }
}

fn render_login(
    state: &AppState,
    return_url: &str,
    username: String,
    error: Option<String>,
) -> Response {
    let template = LoginTemplate {
        issuer: state.config.issuer.clone(),
        action_url: state.config.login_path.clone(),
        return_url: return_url.to_string(),
        username,
        error,
    };

    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Renders an error page.
pub fn render_error(status: StatusCode, error: &str, error_description: Option<&str>) -> Response {
    let template = ErrorTemplate {
        error: error.to_string(),
        error_description: error_description.map(String::from),
    };

    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response(),
    }
}
