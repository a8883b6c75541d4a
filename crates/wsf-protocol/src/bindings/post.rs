//! HTTP-POST binding for sign-in responses.
//!
//! The token response is returned to the relying party as an HTML form that
//! posts `wa`, `wresult` and `wctx` to the reply URL on load.

use crate::types::{actions, params};

/// HTTP-POST binding encoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Renders the auto-submitting sign-in response form.
    ///
    /// `wctx` is included only when the request carried one, and is passed
    /// back exactly as received.
    #[must_use]
    pub fn encode_sign_in_response(wresult: &str, reply_url: &str, context: Option<&str>) -> String {
        let context_input = context
            .map(|ctx| {
                format!(
                    r#"<input type="hidden" name="{}" value="{}"/>"#,
                    params::WCTX,
                    html_escape(ctx)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Working...</title>
</head>
<body onload="document.forms[0].submit()">
    <form method="post" action="{action}">
        <input type="hidden" name="{wa}" value="{sign_in}"/>
        <input type="hidden" name="{wresult}" value="{result}"/>
        {context_input}
        <noscript>
            <p>Script is disabled. Click Submit to continue.</p>
            <input type="submit" value="Submit"/>
        </noscript>
    </form>
</body>
</html>"#,
            action = html_escape(reply_url),
            wa = params::WA,
            sign_in = actions::SIGN_IN,
            wresult = params::WRESULT,
            result = html_escape(wresult),
        )
    }

    /// Reads a hidden field back out of a rendered form, as the relying
    /// party's browser would submit it.
    #[must_use]
    pub fn read_field(html: &str, name: &str) -> Option<String> {
        let marker = format!(r#"name="{name}" value=""#);
        let start = html.find(&marker)? + marker.len();
        let end = html[start..].find('"')?;
        Some(html_unescape(&html[start..start + end]))
    }

    /// Reads the form's `action` attribute.
    #[must_use]
    pub fn read_action(html: &str) -> Option<String> {
        let marker = r#"<form method="post" action=""#;
        let start = html.find(marker)? + marker.len();
        let end = html[start..].find('"')?;
        Some(html_unescape(&html[start..start + end]))
    }
}

/// Escapes HTML special characters.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn html_unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
