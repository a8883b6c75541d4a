//! WS-Trust `RequestSecurityTokenResponse` envelope.

use chrono::{DateTime, Utc};

use crate::types::{TokenType, KEY_TYPE_BEARER, REQUEST_TYPE_ISSUE, WSA_NS, WSP_NS, WSTRUST_NS, WSU_NS};
use crate::xml::XmlWriter;

use super::format_instant;

/// Wraps a signed assertion for delivery in `wresult`.
#[must_use]
pub fn request_security_token_response(
    signed_assertion: &str,
    applies_to: &str,
    token_type: TokenType,
    created: DateTime<Utc>,
    expires: DateTime<Utc>,
) -> String {
    let mut w = XmlWriter::new();
    w.start("t:RequestSecurityTokenResponse", &[("xmlns:t", WSTRUST_NS)])
        .start("t:Lifetime", &[])
        .element("wsu:Created", &[("xmlns:wsu", WSU_NS)], &format_instant(created))
        .element("wsu:Expires", &[("xmlns:wsu", WSU_NS)], &format_instant(expires))
        .end()
        .start("wsp:AppliesTo", &[("xmlns:wsp", WSP_NS)])
        .start("wsa:EndpointReference", &[("xmlns:wsa", WSA_NS)])
        .element("wsa:Address", &[], applies_to)
        .end()
        .end()
        .start("t:RequestedSecurityToken", &[])
        .raw(signed_assertion)
        .end()
        .element("t:TokenType", &[], token_type.uri())
        .element("t:RequestType", &[], REQUEST_TYPE_ISSUE)
        .element("t:KeyType", &[], KEY_TYPE_BEARER);
    w.finish()
}
