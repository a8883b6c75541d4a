//! Parsed WS-Federation request messages.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::error::{WsFedError, WsFedResult};

use super::constants::{actions, params};

/// The decoded query parameters of a WS-Federation request.
///
/// Parameters are kept in their original order. A parameter that appears
/// twice makes the request ambiguous and is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WsFedMessage {
    params: Vec<(String, String)>,
}

impl WsFedMessage {
    /// Parses a raw (still percent-encoded) query string.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::MalformedRequest`] for duplicate parameters or
    /// escapes that do not decode to UTF-8.
    pub fn parse(raw_query: &str) -> WsFedResult<Self> {
        let params: Vec<(String, String)> = serde_urlencoded::from_str(raw_query)
            .map_err(|e| WsFedError::MalformedRequest(format!("unparseable query: {e}")))?;

        let mut seen = HashSet::new();
        for (name, value) in &params {
            if !seen.insert(name.as_str()) {
                return Err(WsFedError::MalformedRequest(format!(
                    "duplicate parameter: {name}"
                )));
            }
            // form_urlencoded decodes lossily; a replacement character means
            // the input was not UTF-8.
            if name.contains('\u{FFFD}') || value.contains('\u{FFFD}') {
                return Err(WsFedError::MalformedRequest(
                    "parameter is not valid UTF-8".to_string(),
                ));
            }
        }

        Ok(Self { params })
    }

    /// Returns a parameter value, treating an empty value as absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    /// The `wa` message type.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.get(params::WA)
    }

    /// True when the query carried no parameters at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Authentication freshness demanded by `wfresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Freshness {
    /// No requirement; any session will do.
    #[default]
    Any,
    /// `wfresh=0`: the subject must authenticate again.
    ForceReauthentication,
    /// `wfresh=N`: the last authentication must be at most N minutes old.
    MaxAge(Duration),
}

impl Freshness {
    fn parse(value: Option<&str>) -> WsFedResult<Self> {
        let Some(value) = value else {
            return Ok(Self::Any);
        };

        let minutes: u32 = value.parse().map_err(|_| {
            WsFedError::MalformedRequest(format!("wfresh must be a non-negative integer: {value}"))
        })?;

        Ok(if minutes == 0 {
            Self::ForceReauthentication
        } else {
            Self::MaxAge(Duration::minutes(i64::from(minutes)))
        })
    }
}

/// A validated-shape sign-in request (`wa=wsignin1.0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRequest {
    /// `wtrealm`.
    pub realm: String,
    /// `wreply`.
    pub reply_url: Option<String>,
    /// `wctx`, passed through unmodified.
    pub context: Option<String>,
    /// `wfresh`.
    pub freshness: Freshness,
    /// `wct`: the instant the sign-in was first requested.
    pub current_time: Option<DateTime<Utc>>,
}

impl SignInRequest {
    /// Extracts a sign-in request from a parsed message.
    ///
    /// # Errors
    ///
    /// - [`WsFedError::InvalidMessageType`] if `wa` is not `wsignin1.0`
    /// - [`WsFedError::MalformedRequest`] if `wtrealm` is missing or `wfresh`
    ///   or `wct` do not parse
    pub fn from_message(message: &WsFedMessage) -> WsFedResult<Self> {
        if message.action() != Some(actions::SIGN_IN) {
            return Err(WsFedError::InvalidMessageType);
        }

        let realm = message
            .get(params::WTREALM)
            .ok_or_else(|| WsFedError::MalformedRequest("wtrealm is required".to_string()))?
            .to_string();

        let current_time = message
            .get(params::WCT)
            .map(|wct| {
                DateTime::parse_from_rfc3339(wct)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|_| WsFedError::MalformedRequest(format!("invalid wct: {wct}")))
            })
            .transpose()?;

        Ok(Self {
            realm,
            reply_url: message.get(params::WREPLY).map(String::from),
            context: message.get(params::WCTX).map(String::from),
            freshness: Freshness::parse(message.get(params::WFRESH))?,
            current_time,
        })
    }
}

/// A sign-out request (`wa=wsignout1.0` or `wa=wsignoutcleanup1.0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutRequest {
    /// `wtrealm`, if the relying party identified itself.
    pub realm: Option<String>,
    /// `wreply`.
    pub reply_url: Option<String>,
    /// True for `wsignoutcleanup1.0`.
    pub cleanup: bool,
}

impl SignOutRequest {
    /// Extracts a sign-out request from a parsed message.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::InvalidMessageType`] if `wa` is not a sign-out
    /// message type.
    pub fn from_message(message: &WsFedMessage) -> WsFedResult<Self> {
        let cleanup = match message.action() {
            Some(actions::SIGN_OUT) => false,
            Some(actions::SIGN_OUT_CLEANUP) => true,
            _ => return Err(WsFedError::InvalidMessageType),
        };

        Ok(Self {
            realm: message.get(params::WTREALM).map(String::from),
            reply_url: message.get(params::WREPLY).map(String::from),
            cleanup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWIN_QUERY: &str =
        "wtrealm=urn%3Aowinrp&wreply=http%3A%2F%2Flocalhost%3A10313%2F&wa=wsignin1.0";

    #[test]
    fn parses_sign_in() {
        let message = WsFedMessage::parse(OWIN_QUERY).unwrap();
        let request = SignInRequest::from_message(&message).unwrap();

        assert_eq!(request.realm, "urn:owinrp");
        assert_eq!(request.reply_url.as_deref(), Some("http://localhost:10313/"));
        assert_eq!(request.context, None);
        assert_eq!(request.freshness, Freshness::Any);
    }

    #[test]
    fn context_is_preserved_verbatim() {
        let message =
            WsFedMessage::parse("wa=wsignin1.0&wtrealm=urn%3Aa&wctx=rm%3D0%26id%3Dpassive%26ru%3D%252f")
                .unwrap();
        let request = SignInRequest::from_message(&message).unwrap();
        assert_eq!(request.context.as_deref(), Some("rm=0&id=passive&ru=%2f"));
    }

    #[test]
    fn wrong_action_is_invalid_message_type() {
        let message = WsFedMessage::parse("wa=wsignout1.0&wtrealm=urn%3Aa").unwrap();
        assert!(matches!(
            SignInRequest::from_message(&message),
            Err(WsFedError::InvalidMessageType)
        ));

        let message = WsFedMessage::parse("wtrealm=urn%3Aa").unwrap();
        assert!(matches!(
            SignInRequest::from_message(&message),
            Err(WsFedError::InvalidMessageType)
        ));
    }

    #[test]
    fn missing_realm_is_malformed() {
        let message = WsFedMessage::parse("wa=wsignin1.0&wtrealm=").unwrap();
        assert!(matches!(
            SignInRequest::from_message(&message),
            Err(WsFedError::MalformedRequest(_))
        ));
    }

    #[test]
    fn duplicate_parameters_are_malformed() {
        assert!(matches!(
            WsFedMessage::parse("wa=wsignin1.0&wtrealm=a&wtrealm=b"),
            Err(WsFedError::MalformedRequest(_))
        ));
    }

    #[test]
    fn non_utf8_escape_is_malformed() {
        assert!(matches!(
            WsFedMessage::parse("wa=wsignin1.0&wtrealm=%FF"),
            Err(WsFedError::MalformedRequest(_))
        ));
    }

    #[test]
    fn freshness_values() {
        let parse = |q: &str| {
            let message = WsFedMessage::parse(q).unwrap();
            SignInRequest::from_message(&message).map(|r| r.freshness)
        };

        assert_eq!(
            parse("wa=wsignin1.0&wtrealm=a&wfresh=0").unwrap(),
            Freshness::ForceReauthentication
        );
        assert_eq!(
            parse("wa=wsignin1.0&wtrealm=a&wfresh=15").unwrap(),
            Freshness::MaxAge(Duration::minutes(15))
        );
        assert!(matches!(
            parse("wa=wsignin1.0&wtrealm=a&wfresh=-1"),
            Err(WsFedError::MalformedRequest(_))
        ));
        assert!(matches!(
            parse("wa=wsignin1.0&wtrealm=a&wfresh=soon"),
            Err(WsFedError::MalformedRequest(_))
        ));
    }

    #[test]
    fn wct_is_parsed_as_utc() {
        let message =
            WsFedMessage::parse("wa=wsignin1.0&wtrealm=a&wct=2024-05-01T10%3A00%3A00.250Z").unwrap();
        let request = SignInRequest::from_message(&message).unwrap();
        let wct = request.current_time.unwrap();
        assert_eq!(wct.to_rfc3339(), "2024-05-01T10:00:00.250+00:00");

        let message = WsFedMessage::parse("wa=wsignin1.0&wtrealm=a&wct=yesterday").unwrap();
        assert!(SignInRequest::from_message(&message).is_err());
    }

    #[test]
    fn sign_out_variants() {
        let message = WsFedMessage::parse("wa=wsignout1.0").unwrap();
        let request = SignOutRequest::from_message(&message).unwrap();
        assert_eq!(request.realm, None);
        assert!(!request.cleanup);

        let message =
            WsFedMessage::parse("wa=wsignoutcleanup1.0&wtrealm=urn%3Aa&wreply=https%3A%2F%2Fa%2F")
                .unwrap();
        let request = SignOutRequest::from_message(&message).unwrap();
        assert!(request.cleanup);
        assert_eq!(request.realm.as_deref(), Some("urn:a"));
        assert_eq!(request.reply_url.as_deref(), Some("https://a/"));

        let message = WsFedMessage::parse("wa=wsignin1.0").unwrap();
        assert!(SignOutRequest::from_message(&message).is_err());
    }

    #[test]
    fn empty_query_is_empty() {
        assert!(WsFedMessage::parse("").unwrap().is_empty());
        assert!(!WsFedMessage::parse("wa=wsignin1.0").unwrap().is_empty());
    }
}
