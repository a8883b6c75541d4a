// Router tests for wsf-protocol
//
// Drives `wsfed_router` with tower::ServiceExt::oneshot against in-memory
// collaborators, without a TCP listener.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use tower::ServiceExt;

use wsf_protocol::bindings::{decode_return_url, HttpPostBinding};
use wsf_protocol::endpoints::{
    wsfed_router, ProviderError, SessionProvider, WsFedConfig, WsFedState,
};
use wsf_protocol::resolver::InMemoryRelyingPartyStore;
use wsf_protocol::signature::{KeyRing, KeySet, SigningCredential, XmlSignatureValidator};
use wsf_protocol::xml::{element_attribute, element_text};
use wsf_protocol::{AuthenticatedSession, RelyingParty};

const SIGNING_KEY: &str = include_str!("../../../fixtures/signing.key");
const SIGNING_CERT: &str = include_str!("../../../fixtures/signing.crt");
const ROLLOVER_KEY: &str = include_str!("../../../fixtures/rollover.key");
const ROLLOVER_CERT: &str = include_str!("../../../fixtures/rollover.crt");

const OWIN_QUERY: &str =
    "wtrealm=urn%3Aowinrp&wreply=http%3A%2F%2Flocalhost%3A10313%2F&wa=wsignin1.0";
const OWIN_LOCATION: &str = "/account/login?returnUrl=%2Fwsfederation%3Fwtrealm%3Durn%253Aowinrp%26wreply%3Dhttp%253A%252F%252Flocalhost%253A10313%252F%26wa%3Dwsignin1.0";

// ─── Test Session Provider ────────────────────────────────────────

#[derive(Default)]
struct TestSessions {
    session: Mutex<Option<AuthenticatedSession>>,
    fresh_requests: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl TestSessions {
    fn signed_in(session: AuthenticatedSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl SessionProvider for TestSessions {
    async fn current_session(
        &self,
        _headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedSession>, ProviderError> {
        Ok(self.session.lock().clone())
    }

    async fn require_fresh_authentication(&self, _headers: &HeaderMap) -> Result<(), ProviderError> {
        self.fresh_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_out(&self, _headers: &HeaderMap) -> Result<Option<HeaderValue>, ProviderError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.session.lock().take();
        Ok(Some(HeaderValue::from_static("wsf_session=; Max-Age=0; Path=/")))
    }
}

// ─── Fixtures ─────────────────────────────────────────────────────

fn key_set() -> KeySet {
    KeySet::new(SigningCredential::from_pem(SIGNING_KEY, SIGNING_CERT).unwrap())
}

fn relying_parties() -> Arc<InMemoryRelyingPartyStore> {
    let store: InMemoryRelyingPartyStore = [
        RelyingParty::builder("urn:owinrp")
            .reply_url("http://localhost:10313/")
            .build()
            .unwrap(),
        RelyingParty::builder("https://app.example.com/")
            .default_reply_url("https://app.example.com/signin")
            .reply_url_pattern("https://app.example.com/*")
            .build()
            .unwrap(),
        RelyingParty::builder("urn:encrypted")
            .reply_url("https://secret.example.com/")
            .encryption_required(true)
            .build()
            .unwrap(),
    ]
    .into_iter()
    .collect();
    Arc::new(store)
}

fn alice() -> AuthenticatedSession {
    AuthenticatedSession::new("alice", Utc::now() - Duration::minutes(2))
        .with_authentication_method("pwd")
        .with_claim("sub", "alice")
        .with_claim("email", "alice@example.com")
}

struct Harness {
    app: Router,
    sessions: Arc<TestSessions>,
    keys: Arc<KeyRing>,
}

fn harness(sessions: TestSessions) -> Harness {
    let sessions = Arc::new(sessions);
    let keys = Arc::new(KeyRing::new(key_set()));
    let state = WsFedState::new(
        WsFedConfig::from_base_url("urn:idp", "https://idp.example.com"),
        relying_parties(),
        sessions.clone(),
        keys.clone(),
    );
    Harness {
        app: wsfed_router().with_state(state),
        sessions,
        keys,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, HeaderMap, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

// ─── Metadata ─────────────────────────────────────────────────────

#[tokio::test]
async fn empty_query_serves_metadata() {
    let h = harness(TestSessions::default());
    let (status, headers, body) = get(&h.app, "/wsfederation").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/xml; charset=utf-8");
    assert!(body.starts_with(
        r#"<?xml version="1.0" encoding="utf-8"?><EntityDescriptor entityID="urn:idp""#
    ));
    assert!(XmlSignatureValidator::from_key_set(&key_set()).validate(&body).is_ok());
}

#[tokio::test]
async fn metadata_is_idempotent_across_paths() {
    let h = harness(TestSessions::default());
    let (_, _, first) = get(&h.app, "/wsfederation").await;
    let (_, _, second) = get(&h.app, "/wsfederation/metadata").await;
    let (_, _, third) = get(&h.app, "/FederationMetadata/2007-06/FederationMetadata.xml").await;

    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[tokio::test]
async fn metadata_without_key_is_500() {
    let h = harness(TestSessions::default());
    h.keys.clear();

    let (status, _, body) = get(&h.app, "/wsfederation").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("SigningCredentialUnavailable"));
}

// ─── Sign-in ──────────────────────────────────────────────────────

#[tokio::test]
async fn sign_in_without_session_redirects_to_login() {
    let h = harness(TestSessions::default());
    let (status, headers, _) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}")).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], OWIN_LOCATION);
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert!(headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn return_url_replays_to_same_redirect() {
    let h = harness(TestSessions::default());
    let (_, headers, _) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}&wctx=rm%3D0%26id%3Dx")).await;

    let location = headers[header::LOCATION].to_str().unwrap();
    let encoded = location.strip_prefix("/account/login?returnUrl=").unwrap();
    let replay = decode_return_url(encoded).unwrap();
    assert_eq!(replay, format!("/wsfederation?{OWIN_QUERY}&wctx=rm%3D0%26id%3Dx"));

    let (_, again, _) = get(&h.app, &replay).await;
    assert_eq!(again[header::LOCATION], headers[header::LOCATION]);
}

#[tokio::test]
async fn unknown_realm_is_400_without_cookie() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, headers, body) = get(
        &h.app,
        "/wsfederation?wa=wsignin1.0&wtrealm=urn%3Anobody&wreply=http%3A%2F%2Flocalhost%3A10313%2F",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("UnknownRealm"));
    assert!(!body.contains("urn:nobody"));
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert!(headers.get(header::LOCATION).is_none());
}

#[tokio::test]
async fn foreign_reply_url_is_rejected_before_login() {
    let h = harness(TestSessions::default());
    let (status, headers, body) = get(
        &h.app,
        "/wsfederation?wa=wsignin1.0&wtrealm=urn%3Aowinrp&wreply=https%3A%2F%2Fevil.example.com%2F",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("InvalidReplyUrl"));
    assert!(headers.get(header::LOCATION).is_none());
}

#[tokio::test]
async fn missing_reply_url_without_default_is_400() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, _, body) = get(&h.app, "/wsfederation?wa=wsignin1.0&wtrealm=urn%3Aowinrp").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("MissingReplyUrl"));
}

#[tokio::test]
async fn unknown_action_is_400() {
    let h = harness(TestSessions::default());
    let (status, _, body) = get(&h.app, "/wsfederation?wa=wattr1.0&wtrealm=urn%3Aowinrp").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("InvalidMessageType"));
}

#[tokio::test]
async fn duplicate_parameter_is_malformed() {
    let h = harness(TestSessions::default());
    let (status, _, body) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}&wtrealm=urn%3Aother")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("MalformedRequest"));
}

#[tokio::test]
async fn authenticated_sign_in_posts_signed_token() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, headers, html) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}&wctx=abc")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");

    assert_eq!(HttpPostBinding::read_action(&html).as_deref(), Some("http://localhost:10313/"));
    assert_eq!(HttpPostBinding::read_field(&html, "wa").as_deref(), Some("wsignin1.0"));
    assert_eq!(HttpPostBinding::read_field(&html, "wctx").as_deref(), Some("abc"));

    let wresult = HttpPostBinding::read_field(&html, "wresult").unwrap();
    assert_eq!(element_text(&wresult, "Audience").unwrap().as_deref(), Some("urn:owinrp"));
    assert_eq!(
        element_text(&wresult, "NameIdentifier").unwrap().as_deref(),
        Some("alice")
    );

    // The certificate advertised in metadata verifies the token.
    let (_, _, metadata) = get(&h.app, "/wsfederation").await;
    let certificate = element_text(&metadata, "X509Certificate").unwrap().unwrap();
    let der = base64_decode(&certificate);
    assert!(XmlSignatureValidator::new(vec![der]).validate(&wresult).is_ok());

    let not_before = element_attribute(&wresult, "Conditions", "NotBefore").unwrap().unwrap();
    let not_after = element_attribute(&wresult, "Conditions", "NotOnOrAfter").unwrap().unwrap();
    let lifetime = chrono::DateTime::parse_from_rfc3339(&not_after).unwrap()
        - chrono::DateTime::parse_from_rfc3339(&not_before).unwrap();
    assert_eq!(lifetime, Duration::hours(10));
}

#[tokio::test]
async fn default_reply_url_is_used_when_wreply_absent() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, _, html) = get(
        &h.app,
        "/wsfederation?wa=wsignin1.0&wtrealm=https%3A%2F%2Fapp.example.com",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        HttpPostBinding::read_action(&html).as_deref(),
        Some("https://app.example.com/signin")
    );
}

#[tokio::test]
async fn pattern_reply_url_is_accepted() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, _, html) = get(
        &h.app,
        "/wsfederation?wa=wsignin1.0&wtrealm=https%3A%2F%2Fapp.example.com%2F&wreply=https%3A%2F%2Fapp.example.com%2Freports%2F",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        HttpPostBinding::read_action(&html).as_deref(),
        Some("https://app.example.com/reports/")
    );
}

#[tokio::test]
async fn encryption_required_is_500() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, _, body) = get(
        &h.app,
        "/wsfederation?wa=wsignin1.0&wtrealm=urn%3Aencrypted&wreply=https%3A%2F%2Fsecret.example.com%2F",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("TokenEncryptionUnsupported"));
}

#[tokio::test]
async fn missing_signing_key_is_500() {
    let h = harness(TestSessions::signed_in(alice()));
    h.keys.clear();

    let (status, _, body) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("SigningCredentialUnavailable"));
}

#[tokio::test]
async fn wfresh_zero_forces_login_and_pins_wct() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, headers, _) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}&wfresh=0")).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(h.sessions.fresh_requests.load(Ordering::SeqCst), 1);

    let location = headers[header::LOCATION].to_str().unwrap();
    let replay = decode_return_url(location.strip_prefix("/account/login?returnUrl=").unwrap()).unwrap();
    assert!(replay.starts_with(&format!("/wsfederation?{OWIN_QUERY}&wfresh=0&wct=")));

    // A login after the pinned instant satisfies the replayed request.
    *h.sessions.session.lock() = Some(
        AuthenticatedSession::new("alice", Utc::now() + Duration::seconds(1)).with_claim("sub", "alice"),
    );
    let (status, _, _) = get(&h.app, &replay).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wfresh_zero_without_session_pins_wct() {
    let h = harness(TestSessions::default());
    let (status, headers, _) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}&wfresh=0")).await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(h.sessions.fresh_requests.load(Ordering::SeqCst), 0);

    let location = headers[header::LOCATION].to_str().unwrap();
    let replay = decode_return_url(location.strip_prefix("/account/login?returnUrl=").unwrap()).unwrap();
    assert!(replay.starts_with(&format!("/wsfederation?{OWIN_QUERY}&wfresh=0&wct=")));

    // The first login after the request is accepted on replay.
    *h.sessions.session.lock() = Some(
        AuthenticatedSession::new("alice", Utc::now() + Duration::seconds(1)).with_claim("sub", "alice"),
    );
    let (status, _, _) = get(&h.app, &replay).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn empty_wct_is_replaced_not_duplicated() {
    let h = harness(TestSessions::default());
    let (status, headers, _) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}&wfresh=0&wct=")).await;
    assert_eq!(status, StatusCode::FOUND);

    let location = headers[header::LOCATION].to_str().unwrap();
    let replay = decode_return_url(location.strip_prefix("/account/login?returnUrl=").unwrap()).unwrap();
    assert_eq!(replay.matches("wct=").count(), 1);
    assert!(!replay.contains("wct=&"));

    *h.sessions.session.lock() = Some(
        AuthenticatedSession::new("alice", Utc::now() + Duration::seconds(1)).with_claim("sub", "alice"),
    );
    let (status, _, _) = get(&h.app, &replay).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wfresh_minutes_accepts_recent_login() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, _, _) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}&wfresh=5")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}&wfresh=1")).await;
    assert_eq!(status, StatusCode::FOUND);
}

// ─── Sign-out ─────────────────────────────────────────────────────

#[tokio::test]
async fn sign_out_clears_session_and_redirects() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, headers, _) = get(
        &h.app,
        "/wsfederation?wa=wsignout1.0&wtrealm=urn%3Aowinrp&wreply=http%3A%2F%2Flocalhost%3A10313%2F",
    )
    .await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "http://localhost:10313/");
    assert_eq!(headers[header::SET_COOKIE], "wsf_session=; Max-Age=0; Path=/");
    assert_eq!(h.sessions.sign_outs.load(Ordering::SeqCst), 1);
    assert!(h.sessions.session.lock().is_none());
}

#[tokio::test]
async fn sign_out_without_reply_goes_to_default() {
    let h = harness(TestSessions::signed_in(alice()));
    let (status, headers, _) = get(&h.app, "/wsfederation?wa=wsignoutcleanup1.0").await;

    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers[header::LOCATION], "/");
}

#[tokio::test]
async fn sign_out_with_unusable_location_keeps_session() {
    let h = harness(TestSessions::signed_in(alice()));

    // Matches the `https://app.example.com/*` pattern but cannot be sent as
    // a Location header.
    let (status, headers, body) = get(
        &h.app,
        "/wsfederation?wa=wsignout1.0&wtrealm=https%3A%2F%2Fapp.example.com%2F&wreply=https%3A%2F%2Fapp.example.com%2Fcaf%C3%A9",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("InvalidReplyUrl"));
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert_eq!(h.sessions.sign_outs.load(Ordering::SeqCst), 0);
    assert!(h.sessions.session.lock().is_some());
}

#[tokio::test]
async fn sign_out_rejects_unvalidated_reply() {
    let h = harness(TestSessions::signed_in(alice()));

    let (status, _, body) = get(&h.app, "/wsfederation?wa=wsignout1.0&wreply=https%3A%2F%2Fevil.example.com%2F").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("InvalidReplyUrl"));

    let (status, _, _) = get(
        &h.app,
        "/wsfederation?wa=wsignout1.0&wtrealm=urn%3Aowinrp&wreply=https%3A%2F%2Fevil.example.com%2F",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Rejected requests leave the session in place.
    assert_eq!(h.sessions.sign_outs.load(Ordering::SeqCst), 0);
    assert!(h.sessions.session.lock().is_some());
}

// ─── Key rotation ─────────────────────────────────────────────────

#[tokio::test]
async fn rotated_key_is_published_and_signs_new_tokens() {
    let h = harness(TestSessions::signed_in(alice()));

    let (_, _, before) = get(&h.app, "/wsfederation").await;
    let old_cert = base64_decode(&element_text(&before, "X509Certificate").unwrap().unwrap());

    let rollover = SigningCredential::from_pem(ROLLOVER_KEY, ROLLOVER_CERT).unwrap();
    let previous = h.keys.rotate(KeySet::new(rollover));
    assert!(previous.is_some());

    let (_, _, after) = get(&h.app, "/wsfederation").await;
    let new_cert = base64_decode(&element_text(&after, "X509Certificate").unwrap().unwrap());
    assert_ne!(old_cert, new_cert);
    assert!(XmlSignatureValidator::new(vec![new_cert.clone()]).validate(&after).is_ok());

    let (status, _, html) = get(&h.app, &format!("/wsfederation?{OWIN_QUERY}")).await;
    assert_eq!(status, StatusCode::OK);
    let wresult = HttpPostBinding::read_field(&html, "wresult").unwrap();

    assert!(XmlSignatureValidator::new(vec![new_cert]).validate(&wresult).is_ok());
    assert!(XmlSignatureValidator::new(vec![old_cert]).validate(&wresult).is_err());
}

fn base64_decode(value: &str) -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(value).unwrap()
}
