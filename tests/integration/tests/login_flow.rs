//! Browser sign-in flow integration tests.
//!
//! Walks a relying party redirect through the login page and back to the
//! token response, then signs out.

use base64::Engine;
use reqwest::StatusCode;

use wsf_protocol::bindings::{decode_return_url, HttpPostBinding};
use wsf_protocol::signature::XmlSignatureValidator;
use wsf_protocol::xml::{element_attribute, element_text};

use crate::common::{location, TestEnv, ALICE_SUBJECT, OWIN_LOCATION, OWIN_QUERY};

/// Follows the sign-in redirect to the login page and returns the
/// `returnUrl` the page will post back.
async fn return_url_from_sign_in(env: &TestEnv) -> anyhow::Result<String> {
    let response = env.get(&format!("/wsfederation?{OWIN_QUERY}")).await?;
    assert_eq!(response.status(), StatusCode::FOUND);

    let login_location = location(&response).unwrap_or_default();
    let encoded = login_location
        .split_once("returnUrl=")
        .map(|(_, v)| v.to_string())
        .unwrap_or_default();
    Ok(decode_return_url(&encoded)?)
}

/// Tests the complete sign-in round trip.
#[tokio::test]
async fn test_sign_in_issues_signed_token() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    // The login page renders the form with the request to continue with.
    let page = env.get(OWIN_LOCATION).await?;
    assert_eq!(page.status(), StatusCode::OK);
    let html = page.text().await?;
    assert!(html.contains(r#"name="returnUrl""#));

    let return_url = return_url_from_sign_in(&env).await?;
    assert_eq!(return_url, format!("/wsfederation?{OWIN_QUERY}"));

    // Logging in replays the original request.
    let response = env.login("alice", "wonderland", &return_url).await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some(return_url.as_str()));
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(cookie.starts_with("wsf_session="));
    assert!(cookie.contains("HttpOnly"));

    // The replayed request now yields the auto-post form.
    let response = env.get(&return_url).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let form = response.text().await?;

    assert_eq!(
        HttpPostBinding::read_action(&form).as_deref(),
        Some("http://localhost:10313/")
    );
    assert_eq!(
        HttpPostBinding::read_field(&form, "wa").as_deref(),
        Some("wsignin1.0")
    );
    assert!(HttpPostBinding::read_field(&form, "wctx").is_none());

    let wresult = HttpPostBinding::read_field(&form, "wresult").unwrap_or_default();
    assert_eq!(element_text(&wresult, "Audience")?.as_deref(), Some("urn:owinrp"));
    assert_eq!(
        element_text(&wresult, "NameIdentifier")?.as_deref(),
        Some(ALICE_SUBJECT)
    );
    assert_eq!(
        element_attribute(&wresult, "Assertion", "Issuer")?.as_deref(),
        Some("urn:wsfed-bridge:test")
    );

    // The token verifies against the certificate published in metadata.
    let metadata = env.get("/wsfederation").await?.text().await?;
    let certificate = element_text(&metadata, "X509Certificate")?.unwrap_or_default();
    let der = base64::engine::general_purpose::STANDARD.decode(certificate)?;
    assert!(XmlSignatureValidator::new(vec![der]).validate(&wresult).is_ok());

    Ok(())
}

/// Tests that a wrong password re-renders the login page.
#[tokio::test]
async fn test_wrong_password_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let return_url = return_url_from_sign_in(&env).await?;

    let response = env.login("alice", "not-the-password", &return_url).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("set-cookie").is_none());
    assert!(response.text().await?.contains("Invalid username or password"));

    // Still anonymous.
    let response = env.get(&return_url).await?;
    assert_eq!(response.status(), StatusCode::FOUND);

    Ok(())
}

/// Tests that an existing session skips the login form.
#[tokio::test]
async fn test_existing_session_skips_login_page() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let return_url = return_url_from_sign_in(&env).await?;
    env.login("alice", "wonderland", &return_url).await?;

    let response = env.get(OWIN_LOCATION).await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some(return_url.as_str()));

    Ok(())
}

/// Tests that sign-out ends the session.
#[tokio::test]
async fn test_sign_out_ends_session() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;
    let return_url = return_url_from_sign_in(&env).await?;
    env.login("alice", "wonderland", &return_url).await?;
    assert_eq!(env.get(&return_url).await?.status(), StatusCode::OK);

    let response = env
        .get("/wsfederation?wa=wsignout1.0&wtrealm=urn%3Aowinrp&wreply=http%3A%2F%2Flocalhost%3A10313%2F")
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("http://localhost:10313/"));
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(cookie.contains("Max-Age=0"));

    // The next sign-in needs a login again.
    let response = env.get(&return_url).await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some(OWIN_LOCATION));

    Ok(())
}
