//! WS-Federation endpoint integration tests.
//!
//! Tests for metadata, request validation and sign-out over HTTP.

use reqwest::StatusCode;

use wsf_protocol::xml::element_text;

use crate::common::{location, TestEnv, OWIN_LOCATION, OWIN_QUERY};

/// Tests that the federation metadata document is served and signed.
#[tokio::test]
async fn test_federation_metadata_endpoint() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .get("/FederationMetadata/2007-06/FederationMetadata.xml")
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(
        content_type.starts_with("application/xml"),
        "Expected XML content type, got {}",
        content_type
    );

    let body = response.text().await?;
    assert!(body.contains("EntityDescriptor"));
    assert!(body.contains("PassiveRequestorEndpoint"));
    assert!(body.contains("<ds:Signature"));
    assert!(
        body.contains(&format!("{}/wsfederation", env.base_url)),
        "Metadata should advertise the configured base URL"
    );
    assert_eq!(
        element_text(&body, "X509Certificate")?.map(|c| c.is_empty()),
        Some(false)
    );

    // The bare endpoint serves the same document.
    let bare = env.get("/wsfederation").await?.text().await?;
    assert_eq!(bare, body);

    Ok(())
}

/// Tests that an anonymous sign-in is sent to the login page.
#[tokio::test]
async fn test_sign_in_redirects_to_login() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.get(&format!("/wsfederation?{OWIN_QUERY}")).await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some(OWIN_LOCATION));
    assert!(response.headers().get("set-cookie").is_none());

    Ok(())
}

/// Tests that an unregistered realm is rejected without a redirect.
#[tokio::test]
async fn test_unknown_realm_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .get("/wsfederation?wa=wsignin1.0&wtrealm=urn%3Aunknown&wreply=http%3A%2F%2Flocalhost%3A10313%2F")
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(location(&response).is_none());
    assert!(response.text().await?.contains("WS-Federation Error"));

    Ok(())
}

/// Tests that a reply URL outside the registration is rejected.
#[tokio::test]
async fn test_unregistered_reply_url_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .get("/wsfederation?wa=wsignin1.0&wtrealm=urn%3Aowinrp&wreply=https%3A%2F%2Fevil.example.com%2F")
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(location(&response).is_none());

    Ok(())
}

/// Tests that an unknown action is a client error.
#[tokio::test]
async fn test_unknown_action_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env.get("/wsfederation?wa=wattr1.0&wtrealm=urn%3Aowinrp").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

/// Tests sign-out without a session.
#[tokio::test]
async fn test_sign_out_without_session() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    let response = env
        .get("/wsfederation?wa=wsignout1.0&wtrealm=urn%3Aowinrp&wreply=http%3A%2F%2Flocalhost%3A10313%2F")
        .await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("http://localhost:10313/"));

    let response = env.get("/wsfederation?wa=wsignoutcleanup1.0").await?;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_deref(), Some("/"));

    Ok(())
}

/// Tests the health endpoints.
#[tokio::test]
async fn test_health_endpoints() -> anyhow::Result<()> {
    let env = TestEnv::new().await?;

    for path in ["/health", "/health/live", "/health/ready"] {
        let response = env.get(path).await?;
        assert!(
            response.status().is_success(),
            "{} returned {}",
            path,
            response.status()
        );
    }

    Ok(())
}
