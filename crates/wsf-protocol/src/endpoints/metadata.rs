//! Federation metadata endpoint.
//!
//! Generates the signed WS-Federation `EntityDescriptor` for the identity
//! provider.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use base64::Engine;

use crate::error::WsFedResult;
use crate::signature::{KeySet, XmlSigner};
use crate::types::{
    token_types, AUTH_NS, DEFAULT_CLAIM_MAPPING, FED_NS, METADATA_NS, WSA_NS, XMLDSIG_NS, XSI_NS,
};
use crate::xml::XmlWriter;

use super::response::error_response;
use super::state::{WsFedConfig, WsFedState};

/// Content type of the metadata document.
pub const METADATA_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// GET handler for the federation metadata document.
pub async fn federation_metadata(State(state): State<WsFedState>) -> impl IntoResponse {
    match handle_metadata(&state).await {
        Ok(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, METADATA_CONTENT_TYPE)],
            xml,
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Produces the metadata document with the current key set.
///
/// # Errors
///
/// Returns [`WsFedError::SigningCredentialUnavailable`] if no key set is
/// configured.
///
/// [`WsFedError::SigningCredentialUnavailable`]: crate::WsFedError::SigningCredentialUnavailable
pub async fn handle_metadata(state: &WsFedState) -> WsFedResult<String> {
    let keys = state.key_snapshot().await.inspect_err(|e| {
        tracing::error!(error = %e, "Cannot serve federation metadata");
    })?;
    generate_metadata(&state.config, &keys)
}

/// The `ID` of the metadata root, derived from the issuer so the document
/// is stable across requests.
#[must_use]
pub fn metadata_document_id(issuer: &str) -> String {
    let digest = hex::encode(wsf_crypto::sha256(issuer.as_bytes()));
    format!("_{}", &digest[..32])
}

/// Builds and signs the metadata document.
///
/// The output depends only on `config` and `keys`, so repeated calls with
/// the same inputs are byte-identical.
///
/// # Errors
///
/// Propagates signing failures.
pub fn generate_metadata(config: &WsFedConfig, keys: &KeySet) -> WsFedResult<String> {
    let id = metadata_document_id(&config.issuer);

    let mut w = XmlWriter::with_declaration();
    w.start(
        "EntityDescriptor",
        &[
            ("entityID", config.issuer.as_str()),
            ("ID", id.as_str()),
            ("xmlns", METADATA_NS),
        ],
    )
    .mark_signature();

    w.start(
        "RoleDescriptor",
        &[
            ("xsi:type", "fed:SecurityTokenServiceType"),
            ("protocolSupportEnumeration", FED_NS),
            ("xmlns:xsi", XSI_NS),
            ("xmlns:fed", FED_NS),
        ],
    );

    let engine = base64::engine::general_purpose::STANDARD;
    for certificate in keys.published_certificates() {
        w.start("KeyDescriptor", &[("use", "signing")])
            .start("KeyInfo", &[("xmlns", XMLDSIG_NS)])
            .start("X509Data", &[])
            .element("X509Certificate", &[], &engine.encode(certificate))
            .end()
            .end()
            .end();
    }

    w.start("fed:TokenTypesOffered", &[])
        .empty("fed:TokenType", &[("Uri", token_types::SAML11)])
        .empty("fed:TokenType", &[("Uri", token_types::SAML2)])
        .end();

    w.start("fed:ClaimTypesOffered", &[]);
    for &(_, claim_type, display_name) in DEFAULT_CLAIM_MAPPING {
        w.start(
            "auth:ClaimType",
            &[("Uri", claim_type), ("Optional", "true"), ("xmlns:auth", AUTH_NS)],
        )
        .element("auth:DisplayName", &[], display_name)
        .end();
    }
    w.end();

    for endpoint in ["fed:SecurityTokenServiceEndpoint", "fed:PassiveRequestorEndpoint"] {
        w.start(endpoint, &[])
            .start("EndpointReference", &[("xmlns", WSA_NS)])
            .element("Address", &[], &config.endpoint_url)
            .end()
            .end();
    }

    let unsigned = w.finish_unsigned(id)?;
    XmlSigner::new(keys.active()).sign(&unsigned)
}
