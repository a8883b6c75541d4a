//! WS-Federation router configuration.

use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::error::WsFedError;
use crate::types::{actions, WsFedMessage, FEDERATION_METADATA_PATH, WSFED_ENDPOINT_PATH};

use super::metadata::federation_metadata;
use super::response::error_response;
use super::signin::sign_in;
use super::signout::sign_out;
use super::state::WsFedState;

/// Creates the WS-Federation router.
///
/// # Endpoints
///
/// | Method | Path                                                 | Handler               |
/// |--------|------------------------------------------------------|-----------------------|
/// | GET    | `/wsfederation`                                      | `wsfed_endpoint`      |
/// | GET    | `/wsfederation/metadata`                             | `federation_metadata` |
/// | GET    | `/FederationMetadata/2007-06/FederationMetadata.xml` | `federation_metadata` |
///
/// # Usage
///
/// ```rust,ignore
/// use wsf_protocol::endpoints::{wsfed_router, WsFedState};
///
/// let app = Router::new()
///     .merge(wsfed_router())
///     .with_state(state);
/// ```
pub fn wsfed_router() -> Router<WsFedState> {
    Router::new()
        .route(WSFED_ENDPOINT_PATH, get(wsfed_endpoint))
        .route("/wsfederation/metadata", get(federation_metadata))
        .route(FEDERATION_METADATA_PATH, get(federation_metadata))
}

/// GET handler for the passive requestor endpoint.
///
/// An empty query serves metadata; otherwise the request is dispatched on
/// `wa`.
pub async fn wsfed_endpoint(
    State(state): State<WsFedState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let query = query.unwrap_or_default();
    if query.is_empty() {
        return federation_metadata(State(state)).await.into_response();
    }

    let message = match WsFedMessage::parse(&query) {
        Ok(message) => message,
        Err(e) => return error_response(&e).into_response(),
    };

    tracing::debug!(wa = message.action().unwrap_or("-"), "WS-Federation request");

    match message.action() {
        Some(actions::SIGN_IN) => sign_in(&state, &headers, &query, &message).await,
        Some(actions::SIGN_OUT | actions::SIGN_OUT_CLEANUP) => {
            sign_out(&state, &headers, &message).await
        }
        _ => error_response(&WsFedError::InvalidMessageType).into_response(),
    }
}
