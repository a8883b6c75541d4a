//! WS-Federation passive requestor protocol bridge.
//!
//! This crate exposes an identity provider's sessions and claims to legacy
//! relying parties that only speak WS-Federation:
//!
//! - **Federation metadata** - Signed `EntityDescriptor` advertising the
//!   passive requestor endpoint and signing certificates
//! - **Sign-in** (`wa=wsignin1.0`) - Realm and reply URL validation, login
//!   redirect with a round-trippable return URL, signed SAML token issuance
//! - **Sign-out** (`wa=wsignout1.0`) - Session termination and validated
//!   post-logout redirect
//!
//! # Architecture
//!
//! - [`types`] - Protocol constants, relying parties, sessions, parsed messages
//! - [`xml`] - XML serialization and exclusive canonicalization
//! - [`signature`] - Signing credentials, key rotation, XML-DSig sign/verify
//! - [`resolver`] - Realm to relying party resolution
//! - [`token`] - SAML assertion and `RequestSecurityTokenResponse` construction
//! - [`bindings`] - Auto-post response form and login return URL encoding
//! - [`endpoints`] - Axum handlers, processors and collaborator traits
//! - [`error`] - Error kinds and their HTTP mapping
//!
//! # Example
//!
//! ```rust,ignore
//! use wsf_protocol::endpoints::{wsfed_router, WsFedState};
//!
//! let state = WsFedState::new(config, relying_parties, sessions, keys);
//! let app = axum::Router::new().merge(wsfed_router().with_state(state));
//! ```
//!
//! # Specifications
//!
//! - [WS-Federation 1.2](http://docs.oasis-open.org/wsfed/federation/v1.2/os/ws-federation-1.2-spec-os.html)
//! - [SAML 1.1 Assertions](https://www.oasis-open.org/committees/download.php/3406/oasis-sstc-saml-core-1.1.pdf)
//! - [Exclusive XML Canonicalization](https://www.w3.org/TR/xml-exc-c14n/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod endpoints;
pub mod error;
pub mod resolver;
pub mod signature;
pub mod token;
pub mod types;
pub mod xml;

pub use error::{WsFedError, WsFedResult};
pub use types::*;
