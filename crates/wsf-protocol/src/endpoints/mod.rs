//! WS-Federation endpoint handlers.
//!
//! This module provides Axum HTTP handlers for the passive requestor
//! endpoint:
//!
//! - **Metadata** - Signed federation metadata
//! - **Sign-in** - Login redirect or signed token response
//! - **Sign-out** - Session termination and post-logout redirect
//!
//! The processors (`process_sign_in`, `process_sign_out`) return plain
//! actions so they can be driven without HTTP.
//!
//! # Example
//!
//! ```rust,ignore
//! use wsf_protocol::endpoints::wsfed_router;
//! use axum::Router;
//!
//! let app = Router::new()
//!     .merge(wsfed_router())
//!     .with_state(wsfed_state);
//! ```

mod metadata;
mod response;
mod router;
mod signin;
mod signout;
mod state;

pub use metadata::*;
pub use response::*;
pub use router::*;
pub use signin::*;
pub use signout::*;
pub use state::*;
