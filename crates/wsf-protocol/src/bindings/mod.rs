//! WS-Federation passive requestor bindings.
//!
//! - **HTTP-POST** - The sign-in response travels to the relying party in an
//!   auto-submitting HTML form
//! - **Login return URL** - The sign-in request is carried through the login
//!   page as a percent-encoded `returnUrl` and replayed afterwards
//!
//! # Usage
//!
//! ```rust,ignore
//! use wsf_protocol::bindings::{login_redirect_location, HttpPostBinding};
//!
//! let location = login_redirect_location("/account/login", "/wsfederation?wa=wsignin1.0&wtrealm=urn%3Aa");
//! let html = HttpPostBinding::encode_sign_in_response(&rstr, "https://rp.example.com/", Some("ctx"));
//! ```

mod post;
mod return_url;

pub use post::*;
pub use return_url::*;
