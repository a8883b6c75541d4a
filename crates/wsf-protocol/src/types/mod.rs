//! WS-Federation types and data structures.
//!
//! Protocol constants, relying party registrations, the identity provider
//! session view and parsed request messages.

mod constants;
mod message;
mod relying_party;
mod session;

pub use constants::*;
pub use message::*;
pub use relying_party::*;
pub use session::*;
