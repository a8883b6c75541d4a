//! End-to-End Integration Tests
//!
//! These tests run the WS-Federation bridge on an ephemeral port with the
//! repository fixtures and drive it with a real HTTP client.

mod common;
mod login_flow;
mod wsfed_endpoints;
