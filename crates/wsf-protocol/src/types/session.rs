//! Identity provider session as seen by the bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A claim attached to an authenticated subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim type in the identity provider's vocabulary (`sub`, `email`, ...).
    #[serde(rename = "type")]
    pub claim_type: String,
    /// Claim value.
    pub value: String,
}

impl Claim {
    /// Creates a claim.
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// An authenticated identity provider session. Read-only to the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    /// Stable subject identifier.
    pub subject_id: String,
    /// Claims about the subject.
    pub claims: Vec<Claim>,
    /// When the subject last authenticated.
    pub authentication_time: DateTime<Utc>,
    /// How the subject authenticated (`pwd`, `mfa`, ...), if known.
    pub authentication_method: Option<String>,
}

impl AuthenticatedSession {
    /// Creates a session with no claims.
    pub fn new(subject_id: impl Into<String>, authentication_time: DateTime<Utc>) -> Self {
        Self {
            subject_id: subject_id.into(),
            claims: Vec::new(),
            authentication_time,
            authentication_method: None,
        }
    }

    /// Adds a claim.
    #[must_use]
    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(claim_type, value));
        self
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_authentication_method(mut self, method: impl Into<String>) -> Self {
        self.authentication_method = Some(method.into());
        self
    }

    /// Values of every claim with the given type, in order.
    pub fn claim_values<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }
}
