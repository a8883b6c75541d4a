//! Realm to relying party resolution and reply URL validation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::endpoints::{ProviderError, RelyingPartyStore};
use crate::error::{WsFedError, WsFedResult};
use crate::types::RelyingParty;

/// Resolves `wtrealm` values and validates `wreply` against the result.
#[derive(Clone)]
pub struct RelyingPartyResolver {
    store: Arc<dyn RelyingPartyStore>,
}

impl RelyingPartyResolver {
    /// Creates a resolver over `store`.
    pub fn new(store: Arc<dyn RelyingPartyStore>) -> Self {
        Self { store }
    }

    /// Finds the relying party for `realm`.
    ///
    /// The realm is matched exactly. When that fails, the variant with the
    /// trailing slash added or removed is tried, since relying parties
    /// commonly send their base URL either way.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::UnknownRealm`] if neither form is registered.
    pub async fn resolve(&self, realm: &str) -> WsFedResult<RelyingParty> {
        if let Some(rp) = self.store.find_by_realm(realm).await? {
            return Ok(rp);
        }

        let alternate = match realm.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
            Some(_) => return Err(WsFedError::UnknownRealm(realm.to_string())),
            None => format!("{realm}/"),
        };

        if let Some(rp) = self.store.find_by_realm(&alternate).await? {
            tracing::debug!(realm, registered = %alternate, "Realm matched with trailing slash toggled");
            return Ok(rp);
        }

        Err(WsFedError::UnknownRealm(realm.to_string()))
    }

    /// Chooses the reply URL for a sign-in response.
    ///
    /// A supplied `wreply` must be allowed by the relying party; otherwise
    /// its default reply URL is used.
    ///
    /// # Errors
    ///
    /// - [`WsFedError::InvalidReplyUrl`] if `requested` is not allowed
    /// - [`WsFedError::MissingReplyUrl`] if nothing was supplied and no
    ///   default is registered
    pub fn reply_url(rp: &RelyingParty, requested: Option<&str>) -> WsFedResult<String> {
        match requested {
            Some(url) if rp.is_reply_url_allowed(url) => Ok(url.to_string()),
            Some(url) => Err(WsFedError::InvalidReplyUrl(url.to_string())),
            None => rp
                .default_reply_url()
                .map(String::from)
                .ok_or_else(|| WsFedError::MissingReplyUrl(rp.realm().to_string())),
        }
    }
}

impl std::fmt::Debug for RelyingPartyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelyingPartyResolver").finish_non_exhaustive()
    }
}

/// Relying parties held in memory, keyed by realm.
#[derive(Debug, Default)]
pub struct InMemoryRelyingPartyStore {
    relying_parties: RwLock<HashMap<String, RelyingParty>>,
}

impl InMemoryRelyingPartyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a relying party.
    pub fn insert(&self, rp: RelyingParty) {
        tracing::debug!(realm = %rp.realm(), "Registered relying party");
        self.relying_parties.write().insert(rp.realm().to_string(), rp);
    }

    /// Number of registered relying parties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relying_parties.read().len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relying_parties.read().is_empty()
    }
}

impl FromIterator<RelyingParty> for InMemoryRelyingPartyStore {
    fn from_iter<I: IntoIterator<Item = RelyingParty>>(iter: I) -> Self {
        let store = Self::new();
        for rp in iter {
            store.insert(rp);
        }
        store
    }
}

#[async_trait]
impl RelyingPartyStore for InMemoryRelyingPartyStore {
    async fn find_by_realm(&self, realm: &str) -> Result<Option<RelyingParty>, ProviderError> {
        Ok(self.relying_parties.read().get(realm).cloned())
    }
}
