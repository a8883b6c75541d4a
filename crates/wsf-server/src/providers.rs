//! Provider implementations for the server.
//!
//! This module provides concrete implementations of the collaborator traits
//! consumed by the WS-Federation endpoints, backed by files and memory:
//!
//! - relying parties loaded from a JSON file
//! - development users with Argon2id password hashes
//! - cookie-keyed in-memory sessions
//! - the signing key ring loaded from PEM files

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Deserialize;
use uuid::Uuid;

use wsf_protocol::endpoints::{ProviderError, SessionProvider};
use wsf_protocol::resolver::InMemoryRelyingPartyStore;
use wsf_protocol::signature::{KeyRing, KeySet, SigningCredential};
use wsf_protocol::{AuthenticatedSession, Claim, RelyingParty};

use crate::config::ServerConfig;

/// Longest session lifetime accepted from configuration (one year).
pub const MAX_SESSION_LIFETIME_SECS: i64 = 366 * 24 * 60 * 60;

/// Aggregate providers for the server.
#[derive(Clone)]
pub struct Providers {
    /// Relying party registrations.
    pub relying_parties: Arc<InMemoryRelyingPartyStore>,

    /// Development user directory.
    pub users: Arc<UserDirectory>,

    /// Cookie-keyed sessions.
    pub sessions: Arc<CookieSessionStore>,

    /// Signing keys.
    pub keys: Arc<KeyRing>,
}

impl Providers {
    /// Loads every provider from the files named in `config`.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let relying_parties = match &config.relying_parties_path {
            Some(path) => load_relying_parties(path)?,
            None => {
                tracing::warn!("WSF_RELYING_PARTIES_PATH not set; no relying parties registered");
                InMemoryRelyingPartyStore::new()
            }
        };

        let users = match &config.users_path {
            Some(path) => UserDirectory::load(path)?,
            None => {
                tracing::warn!("WSF_USERS_PATH not set; nobody can log in");
                UserDirectory::default()
            }
        };

        let keys = load_key_ring(config)?;

        let session_lifetime = Duration::try_seconds(config.session_lifetime)
            .filter(|d| *d > Duration::zero() && d.num_seconds() <= MAX_SESSION_LIFETIME_SECS)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "session lifetime must be between 1 and {MAX_SESSION_LIFETIME_SECS} seconds, got {}",
                    config.session_lifetime
                )
            })?;

        Ok(Self {
            relying_parties: Arc::new(relying_parties),
            users: Arc::new(users),
            sessions: Arc::new(CookieSessionStore::new(
                config.session_cookie.clone(),
                session_lifetime,
            )),
            keys: Arc::new(keys),
        })
    }
}

// ============================================================================
// Relying parties
// ============================================================================

/// A relying party as written in the registration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelyingPartyRecord {
    /// Realm identifier.
    pub realm: String,
    /// Exact reply URLs.
    #[serde(default)]
    pub reply_urls: Vec<String>,
    /// `https://host/path/*` patterns.
    #[serde(default)]
    pub reply_url_patterns: Vec<String>,
    /// Reply URL used when a request has no `wreply`.
    #[serde(default)]
    pub default_reply_url: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub token_lifetime_secs: Option<i64>,
    /// Replacement claim mapping (IdP claim type to output claim type).
    #[serde(default)]
    pub claim_mapping: Option<HashMap<String, String>>,
    /// Whether tokens must be encrypted.
    #[serde(default)]
    pub encryption_required: bool,
    /// `saml11` or `saml2` (or the token type URI).
    #[serde(default)]
    pub token_type: Option<String>,
    /// Signature algorithm URI or short name.
    #[serde(default)]
    pub signature_algorithm: Option<String>,
    /// Digest algorithm URI or short name.
    #[serde(default)]
    pub digest_algorithm: Option<String>,
    /// Name identifier format URI.
    #[serde(default)]
    pub name_identifier_format: Option<String>,
}

impl RelyingPartyRecord {
    /// Validates the record into a [`RelyingParty`].
    pub fn into_relying_party(self) -> anyhow::Result<RelyingParty> {
        let realm = self.realm.clone();
        let mut builder = RelyingParty::builder(self.realm)
            .encryption_required(self.encryption_required);

        for url in self.reply_urls {
            builder = builder.reply_url(url);
        }
        for pattern in self.reply_url_patterns {
            builder = builder.reply_url_pattern(pattern);
        }
        if let Some(url) = self.default_reply_url {
            builder = builder.default_reply_url(url);
        }
        if let Some(secs) = self.token_lifetime_secs {
            let lifetime = Duration::try_seconds(secs)
                .ok_or_else(|| anyhow::anyhow!("token lifetime of {realm} is out of range"))?;
            builder = builder.token_lifetime(lifetime);
        }
        if let Some(mapping) = self.claim_mapping {
            builder = builder.claim_mapping(mapping);
        }
        if let Some(token_type) = self.token_type {
            builder = builder.token_type(token_type.parse().map_err(anyhow::Error::msg)?);
        }
        if let Some(alg) = self.signature_algorithm {
            builder = builder.signature_algorithm(alg.parse().map_err(anyhow::Error::msg)?);
        }
        if let Some(alg) = self.digest_algorithm {
            builder = builder.digest_algorithm(alg.parse().map_err(anyhow::Error::msg)?);
        }
        if let Some(format) = self.name_identifier_format {
            builder = builder.name_identifier_format(format);
        }

        builder
            .build()
            .with_context(|| format!("invalid relying party {realm}"))
    }
}

/// Parses a JSON array of relying party records.
pub fn parse_relying_parties(json: &str) -> anyhow::Result<InMemoryRelyingPartyStore> {
    let records: Vec<RelyingPartyRecord> =
        serde_json::from_str(json).context("relying party file is not valid JSON")?;

    let store = InMemoryRelyingPartyStore::new();
    for record in records {
        store.insert(record.into_relying_party()?);
    }
    Ok(store)
}

/// Loads relying parties from a JSON file.
pub fn load_relying_parties(path: &Path) -> anyhow::Result<InMemoryRelyingPartyStore> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let store = parse_relying_parties(&json)?;
    tracing::info!(count = store.len(), path = %path.display(), "Loaded relying parties");
    Ok(store)
}

// ============================================================================
// Users
// ============================================================================

/// Hashes a password with Argon2id, returning the PHC string.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

/// Verifies a password against a PHC hash.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// A user as written in the users file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRecord {
    /// Login name.
    pub username: String,
    /// Argon2 PHC hash.
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Plain password, hashed at load time. Development fixtures only.
    #[serde(default)]
    pub password: Option<String>,
    /// Subject identifier; defaults to the username.
    #[serde(default)]
    pub subject_id: Option<String>,
    /// Claims released to relying parties.
    #[serde(default)]
    pub claims: Vec<Claim>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    subject_id: String,
    password_hash: String,
    claims: Vec<Claim>,
}

/// A successfully authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Subject identifier.
    pub subject_id: String,
    /// Claims about the user.
    pub claims: Vec<Claim>,
}

/// Development user directory.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: HashMap<String, StoredUser>,
}

impl UserDirectory {
    /// Builds a directory from records.
    pub fn from_records(records: Vec<UserRecord>) -> anyhow::Result<Self> {
        let mut users = HashMap::with_capacity(records.len());
        for record in records {
            let password_hash = match (record.password_hash, record.password) {
                (Some(hash), _) => hash,
                (None, Some(password)) => hash_password(&password)?,
                (None, None) => anyhow::bail!("user {} has no password", record.username),
            };
            PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("user {} has an invalid hash: {e}", record.username))?;

            let subject_id = record.subject_id.unwrap_or_else(|| record.username.clone());
            users.insert(
                record.username,
                StoredUser {
                    subject_id,
                    password_hash,
                    claims: record.claims,
                },
            );
        }
        Ok(Self { users })
    }

    /// Loads users from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let records: Vec<UserRecord> =
            serde_json::from_str(&json).context("users file is not valid JSON")?;
        let directory = Self::from_records(records)?;
        tracing::info!(count = directory.users.len(), path = %path.display(), "Loaded users");
        Ok(directory)
    }

    /// Checks a username and password.
    #[must_use]
    pub fn authenticate(&self, username: &str, password: &str) -> Option<AuthenticatedUser> {
        let user = self.users.get(username)?;
        if !verify_password(password, &user.password_hash) {
            return None;
        }
        Some(AuthenticatedUser {
            subject_id: user.subject_id.clone(),
            claims: user.claims.clone(),
        })
    }
}

// ============================================================================
// Sessions
// ============================================================================

#[derive(Debug, Clone)]
struct StoredSession {
    session: AuthenticatedSession,
    expires_at: DateTime<Utc>,
    force_login: bool,
}

/// In-memory sessions keyed by an opaque cookie value.
///
/// For production with multiple instances, use a distributed store.
pub struct CookieSessionStore {
    cookie_name: String,
    lifetime: Duration,
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl CookieSessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(cookie_name: String, lifetime: Duration) -> Self {
        Self {
            cookie_name,
            lifetime,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Extracts this store's session id from the request cookies.
    #[must_use]
    pub fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.to_string())
            .filter(|value| !value.is_empty())
    }

    /// Starts a session for `user` and returns its `Set-Cookie` value.
    ///
    /// Any session the request already carried is replaced.
    pub fn create(
        &self,
        headers: &HeaderMap,
        user: AuthenticatedUser,
        method: &str,
    ) -> Result<HeaderValue, ProviderError> {
        let now = Utc::now();
        let id = Uuid::new_v4().simple().to_string();

        let mut session = AuthenticatedSession::new(user.subject_id, now).with_authentication_method(method);
        session.claims = user.claims;

        {
            let mut sessions = self.sessions.write();
            if let Some(previous) = self.session_id(headers) {
                sessions.remove(&previous);
            }
            sessions.retain(|_, s| s.expires_at > now);
            sessions.insert(
                id.clone(),
                StoredSession {
                    session,
                    expires_at: now + self.lifetime,
                    force_login: false,
                },
            );
        }

        let cookie = format!(
            "{}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name,
            self.lifetime.num_seconds()
        );
        HeaderValue::from_str(&cookie).map_err(|e| ProviderError::Internal(e.to_string()))
    }

    /// True if the caller has a live session that the login page may reuse.
    #[must_use]
    pub fn can_skip_login(&self, headers: &HeaderMap) -> bool {
        let Some(id) = self.session_id(headers) else {
            return false;
        };
        self.sessions
            .read()
            .get(&id)
            .is_some_and(|s| s.expires_at > Utc::now() && !s.force_login)
    }

    /// Number of stored sessions, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// True when no session is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn clear_cookie(&self) -> Result<HeaderValue, ProviderError> {
        HeaderValue::from_str(&format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        ))
        .map_err(|e| ProviderError::Internal(e.to_string()))
    }
}

#[async_trait]
impl SessionProvider for CookieSessionStore {
    async fn current_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedSession>, ProviderError> {
        let Some(id) = self.session_id(headers) else {
            return Ok(None);
        };
        Ok(self
            .sessions
            .read()
            .get(&id)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.session.clone()))
    }

    async fn require_fresh_authentication(&self, headers: &HeaderMap) -> Result<(), ProviderError> {
        if let Some(id) = self.session_id(headers) {
            if let Some(stored) = self.sessions.write().get_mut(&id) {
                stored.force_login = true;
            }
        }
        Ok(())
    }

    async fn sign_out(&self, headers: &HeaderMap) -> Result<Option<HeaderValue>, ProviderError> {
        let Some(id) = self.session_id(headers) else {
            return Ok(None);
        };
        self.sessions.write().remove(&id);
        self.clear_cookie().map(Some)
    }
}

// ============================================================================
// Signing keys
// ============================================================================

/// Loads the signing key ring.
///
/// With no key configured the ring is empty: metadata and issuance then
/// fail with `SigningCredentialUnavailable` until a key is installed.
pub fn load_key_ring(config: &ServerConfig) -> anyhow::Result<KeyRing> {
    let (Some(key_path), Some(cert_path)) = (&config.signing_key_path, &config.signing_cert_path)
    else {
        tracing::warn!("No signing key configured; token issuance is disabled");
        return Ok(KeyRing::empty());
    };

    let key_pem = std::fs::read_to_string(key_path)
        .with_context(|| format!("cannot read {}", key_path.display()))?;
    let cert_pem = std::fs::read_to_string(cert_path)
        .with_context(|| format!("cannot read {}", cert_path.display()))?;
    let credential = SigningCredential::from_pem(&key_pem, &cert_pem)
        .with_context(|| format!("invalid signing credential {}", cert_path.display()))?;

    tracing::info!(
        subject = %credential.subject(),
        thumbprint = %credential.thumbprint(),
        "Loaded signing credential"
    );

    let mut keys = KeySet::new(credential);
    for path in &config.additional_cert_paths {
        let pem = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let der = wsf_protocol::signature::certificate_der_from_pem(&pem)
            .with_context(|| format!("invalid certificate {}", path.display()))?;
        keys = keys.with_published(der);
    }

    Ok(KeyRing::new(keys))
}
