//! Registered relying parties.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use url::Url;

use crate::error::{WsFedError, WsFedResult};
use crate::signature::{DigestAlgorithm, SignatureAlgorithm};

use super::constants::{name_id_formats, token_types, DEFAULT_CLAIM_MAPPING};

/// Default token lifetime: ten hours, matching typical WIF session lifetimes.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 36_000;

/// Longest token lifetime a relying party may be configured with (one year).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 366 * 24 * 60 * 60;

/// Assertion format placed inside the token response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenType {
    /// SAML 1.1 assertion.
    #[default]
    Saml11,
    /// SAML 2.0 assertion.
    Saml2,
}

impl TokenType {
    /// Returns the WSS token profile URI.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Saml11 => token_types::SAML11,
            Self::Saml2 => token_types::SAML2,
        }
    }
}

impl FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            token_types::SAML11 => Ok(Self::Saml11),
            token_types::SAML2 => Ok(Self::Saml2),
            _ => match s.to_ascii_lowercase().as_str() {
                "saml11" | "saml1.1" => Ok(Self::Saml11),
                "saml2" | "saml2.0" => Ok(Self::Saml2),
                _ => Err(format!("unsupported token type: {s}")),
            },
        }
    }
}

/// A wildcard reply URL pattern of the form `https://host[:port]/path/*`.
///
/// A candidate matches when it has the same origin, carries no user info,
/// and its normalized path starts with the pattern's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyUrlPattern {
    pattern: String,
    base: Url,
}

impl ReplyUrlPattern {
    /// Parses a pattern. The `*` must be the last character and must follow
    /// a `/`, so the host and path prefix are fixed.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::Configuration`] for any other shape.
    pub fn parse(pattern: &str) -> WsFedResult<Self> {
        let prefix = pattern
            .strip_suffix('*')
            .filter(|p| p.ends_with('/') && !p.contains('*'))
            .ok_or_else(|| {
                WsFedError::Configuration(format!("reply URL pattern must end in '/*': {pattern}"))
            })?;

        let base = parse_absolute_url(prefix)?;
        if base.query().is_some() || base.fragment().is_some() {
            return Err(WsFedError::Configuration(format!(
                "reply URL pattern cannot carry a query or fragment: {pattern}"
            )));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            base,
        })
    }

    /// Checks a candidate reply URL against the pattern.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let Ok(url) = Url::parse(candidate) else {
            return false;
        };

        url.origin() == self.base.origin()
            && url.username().is_empty()
            && url.password().is_none()
            && url.path().starts_with(self.base.path())
    }

    /// The pattern as configured.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// A registered relying party.
///
/// Immutable once built; construct with [`RelyingParty::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    realm: String,
    allowed_reply_urls: BTreeSet<String>,
    reply_url_patterns: Vec<ReplyUrlPattern>,
    default_reply_url: Option<String>,
    token_lifetime: Duration,
    claim_mapping: BTreeMap<String, String>,
    encryption_required: bool,
    digest_algorithm: DigestAlgorithm,
    signature_algorithm: SignatureAlgorithm,
    token_type: TokenType,
    name_identifier_format: String,
}

impl RelyingParty {
    /// Starts a builder for the given realm.
    #[must_use]
    pub fn builder(realm: impl Into<String>) -> RelyingPartyBuilder {
        RelyingPartyBuilder::new(realm)
    }

    /// The realm identifier (`wtrealm`).
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Exact reply URLs this relying party may receive tokens at.
    #[must_use]
    pub const fn allowed_reply_urls(&self) -> &BTreeSet<String> {
        &self.allowed_reply_urls
    }

    /// Wildcard reply URL patterns.
    #[must_use]
    pub fn reply_url_patterns(&self) -> &[ReplyUrlPattern] {
        &self.reply_url_patterns
    }

    /// Reply URL used when the request carries no `wreply`.
    #[must_use]
    pub fn default_reply_url(&self) -> Option<&str> {
        self.default_reply_url.as_deref()
    }

    /// Token lifetime, always strictly positive.
    #[must_use]
    pub const fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Identity provider claim type to output claim type.
    #[must_use]
    pub const fn claim_mapping(&self) -> &BTreeMap<String, String> {
        &self.claim_mapping
    }

    /// Whether the relying party demands encrypted tokens.
    #[must_use]
    pub const fn encryption_required(&self) -> bool {
        self.encryption_required
    }

    /// Digest algorithm for the token signature reference.
    #[must_use]
    pub const fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    /// Signature algorithm for the token.
    #[must_use]
    pub const fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_algorithm
    }

    /// Assertion format.
    #[must_use]
    pub const fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Name identifier format of the token subject.
    #[must_use]
    pub fn name_identifier_format(&self) -> &str {
        &self.name_identifier_format
    }

    /// Checks a reply URL against the allow-list: byte-identical membership
    /// or a pattern match.
    #[must_use]
    pub fn is_reply_url_allowed(&self, reply_url: &str) -> bool {
        self.allowed_reply_urls.contains(reply_url)
            || self.reply_url_patterns.iter().any(|p| p.matches(reply_url))
    }
}

/// Builder for [`RelyingParty`].
#[derive(Debug, Clone)]
pub struct RelyingPartyBuilder {
    realm: String,
    allowed_reply_urls: Vec<String>,
    reply_url_patterns: Vec<String>,
    default_reply_url: Option<String>,
    token_lifetime: Duration,
    claim_mapping: Option<BTreeMap<String, String>>,
    encryption_required: bool,
    digest_algorithm: DigestAlgorithm,
    signature_algorithm: SignatureAlgorithm,
    token_type: TokenType,
    name_identifier_format: String,
}

impl RelyingPartyBuilder {
    fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            allowed_reply_urls: Vec::new(),
            reply_url_patterns: Vec::new(),
            default_reply_url: None,
            token_lifetime: Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS),
            claim_mapping: None,
            encryption_required: false,
            digest_algorithm: DigestAlgorithm::default(),
            signature_algorithm: SignatureAlgorithm::default(),
            token_type: TokenType::default(),
            name_identifier_format: name_id_formats::UNSPECIFIED.to_string(),
        }
    }

    /// Allows an exact reply URL.
    #[must_use]
    pub fn reply_url(mut self, url: impl Into<String>) -> Self {
        self.allowed_reply_urls.push(url.into());
        self
    }

    /// Allows reply URLs matching a `.../*` pattern.
    #[must_use]
    pub fn reply_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.reply_url_patterns.push(pattern.into());
        self
    }

    /// Sets the default reply URL. It is added to the allow-list.
    #[must_use]
    pub fn default_reply_url(mut self, url: impl Into<String>) -> Self {
        self.default_reply_url = Some(url.into());
        self
    }

    /// Sets the token lifetime.
    #[must_use]
    pub const fn token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Replaces the claim mapping. Without this call the default WS-* mapping
    /// applies.
    #[must_use]
    pub fn claim_mapping<I, K, V>(mut self, mapping: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.claim_mapping = Some(
            mapping
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Marks the relying party as requiring encrypted tokens.
    #[must_use]
    pub const fn encryption_required(mut self, required: bool) -> Self {
        self.encryption_required = required;
        self
    }

    /// Sets the digest algorithm.
    #[must_use]
    pub const fn digest_algorithm(mut self, alg: DigestAlgorithm) -> Self {
        self.digest_algorithm = alg;
        self
    }

    /// Sets the signature algorithm.
    #[must_use]
    pub const fn signature_algorithm(mut self, alg: SignatureAlgorithm) -> Self {
        self.signature_algorithm = alg;
        self
    }

    /// Sets the assertion format.
    #[must_use]
    pub const fn token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Sets the subject name identifier format.
    #[must_use]
    pub fn name_identifier_format(mut self, format: impl Into<String>) -> Self {
        self.name_identifier_format = format.into();
        self
    }

    /// Validates and builds the relying party.
    ///
    /// # Errors
    ///
    /// Returns [`WsFedError::Configuration`] when the realm is empty, the
    /// lifetime is not strictly positive or longer than a year, or any reply
    /// URL is not an absolute `http`/`https` URL.
    pub fn build(self) -> WsFedResult<RelyingParty> {
        if self.realm.trim().is_empty() {
            return Err(WsFedError::Configuration("realm cannot be empty".to_string()));
        }
        if self.token_lifetime <= Duration::zero() {
            return Err(WsFedError::Configuration(format!(
                "token lifetime for {} must be positive",
                self.realm
            )));
        }
        if self.token_lifetime.num_seconds() > MAX_TOKEN_LIFETIME_SECS {
            return Err(WsFedError::Configuration(format!(
                "token lifetime for {} exceeds {MAX_TOKEN_LIFETIME_SECS}s",
                self.realm
            )));
        }

        let mut allowed_reply_urls = BTreeSet::new();
        for url in self.allowed_reply_urls.into_iter().chain(self.default_reply_url.clone()) {
            parse_absolute_url(&url)?;
            allowed_reply_urls.insert(url);
        }

        let reply_url_patterns = self
            .reply_url_patterns
            .iter()
            .map(|p| ReplyUrlPattern::parse(p))
            .collect::<WsFedResult<Vec<_>>>()?;

        let claim_mapping = self.claim_mapping.unwrap_or_else(|| {
            DEFAULT_CLAIM_MAPPING
                .iter()
                .map(|(from, to, _)| ((*from).to_string(), (*to).to_string()))
                .collect()
        });

        Ok(RelyingParty {
            realm: self.realm,
            allowed_reply_urls,
            reply_url_patterns,
            default_reply_url: self.default_reply_url,
            token_lifetime: self.token_lifetime,
            claim_mapping,
            encryption_required: self.encryption_required,
            digest_algorithm: self.digest_algorithm,
            signature_algorithm: self.signature_algorithm,
            token_type: self.token_type,
            name_identifier_format: self.name_identifier_format,
        })
    }
}

impl fmt::Display for RelyingParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.realm)
    }
}

fn parse_absolute_url(url: &str) -> WsFedResult<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| WsFedError::Configuration(format!("invalid reply URL {url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(parsed),
        _ => Err(WsFedError::Configuration(format!(
            "reply URL must be absolute http(s): {url}"
        ))),
    }
}
