use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::cache::{InMemoryKeyCache, KeyCache};
use crate::error::KeyStoreError;
use crate::fetch::{HttpFetch, ReqwestFetch};
use crate::jwks::{JoseParser, Key, KeyQuery, KeySet, StandardJoseParser};
use crate::keystore::IssuerKeyStore;

/// Static metadata describing an OpenID Connect issuer.
///
/// Maps directly onto a parsed discovery document: unknown members are
/// ignored and absent members deserialize as `None`. How the metadata is
/// obtained (discovery endpoint, configuration files) is up to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerMetadata {
    /// Issuer identifier URL.
    pub issuer: String,
    /// URL of the authorization endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    /// URL of the token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    /// URL of the userinfo endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
    /// URL of the end-session (logout) endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,
    /// URL of the dynamic client registration endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_endpoint: Option<String>,
    /// URL of the JWKS document; key resolution requires it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,
    /// `response_type` values the issuer supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_types_supported: Option<Vec<String>>,
    /// `response_mode` values the issuer supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modes_supported: Option<Vec<String>>,
    /// Grant types the issuer supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant_types_supported: Option<Vec<String>>,
    /// Signing algorithms the issuer may use for ID tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_signing_alg_values_supported: Option<Vec<String>>,
    /// Client authentication methods the token endpoint supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_methods_supported: Option<Vec<String>>,
}

impl IssuerMetadata {
    /// Create metadata for `issuer` with every optional member unset.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            authorization_endpoint: None,
            token_endpoint: None,
            userinfo_endpoint: None,
            end_session_endpoint: None,
            registration_endpoint: None,
            jwks_uri: None,
            response_types_supported: None,
            response_modes_supported: None,
            grant_types_supported: None,
            id_token_signing_alg_values_supported: None,
            token_endpoint_auth_methods_supported: None,
        }
    }

    /// Set the authorization endpoint URL.
    pub fn with_authorization_endpoint(mut self, url: impl Into<String>) -> Self {
        self.authorization_endpoint = Some(url.into());
        self
    }

    /// Set the token endpoint URL.
    pub fn with_token_endpoint(mut self, url: impl Into<String>) -> Self {
        self.token_endpoint = Some(url.into());
        self
    }

    /// Set the userinfo endpoint URL.
    pub fn with_userinfo_endpoint(mut self, url: impl Into<String>) -> Self {
        self.userinfo_endpoint = Some(url.into());
        self
    }

    /// Set the end-session endpoint URL.
    pub fn with_end_session_endpoint(mut self, url: impl Into<String>) -> Self {
        self.end_session_endpoint = Some(url.into());
        self
    }

    /// Set the dynamic client registration endpoint URL.
    pub fn with_registration_endpoint(mut self, url: impl Into<String>) -> Self {
        self.registration_endpoint = Some(url.into());
        self
    }

    /// Set the JWKS document URL.
    pub fn with_jwks_uri(mut self, url: impl Into<String>) -> Self {
        self.jwks_uri = Some(url.into());
        self
    }

    /// Set the supported `response_type` values.
    pub fn with_response_types_supported(
        mut self,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.response_types_supported = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the supported `response_mode` values.
    pub fn with_response_modes_supported(
        mut self,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.response_modes_supported = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the supported grant types.
    pub fn with_grant_types_supported(
        mut self,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.grant_types_supported = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the ID token signing algorithms.
    pub fn with_id_token_signing_alg_values_supported(
        mut self,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.id_token_signing_alg_values_supported =
            Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the supported token endpoint authentication methods.
    pub fn with_token_endpoint_auth_methods_supported(
        mut self,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.token_endpoint_auth_methods_supported =
            Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// An OpenID Connect issuer: immutable metadata plus the key store resolving
/// its published keys.
///
/// The key store is created lazily on first key access. Collaborators (HTTP
/// fetch, JOSE parser, key cache) are injected through the `with_*` builders
/// before that; the defaults are the bundled implementations.
///
/// # Example
///
/// ```ignore
/// use oidc_keys::prelude::*;
///
/// let issuer = Issuer::new(
///     IssuerMetadata::new("https://op.example.com")
///         .with_jwks_uri("https://op.example.com/certs"),
/// );
///
/// let key = issuer.key(&KeyQuery::new().with_alg("RS256")).await?;
/// ```
pub struct Issuer {
    metadata: IssuerMetadata,
    http: Arc<dyn HttpFetch>,
    parser: Arc<dyn JoseParser>,
    cache: Arc<dyn KeyCache>,
    store: OnceLock<IssuerKeyStore>,
}

impl Issuer {
    /// Create an issuer from its metadata, using the bundled collaborators.
    pub fn new(metadata: IssuerMetadata) -> Self {
        Self {
            metadata,
            http: Arc::new(ReqwestFetch::new()),
            parser: Arc::new(StandardJoseParser),
            cache: Arc::new(InMemoryKeyCache::default()),
            store: OnceLock::new(),
        }
    }

    /// Replace the HTTP collaborator used to fetch the JWKS document.
    pub fn with_http_fetch(mut self, http: impl HttpFetch) -> Self {
        self.http = Arc::new(http);
        self
    }

    /// Replace the JOSE parser turning fetched payloads into key sets.
    pub fn with_jose_parser(mut self, parser: impl JoseParser) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Replace the key cache. Pass a clone of a shared cache to let several
    /// issuers share one bounded store.
    pub fn with_key_cache(mut self, cache: impl KeyCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    /// The issuer metadata, as an independent copy.
    ///
    /// Mutating the returned value never affects this issuer.
    pub fn metadata(&self) -> IssuerMetadata {
        self.metadata.clone()
    }

    /// The key store for this issuer, created on first access.
    pub fn key_store(&self) -> &IssuerKeyStore {
        self.store.get_or_init(|| {
            IssuerKeyStore::new(
                self.metadata.jwks_uri.clone(),
                self.http.clone(),
                self.parser.clone(),
                self.cache.clone(),
            )
        })
    }

    /// Current key set for this issuer; see [`IssuerKeyStore::keystore`].
    pub async fn keystore(&self, force_refetch: bool) -> Result<Arc<KeySet>, KeyStoreError> {
        self.key_store().keystore(force_refetch).await
    }

    /// Resolve exactly one key; see [`IssuerKeyStore::key`].
    pub async fn key(&self, query: &KeyQuery) -> Result<Key, KeyStoreError> {
        self.key_store().key(query).await
    }

    /// Drop this issuer's cached key set; see [`IssuerKeyStore::invalidate`].
    pub fn invalidate(&self) {
        self.key_store().invalidate()
    }
}
