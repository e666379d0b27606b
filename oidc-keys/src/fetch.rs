use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;

use crate::error::KeyStoreError;

/// The raw outcome of one JWKS fetch attempt.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Bytes,
}

/// Pluggable HTTP collaborator used to fetch JWKS documents.
///
/// The store performs exactly one `get` per fetch attempt, against the
/// issuer's `jwks_uri`. Transport concerns (TLS, timeouts, proxies, retries)
/// belong to implementations, not to the store.
pub trait HttpFetch: Send + Sync + 'static {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchResponse, KeyStoreError>> + Send + 'a>>;
}

/// Default [`HttpFetch`] backed by a shared [`reqwest::Client`].
#[derive(Clone)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    /// Create a fetcher with reqwest's default client settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a fetcher whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, KeyStoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                KeyStoreError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { client })
    }

    /// Create a fetcher from a caller-configured client (proxies, custom TLS,
    /// connection pools shared with the rest of the application).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetch for ReqwestFetch {
    fn get<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<FetchResponse, KeyStoreError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| KeyStoreError::RemoteFetch(format!("JWKS fetch error: {e}")))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| KeyStoreError::RemoteFetch(format!("JWKS fetch error: {e}")))?;
            Ok(FetchResponse { status, body })
        })
    }
}
