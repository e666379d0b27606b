//! OpenID Connect issuer key store.
//!
//! Given an issuer's static metadata and its remote JWKS endpoint, this
//! crate resolves signing and encryption keys on demand, caches the fetched
//! key set, and refreshes the cache when a requested key cannot be satisfied
//! from what is cached. Keys are not refetched on every lookup, and a stale
//! set is never reported as a miss without one refetch first.
//!
//! Token signature validation is out of scope: the store resolves candidate
//! keys and hands them to the caller (see [`Key::decoding_key`]).
//!
//! # Example
//!
//! ```ignore
//! use oidc_keys::prelude::*;
//!
//! let issuer = Issuer::new(
//!     IssuerMetadata::new("https://op.example.com")
//!         .with_jwks_uri("https://op.example.com/certs"),
//! );
//!
//! // Fetches on first access, then serves from cache.
//! let key = issuer
//!     .key(&KeyQuery::new().with_alg("RS256").with_kid("2024-06"))
//!     .await?;
//! let decoding_key = key.decoding_key()?;
//! ```

pub mod cache;
pub mod error;
pub mod fetch;
pub mod issuer;
pub mod jwks;
pub mod keystore;

pub use cache::{CacheEntry, InMemoryKeyCache, KeyCache, DEFAULT_CAPACITY, DEFAULT_TTL};
pub use error::KeyStoreError;
pub use fetch::{FetchResponse, HttpFetch, ReqwestFetch};
pub use issuer::{Issuer, IssuerMetadata};
pub use jwks::{JoseParser, Key, KeyQuery, KeySet, StandardJoseParser};
pub use keystore::IssuerKeyStore;

pub mod prelude {
    //! Re-exports of the most commonly used types.
    pub use crate::error::KeyStoreError;
    pub use crate::issuer::{Issuer, IssuerMetadata};
    pub use crate::jwks::{Key, KeyQuery, KeySet};
    pub use crate::keystore::IssuerKeyStore;
}
