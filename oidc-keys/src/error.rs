/// Errors surfaced by issuer key resolution.
#[derive(Debug)]
pub enum KeyStoreError {
    /// The issuer is missing configuration required for the operation,
    /// typically a `jwks_uri`. Retrying cannot succeed.
    Configuration(String),
    /// Fetching or parsing the remote JWKS document failed (network error,
    /// non-200 status, malformed payload). Transient; a previously cached
    /// key set, if any, stays in place.
    RemoteFetch(String),
    /// No key satisfied the query, even after refetching the set once.
    KeyNotFound,
    /// More than one key satisfied the query; a `kid` is required to
    /// disambiguate.
    AmbiguousKey,
    /// A resolved key could not be turned into usable key material.
    InvalidKeyMaterial(String),
}

impl std::fmt::Display for KeyStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyStoreError::Configuration(msg) => write!(f, "{msg}"),
            KeyStoreError::RemoteFetch(msg) => write!(f, "{msg}"),
            KeyStoreError::KeyNotFound => write!(f, "no valid key found"),
            KeyStoreError::AmbiguousKey => {
                write!(f, "multiple matching keys, kid must be provided")
            }
            KeyStoreError::InvalidKeyMaterial(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for KeyStoreError {}
