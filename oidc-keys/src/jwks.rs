use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};

use crate::error::KeyStoreError;

/// A single JWK parsed from a JWKS document.
///
/// The descriptor fields (`kid`, `kty`, `alg`, `use`) drive key selection;
/// the key-material components (`n`/`e`, `x`/`y`/`crv`, `k`) are kept as the
/// base64url strings the document carried and only decoded by
/// [`decoding_key`](Self::decoding_key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Key ID. Unique in a well-formed set, but rotated or malformed sets
    /// may repeat it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// Key type ("RSA", "EC", "OKP" or "oct").
    pub kty: String,
    /// Algorithm the key is intended for (e.g. "RS256").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Key use ("sig" or "enc").
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub r#use: Option<String>,
    /// RSA modulus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// X coordinate for EC keys, or the public key bytes for OKP keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Y coordinate for EC keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Curve name for EC and OKP keys (e.g. "P-256", "Ed25519").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// Symmetric key value for oct keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
}

impl Key {
    /// Returns `true` if this key satisfies every criterion present in
    /// `query`.
    ///
    /// `kid` must match exactly. A key that declares an `alg` must match the
    /// queried one exactly; a key that declares none matches any algorithm
    /// compatible with its key type and curve. A key without a `use` is
    /// unrestricted and matches either value.
    pub fn matches(&self, query: &KeyQuery) -> bool {
        if let Some(kid) = query.kid.as_deref() {
            if self.kid.as_deref() != Some(kid) {
                return false;
            }
        }
        if let Some(alg) = query.alg.as_deref() {
            match self.alg.as_deref() {
                Some(declared) => {
                    if declared != alg {
                        return false;
                    }
                }
                None => {
                    if !alg_compatible(alg, &self.kty, self.crv.as_deref()) {
                        return false;
                    }
                }
            }
        }
        if let Some(queried) = query.r#use.as_deref() {
            if let Some(declared) = self.r#use.as_deref() {
                if declared != queried {
                    return false;
                }
            }
        }
        true
    }

    /// Build a [`DecodingKey`] from this key's raw material.
    ///
    /// The store never validates token signatures itself; callers that do
    /// consume resolved keys through this.
    pub fn decoding_key(&self) -> Result<DecodingKey, KeyStoreError> {
        match self.kty.as_str() {
            "RSA" => {
                let n = component(&self.n, "RSA", "n")?;
                let e = component(&self.e, "RSA", "e")?;
                DecodingKey::from_rsa_components(n, e).map_err(|err| {
                    KeyStoreError::InvalidKeyMaterial(format!(
                        "Failed to construct RSA decoding key: {err}"
                    ))
                })
            }
            "EC" => {
                let x = component(&self.x, "EC", "x")?;
                let y = component(&self.y, "EC", "y")?;
                DecodingKey::from_ec_components(x, y).map_err(|err| {
                    KeyStoreError::InvalidKeyMaterial(format!(
                        "Failed to construct EC decoding key: {err}"
                    ))
                })
            }
            "OKP" => {
                let x = component(&self.x, "OKP", "x")?;
                DecodingKey::from_ed_components(x).map_err(|err| {
                    KeyStoreError::InvalidKeyMaterial(format!(
                        "Failed to construct Ed decoding key: {err}"
                    ))
                })
            }
            "oct" => {
                let k = component(&self.k, "oct", "k")?;
                let secret = URL_SAFE_NO_PAD.decode(k).map_err(|err| {
                    KeyStoreError::InvalidKeyMaterial(format!(
                        "Failed to decode 'k' component: {err}"
                    ))
                })?;
                Ok(DecodingKey::from_secret(&secret))
            }
            other => Err(KeyStoreError::InvalidKeyMaterial(format!(
                "Unsupported key type: {other}"
            ))),
        }
    }
}

fn component<'a>(
    field: &'a Option<String>,
    kty: &str,
    name: &str,
) -> Result<&'a str, KeyStoreError> {
    field.as_deref().ok_or_else(|| {
        KeyStoreError::InvalidKeyMaterial(format!("{kty} key missing '{name}' component"))
    })
}

/// Whether `alg` can be used with a key of type `kty` (and curve `crv` for
/// EC keys). RFC 7517 makes `alg` optional, so keys omitting it are matched
/// by key-type compatibility instead.
fn alg_compatible(alg: &str, kty: &str, crv: Option<&str>) -> bool {
    match alg {
        "RS256" | "RS384" | "RS512" | "PS256" | "PS384" | "PS512" => kty == "RSA",
        "ES256" => kty == "EC" && crv == Some("P-256"),
        "ES384" => kty == "EC" && crv == Some("P-384"),
        "ES512" => kty == "EC" && crv == Some("P-521"),
        "EdDSA" => kty == "OKP",
        "HS256" | "HS384" | "HS512" => kty == "oct",
        _ => false,
    }
}

/// An ordered, immutable set of keys parsed from one JWKS document.
///
/// Every fetch produces a wholly new set; lookups never mix keys from two
/// fetch generations. `PartialEq` compares content, which is distinct from
/// generation identity (pointer equality of the shared handle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySet {
    keys: Vec<Key>,
}

impl KeySet {
    /// Create a key set from already-parsed keys, preserving their order.
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// The keys in document order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the set contains no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the keys in document order.
    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.keys.iter()
    }
}

/// Criteria for selecting a single key from a key set.
///
/// Every present field must be satisfied; absent fields match anything.
///
/// # Example
///
/// ```ignore
/// let query = KeyQuery::new().with_alg("RS256").with_kid("2024-06");
/// let key = issuer.key(&query).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyQuery {
    /// Exact key ID to match.
    pub kid: Option<String>,
    /// Algorithm the key must support.
    pub alg: Option<String>,
    /// Key use ("sig" or "enc") the key must allow.
    pub r#use: Option<String>,
}

impl KeyQuery {
    /// Create an empty query matching every key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact `kid` match.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Require the key to support `alg`.
    pub fn with_alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    /// Require the key use to allow `use` ("sig" or "enc").
    pub fn with_use(mut self, r#use: impl Into<String>) -> Self {
        self.r#use = Some(r#use.into());
        self
    }
}

/// Parses raw JWKS payloads into [`KeySet`]s.
///
/// The store fetches bytes and hands them here, so tests and embedders can
/// substitute their own JOSE handling. Parsing is pure CPU work and stays
/// synchronous.
pub trait JoseParser: Send + Sync + 'static {
    /// Parse one JWKS document.
    fn parse(&self, raw: &[u8]) -> Result<KeySet, KeyStoreError>;
}

/// Default [`JoseParser`] for RFC 7517 JWKS documents.
///
/// Rejects payloads without a `keys` array, keys without a `kty`, and key
/// types other than RSA, EC, OKP and oct.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardJoseParser;

impl JoseParser for StandardJoseParser {
    fn parse(&self, raw: &[u8]) -> Result<KeySet, KeyStoreError> {
        let set: KeySet = serde_json::from_slice(raw)
            .map_err(|e| KeyStoreError::RemoteFetch(format!("Failed to parse JWKS: {e}")))?;
        for key in set.iter() {
            if !matches!(key.kty.as_str(), "RSA" | "EC" | "OKP" | "oct") {
                return Err(KeyStoreError::RemoteFetch(format!(
                    "Unsupported key type: {}",
                    key.kty
                )));
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(kid: Option<&str>, kty: &str, alg: Option<&str>) -> Key {
        serde_json::from_value(serde_json::json!({
            "kid": kid,
            "kty": kty,
            "alg": alg,
        }))
        .unwrap()
    }

    #[test]
    fn kid_must_match_exactly() {
        let k = key(Some("a"), "RSA", Some("RS256"));
        assert!(k.matches(&KeyQuery::new().with_kid("a")));
        assert!(!k.matches(&KeyQuery::new().with_kid("b")));
    }

    #[test]
    fn declared_alg_must_match_exactly() {
        let k = key(Some("a"), "RSA", Some("RS256"));
        assert!(k.matches(&KeyQuery::new().with_alg("RS256")));
        assert!(!k.matches(&KeyQuery::new().with_alg("RS384")));
    }

    #[test]
    fn missing_alg_matches_by_key_type() {
        let k = key(Some("a"), "RSA", None);
        assert!(k.matches(&KeyQuery::new().with_alg("RS256")));
        assert!(k.matches(&KeyQuery::new().with_alg("PS384")));
        assert!(!k.matches(&KeyQuery::new().with_alg("ES256")));
        assert!(!k.matches(&KeyQuery::new().with_alg("HS256")));
    }

    #[test]
    fn missing_use_is_unrestricted() {
        let k = key(Some("a"), "RSA", Some("RS256"));
        assert!(k.matches(&KeyQuery::new().with_use("sig")));
        assert!(k.matches(&KeyQuery::new().with_use("enc")));
    }

    #[test]
    fn declared_use_must_match() {
        let mut k = key(Some("a"), "RSA", Some("RS256"));
        k.r#use = Some("sig".to_string());
        assert!(k.matches(&KeyQuery::new().with_use("sig")));
        assert!(!k.matches(&KeyQuery::new().with_use("enc")));
    }

    #[test]
    fn empty_query_matches_everything() {
        let k = key(None, "oct", None);
        assert!(k.matches(&KeyQuery::new()));
    }

    #[test]
    fn ec_compatibility_is_curve_specific() {
        assert!(alg_compatible("ES256", "EC", Some("P-256")));
        assert!(!alg_compatible("ES256", "EC", Some("P-384")));
        assert!(alg_compatible("ES384", "EC", Some("P-384")));
        assert!(alg_compatible("ES512", "EC", Some("P-521")));
        assert!(!alg_compatible("ES256", "RSA", None));
    }

    #[test]
    fn remaining_families_map_to_their_key_types() {
        assert!(alg_compatible("EdDSA", "OKP", Some("Ed25519")));
        assert!(alg_compatible("HS512", "oct", None));
        assert!(!alg_compatible("EdDSA", "EC", Some("P-256")));
        assert!(!alg_compatible("none", "RSA", None));
    }
}
