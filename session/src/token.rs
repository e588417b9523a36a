//! Bearer token validation.
//!
//! Pure checks over the stored token strings. Everything here fails closed:
//! a missing token, a malformed structure, or an undecodable payload all
//! yield `false`, and no decode error ever escapes to the caller.

use crate::keys;
use crate::state::TokenSet;
use crate::stores::{KeyValueStore, read};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The claims the session subsystem cares about. Everything else in the
/// payload is ignored.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    /// Expiry as epoch seconds.
    #[serde(default)]
    exp: Option<i64>,
}

/// Read the three bearer tokens from storage.
///
/// Returns `None` (fail closed) if any token is absent or storage is
/// unreadable.
#[must_use]
pub fn read_token_set<K: KeyValueStore>(storage: &K) -> Option<TokenSet> {
    Some(TokenSet {
        access_token: read(storage, keys::ACCESS_TOKEN)?,
        refresh_token: read(storage, keys::REFRESH_TOKEN)?,
        id_token: read(storage, keys::ID_TOKEN)?,
    })
}

/// Is the stored token set present and usable at `now`?
///
/// All three tokens must exist; the identity token must have exactly three
/// dot-separated segments with a base64 JSON payload; an `exp` claim in the
/// past invalidates the set. No side effects.
#[must_use]
pub fn token_set_valid<K: KeyValueStore>(storage: &K, now: DateTime<Utc>) -> bool {
    match read_token_set(storage) {
        Some(tokens) => id_token_usable(&tokens.id_token, now),
        None => false,
    }
}

fn id_token_usable(id_token: &str, now: DateTime<Utc>) -> bool {
    let segments: Vec<&str> = id_token.split('.').collect();
    if segments.len() != 3 {
        tracing::debug!("id token does not have three segments");
        return false;
    }

    let Some(payload) = decode_segment(segments[1]) else {
        tracing::debug!("id token payload is not decodable base64");
        return false;
    };

    let claims: IdTokenClaims = match serde_json::from_slice(&payload) {
        Ok(claims) => claims,
        Err(error) => {
            tracing::debug!(%error, "id token payload is not valid JSON");
            return false;
        },
    };

    match claims.exp {
        Some(exp) if exp < now.timestamp() => {
            tracing::debug!(exp, "id token expired");
            false
        },
        _ => true,
    }
}

// Identity tokens arrive base64url unpadded; tolerate the standard alphabet
// too, since some issuers pad.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| STANDARD.decode(segment))
        .ok()
}

/// Bearer credentials for authenticated backend calls, assembled from
/// storage the way the request interceptor assembles headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerCredentials {
    /// The token sent as `Authorization: Bearer <token>`. The legacy `jwt`
    /// key wins over `id_token` when both are present.
    pub token: String,
    /// Partition key scoping the call to the active organization.
    pub partition_key: Option<String>,
}

impl BearerCredentials {
    /// Assemble credentials from storage; `None` when no token is stored.
    #[must_use]
    pub fn from_storage<K: KeyValueStore>(storage: &K) -> Option<Self> {
        let token = read(storage, keys::JWT).or_else(|| read(storage, keys::ID_TOKEN))?;
        Some(Self {
            token,
            partition_key: read(storage, keys::PARTITION_KEY),
        })
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::stores::MemoryKeyValueStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn forge_id_token(exp: Option<i64>) -> String {
        let payload = exp.map_or_else(
            || serde_json::json!({ "sub": "user-1" }),
            |exp| serde_json::json!({ "sub": "user-1", "exp": exp }),
        );
        let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("header.{encoded}.signature")
    }

    fn store_with_tokens(id_token: &str) -> MemoryKeyValueStore {
        let store = MemoryKeyValueStore::new();
        store.set(keys::ACCESS_TOKEN, "access").unwrap();
        store.set(keys::REFRESH_TOKEN, "refresh").unwrap();
        store.set(keys::ID_TOKEN, id_token).unwrap();
        store
    }

    #[test]
    fn any_missing_token_fails_closed() {
        let id_token = forge_id_token(None);
        for missing in [keys::ACCESS_TOKEN, keys::REFRESH_TOKEN, keys::ID_TOKEN] {
            let store = store_with_tokens(&id_token);
            store.remove(missing).unwrap();
            assert!(!token_set_valid(&store, now()), "missing {missing}");
        }
    }

    #[test]
    fn well_formed_unexpired_token_set_is_valid() {
        let exp = now().timestamp() + 3_600;
        let store = store_with_tokens(&forge_id_token(Some(exp)));
        assert!(token_set_valid(&store, now()));
    }

    #[test]
    fn token_without_exp_claim_is_valid() {
        let store = store_with_tokens(&forge_id_token(None));
        assert!(token_set_valid(&store, now()));
    }

    #[test]
    fn expired_claim_invalidates_a_complete_token_set() {
        let exp = now().timestamp() - 1;
        let store = store_with_tokens(&forge_id_token(Some(exp)));
        assert!(!token_set_valid(&store, now()));
    }

    #[test]
    fn wrong_segment_count_is_invalid() {
        for bad in ["onlyone", "two.segments", "a.b.c.d"] {
            let store = store_with_tokens(bad);
            assert!(!token_set_valid(&store, now()), "accepted {bad}");
        }
    }

    #[test]
    fn undecodable_payload_is_invalid() {
        let store = store_with_tokens("header.!!not-base64!!.signature");
        assert!(!token_set_valid(&store, now()));

        let not_json = URL_SAFE_NO_PAD.encode("plain text");
        let store = store_with_tokens(&format!("header.{not_json}.signature"));
        assert!(!token_set_valid(&store, now()));
    }

    #[test]
    fn standard_alphabet_payload_is_tolerated() {
        let payload = serde_json::json!({ "sub": "user-1" }).to_string();
        let encoded = STANDARD.encode(payload);
        let store = store_with_tokens(&format!("header.{encoded}.signature"));
        assert!(token_set_valid(&store, now()));
    }

    #[test]
    fn credentials_prefer_the_legacy_jwt_key() {
        let store = store_with_tokens(&forge_id_token(None));
        store.set(keys::JWT, "legacy").unwrap();
        store.set(keys::PARTITION_KEY, "pk-1").unwrap();
        let credentials = BearerCredentials::from_storage(&store).unwrap();
        assert_eq!(credentials.token, "legacy");
        assert_eq!(credentials.partition_key.as_deref(), Some("pk-1"));
        assert_eq!(credentials.authorization_header(), "Bearer legacy");
    }

    #[test]
    fn credentials_fall_back_to_the_id_token() {
        let store = MemoryKeyValueStore::new();
        store.set(keys::ID_TOKEN, "idtok").unwrap();
        let credentials = BearerCredentials::from_storage(&store).unwrap();
        assert_eq!(credentials.token, "idtok");
        assert_eq!(credentials.partition_key, None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Arbitrary id-token strings never panic the validator.
            #[test]
            fn validator_is_total(raw in "\\PC*") {
                let store = MemoryKeyValueStore::new();
                store.set(keys::ACCESS_TOKEN, "a").unwrap();
                store.set(keys::REFRESH_TOKEN, "r").unwrap();
                store.set(keys::ID_TOKEN, &raw).unwrap();
                let _ = token_set_valid(&store, now());
            }
        }
    }
}
