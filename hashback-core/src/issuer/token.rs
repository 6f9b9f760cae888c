//! Credential minting.
//!
//! Issued credentials are HS256 JWTs: header `{"typ":"JWT","alg":"HS256"}`,
//! claims `iss` (issuer host), `sub` (verify-URL host), `iat`, and `exp`.
//! The token's internal structure is opaque to the rest of the protocol;
//! nothing here is consulted again after issuance.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;

/// Fixed JWT header, serialized once so the byte form never varies.
const JWT_HEADER: &str = "{\"typ\":\"JWT\",\"alg\":\"HS256\"}";

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    iat: i64,
    exp: i64,
}

/// A freshly minted token with its validity bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedToken {
    /// The signed JWT.
    pub jwt: String,
    /// Issue time in Unix seconds.
    pub issued_at: i64,
    /// Expiry time in Unix seconds.
    pub expires_at: i64,
}

/// Mints HS256 tokens with a fixed key and lifetime.
pub struct TokenMint {
    key: Vec<u8>,
    lifetime_secs: i64,
}

impl fmt::Debug for TokenMint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMint").field("lifetime_secs", &self.lifetime_secs).finish_non_exhaustive()
    }
}

impl TokenMint {
    /// Creates a mint signing with `key`, issuing tokens valid for
    /// `lifetime_secs`.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>, lifetime_secs: i64) -> Self {
        Self { key: key.into(), lifetime_secs }
    }

    /// Mints a token for `subject`, issued by `issuer`, at time `now`.
    #[must_use]
    pub fn issue(&self, issuer: &str, subject: &str, now: i64) -> MintedToken {
        let expires_at = now + self.lifetime_secs;
        let claims = Claims { iss: issuer, sub: subject, iat: now, exp: expires_at };
        let claims_json =
            serde_json::to_string(&claims).expect("claims of plain strings and integers serialize");

        let signing_input =
            format!("{}.{}", base64_url_encode(JWT_HEADER.as_bytes()), base64_url_encode(claims_json.as_bytes()));

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .expect("HMAC accepts keys of any length");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        MintedToken {
            jwt: format!("{signing_input}.{}", base64_url_encode(&signature)),
            issued_at: now,
            expires_at,
        }
    }
}

/// Encodes bytes as base64url without padding, per RFC 7515 section 2.
fn base64_url_encode(data: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_has_three_parts() {
        let mint = TokenMint::new(b"test-key".to_vec(), 3600);
        let token = mint.issue("issuer.example", "caller.example", 1700000000);

        let parts: Vec<&str> = token.jwt.split('.').collect();
        assert_eq!(parts.len(), 3, "JWT must have 3 parts");
        assert!(!token.jwt.contains('='), "base64url must not contain padding");
    }

    #[test]
    fn test_token_header_and_claims_decode() {
        let mint = TokenMint::new(b"test-key".to_vec(), 3600);
        let token = mint.issue("issuer.example", "caller.example", 1700000000);
        let parts: Vec<&str> = token.jwt.split('.').collect();

        let header_bytes = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            parts[0],
        )
        .unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header_bytes).unwrap();
        assert_eq!(header["typ"], "JWT");
        assert_eq!(header["alg"], "HS256");

        let claims_bytes = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            parts[1],
        )
        .unwrap();
        let claims: serde_json::Value = serde_json::from_slice(&claims_bytes).unwrap();
        assert_eq!(claims["iss"], "issuer.example");
        assert_eq!(claims["sub"], "caller.example");
        assert_eq!(claims["iat"], 1700000000);
        assert_eq!(claims["exp"], 1700003600);
    }

    #[test]
    fn test_lifetime_sets_expiry() {
        let mint = TokenMint::new(b"k".to_vec(), 1000);
        let token = mint.issue("i", "s", 5000);
        assert_eq!(token.issued_at, 5000);
        assert_eq!(token.expires_at, 6000);
    }

    #[test]
    fn test_signature_verifies_with_same_key() {
        let mint = TokenMint::new(b"shared-secret".to_vec(), 3600);
        let token = mint.issue("issuer.example", "caller.example", 1700000000);
        let parts: Vec<&str> = token.jwt.split('.').collect();

        let mut mac = Hmac::<Sha256>::new_from_slice(b"shared-secret").unwrap();
        mac.update(format!("{}.{}", parts[0], parts[1]).as_bytes());
        let expected = mac.finalize().into_bytes();

        let actual = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            parts[2],
        )
        .unwrap();
        assert_eq!(actual.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_different_keys_produce_different_signatures() {
        let a = TokenMint::new(b"key-a".to_vec(), 3600).issue("i", "s", 1700000000);
        let b = TokenMint::new(b"key-b".to_vec(), 3600).issue("i", "s", 1700000000);

        let sig = |t: &MintedToken| t.jwt.rsplit('.').next().unwrap().to_owned();
        assert_ne!(sig(&a), sig(&b));
        // Header and claims match; only the signatures differ.
        assert_eq!(
            a.jwt.rsplit_once('.').unwrap().0,
            b.jwt.rsplit_once('.').unwrap().0
        );
    }

    #[test]
    fn test_minting_is_deterministic_for_fixed_inputs() {
        let mint = TokenMint::new(b"k".to_vec(), 3600);
        assert_eq!(mint.issue("i", "s", 1700000000), mint.issue("i", "s", 1700000000));
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let mint = TokenMint::new(b"very-secret".to_vec(), 3600);
        let printed = format!("{mint:?}");
        assert!(!printed.contains("very-secret"));
    }
}
