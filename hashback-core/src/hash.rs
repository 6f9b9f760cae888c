//! Verification hash derivation.
//!
//! The verification hash is PBKDF2-HMAC-SHA256 over the canonical request
//! bytes, with a fixed protocol-wide salt and the request's `Rounds` as the
//! iteration count. A keyed iterated construction is used rather than a
//! single hash pass so that an attacker who can predict part of a request
//! cannot usefully precompute hashes; the iteration count additionally lets
//! policy raise the cost floor without a protocol change.
//!
//! Output is always 32 bytes, base64 encoded for transport (44 characters).

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::{
    canonical::canonical_bytes,
    error::HashBackError,
    request::{AuthenticationRequest, ProtocolVersion},
    Result,
};

/// Verification hash length in bytes.
pub const HASH_LEN: usize = 32;

/// Fixed PBKDF2 salt for public draft 3.0.
const FIXED_SALT_3_0: &[u8; 64] =
    b"BECOLRZAMVFWECYGJTLURIDPAYBGMSCQFDXTUYNPMZOAFEDGCKXTJUZLEQFCKXYB";

/// Fixed PBKDF2 salt for public draft 3.1.
const FIXED_SALT_3_1: [u8; 32] = [
    134, 186, 14, 196, 2, 181, 162, 234, 156, 123, 82, 221, 66, 168, 131, 6, 14, 181, 146, 190,
    102, 141, 141, 160, 106, 129, 196, 14, 204, 107, 217, 221,
];

/// Returns the fixed salt for a protocol version.
#[must_use]
pub fn fixed_salt(version: ProtocolVersion) -> &'static [u8] {
    match version {
        ProtocolVersion::Draft30 => FIXED_SALT_3_0,
        ProtocolVersion::Draft31 => &FIXED_SALT_3_1,
    }
}

/// Derives the verification hash for a request.
///
/// The result is bit-identical across processes and machines for identical
/// input, which is what lets the issuer recompute it independently of the
/// caller.
///
/// # Errors
///
/// Returns [`HashBackError::InvalidRounds`] when `rounds` is zero, and
/// [`HashBackError::InvalidRequest`] if canonical serialization fails.
/// Upper bounds on `rounds` are issuer policy and enforced before this
/// function is reached.
pub fn verification_hash(request: &AuthenticationRequest) -> Result<String> {
    if request.rounds == 0 {
        return Err(HashBackError::InvalidRounds { accept: 1 });
    }

    let canonical = canonical_bytes(request)?;

    let mut output = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(
        &canonical,
        fixed_salt(request.hash_back),
        request.rounds,
        &mut output,
    );

    Ok(base64::Engine::encode(&base64::engine::general_purpose::STANDARD, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResponseType;

    fn vector_request(version: ProtocolVersion, issuer: &str, now: i64, unus: &str, verify: &str) -> AuthenticationRequest {
        AuthenticationRequest {
            hash_back: version,
            issuer_url: issuer.to_owned(),
            now,
            rounds: 1,
            type_of_response: ResponseType::BearerToken,
            unus: unus.to_owned(),
            verify_url: verify.to_owned(),
        }
    }

    // The four documented protocol examples. These pin cross-implementation
    // compatibility: a hash change here is a wire break, not a refactor.

    #[test]
    fn test_draft_3_0_example_one() {
        let req = vector_request(
            ProtocolVersion::Draft30,
            "https://issuer.example/api/generate_bearer_token",
            529297200,
            "iZ5kWQaBRd3EaMtJpC4AS40JzfFgSepLpvPxMTAbt6w=",
            "https://caller.example/hashback_files/my_json_hash.txt",
        );
        assert_eq!(
            verification_hash(&req).unwrap(),
            "2pFPaBO1bf6B7O8t9mCX8XZqU8rPtxcEYRU4eurPJEU="
        );
    }

    #[test]
    fn test_draft_3_0_example_two() {
        let req = vector_request(
            ProtocolVersion::Draft30,
            "https://sass.example/api/login/hashback",
            1111863600,
            "TmDFGekvQ+CRgANj9QPZQtBnF077gAc4AeRASFSDXo8=",
            "https://carol.example/hashback/64961859.txt",
        );
        assert_eq!(
            verification_hash(&req).unwrap(),
            "3IoVdF2nnOJ1mwNGZYXoZcPLTsY2NyL+8JIWJB3jKzM="
        );
    }

    #[test]
    fn test_draft_3_1_example_one() {
        let req = vector_request(
            ProtocolVersion::Draft31,
            "https://issuer.example/api/generate_bearer_token",
            529297200,
            "iZ5kWQaBRd3EaMtJpC4AS40JzfFgSepLpvPxMTAbt6w=",
            "https://caller.example/hashback_files/my_json_hash.txt",
        );
        assert_eq!(
            verification_hash(&req).unwrap(),
            "gnegmhqavAFiKctk5RTywzDKC5utN+nHjTzgNABH70Q="
        );
    }

    #[test]
    fn test_draft_3_1_example_two() {
        let req = vector_request(
            ProtocolVersion::Draft31,
            "https://sass.example/api/login/hashback",
            1111863600,
            "TmDFGekvQ+CRgANj9QPZQtBnF077gAc4AeRASFSDXo8=",
            "https://carol.example/hashback/64961859.txt",
        );
        assert_eq!(
            verification_hash(&req).unwrap(),
            "cMrpOXW6hMJmi9IMKEPHfvN29yfyaPEVY064coS9L8c="
        );
    }

    #[test]
    fn test_hash_is_44_character_base64() {
        let req = vector_request(
            ProtocolVersion::Draft31,
            "https://issuer.example/issuer",
            1700000000,
            "iZ5kWQaBRd3EaMtJpC4AS40JzfFgSepLpvPxMTAbt6w=",
            "https://caller.example/hashes?id=abc",
        );
        let hash = verification_hash(&req).unwrap();
        assert_eq!(hash.len(), 44);
        let decoded =
            base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &hash).unwrap();
        assert_eq!(decoded.len(), HASH_LEN);
    }

    #[test]
    fn test_versions_differ_only_by_salt() {
        let base = vector_request(
            ProtocolVersion::Draft30,
            "https://issuer.example/issuer",
            1700000000,
            "iZ5kWQaBRd3EaMtJpC4AS40JzfFgSepLpvPxMTAbt6w=",
            "https://caller.example/hashes?id=abc",
        );
        let mut other = base.clone();
        other.hash_back = ProtocolVersion::Draft31;

        assert_ne!(verification_hash(&base).unwrap(), verification_hash(&other).unwrap());
    }

    #[test]
    fn test_rounds_change_the_hash() {
        let base = vector_request(
            ProtocolVersion::Draft31,
            "https://issuer.example/issuer",
            1700000000,
            "iZ5kWQaBRd3EaMtJpC4AS40JzfFgSepLpvPxMTAbt6w=",
            "https://caller.example/hashes?id=abc",
        );
        let mut more_rounds = base.clone();
        more_rounds.rounds = 3;

        assert_ne!(
            verification_hash(&base).unwrap(),
            verification_hash(&more_rounds).unwrap()
        );
    }

    #[test]
    fn test_zero_rounds_rejected_before_derivation() {
        let mut req = vector_request(
            ProtocolVersion::Draft31,
            "https://issuer.example/issuer",
            1700000000,
            "iZ5kWQaBRd3EaMtJpC4AS40JzfFgSepLpvPxMTAbt6w=",
            "https://caller.example/hashes?id=abc",
        );
        req.rounds = 0;

        let result = verification_hash(&req);
        assert!(matches!(result, Err(HashBackError::InvalidRounds { accept: 1 })));
    }

    #[test]
    fn test_fixed_salts_have_documented_lengths() {
        assert_eq!(fixed_salt(ProtocolVersion::Draft30).len(), 64);
        assert_eq!(fixed_salt(ProtocolVersion::Draft31).len(), 32);
    }
}
