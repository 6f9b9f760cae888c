//! The authentication request object and its field invariants.
//!
//! An [`AuthenticationRequest`] is built once per attempt, is immutable
//! thereafter, and is discarded after one issuer round-trip. Its serde field
//! order doubles as the canonical serialization order (see [`crate::canonical`]),
//! so the struct declaration below is part of the wire contract.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Supported protocol versions.
///
/// The version string is the first canonical field and selects the fixed
/// PBKDF2 salt used in hash derivation. Both public drafts are accepted; they
/// differ only in salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProtocolVersion {
    /// Public draft 3.0 (ASCII salt).
    #[serde(rename = "HASHBACK-PUBLIC-DRAFT-3-0")]
    Draft30,
    /// Public draft 3.1 (binary salt).
    #[serde(rename = "HASHBACK-PUBLIC-DRAFT-3-1")]
    Draft31,
}

impl ProtocolVersion {
    /// Version strings accepted by issuers, in preference order.
    pub const ACCEPTED: [&'static str; 2] =
        ["HASHBACK-PUBLIC-DRAFT-3-1", "HASHBACK-PUBLIC-DRAFT-3-0"];

    /// The wire form of this version.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft30 => "HASHBACK-PUBLIC-DRAFT-3-0",
            Self::Draft31 => "HASHBACK-PUBLIC-DRAFT-3-1",
        }
    }
}

/// Requested credential delivery mode.
///
/// A closed variant rather than a string so issuer-side branching is
/// exhaustive at compile time. The wire names below are fixed by the
/// protocol; note the cookie mode's status-code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    /// HTTP 200 with a JSON bearer grant body.
    BearerToken,
    /// HTTP 200 with a JSON string body holding the JWT.
    #[serde(rename = "JWT")]
    Jwt,
    /// HTTP 204 with the credential in a `Set-Cookie` header.
    #[serde(rename = "204SetCookie")]
    SetCookie,
}

impl ResponseType {
    /// Wire names accepted by issuers.
    pub const ACCEPTED: [&'static str; 3] = ["BearerToken", "JWT", "204SetCookie"];

    /// The wire form of this response type.
    #[must_use]
    pub const fn wire_name(&self) -> &'static str {
        match self {
            Self::BearerToken => "BearerToken",
            Self::Jwt => "JWT",
            Self::SetCookie => "204SetCookie",
        }
    }
}

/// A single authentication request from a caller to an issuer.
///
/// Field declaration order is the canonical JSON order and must not change:
/// `HashBack`, `IssuerUrl`, `Now`, `Rounds`, `TypeOfResponse`, `Unus`,
/// `VerifyUrl`. Every field participates in the verification hash, so any
/// change to any field changes the hash.
///
/// # Invariants
///
/// - `unus` is fresh per attempt: 44 base64 characters decoding to exactly
///   32 cryptographically random bytes.
/// - `verify_url` embeds an identifier unique to this attempt so concurrent
///   requests cannot collide.
/// - `now` anchors freshness; issuers reject requests outside their clock
///   skew window.
///
/// # Examples
///
/// ```
/// use hashback_core::{AuthenticationRequest, ProtocolVersion, ResponseType};
///
/// let req = AuthenticationRequest::build(
///     ProtocolVersion::Draft31,
///     ResponseType::BearerToken,
///     "https://issuer.example/issuer",
///     1,
///     "https://caller.example/hashes?id=550e8400-e29b-41d4-a716-446655440000",
/// );
/// assert_eq!(req.unus.len(), 44);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationRequest {
    /// Protocol version identifier.
    pub hash_back: ProtocolVersion,
    /// Absolute URL of the issuer endpoint this request is addressed to.
    pub issuer_url: String,
    /// Request build time in Unix seconds.
    pub now: i64,
    /// PBKDF2 iteration count for the verification hash.
    pub rounds: u32,
    /// Requested credential delivery mode.
    pub type_of_response: ResponseType,
    /// Single-use nonce: base64 of 256 cryptographically random bits.
    pub unus: String,
    /// Absolute URL where the caller publishes the verification hash.
    pub verify_url: String,
}

impl AuthenticationRequest {
    /// Builds a request stamped with the current time and a fresh `Unus`.
    ///
    /// # Panics
    ///
    /// Panics if the system clock is before the Unix epoch, which indicates
    /// a host configuration error.
    #[must_use]
    pub fn build(
        version: ProtocolVersion,
        response_type: ResponseType,
        issuer_url: &str,
        rounds: u32,
        verify_url: &str,
    ) -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("system time must be after Unix epoch")
            .as_secs() as i64;

        Self {
            hash_back: version,
            issuer_url: issuer_url.to_owned(),
            now,
            rounds,
            type_of_response: response_type,
            unus: generate_unus(),
            verify_url: verify_url.to_owned(),
        }
    }
}

/// Generates a fresh `Unus` value: 256 bits from the operating system's
/// secure random source, base64 encoded.
#[must_use]
pub fn generate_unus() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

/// Checks that a `Unus` value is 44 base64 characters decoding to exactly
/// 32 bytes.
#[must_use]
pub fn is_valid_unus(unus: &str) -> bool {
    if unus.len() != 44 {
        return false;
    }
    match base64::Engine::decode(&base64::engine::general_purpose::STANDARD, unus) {
        Ok(bytes) => bytes.len() == 32,
        Err(_) => false,
    }
}
