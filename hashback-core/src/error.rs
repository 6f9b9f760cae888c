//! Error types for HashBack exchanges.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! [`HashBackError`] covers both halves of the protocol. Each variant maps to
//! a stable machine-readable reason code via [`HashBackError::reason_code`],
//! which issuer-side HTTP surfaces put in rejection bodies instead of free
//! text.
//!
//! # Error Categories
//!
//! - **Caller side**: [`PublishFailed`](HashBackError::PublishFailed),
//!   [`IssuanceFailed`](HashBackError::IssuanceFailed),
//!   [`Http`](HashBackError::Http)
//! - **Issuer side**: [`InvalidRequest`](HashBackError::InvalidRequest),
//!   [`InvalidRounds`](HashBackError::InvalidRounds),
//!   [`VerifyUnreachable`](HashBackError::VerifyUnreachable),
//!   [`VerifyTimeout`](HashBackError::VerifyTimeout),
//!   [`HashMismatch`](HashBackError::HashMismatch),
//!   [`Replay`](HashBackError::Replay)
//!
//! Security-relevant rejections ([`HashMismatch`](HashBackError::HashMismatch),
//! [`Replay`](HashBackError::Replay)) deliberately carry no detail: revealing
//! which field diverged, or when a nonce was first seen, would hand an
//! attacker an oracle. The same rule applies to all issuer-authored messages,
//! which never quote values taken from the request.

use thiserror::Error;

/// Result type alias for HashBack operations.
pub type Result<T> = std::result::Result<T, HashBackError>;

/// Errors raised by either half of a HashBack exchange.
///
/// # Retry Guidance
///
/// - [`PublishFailed`](Self::PublishFailed): the attempt is dead, but the
///   caller may retry with a fresh `Unus` and `VerifyUrl`. Never republish
///   the failed pair.
/// - [`VerifyUnreachable`](Self::VerifyUnreachable) /
///   [`VerifyTimeout`](Self::VerifyTimeout): terminal for the attempt; the
///   caller may start a new one.
/// - [`InvalidRequest`](Self::InvalidRequest) /
///   [`InvalidRounds`](Self::InvalidRounds): fix the request or local policy
///   before retrying.
/// - [`HashMismatch`](Self::HashMismatch) / [`Replay`](Self::Replay):
///   terminal, not retried.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum HashBackError {
    /// The request failed structural or policy validation.
    ///
    /// Covers unknown protocol versions, a foreign `IssuerUrl`, a stale or
    /// future `Now` timestamp, a malformed `Unus`, and an unacceptable
    /// `VerifyUrl`. The message is issuer-authored and does not echo request
    /// values.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// `Rounds` falls outside the issuer's accepted range.
    ///
    /// `accept` is the nearest acceptable value, so a caller that trusts the
    /// issuer can adjust and retry with a fresh request.
    #[error("rounds outside the accepted range, nearest acceptable is {accept}")]
    InvalidRounds {
        /// Nearest acceptable iteration count.
        accept: u32,
    },

    /// The verification hash could not be published before contacting the
    /// issuer.
    ///
    /// Raised on any non-2xx response or transport failure from the hash
    /// store. The caller must not proceed to the issuer, since `VerifyUrl`
    /// would not resolve.
    #[error("publishing verification hash failed: {0}")]
    PublishFailed(String),

    /// The issuer could not fetch `VerifyUrl`.
    ///
    /// Covers connection failures and any response status other than 200.
    #[error("verify URL could not be fetched: {0}")]
    VerifyUnreachable(String),

    /// The issuer's fetch of `VerifyUrl` exceeded its configured timeout.
    #[error("verify URL fetch timed out")]
    VerifyTimeout,

    /// The fetched content did not equal the recomputed verification hash.
    #[error("verification hash did not match the expected hash")]
    HashMismatch,

    /// The request's `Unus` was already consumed by this issuer.
    #[error("request nonce has already been used")]
    Replay,

    /// The issuer's response did not match the requested response type.
    ///
    /// Raised by the caller when classifying the issuer response: a wrong
    /// status code for the mode, a missing `Set-Cookie` header, or a body
    /// that does not parse as the expected credential shape.
    #[error("issuer response did not match the requested response type: {0}")]
    IssuanceFailed(String),

    /// A caller-side HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl HashBackError {
    /// Stable machine-readable reason code for this error.
    ///
    /// Issuer rejection bodies carry this code so callers can branch without
    /// parsing human-readable text.
    #[must_use]
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::InvalidRounds { .. } => "InvalidRounds",
            Self::PublishFailed(_) => "PublishFailed",
            Self::VerifyUnreachable(_) => "VerifyUnreachable",
            Self::VerifyTimeout => "VerifyTimeout",
            Self::HashMismatch => "HashMismatch",
            Self::Replay => "Replay",
            Self::IssuanceFailed(_) => "IssuanceFailed",
            Self::Http(_) => "Http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = HashBackError::InvalidRequest("Now is too far from the server clock".into());
        assert_eq!(error.to_string(), "invalid request: Now is too far from the server clock");
    }

    #[test]
    fn test_invalid_rounds_carries_bound() {
        let error = HashBackError::InvalidRounds { accept: 9 };
        assert!(error.to_string().contains('9'));
        assert_eq!(error.reason_code(), "InvalidRounds");
    }

    #[test]
    fn test_security_relevant_errors_carry_no_detail() {
        assert_eq!(
            HashBackError::HashMismatch.to_string(),
            "verification hash did not match the expected hash"
        );
        assert_eq!(HashBackError::Replay.to_string(), "request nonce has already been used");
    }

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(HashBackError::HashMismatch.reason_code(), "HashMismatch");
        assert_eq!(HashBackError::Replay.reason_code(), "Replay");
        assert_eq!(HashBackError::VerifyTimeout.reason_code(), "VerifyTimeout");
        assert_eq!(
            HashBackError::PublishFailed("status 503".into()).reason_code(),
            "PublishFailed"
        );
    }
}
