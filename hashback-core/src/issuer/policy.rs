//! Issuer policy configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::{error::HashBackError, Result};

/// Issuer-side policy, deserializable from TOML.
///
/// Every bound an issuer enforces lives here rather than in code, so
/// deployments can tighten limits without a rebuild.
///
/// # Examples
///
/// ```toml
/// issuer_host = "issuer.example"
/// min_rounds = 1
/// max_rounds = 9
/// clock_skew_secs = 100
/// fetch_timeout_secs = 10
/// token_lifetime_secs = 3600
/// require_https_verify_url = true
/// token_key = "replace-me-with-a-real-key"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct IssuerPolicy {
    /// Host this issuer answers for. Requests whose `IssuerUrl` names a
    /// different host are rejected, closing cross-issuer confusion.
    #[serde(default = "default_issuer_host")]
    pub issuer_host: String,

    /// Lowest acceptable `Rounds`. The caller's chosen value is not trusted
    /// below this floor.
    #[serde(default = "default_min_rounds")]
    pub min_rounds: u32,

    /// Highest acceptable `Rounds`, bounding the work a request can demand.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Maximum distance, in seconds, between the request's `Now` and the
    /// issuer clock.
    #[serde(default = "default_clock_skew_secs")]
    pub clock_skew_secs: i64,

    /// Timeout for the verify-URL fetch, the one externally blocking step.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Lifetime of issued credentials in seconds.
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: i64,

    /// Whether `VerifyUrl` must be HTTPS. Disable only for local
    /// development against a plain-HTTP hash store.
    #[serde(default = "default_require_https")]
    pub require_https_verify_url: bool,

    /// Capacity of the replay guard. Consumed nonces beyond this are
    /// forgotten oldest-first; their requests will have aged out of the
    /// freshness window long before.
    #[serde(default = "default_replay_capacity")]
    pub replay_capacity: usize,

    /// HMAC key for signing issued tokens.
    #[serde(default = "default_token_key")]
    pub token_key: String,
}

impl Default for IssuerPolicy {
    fn default() -> Self {
        Self {
            issuer_host: default_issuer_host(),
            min_rounds: default_min_rounds(),
            max_rounds: default_max_rounds(),
            clock_skew_secs: default_clock_skew_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            token_lifetime_secs: default_token_lifetime_secs(),
            require_https_verify_url: default_require_https(),
            replay_capacity: default_replay_capacity(),
            token_key: default_token_key(),
        }
    }
}

impl IssuerPolicy {
    /// Validates policy values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`HashBackError::InvalidRequest`] describing the first
    /// violated bound:
    /// - `min_rounds` must be at least 1 and no greater than `max_rounds`
    /// - `clock_skew_secs` must be 1-3600
    /// - `fetch_timeout_secs` must be 1-300
    /// - `token_lifetime_secs` must be positive
    /// - `token_key` must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.min_rounds == 0 {
            return Err(HashBackError::InvalidRequest(
                "policy min_rounds must be at least 1".to_owned(),
            ));
        }
        if self.max_rounds < self.min_rounds {
            return Err(HashBackError::InvalidRequest(
                "policy max_rounds must not be below min_rounds".to_owned(),
            ));
        }
        if self.clock_skew_secs < 1 || self.clock_skew_secs > 3600 {
            return Err(HashBackError::InvalidRequest(
                "policy clock_skew_secs must be between 1 and 3600".to_owned(),
            ));
        }
        if self.fetch_timeout_secs == 0 || self.fetch_timeout_secs > 300 {
            return Err(HashBackError::InvalidRequest(
                "policy fetch_timeout_secs must be between 1 and 300".to_owned(),
            ));
        }
        if self.token_lifetime_secs < 1 {
            return Err(HashBackError::InvalidRequest(
                "policy token_lifetime_secs must be positive".to_owned(),
            ));
        }
        if self.token_key.is_empty() {
            return Err(HashBackError::InvalidRequest(
                "policy token_key must not be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Fetch timeout as a [`Duration`].
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// How long a consumed nonce stays recorded: the freshness window, which
    /// is the clock skew in both directions.
    #[must_use]
    pub fn replay_lifetime_secs(&self) -> i64 {
        self.clock_skew_secs * 2
    }
}

fn default_issuer_host() -> String {
    "localhost".to_owned()
}

fn default_min_rounds() -> u32 {
    1
}

fn default_max_rounds() -> u32 {
    9
}

fn default_clock_skew_secs() -> i64 {
    100
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_token_lifetime_secs() -> i64 {
    3600
}

fn default_require_https() -> bool {
    true
}

fn default_replay_capacity() -> usize {
    10_000
}

fn default_token_key() -> String {
    // Development placeholder. The service warns at startup when it is
    // still in effect.
    "hashback-dev-key-do-not-deploy".to_owned()
}
