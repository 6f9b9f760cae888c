//! The verify-then-issue decision procedure.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    credential::{BearerGrant, IssuedCredential, COOKIE_NAME},
    error::HashBackError,
    hash::verification_hash,
    issuer::{IssuerPolicy, ReplayGuard, TokenMint, VerifyHashSource},
    request::{is_valid_unus, AuthenticationRequest, ResponseType},
    Result,
};

/// Source of the issuer's current time in Unix seconds. Injectable so tests
/// can pin the clock.
pub type ClockFn = Arc<dyn Fn() -> i64 + Send + Sync>;

/// The issuer half of a HashBack exchange.
///
/// One instance serves many concurrent requests; the replay guard is the
/// only state shared between them. Each call to [`process`](Self::process)
/// walks the same fixed sequence, every step closing a distinct attack:
///
/// 1. structural and policy validation (malformed input)
/// 2. verify-URL fetch (unreachable proof)
/// 3. hash recomputation and comparison (forged proof)
/// 4. replay check (replayed proof)
/// 5. issuance
///
/// The hash is always recomputed from the request as received; a hash
/// supplied by the caller is never trusted. The replay check runs after the
/// comparison so that a failed attempt does not burn its nonce.
pub struct Issuer {
    policy: IssuerPolicy,
    source: Arc<dyn VerifyHashSource>,
    replay: ReplayGuard,
    mint: TokenMint,
    clock: ClockFn,
}

impl fmt::Debug for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Issuer").field("policy", &self.policy).finish_non_exhaustive()
    }
}

impl Issuer {
    /// Creates an issuer enforcing `policy`, fetching verify URLs through
    /// `source`.
    ///
    /// # Errors
    ///
    /// Returns [`HashBackError::InvalidRequest`] when the policy fails its
    /// own validation.
    pub fn new(policy: IssuerPolicy, source: Arc<dyn VerifyHashSource>) -> Result<Self> {
        policy.validate()?;
        let replay = ReplayGuard::new(policy.replay_capacity, policy.replay_lifetime_secs());
        let mint = TokenMint::new(policy.token_key.as_bytes().to_vec(), policy.token_lifetime_secs);
        Ok(Self { policy, source, replay, mint, clock: Arc::new(system_now) })
    }

    /// Replaces the issuer clock. Intended for tests.
    #[must_use]
    pub fn with_clock(mut self, clock: ClockFn) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the decision procedure for one request.
    ///
    /// # Errors
    ///
    /// Every rejection is terminal for this request:
    /// [`InvalidRequest`](HashBackError::InvalidRequest) or
    /// [`InvalidRounds`](HashBackError::InvalidRounds) from validation,
    /// [`VerifyUnreachable`](HashBackError::VerifyUnreachable) or
    /// [`VerifyTimeout`](HashBackError::VerifyTimeout) from the fetch,
    /// [`HashMismatch`](HashBackError::HashMismatch) from the comparison,
    /// and [`Replay`](HashBackError::Replay) from the nonce check. No
    /// credential state is created on any of these paths.
    #[instrument(
        skip(self, request),
        fields(type_of_response = request.type_of_response.wire_name(), rounds = request.rounds)
    )]
    pub async fn process(&self, request: &AuthenticationRequest) -> Result<IssuedCredential> {
        let now = (self.clock)();

        let verify_url = self.validate(request, now)?;

        let presented = self.source.fetch(&verify_url).await?;

        let expected = verification_hash(request)?;
        if presented != expected {
            warn!("verification hash mismatch");
            return Err(HashBackError::HashMismatch);
        }

        if !self.replay.try_consume(&request.unus, now) {
            warn!("replayed nonce");
            return Err(HashBackError::Replay);
        }

        let subject = verify_url.host_str().unwrap_or_default();
        let token = self.mint.issue(&self.policy.issuer_host, subject, now);
        debug!("credential issued");

        Ok(match request.type_of_response {
            ResponseType::BearerToken => IssuedCredential::BearerToken(BearerGrant {
                bearer_token: token.jwt,
                issued_at: token.issued_at,
                expires_at: token.expires_at,
            }),
            ResponseType::Jwt => IssuedCredential::Jwt(token.jwt),
            ResponseType::SetCookie => IssuedCredential::SessionCookie {
                name: COOKIE_NAME.to_owned(),
                value: token.jwt,
            },
        })
    }

    /// Structural and policy validation. Returns the parsed verify URL on
    /// success. Rejection messages are issuer-authored and never quote
    /// request values.
    fn validate(&self, request: &AuthenticationRequest, now: i64) -> Result<Url> {
        let issuer_url = Url::parse(&request.issuer_url).map_err(|_| {
            HashBackError::InvalidRequest("IssuerUrl is not a valid absolute URL".to_owned())
        })?;
        if issuer_url.host_str() != Some(self.policy.issuer_host.as_str()) {
            return Err(HashBackError::InvalidRequest(
                "IssuerUrl is for a different issuer".to_owned(),
            ));
        }

        if (request.now - now).abs() >= self.policy.clock_skew_secs {
            return Err(HashBackError::InvalidRequest(
                "Now is too far from the issuer clock".to_owned(),
            ));
        }

        if !is_valid_unus(&request.unus) {
            return Err(HashBackError::InvalidRequest(
                "Unus must be 256 bits of base64".to_owned(),
            ));
        }

        if request.rounds < self.policy.min_rounds {
            return Err(HashBackError::InvalidRounds { accept: self.policy.min_rounds });
        }
        if request.rounds > self.policy.max_rounds {
            return Err(HashBackError::InvalidRounds { accept: self.policy.max_rounds });
        }

        let verify_url = Url::parse(&request.verify_url).map_err(|_| {
            HashBackError::InvalidRequest("VerifyUrl is not a valid absolute URL".to_owned())
        })?;
        if verify_url.host_str().is_none() {
            return Err(HashBackError::InvalidRequest(
                "VerifyUrl is missing a host".to_owned(),
            ));
        }
        if self.policy.require_https_verify_url && verify_url.scheme() != "https" {
            return Err(HashBackError::InvalidRequest("VerifyUrl is not HTTPS".to_owned()));
        }

        Ok(verify_url)
    }
}

fn system_now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("system time must be after Unix epoch")
        .as_secs() as i64
}
