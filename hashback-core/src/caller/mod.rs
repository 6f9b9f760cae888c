//! Caller half of the exchange.
//!
//! A caller attempt is strictly sequential: build the request, derive the
//! hash, publish it, and only then contact the issuer. Independent attempts
//! may run fully in parallel; nothing here is shared between them.

mod client;
mod publish;

pub use client::{interpret_response, IssuerClient};
pub use publish::HashPublisher;

use std::time::Duration;

use reqwest::Client;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    credential::IssuedCredential,
    hash::verification_hash,
    request::{AuthenticationRequest, ProtocolVersion, ResponseType},
    Result,
};

/// Creates the shared HTTP client configuration for caller-side requests:
/// 30 second total timeout, 10 second connect timeout, pooled connections.
pub(crate) fn create_http_client() -> Result<Client> {
    Client::builder()
        .pool_max_idle_per_host(10)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(crate::HashBackError::Http)
}

/// Configuration for a caller.
#[derive(Debug, Clone)]
pub struct CallerConfig {
    /// Issuer endpoint the request is POSTed to.
    pub issuer_url: String,
    /// Hash store endpoint the verification hash is published to. The
    /// matching `VerifyUrl` is derived from this.
    pub hash_store_url: String,
    /// Protocol version to speak.
    pub version: ProtocolVersion,
    /// Requested credential delivery mode.
    pub response_type: ResponseType,
    /// PBKDF2 iteration count to offer.
    pub rounds: u32,
}

/// Runs complete caller attempts against one issuer.
///
/// # Examples
///
/// ```rust,no_run
/// use hashback_core::caller::{Caller, CallerConfig};
/// use hashback_core::{ProtocolVersion, ResponseType};
///
/// # async fn example() -> hashback_core::Result<()> {
/// let caller = Caller::new(CallerConfig {
///     issuer_url: "https://issuer.example/issuer".to_owned(),
///     hash_store_url: "https://caller.example/hashes".to_owned(),
///     version: ProtocolVersion::Draft31,
///     response_type: ResponseType::BearerToken,
///     rounds: 1,
/// })?;
///
/// let credential = caller.acquire().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Caller {
    publisher: HashPublisher,
    client: IssuerClient,
    config: CallerConfig,
}

impl Caller {
    /// Creates a caller from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HashBackError::InvalidRequest`] when the hash store
    /// URL does not parse, or an error if the HTTP clients cannot be built.
    pub fn new(config: CallerConfig) -> Result<Self> {
        Ok(Self {
            publisher: HashPublisher::new(&config.hash_store_url)?,
            client: IssuerClient::new()?,
            config,
        })
    }

    /// Runs one complete attempt: build, derive, publish, request.
    ///
    /// Each call uses a fresh `Unus` and verify id; a failed attempt is
    /// discarded whole and never retried with the same pair.
    ///
    /// # Errors
    ///
    /// Returns [`crate::HashBackError::PublishFailed`] when the hash cannot
    /// be published (the issuer is then never contacted),
    /// [`crate::HashBackError::IssuanceFailed`] when the issuer response
    /// does not match the requested mode, and
    /// [`crate::HashBackError::Http`] on transport failure.
    #[instrument(skip(self), fields(response_type = self.config.response_type.wire_name()))]
    pub async fn acquire(&self) -> Result<IssuedCredential> {
        let id = Uuid::new_v4();
        let verify_url = self.publisher.verify_url(id);

        let request = AuthenticationRequest::build(
            self.config.version,
            self.config.response_type,
            &self.config.issuer_url,
            self.config.rounds,
            &verify_url,
        );

        let hash = verification_hash(&request)?;
        self.publisher.publish(id, &hash).await?;

        self.client.request_credential(&request).await
    }
}
