//! Verification hash publication.

use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{error::HashBackError, store::AddHashBody, Result};

/// Publishes verification hashes to a hash store endpoint.
///
/// The publisher owns the pairing between the store URL and the `VerifyUrl`
/// the issuer will fetch: [`verify_url`](Self::verify_url) derives the
/// latter from the former, so the id published and the id fetched cannot
/// diverge.
///
/// Publication must succeed before the issuer is contacted. A `VerifyUrl`
/// that does not yet resolve would be rejected as unreachable and waste the
/// attempt's nonce.
#[derive(Debug, Clone)]
pub struct HashPublisher {
    http: Client,
    store_url: Url,
}

impl HashPublisher {
    /// Creates a publisher for the given hash store endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`HashBackError::InvalidRequest`] when the URL does not
    /// parse, or an error if the HTTP client cannot be built.
    pub fn new(store_url: &str) -> Result<Self> {
        let store_url = Url::parse(store_url).map_err(|_| {
            HashBackError::InvalidRequest("hash store URL is not a valid absolute URL".to_owned())
        })?;
        Ok(Self { http: super::create_http_client()?, store_url })
    }

    /// The `VerifyUrl` at which the hash published under `id` will be
    /// served.
    #[must_use]
    pub fn verify_url(&self, id: Uuid) -> String {
        format!("{}?id={id}", self.store_url)
    }

    /// Publishes `hash` under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`HashBackError::PublishFailed`] on any transport failure or
    /// non-2xx response. The attempt must then be abandoned; a retry needs a
    /// fresh id and nonce.
    #[instrument(skip(self, hash))]
    pub async fn publish(&self, id: Uuid, hash: &str) -> Result<()> {
        let body = AddHashBody { id: id.to_string(), hash: hash.to_owned() };

        let response = self
            .http
            .post(self.store_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "hash store unreachable");
                HashBackError::PublishFailed("hash store could not be reached".to_owned())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "hash store refused the hash");
            return Err(HashBackError::PublishFailed(format!(
                "hash store returned status {status}"
            )));
        }

        debug!("verification hash published");
        Ok(())
    }
}
