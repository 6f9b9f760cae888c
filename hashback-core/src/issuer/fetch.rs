//! Verify-URL retrieval.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{error::HashBackError, Result};

/// Retrieves the content published at a request's `VerifyUrl`.
///
/// The issuer's one externally blocking step sits behind this trait so that
/// embedders can route retrieval through their own stack and tests can run
/// without a network.
#[async_trait]
pub trait VerifyHashSource: Send + Sync {
    /// Fetches the verify URL and returns its body with surrounding
    /// whitespace stripped.
    ///
    /// # Errors
    ///
    /// Returns [`HashBackError::VerifyTimeout`] when retrieval exceeded its
    /// deadline and [`HashBackError::VerifyUnreachable`] for transport
    /// failures or any status other than 200.
    async fn fetch(&self, verify_url: &Url) -> Result<String>;
}

/// HTTP implementation of [`VerifyHashSource`].
///
/// Configuration mirrors the caller-side client: an overall request timeout
/// from issuer policy, a 10 second connect timeout, and connection pooling.
#[derive(Debug, Clone)]
pub struct HttpVerifySource {
    http: Client,
}

impl HttpVerifySource {
    /// Creates a source with the given overall fetch timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(10)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(HashBackError::Http)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl VerifyHashSource for HttpVerifySource {
    #[instrument(skip(self), fields(host = verify_url.host_str()))]
    async fn fetch(&self, verify_url: &Url) -> Result<String> {
        let response = self
            .http
            .get(verify_url.clone())
            .header(reqwest::header::ACCEPT, "text/plain")
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "verify URL fetch failed");
                if e.is_timeout() {
                    HashBackError::VerifyTimeout
                } else {
                    // The transport error text can embed the caller-chosen
                    // URL; it goes to the log, not the rejection.
                    HashBackError::VerifyUnreachable("verify URL could not be reached".to_owned())
                }
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(status = %status, "verify URL returned unexpected status");
            return Err(HashBackError::VerifyUnreachable(format!(
                "verify URL returned status {status}, expected 200"
            )));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                HashBackError::VerifyTimeout
            } else {
                HashBackError::VerifyUnreachable("verify URL body could not be read".to_owned())
            }
        })?;

        debug!("verify URL fetched");
        Ok(body.trim().to_owned())
    }
}
