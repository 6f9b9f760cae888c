//! Issuer client and response interpretation.

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::{
    canonical::canonical_bytes,
    credential::{BearerGrant, IssuedCredential},
    error::HashBackError,
    request::{AuthenticationRequest, ResponseType},
    Result,
};

/// Submits authentication requests to issuers and classifies their
/// responses.
///
/// Classification is strict per response mode. The issuer signals success
/// differently depending on delivery mechanism (body payload vs header
/// only), so a conforming client rejects mismatches rather than loosely
/// accepting any 2xx. The rules live in [`interpret_response`], which is
/// pure and independently testable.
#[derive(Debug, Clone)]
pub struct IssuerClient {
    http: Client,
}

impl IssuerClient {
    /// Creates a client with the shared caller-side HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self { http: super::create_http_client()? })
    }

    /// POSTs the request to its `IssuerUrl` and interprets the response
    /// under the request's own `TypeOfResponse`.
    ///
    /// The body sent is the canonical serialization, so the bytes on the
    /// wire are exactly the bytes both sides hash.
    ///
    /// # Errors
    ///
    /// Returns [`HashBackError::Http`] on transport failure and
    /// [`HashBackError::IssuanceFailed`] when the response does not match
    /// the requested mode.
    #[instrument(skip(self, request), fields(response_type = request.type_of_response.wire_name()))]
    pub async fn request_credential(
        &self,
        request: &AuthenticationRequest,
    ) -> Result<IssuedCredential> {
        let issuer_url = Url::parse(&request.issuer_url).map_err(|_| {
            HashBackError::InvalidRequest("IssuerUrl is not a valid absolute URL".to_owned())
        })?;
        let body = canonical_bytes(request)?;

        let response = self
            .http
            .post(issuer_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let set_cookie = response
            .headers()
            .get(reqwest::header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;

        debug!(status, "issuer responded");
        interpret_response(request.type_of_response, status, set_cookie.as_deref(), &bytes)
    }
}

/// Maps a classified issuer response to a credential or a typed failure.
///
/// Pure: no network or hashing side effects. The per-mode contract is:
///
/// - [`ResponseType::BearerToken`]: HTTP 200 with a JSON bearer grant body
/// - [`ResponseType::Jwt`]: HTTP 200 with a JSON string body
/// - [`ResponseType::SetCookie`]: HTTP 204 with a `Set-Cookie` header
///
/// Anything else, including a 200 where a 204 was required, is
/// [`HashBackError::IssuanceFailed`].
///
/// # Errors
///
/// Returns [`HashBackError::IssuanceFailed`] describing which part of the
/// contract the response violated.
pub fn interpret_response(
    mode: ResponseType,
    status: u16,
    set_cookie: Option<&str>,
    body: &[u8],
) -> Result<IssuedCredential> {
    match mode {
        ResponseType::BearerToken => {
            if status != 200 {
                return Err(HashBackError::IssuanceFailed(format!(
                    "expected status 200 for BearerToken, got {status}"
                )));
            }
            let grant: BearerGrant = serde_json::from_slice(body).map_err(|_| {
                HashBackError::IssuanceFailed("response body is not a bearer grant".to_owned())
            })?;
            if grant.bearer_token.is_empty() {
                return Err(HashBackError::IssuanceFailed("bearer token is empty".to_owned()));
            }
            Ok(IssuedCredential::BearerToken(grant))
        }
        ResponseType::Jwt => {
            if status != 200 {
                return Err(HashBackError::IssuanceFailed(format!(
                    "expected status 200 for JWT, got {status}"
                )));
            }
            let jwt: String = serde_json::from_slice(body).map_err(|_| {
                HashBackError::IssuanceFailed("response body is not a JSON string".to_owned())
            })?;
            if jwt.is_empty() {
                return Err(HashBackError::IssuanceFailed("issued JWT is empty".to_owned()));
            }
            Ok(IssuedCredential::Jwt(jwt))
        }
        ResponseType::SetCookie => {
            if status != 204 {
                return Err(HashBackError::IssuanceFailed(format!(
                    "expected status 204 for 204SetCookie, got {status}"
                )));
            }
            let header = set_cookie.ok_or_else(|| {
                HashBackError::IssuanceFailed("Set-Cookie header is missing".to_owned())
            })?;
            // Only the leading name=value pair is the credential; attributes
            // after the first semicolon belong to the browser.
            let pair = header.split(';').next().unwrap_or_default();
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                HashBackError::IssuanceFailed("Set-Cookie header is malformed".to_owned())
            })?;
            if name.is_empty() || value.is_empty() {
                return Err(HashBackError::IssuanceFailed(
                    "Set-Cookie header is malformed".to_owned(),
                ));
            }
            Ok(IssuedCredential::SessionCookie {
                name: name.trim().to_owned(),
                value: value.trim().to_owned(),
            })
        }
    }
}
