//! Issued credential variants.
//!
//! The credential content is opaque to this crate beyond its delivery tag:
//! what the issuer mints and what the caller does with it are both outside
//! the protocol core.

use serde::{Deserialize, Serialize};

use crate::request::ResponseType;

/// Cookie name used by the `204SetCookie` response mode.
pub const COOKIE_NAME: &str = "HashBack";

/// The bearer-token response body, as sent on the wire.
///
/// Key names are PascalCase and part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BearerGrant {
    /// The issued token.
    pub bearer_token: String,
    /// Issue time in Unix seconds.
    pub issued_at: i64,
    /// Expiry time in Unix seconds.
    pub expires_at: i64,
}

/// A credential issued at the end of a successful exchange.
///
/// Exactly one variant per [`ResponseType`]; the pairing is fixed, so a
/// caller that requested one mode never has to handle the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedCredential {
    /// A bearer grant, delivered as an HTTP 200 JSON body.
    BearerToken(BearerGrant),
    /// A JWT, delivered as an HTTP 200 JSON string body.
    Jwt(String),
    /// A session cookie, delivered via `Set-Cookie` on an HTTP 204.
    SessionCookie {
        /// Cookie name.
        name: String,
        /// Cookie value.
        value: String,
    },
}

impl IssuedCredential {
    /// The response mode this credential was delivered under.
    #[must_use]
    pub fn response_type(&self) -> ResponseType {
        match self {
            Self::BearerToken(_) => ResponseType::BearerToken,
            Self::Jwt(_) => ResponseType::Jwt,
            Self::SessionCookie { .. } => ResponseType::SetCookie,
        }
    }
}
