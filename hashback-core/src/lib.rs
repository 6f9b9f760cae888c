//! HashBack: proof-of-URL-control authentication.
//!
//! HashBack lets a caller obtain a short-lived credential (bearer token, JWT,
//! or session cookie) from an issuer by proving it controls an HTTP-reachable
//! location, without any pre-shared secret. This crate implements both halves
//! of the exchange.
//!
//! # Protocol Overview
//!
//! The caller builds an [`AuthenticationRequest`], serializes it into a
//! canonical byte form, and derives a verification hash from those bytes with
//! PBKDF2. It publishes the hash at a URL only it controls (`VerifyUrl`),
//! then POSTs the same request to the issuer. The issuer fetches `VerifyUrl`,
//! independently recomputes the hash from the request it received, and issues
//! a credential only when the two match.
//!
//! ```text
//! ┌──────────┐  1. POST {ID, Hash}   ┌────────────┐
//! │  Caller  │──────────────────────▶│ Hash store │  (a URL the caller
//! │          │                       │ (VerifyUrl)│   controls)
//! └────┬─────┘                       └─────▲──────┘
//!      │ 2. POST AuthenticationRequest     │ 3. GET VerifyUrl
//!      ▼                                   │
//! ┌──────────┐  recompute hash, compare,   │
//! │  Issuer  │─────────────────────────────┘
//! │          │  4. 200 BearerToken / 200 JWT / 204 Set-Cookie
//! └──────────┘
//! ```
//!
//! # Module Organization
//!
//! - [`request`]: the [`AuthenticationRequest`] object and its invariants
//! - [`canonical`]: deterministic request serialization
//! - [`hash`]: verification hash derivation (PBKDF2-HMAC-SHA256)
//! - [`caller`]: publish-then-request flow and issuer response interpretation
//! - [`issuer`]: the verify-then-issue decision procedure, replay guard,
//!   verify-URL fetching, and token minting
//! - [`store`]: in-memory hash store backing the development publish endpoint
//! - [`credential`]: the issued credential variants
//! - [`error`]: error taxonomy with machine-readable reason codes
//!
//! # Quick Start (caller side)
//!
//! ```rust,no_run
//! use hashback_core::caller::{Caller, CallerConfig};
//! use hashback_core::{ProtocolVersion, ResponseType};
//!
//! # async fn example() -> hashback_core::Result<()> {
//! let caller = Caller::new(CallerConfig {
//!     issuer_url: "https://issuer.example/issuer".to_owned(),
//!     hash_store_url: "https://caller.example/hashes".to_owned(),
//!     version: ProtocolVersion::Draft31,
//!     response_type: ResponseType::BearerToken,
//!     rounds: 1,
//! })?;
//!
//! let credential = caller.acquire().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Quick Start (issuer side)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use hashback_core::issuer::{HttpVerifySource, Issuer, IssuerPolicy};
//!
//! # async fn example(req: hashback_core::AuthenticationRequest) -> hashback_core::Result<()> {
//! let policy = IssuerPolicy { issuer_host: "issuer.example".to_owned(), ..IssuerPolicy::default() };
//! let source = Arc::new(HttpVerifySource::new(policy.fetch_timeout())?);
//! let issuer = Issuer::new(policy, source)?;
//!
//! let credential = issuer.process(&req).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Security Properties
//!
//! - **No pre-shared secret**: control of `VerifyUrl` is the credential.
//! - **Replay protection**: each request carries a single-use 256-bit nonce
//!   (`Unus`); the issuer tracks consumed nonces for the freshness window.
//! - **Freshness**: requests are rejected when their `Now` timestamp falls
//!   outside the issuer's clock-skew window.
//! - **No trusted hashes**: the issuer never accepts a caller-supplied hash;
//!   it always recomputes from the request it received.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod caller;
pub mod canonical;
pub mod credential;
pub mod error;
pub mod hash;
pub mod issuer;
pub mod request;
pub mod store;

pub use credential::{BearerGrant, IssuedCredential};
pub use error::{HashBackError, Result};
pub use request::{AuthenticationRequest, ProtocolVersion, ResponseType};

#[cfg(test)]
mod tests;
