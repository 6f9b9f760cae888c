//! Issuer half of the exchange.
//!
//! One [`Issuer`] instance serves many concurrent requests. Each request runs
//! the same fixed decision procedure: structural validation, verify-URL
//! fetch, hash comparison, replay check, then issuance. The only state shared
//! between requests is the replay guard.
//!
//! The verify-URL fetch is behind the [`VerifyHashSource`] trait so tests and
//! embedders can supply their own retrieval; [`HttpVerifySource`] is the
//! production implementation.

mod fetch;
mod policy;
mod replay;
mod session;
mod token;

pub use fetch::{HttpVerifySource, VerifyHashSource};
pub use policy::IssuerPolicy;
pub use replay::ReplayGuard;
pub use session::{ClockFn, Issuer};
pub use token::{MintedToken, TokenMint};
