//! Test utilities for the Document Gateway.
//!
//! Provides deterministic RSA key fixtures, JWT/JWKS builders, and a server
//! harness that runs the gateway against an in-memory store on an ephemeral
//! port. Integration tests combine these with a `wiremock` issuer.

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

pub use crypto_fixtures::TestRsaKey;
pub use server_harness::TestGateway;
pub use token_builders::TestTokenBuilder;
