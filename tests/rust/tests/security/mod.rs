//! Security tests: envelope encryption, PKCE, claim extraction.

mod crypto;
mod pkce;
