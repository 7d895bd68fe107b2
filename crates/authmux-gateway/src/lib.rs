//! Authmux Gateway Services
//!
//! The service layer between HTTP handlers and the storage crate: token
//! lifecycle with a cache-aside read path, identity management with explicit
//! decryption, PKCE helpers, and the transparent upstream credential-refresh
//! protocol.

pub mod cache;
pub mod claims;
pub mod identity;
pub mod pkce;
pub mod tokens;
pub mod upstream;

pub use cache::MemoryCache;
pub use claims::extract_roles;
pub use identity::IdentityManager;
pub use pkce::PkceChallenge;
pub use tokens::TokenManager;
pub use upstream::{RefreshingClient, UpstreamResponse, UpstreamTokenClient};
