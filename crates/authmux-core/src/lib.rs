//! Authmux core domain logic
//!
//! Domain entities, repository/cache traits, and the error taxonomy for the
//! authorization-server token store. Storage backends and the gateway-side
//! services live in `authmux-storage` and `authmux-gateway`.

pub mod config;
pub mod domain;
pub mod error;
pub mod repository;

pub use config::{AuthConfig, UpstreamConfig};
pub use domain::{
    generate_client_id, generate_token_value, AccessTokenMeta, AuthorizationCode, ExternalProfile,
    OAuthClient, TokenRecord, TokenType, UpstreamTokenPair, UserProfile,
};
pub use error::{AuthError, AuthResult, CryptoError};
pub use repository::{
    AuthCodeRepository, ClientRepository, MarkUsedOutcome, RepoResult, TokenCache, TokenRepository,
    UserProfileRepository,
};
