//! Domain entities for the authorization-server token store.

mod client;
mod code;
mod profile;
mod token;

pub use client::{generate_client_id, OAuthClient};
pub use code::AuthorizationCode;
pub use profile::{ExternalProfile, UpstreamTokenPair, UserProfile};
pub use token::{generate_token_value, AccessTokenMeta, TokenRecord, TokenType};
