pub mod auth;
pub mod client;
mod models;

pub use auth::{Credentials, OAuthClient, SCOPES};
pub use client::{SpotifyClient, SpotifyClientBuilder, TokenSink};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Parses `url` so that relative joins extend its path instead of replacing the last segment.
pub(crate) fn base_url(url: &str) -> crate::error::Result<url::Url> {
    Ok(url::Url::parse(&format!("{}/", url.trim_end_matches('/')))?)
}
