//! Centralized configuration management.
//!
//! Service settings are loaded from environment variables once at startup, so a
//! missing or malformed value fails the run before any remote call is made.

use beatshift::spotify::{OAuthClient, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Spotify application client id (required for authorization)
    client_id: Option<String>,
    /// Spotify application client secret (required for authorization)
    client_secret: Option<String>,
    /// Port of the local authorization callback listener (default: 8000)
    port: u16,
    /// Redirect URI registered with Spotify (default: "http://localhost:{PORT}/callback")
    redirect_uri: String,
    /// Where access and refresh tokens are stored (default: "credentials.json")
    credentials_path: PathBuf,
    /// Spotify Web API base URL
    api_url: String,
    /// Spotify accounts service base URL
    accounts_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "PORT", value })?,
            None => 8000,
        };

        Ok(Self {
            client_id: lookup("CLIENT_ID").filter(|v| !v.is_empty()),
            client_secret: lookup("CLIENT_SECRET").filter(|v| !v.is_empty()),
            port,
            redirect_uri: lookup("REDIRECT_URI")
                .unwrap_or_else(|| format!("http://localhost:{port}/callback")),
            credentials_path: PathBuf::from(
                lookup("CREDENTIALS_PATH").unwrap_or_else(|| "credentials.json".to_string()),
            ),
            api_url: lookup("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            accounts_url: lookup("SPOTIFY_ACCOUNTS_URL")
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// OAuth client for the authorization handshake and token refresh.
    pub fn oauth(&self) -> Result<OAuthClient, ConfigError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or(ConfigError::Missing("CLIENT_ID"))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or(ConfigError::Missing("CLIENT_SECRET"))?;
        OAuthClient::new(
            client_id,
            client_secret,
            &self.redirect_uri,
            &self.accounts_url,
        )
        .map_err(|_| ConfigError::Invalid {
            var: "SPOTIFY_ACCOUNTS_URL",
            value: self.accounts_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();

        assert_eq!(config.port(), 8000);
        assert_eq!(config.redirect_uri, "http://localhost:8000/callback");
        assert_eq!(config.credentials_path(), Path::new("credentials.json"));
        assert_eq!(config.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn redirect_follows_port() {
        let config = config(&[("PORT", "9000")]).unwrap();
        assert_eq!(config.redirect_uri, "http://localhost:9000/callback");
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { var: "PORT", .. })
        ));
    }

    #[test]
    fn oauth_requires_client_credentials() {
        let config = config(&[("CLIENT_ID", "id")]).unwrap();
        assert!(matches!(
            config.oauth(),
            Err(ConfigError::Missing("CLIENT_SECRET"))
        ));
    }

    #[test]
    fn oauth_builds_with_client_credentials() {
        let config = config(&[("CLIENT_ID", "id"), ("CLIENT_SECRET", "secret")]).unwrap();
        assert!(config.oauth().is_ok());
    }
}
