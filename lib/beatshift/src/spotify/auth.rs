//! Authorization-code flow against the Spotify accounts service.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::models::{ErrorBody, ErrorDetail, TokenResponse};
use crate::error::{Error, Result};

/// Scopes needed to read and modify the saved-tracks library.
pub const SCOPES: &[&str] = &["user-library-read", "user-library-modify"];

/// Refresh this long before the reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: None,
        }
    }

    /// Unknown expiry counts as valid; the API's 401 is the fallback signal.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .map(|at| at - Duration::seconds(EXPIRY_MARGIN_SECS) <= now)
            .unwrap_or(false)
    }

    fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at: response
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    accounts_url: Url,
    http: Client,
}

impl OAuthClient {
    pub fn new(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        accounts_url: &str,
    ) -> Result<Self> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(Error::NotConfigured(
                "client id and secret are required for authorization".to_string(),
            ));
        }
        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            accounts_url: super::base_url(accounts_url)?,
            http: Client::new(),
        })
    }

    pub fn authorize_url(&self, scopes: &[&str], state: &str) -> Result<Url> {
        let mut url = self.accounts_url.join("authorize")?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", &scopes.join(" "))
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("state", state);
        Ok(url)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<Credentials> {
        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;
        info!("Exchanged authorization code for access token");
        Ok(Credentials::from_response(response, None))
    }

    /// The previous refresh token is kept when the response does not rotate it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credentials> {
        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;
        info!("Refreshed access token");
        Ok(Credentials::from_response(
            response,
            Some(refresh_token.to_string()),
        ))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let url = self.accounts_url.join("api/token")?;
        let response = self
            .http
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(ErrorBody {
                    error: ErrorDetail::Code(code),
                }) => code,
                Ok(ErrorBody {
                    error: ErrorDetail::Api { message },
                }) => message,
                Err(_) => text,
            };
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oauth() -> OAuthClient {
        OAuthClient::new(
            "client",
            "secret",
            "http://localhost:8000/callback",
            "https://accounts.spotify.com",
        )
        .unwrap()
    }

    #[test]
    fn authorize_url_carries_scopes_and_redirect() {
        let url = oauth().authorize_url(SCOPES, "xyz").unwrap();

        assert_eq!(url.path(), "/authorize");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "client".into())));
        assert!(pairs.contains(&(
            "scope".into(),
            "user-library-read user-library-modify".into()
        )));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://localhost:8000/callback".into()
        )));
        assert!(pairs.contains(&("state".into(), "xyz".into())));
    }

    #[test]
    fn missing_client_secret_is_not_configured() {
        assert!(matches!(
            OAuthClient::new("client", "", "http://localhost/callback", "https://a.b"),
            Err(Error::NotConfigured(_))
        ));
    }

    #[test]
    fn expiry_respects_margin() {
        let now = Utc::now();
        let mut credentials = Credentials::new("token", None);
        assert!(!credentials.is_expired(now));

        credentials.expires_at = Some(now + Duration::seconds(30));
        assert!(credentials.is_expired(now));

        credentials.expires_at = Some(now + Duration::seconds(3600));
        assert!(!credentials.is_expired(now));
    }

    #[test]
    fn refreshed_credentials_keep_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".to_string(),
            refresh_token: None,
            expires_in: Some(3600),
        };
        let credentials = Credentials::from_response(response, Some("old-refresh".to_string()));

        assert_eq!(credentials.access_token, "new");
        assert_eq!(credentials.refresh_token.as_deref(), Some("old-refresh"));
        assert!(credentials.expires_at.is_some());
    }
}
