use super::{
    auth::{Credentials, OAuthClient},
    models::{ErrorBody, ErrorDetail, SaveRequest, SearchResponse, TrackObject},
};
use crate::{
    error::{Error, Result},
    submit::MAX_BATCH_SIZE,
    traits::RemoteCatalog,
};
use async_trait::async_trait;
use chrono::Utc;
use itertools::Itertools;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use shared::catalog::RemoteTrack;
use std::{fmt, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Called with the new credentials after every token refresh.
pub type TokenSink = Arc<dyn Fn(&Credentials) + Send + Sync>;

/// Authenticated Spotify Web API capability. Constructed once per run and shared
/// by reference; token refresh happens inside a single request.
#[derive(Clone)]
pub struct SpotifyClient {
    api_url: Url,
    client: Client,
    credentials: Arc<RwLock<Credentials>>,
    oauth: Option<OAuthClient>,
    on_refresh: Option<TokenSink>,
    search_limit: u8,
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("api_url", &self.api_url.as_str())
            .field("can_refresh", &self.oauth.is_some())
            .field("search_limit", &self.search_limit)
            .finish()
    }
}

#[derive(Default)]
pub struct SpotifyClientBuilder {
    api_url: Option<String>,
    credentials: Option<Credentials>,
    oauth: Option<OAuthClient>,
    on_refresh: Option<TokenSink>,
    search_limit: Option<u8>,
}

impl SpotifyClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn api_url(mut self, url: &str) -> Self {
        self.api_url = Some(url.to_string());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Enables refreshing the access token when it expires or is rejected.
    pub fn oauth(mut self, oauth: OAuthClient) -> Self {
        self.oauth = Some(oauth);
        self
    }

    pub fn on_refresh(mut self, sink: impl Fn(&Credentials) + Send + Sync + 'static) -> Self {
        self.on_refresh = Some(Arc::new(sink));
        self
    }

    pub fn search_limit(mut self, limit: u8) -> Self {
        self.search_limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<SpotifyClient> {
        let credentials = self
            .credentials
            .ok_or_else(|| Error::NotConfigured("Spotify credentials are missing".to_string()))?;
        let api_url =
            super::base_url(self.api_url.as_deref().unwrap_or(super::DEFAULT_API_URL))?;

        Ok(SpotifyClient {
            api_url,
            client: Client::new(),
            credentials: Arc::new(RwLock::new(credentials)),
            oauth: self.oauth,
            on_refresh: self.on_refresh,
            search_limit: self.search_limit.unwrap_or(1).clamp(1, 50),
        })
    }
}

impl SpotifyClient {
    pub async fn credentials(&self) -> Credentials {
        self.credentials.read().await.clone()
    }

    async fn make_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T> {
        let expired = self.credentials.read().await.is_expired(Utc::now());
        if expired && self.can_refresh().await {
            info!("Access token expired, refreshing before request");
            self.refresh_token().await?;
        }

        let response = self.dispatch(method.clone(), endpoint, query, body).await?;
        if response.status() == StatusCode::UNAUTHORIZED && self.can_refresh().await {
            info!("Access token rejected, refreshing and retrying once");
            self.refresh_token().await?;
            let response = self.dispatch(method, endpoint, query, body).await?;
            return Self::handle_response(response).await;
        }
        Self::handle_response(response).await
    }

    async fn dispatch<B: Serialize>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response> {
        let url = self.api_url.join(endpoint)?;
        debug!("Request: {} {}", method, url);
        let token = self.credentials.read().await.access_token.clone();
        let mut request = self.client.request(method, url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(b) = body {
            request = request.json(b);
        }
        Ok(request.send().await?)
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            let text = if text.trim().is_empty() { "null" } else { &text };
            return serde_json::from_str(text).map_err(|e| Error::Api {
                status: status.as_u16(),
                message: format!("JSON parse error: {e}"),
            });
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                error: ErrorDetail::Api { message },
            }) => message,
            _ if text.trim().is_empty() => status.to_string(),
            _ => text,
        };
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn can_refresh(&self) -> bool {
        self.oauth.is_some() && self.credentials.read().await.refresh_token.is_some()
    }

    async fn refresh_token(&self) -> Result<()> {
        let oauth = self
            .oauth
            .as_ref()
            .ok_or_else(|| Error::NotConfigured("no OAuth client for refresh".to_string()))?;
        let mut credentials = self.credentials.write().await;
        let refresh_token = credentials
            .refresh_token
            .clone()
            .ok_or(Error::Unauthorized)?;
        *credentials = oauth.refresh(&refresh_token).await?;
        if let Some(sink) = &self.on_refresh {
            sink(&*credentials);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCatalog for SpotifyClient {
    fn name(&self) -> &'static str {
        "Spotify"
    }

    async fn search(&self, query: &str) -> Result<Vec<RemoteTrack>> {
        let params = [
            ("q", query.to_string()),
            ("type", "track".to_string()),
            ("limit", self.search_limit.to_string()),
        ];
        let response: SearchResponse = self
            .make_request(Method::GET, "search", &params, None::<&()>)
            .await?;

        Ok(response
            .tracks
            .map(|paging| {
                paging
                    .items
                    .into_iter()
                    .filter_map(TrackObject::into_remote)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn is_saved(&self, ids: &[String]) -> Result<Vec<bool>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let params = [("ids", ids.iter().join(","))];
        let flags: Vec<bool> = self
            .make_request(Method::GET, "me/tracks/contains", &params, None::<&()>)
            .await?;
        if flags.len() != ids.len() {
            return Err(Error::UnexpectedResponse(format!(
                "asked about {} tracks, got {} flags",
                ids.len(),
                flags.len()
            )));
        }
        Ok(flags)
    }

    async fn save(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        if ids.len() > MAX_BATCH_SIZE {
            return Err(Error::Api {
                status: 400,
                message: format!(
                    "cannot save {} tracks at once, limit is {MAX_BATCH_SIZE}",
                    ids.len()
                ),
            });
        }
        self.make_request::<(), _>(Method::PUT, "me/tracks", &[], Some(&SaveRequest { ids }))
            .await
    }
}
