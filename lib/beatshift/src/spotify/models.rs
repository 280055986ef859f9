use serde::{Deserialize, Serialize};
use shared::catalog::RemoteTrack;

// Raw Spotify Web API payloads

#[derive(Deserialize, Debug)]
pub(crate) struct SearchResponse {
    pub tracks: Option<Paging<TrackObject>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Paging<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ArtistObject {
    pub name: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct TrackObject {
    // null for local files in a user's library
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
}

impl TrackObject {
    pub fn into_remote(self) -> Option<RemoteTrack> {
        let id = self.id?;
        Some(RemoteTrack {
            id,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            name: self.name,
        })
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct SaveRequest<'a> {
    pub ids: &'a [String],
}

#[derive(Deserialize, Debug)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum ErrorDetail {
    Api { message: String },
    // accounts service: {"error": "invalid_grant", "error_description": "..."}
    Code(String),
}
