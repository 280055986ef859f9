use serde::{Deserialize, Serialize};

/// A track as known to the remote catalog. Read-only for the engine, addressed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrack {
    pub id: String,
    pub artists: Vec<String>,
    pub name: String,
}

impl RemoteTrack {
    pub fn new(id: impl Into<String>, artists: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            artists,
            name: name.into(),
        }
    }

    /// `"<first artist> - <name>"`, the form local descriptors are written in.
    pub fn display_name(&self) -> String {
        match self.artists.first() {
            Some(artist) => format!("{} - {}", artist, self.name),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_uses_first_artist() {
        let track = RemoteTrack::new(
            "abc",
            vec!["Metrik".to_string(), "Other".to_string()],
            "Freefall (VIP Mix)",
        );
        assert_eq!(track.display_name(), "Metrik - Freefall (VIP Mix)");
    }

    #[test]
    fn display_name_without_artists_is_title() {
        let track = RemoteTrack::new("abc", vec![], "Untitled");
        assert_eq!(track.display_name(), "Untitled");
    }
}
