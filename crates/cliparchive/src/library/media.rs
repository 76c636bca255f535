use serde::Serialize;

/// Public locations of a clip's media, derived from the filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUris {
    pub video_uri: String,
    pub thumbnail_uri: String,
}

/// Builds media URIs under a fixed base URL. Nothing here is persisted.
#[derive(Debug, Clone)]
pub struct MediaLocator {
    base_url: String,
}

impl MediaLocator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn uris(&self, filename: &str) -> MediaUris {
        MediaUris {
            video_uri: format!("{}/{}", self.base_url, filename),
            thumbnail_uri: format!("{}/Thumbnails/{}.png", self.base_url, filename),
        }
    }
}
