//! GitHub contents API client.
//!
//! The LiberData catalogue is a plain GitHub repository. Directory listings
//! come from the contents endpoint and file bodies from each entry's
//! `download_url`.

use serde::Deserialize;
use tracing::{debug, info};

use super::http::AsyncHttpClient;
use super::types::{body_to_string, FetchError};

/// Contents API root of the LiberMap repository.
pub const DEFAULT_CONTENTS_URL: &str = "https://api.github.com/repos/cysyiu/LiberMap/contents/";

const GITHUB_ACCEPT: (&str, &str) = ("Accept", "application/vnd.github+json");

/// Entry type reported by the contents API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
    #[serde(other)]
    Other,
}

/// One item of a directory listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Client for listing and downloading repository content.
#[derive(Clone)]
pub struct ContentsClient<C> {
    http: C,
    base_url: String,
}

impl<C: AsyncHttpClient> ContentsClient<C> {
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// URL of the listing endpoint for `path`.
    ///
    /// `path` is used as-is; category paths are stored already percent-encoded.
    pub fn listing_url(&self, path: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, path.trim_start_matches('/'))
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// List the immediate children of a repository directory.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirectoryEntry>, FetchError> {
        let url = self.listing_url(path);
        debug!(url = %url, "Listing directory");

        let body = self.http.get_with_headers(&url, &[GITHUB_ACCEPT]).await?;
        let entries: Vec<DirectoryEntry> = serde_json::from_slice(&body)?;

        info!(path = path, entries = entries.len(), "Directory listed");
        Ok(entries)
    }

    /// Fetch a file body as text.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let body = self.http.get(url).await?;
        body_to_string(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::http::tests::MockHttpClient;

    const LISTING: &str = r#"[
        {"name": "Country_Parks.kml", "path": "Data_GML/保育 Conservation/Country_Parks.kml",
         "sha": "abc", "size": 1024, "type": "file",
         "download_url": "https://raw.githubusercontent.com/cysyiu/LiberMap/main/Country_Parks.kml"},
        {"name": "Wetlands", "path": "Data_GML/保育 Conservation/Wetlands",
         "type": "dir", "download_url": null},
        {"name": "link", "path": "x", "type": "symlink"}
    ]"#;

    #[test]
    fn test_listing_deserializes() {
        let entries: Vec<DirectoryEntry> = serde_json::from_str(LISTING).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert!(entries[0].download_url.is_some());
        assert_eq!(entries[1].kind, EntryKind::Dir);
        assert_eq!(entries[1].download_url, None);
        assert_eq!(entries[2].kind, EntryKind::Other);
    }

    #[test]
    fn test_listing_url_joins_once() {
        let client = ContentsClient::new(MockHttpClient::default(), DEFAULT_CONTENTS_URL);
        assert_eq!(
            client.listing_url("/Data_GML/a"),
            "https://api.github.com/repos/cysyiu/LiberMap/contents/Data_GML/a"
        );
        let bare = ContentsClient::new(MockHttpClient::default(), "http://host/contents");
        assert_eq!(bare.listing_url("x"), "http://host/contents/x");
    }

    #[tokio::test]
    async fn test_list_directory() {
        let url = format!("{}Data_GML/x", DEFAULT_CONTENTS_URL);
        let http = MockHttpClient::default().with(&url, LISTING);
        let client = ContentsClient::new(http, DEFAULT_CONTENTS_URL);

        let entries = client.list_directory("Data_GML/x").await.unwrap();
        assert_eq!(entries[1].name, "Wetlands");
    }

    #[tokio::test]
    async fn test_list_directory_rejects_object_body() {
        let url = format!("{}file.kml", DEFAULT_CONTENTS_URL);
        let http = MockHttpClient::default().with(&url, r#"{"message": "Not Found"}"#);
        let client = ContentsClient::new(http, DEFAULT_CONTENTS_URL);

        assert!(matches!(
            client.list_directory("file.kml").await,
            Err(FetchError::InvalidResponse(_))
        ));
    }
}
