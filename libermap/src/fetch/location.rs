//! Government location search API client.
//!
//! `GET {base}?q=<query>` returns a ranked array of places with HK1980 Grid
//! coordinates.

use serde::Deserialize;
use tracing::{debug, warn};

use super::http::AsyncHttpClient;
use super::types::FetchError;

/// Lands Department location search endpoint.
pub const DEFAULT_LOCATION_SEARCH_URL: &str =
    "https://geodata.gov.hk/gs/api/v1.0.0/locationSearch";

/// One ranked match. `x`/`y` are HK1980 Grid easting/northing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResult {
    #[serde(rename = "nameZH")]
    pub name_zh: String,
    #[serde(rename = "nameEN", default)]
    pub name_en: Option<String>,
    #[serde(rename = "addressZH", default)]
    pub address_zh: Option<String>,
    #[serde(rename = "addressEN", default)]
    pub address_en: Option<String>,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone)]
pub struct LocationSearchClient<C> {
    http: C,
    base_url: String,
}

impl<C: AsyncHttpClient> LocationSearchClient<C> {
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Request URL for `query`, percent-encoded.
    pub fn query_url(&self, query: &str) -> Result<String, FetchError> {
        url::Url::parse_with_params(&self.base_url, &[("q", query)])
            .map(String::from)
            .map_err(|e| FetchError::InvalidResponse(format!("bad search URL: {}", e)))
    }

    /// Run a query and keep the first `limit` results.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LocationResult>, FetchError> {
        let url = self.query_url(query)?;
        debug!(query = query, url = %url, "Location search");

        let body = self.http.get(&url).await.inspect_err(|e| {
            warn!(query = query, error = %e, "Location search request failed");
        })?;
        let mut results: Vec<LocationResult> = serde_json::from_slice(&body)?;
        results.truncate(limit);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::http::tests::MockHttpClient;

    const CENTRAL: &str = r#"[
        {"addressZH": "中環", "nameZH": "中環站", "x": 833800, "y": 816200,
         "nameEN": "Central Station", "addressEN": "Central", "districtZH": "中西區"},
        {"addressZH": "", "nameZH": "中環碼頭", "x": 834000, "y": 816700},
        {"nameZH": "中環街市", "x": 833700, "y": 816000},
        {"nameZH": "中環廣場", "x": 835900, "y": 815900},
        {"nameZH": "中環大廈", "x": 833600, "y": 816100},
        {"nameZH": "中環中心", "x": 833500, "y": 816000}
    ]"#;

    #[test]
    fn test_query_url_encodes() {
        let client = LocationSearchClient::new(MockHttpClient::default(), DEFAULT_LOCATION_SEARCH_URL);
        assert_eq!(
            client.query_url("Central Pier").unwrap(),
            "https://geodata.gov.hk/gs/api/v1.0.0/locationSearch?q=Central+Pier"
        );
    }

    #[tokio::test]
    async fn test_search_truncates() {
        let http = MockHttpClient::default().with(
            "https://geodata.gov.hk/gs/api/v1.0.0/locationSearch?q=Central",
            CENTRAL,
        );
        let client = LocationSearchClient::new(http, DEFAULT_LOCATION_SEARCH_URL);

        let results = client.search("Central", 5).await.unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].name_zh, "中環站");
        assert_eq!(results[0].name_en.as_deref(), Some("Central Station"));
        assert_eq!(results[2].x, 833700.0);
    }

    #[tokio::test]
    async fn test_search_propagates_http_failure() {
        let http = MockHttpClient::default().failing(
            "https://geodata.gov.hk/gs/api/v1.0.0/locationSearch?q=Central",
            503,
        );
        let client = LocationSearchClient::new(http, DEFAULT_LOCATION_SEARCH_URL);
        assert!(matches!(
            client.search("Central", 5).await,
            Err(FetchError::Status { status: 503, .. })
        ));
    }
}
