//! Remote content fetching.
//!
//! - [`http`]: the [`AsyncHttpClient`] seam and its reqwest implementation
//! - [`github`]: directory listings of the LiberData repository
//! - [`location`]: the government location search API

pub mod github;
pub mod http;
pub mod location;
mod types;

pub use github::{ContentsClient, DirectoryEntry, EntryKind, DEFAULT_CONTENTS_URL};
pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use location::{LocationResult, LocationSearchClient, DEFAULT_LOCATION_SEARCH_URL};
pub use types::{body_to_string, FetchError};
